//! Request-code / verify-code / validate-session orchestration.
//!
//! The service keeps no state between calls. Everything a later step needs is
//! carried in the signed proof or session token handed back to the caller.

use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

use crate::{
    config::AuthConfig,
    dtos::auth::{
        RequestCodeRequest, RequestCodeResponse, ValidateSessionRequest,
        ValidateSessionResponse, VerifyCodeRequest, VerifyCodeResponse,
    },
    models::Intent,
    services::{AuthError, CodeMailer, CodeRejection, TokenClaims, TokenCodec},
    utils::{code_matches, generate_code, hash_code, is_well_formed_code, normalize_email},
};

/// Lifetime of a proof token.
pub const CODE_TTL_SECONDS: i64 = 10 * 60;
/// Lifetime of a session token.
pub const SESSION_TTL_SECONDS: i64 = 7 * 24 * 60 * 60;
/// Advisory delay before requesting another code. Not enforced here.
pub const CODE_COOLDOWN_SECONDS: i64 = 60;

#[derive(Clone)]
pub struct AuthService {
    codec: TokenCodec,
    mailer: Arc<dyn CodeMailer>,
    dispatch_timeout: std::time::Duration,
}

impl AuthService {
    pub fn new(
        codec: TokenCodec,
        mailer: Arc<dyn CodeMailer>,
        dispatch_timeout: std::time::Duration,
    ) -> Self {
        Self {
            codec,
            mailer,
            dispatch_timeout,
        }
    }

    pub fn from_config(
        config: &AuthConfig,
        mailer: Arc<dyn CodeMailer>,
    ) -> Result<Self, AuthError> {
        let codec = TokenCodec::new(&config.token.secret).map_err(AuthError::Configuration)?;
        Ok(Self::new(
            codec,
            mailer,
            std::time::Duration::from_secs(config.mail.dispatch_timeout_seconds),
        ))
    }

    /// Mail a fresh code to the address and return a proof token bound to it.
    ///
    /// No proof token is issued unless the mailer accepted the message.
    #[tracing::instrument(skip(self, req), fields(email = tracing::field::Empty, intent = tracing::field::Empty))]
    pub async fn request_code(
        &self,
        req: RequestCodeRequest,
    ) -> Result<RequestCodeResponse, AuthError> {
        let intent = parse_intent(req.intent.as_deref())?;
        let email = req
            .email
            .as_deref()
            .and_then(normalize_email)
            .ok_or(AuthError::InvalidEmail)?;

        let span = tracing::Span::current();
        span.record("email", email.as_str());
        span.record("intent", intent.as_str());

        let code = generate_code();

        match tokio::time::timeout(self.dispatch_timeout, self.mailer.send_code(&email, &code))
            .await
        {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::error!(error = %e, "Code dispatch failed, no proof token issued");
                return Err(AuthError::MailDispatch(e));
            }
            Err(_) => {
                tracing::error!(
                    timeout_seconds = self.dispatch_timeout.as_secs(),
                    "Code dispatch timed out, no proof token issued"
                );
                return Err(AuthError::MailTimeout(self.dispatch_timeout.as_secs()));
            }
        }

        let proof_token = self.codec.sign(
            TokenClaims::EmailCode {
                code_digest: hash_code(&email, &code),
                email,
                intent,
            },
            Duration::seconds(CODE_TTL_SECONDS),
        )?;

        tracing::info!("Code issued");

        Ok(RequestCodeResponse {
            ok: true,
            proof_token,
            expires_in_seconds: CODE_TTL_SECONDS,
            cooldown_seconds: CODE_COOLDOWN_SECONDS,
        })
    }

    /// Exchange a proof token and the mailed code for a session token.
    pub fn verify_code(&self, req: VerifyCodeRequest) -> Result<VerifyCodeResponse, AuthError> {
        self.verify_code_at(req, Utc::now())
    }

    #[tracing::instrument(skip(self, req, now), fields(email = tracing::field::Empty))]
    pub fn verify_code_at(
        &self,
        req: VerifyCodeRequest,
        now: DateTime<Utc>,
    ) -> Result<VerifyCodeResponse, AuthError> {
        let missing: Vec<&'static str> = [
            ("email", &req.email),
            ("intent", &req.intent),
            ("code", &req.code),
            ("proofToken", &req.proof_token),
        ]
        .into_iter()
        .filter(|(_, value)| is_blank(value))
        .map(|(name, _)| name)
        .collect();

        if !missing.is_empty() {
            return Err(AuthError::MissingFields(missing));
        }

        let email = req
            .email
            .as_deref()
            .and_then(normalize_email)
            .ok_or(AuthError::InvalidEmail)?;
        tracing::Span::current().record("email", email.as_str());

        let intent = parse_intent(req.intent.as_deref())?;
        let code = req.code.unwrap_or_default();
        let proof_token = req.proof_token.unwrap_or_default();

        // Cheap shape check before any signature work.
        if !is_well_formed_code(&code) {
            return Err(AuthError::MalformedCode);
        }

        let signed = self
            .codec
            .verify_at(&proof_token, now)
            .map_err(|_| reject(CodeRejection::ProofTokenInvalid))?;

        let TokenClaims::EmailCode {
            email: bound_email,
            intent: bound_intent,
            code_digest,
        } = signed.claims
        else {
            return Err(reject(CodeRejection::NotAProofToken));
        };

        if bound_email != email || bound_intent != intent {
            return Err(reject(CodeRejection::BindingMismatch));
        }

        if !code_matches(&email, &code, &code_digest) {
            return Err(reject(CodeRejection::WrongCode));
        }

        let session_token = self.codec.sign_at(
            TokenClaims::Session { email },
            Duration::seconds(SESSION_TTL_SECONDS),
            now,
        )?;

        tracing::info!(intent = %intent, "Code verified, session issued");

        Ok(VerifyCodeResponse {
            ok: true,
            session_token,
            expires_in_seconds: SESSION_TTL_SECONDS,
        })
    }

    /// Confirm a session token and return the address it was issued to.
    pub fn validate_session(
        &self,
        req: ValidateSessionRequest,
    ) -> Result<ValidateSessionResponse, AuthError> {
        self.validate_session_at(req, Utc::now())
    }

    #[tracing::instrument(skip(self, req, now))]
    pub fn validate_session_at(
        &self,
        req: ValidateSessionRequest,
        now: DateTime<Utc>,
    ) -> Result<ValidateSessionResponse, AuthError> {
        if is_blank(&req.session_token) {
            return Err(AuthError::MissingFields(vec!["sessionToken"]));
        }
        let token = req.session_token.unwrap_or_default();

        let signed = self.codec.verify_at(&token, now).map_err(|_| {
            tracing::debug!("Session token failed verification");
            AuthError::InvalidSession
        })?;

        match signed.claims {
            TokenClaims::Session { email } if !email.is_empty() => {
                Ok(ValidateSessionResponse { ok: true, email })
            }
            _ => {
                tracing::debug!("Token is not a session token");
                Err(AuthError::InvalidSession)
            }
        }
    }
}

fn parse_intent(raw: Option<&str>) -> Result<Intent, AuthError> {
    raw.ok_or(AuthError::InvalidIntent)?
        .parse()
        .map_err(|_| AuthError::InvalidIntent)
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, |v| v.trim().is_empty())
}

fn reject(reason: CodeRejection) -> AuthError {
    tracing::warn!(reason = reason.as_str(), "Code verification rejected");
    AuthError::CodeRejected(reason)
}
