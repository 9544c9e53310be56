use service_core::error::AppError;
use thiserror::Error;

use super::email::MailError;

/// Caller-facing classification of a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Malformed or missing input; safe to describe precisely.
    InvalidInput,
    /// Token or code rejected; always described generically.
    Unauthenticated,
    /// Mail transport or signing failed; the caller may retry the flow.
    DependencyFailure,
    /// The service cannot run with its current configuration.
    ConfigurationFatal,
}

/// Why a code check was refused. Logged, never returned to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeRejection {
    ProofTokenInvalid,
    NotAProofToken,
    BindingMismatch,
    WrongCode,
}

impl CodeRejection {
    pub fn as_str(&self) -> &'static str {
        match self {
            CodeRejection::ProofTokenInvalid => "proof_token_invalid",
            CodeRejection::NotAProofToken => "not_a_proof_token",
            CodeRejection::BindingMismatch => "binding_mismatch",
            CodeRejection::WrongCode => "wrong_code",
        }
    }
}

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Invalid email address")]
    InvalidEmail,

    #[error("Invalid intent, expected 'login' or 'signup'")]
    InvalidIntent,

    #[error("Missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    #[error("Code must be exactly 6 digits")]
    MalformedCode,

    // Every variant of CodeRejection renders the same message.
    #[error("Invalid or expired code. Request a new one.")]
    CodeRejected(CodeRejection),

    #[error("Session is invalid or expired")]
    InvalidSession,

    #[error("Failed to send email: {0}")]
    MailDispatch(#[from] MailError),

    #[error("Email dispatch timed out after {0} seconds")]
    MailTimeout(u64),

    #[error("Configuration error: {0}")]
    Configuration(anyhow::Error),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AuthError {
    pub fn class(&self) -> ErrorClass {
        match self {
            AuthError::InvalidEmail
            | AuthError::InvalidIntent
            | AuthError::MissingFields(_)
            | AuthError::MalformedCode => ErrorClass::InvalidInput,
            AuthError::CodeRejected(_) | AuthError::InvalidSession => ErrorClass::Unauthenticated,
            AuthError::MailDispatch(_) | AuthError::MailTimeout(_) | AuthError::Internal(_) => {
                ErrorClass::DependencyFailure
            }
            AuthError::Configuration(_) => ErrorClass::ConfigurationFatal,
        }
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidEmail
            | AuthError::InvalidIntent
            | AuthError::MissingFields(_)
            | AuthError::MalformedCode => AppError::BadRequest(anyhow::anyhow!(err.to_string())),
            AuthError::CodeRejected(_) | AuthError::InvalidSession => {
                AppError::Unauthorized(anyhow::anyhow!(err.to_string()))
            }
            AuthError::MailDispatch(_) | AuthError::MailTimeout(_) => {
                AppError::BadGateway("Could not send the code email".to_string())
            }
            AuthError::Configuration(e) => AppError::ConfigError(e),
            AuthError::Internal(e) => AppError::InternalError(e),
        }
    }
}
