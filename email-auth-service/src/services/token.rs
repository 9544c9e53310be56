use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::Intent;

/// Claims carried by the two token kinds, tagged by `kind` on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TokenClaims {
    /// Proof that a code was mailed to `email` for `intent`.
    EmailCode {
        email: String,
        intent: Intent,
        code_digest: String,
    },
    /// Completed login for `email`.
    Session { email: String },
}

/// Claims plus the validity window stamped at signing time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedClaims {
    #[serde(flatten)]
    pub claims: TokenClaims,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

/// Uniform verification failure. Corrupt, forged, and expired tokens are not
/// told apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("token verification failed")]
pub struct VerificationError;

/// HS256 signer/verifier over a single process-wide secret.
#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenCodec {
    pub fn new(secret: &SecretString) -> Result<Self, anyhow::Error> {
        let secret = secret.expose_secret();
        if secret.is_empty() {
            return Err(anyhow::anyhow!("Token signing secret must not be empty"));
        }

        // Expiry is checked by hand in `verify_at` so it is exact and clock-injectable.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        })
    }

    /// Sign `claims` valid for `ttl` from now.
    pub fn sign(&self, claims: TokenClaims, ttl: Duration) -> Result<String, anyhow::Error> {
        self.sign_at(claims, ttl, Utc::now())
    }

    /// Sign `claims` as if issued at `issued_at`.
    pub fn sign_at(
        &self,
        claims: TokenClaims,
        ttl: Duration,
        issued_at: DateTime<Utc>,
    ) -> Result<String, anyhow::Error> {
        let signed = SignedClaims {
            claims,
            iat: issued_at.timestamp(),
            exp: (issued_at + ttl).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &signed, &self.encoding_key)
            .map_err(|e| anyhow::anyhow!("Failed to encode token: {}", e))
    }

    pub fn verify(&self, token: &str) -> Result<SignedClaims, VerificationError> {
        self.verify_at(token, Utc::now())
    }

    /// Verify signature and structure, then require `now < exp`.
    pub fn verify_at(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<SignedClaims, VerificationError> {
        let token_data = decode::<SignedClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| {
                tracing::debug!(reason = %e, "Token rejected");
                VerificationError
            })?;

        let signed = token_data.claims;
        if now.timestamp() >= signed.exp {
            tracing::debug!(exp = signed.exp, "Token rejected: expired");
            return Err(VerificationError);
        }

        Ok(signed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec(secret: &str) -> TokenCodec {
        TokenCodec::new(&SecretString::new(secret.to_string())).unwrap()
    }

    fn proof_claims() -> TokenClaims {
        TokenClaims::EmailCode {
            email: "a@b.com".to_string(),
            intent: Intent::Login,
            code_digest: "ab".repeat(32),
        }
    }

    #[test]
    fn test_empty_secret_is_rejected() {
        assert!(TokenCodec::new(&SecretString::new(String::new())).is_err());
    }

    #[test]
    fn test_proof_token_round_trip() -> Result<(), anyhow::Error> {
        let codec = codec("test-secret");
        let token = codec.sign(proof_claims(), Duration::minutes(10))?;

        let signed = codec.verify(&token).expect("token should verify");
        assert_eq!(signed.claims, proof_claims());
        assert_eq!(signed.exp - signed.iat, 600);
        Ok(())
    }

    #[test]
    fn test_wire_format_carries_kind() -> Result<(), anyhow::Error> {
        let codec = codec("test-secret");
        let token = codec.sign(
            TokenClaims::Session {
                email: "a@b.com".to_string(),
            },
            Duration::days(7),
        )?;

        let mut validation = Validation::new(Algorithm::HS256);
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        let value = decode::<serde_json::Value>(&token, &DecodingKey::from_secret(&[]), &validation)?
            .claims;
        assert_eq!(value["kind"], "session");
        assert_eq!(value["email"], "a@b.com");
        assert!(value["iat"].is_i64());
        assert!(value["exp"].is_i64());
        Ok(())
    }

    #[test]
    fn test_wrong_secret_is_rejected() -> Result<(), anyhow::Error> {
        let token = codec("secret-one").sign(proof_claims(), Duration::minutes(10))?;
        assert_eq!(codec("secret-two").verify(&token), Err(VerificationError));
        Ok(())
    }

    #[test]
    fn test_tampered_payload_is_rejected() -> Result<(), anyhow::Error> {
        let codec = codec("test-secret");
        let token = codec.sign(proof_claims(), Duration::minutes(10))?;
        let other = codec.sign(
            TokenClaims::Session {
                email: "a@b.com".to_string(),
            },
            Duration::days(7),
        )?;

        // Splice the session payload onto the proof token's signature.
        let parts: Vec<&str> = token.split('.').collect();
        let other_parts: Vec<&str> = other.split('.').collect();
        let forged = format!("{}.{}.{}", parts[0], other_parts[1], parts[2]);

        assert_eq!(codec.verify(&forged), Err(VerificationError));
        Ok(())
    }

    #[test]
    fn test_garbage_is_rejected() {
        let codec = codec("test-secret");
        for token in ["", "not-a-token", "a.b.c", "...."] {
            assert_eq!(codec.verify(token), Err(VerificationError));
        }
    }

    #[test]
    fn test_expiry_boundary() -> Result<(), anyhow::Error> {
        let codec = codec("test-secret");
        let issued_at = Utc::now() - Duration::minutes(30);
        let token = codec.sign_at(proof_claims(), Duration::minutes(10), issued_at)?;

        let exp = issued_at + Duration::minutes(10);
        assert!(codec.verify_at(&token, exp - Duration::seconds(1)).is_ok());
        assert_eq!(codec.verify_at(&token, exp), Err(VerificationError));
        assert_eq!(codec.verify(&token), Err(VerificationError));
        Ok(())
    }

    #[test]
    fn test_unknown_kind_is_rejected() -> Result<(), anyhow::Error> {
        let now = Utc::now().timestamp();
        let token = encode(
            &Header::new(Algorithm::HS256),
            &serde_json::json!({ "kind": "admin", "email": "a@b.com", "iat": now, "exp": now + 600 }),
            &EncodingKey::from_secret(b"test-secret"),
        )?;

        assert_eq!(codec("test-secret").verify(&token), Err(VerificationError));
        Ok(())
    }

    #[test]
    fn test_other_algorithm_is_rejected() -> Result<(), anyhow::Error> {
        let now = Utc::now().timestamp();
        let token = encode(
            &Header::new(Algorithm::HS512),
            &serde_json::json!({ "kind": "session", "email": "a@b.com", "iat": now, "exp": now + 600 }),
            &EncodingKey::from_secret(b"test-secret"),
        )?;

        assert_eq!(codec("test-secret").verify(&token), Err(VerificationError));
        Ok(())
    }

    #[test]
    fn test_missing_exp_is_rejected() -> Result<(), anyhow::Error> {
        let token = encode(
            &Header::new(Algorithm::HS256),
            &serde_json::json!({ "kind": "session", "email": "a@b.com", "iat": 0 }),
            &EncodingKey::from_secret(b"test-secret"),
        )?;

        assert_eq!(codec("test-secret").verify(&token), Err(VerificationError));
        Ok(())
    }
}
