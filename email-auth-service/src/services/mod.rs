//! Services layer for email-auth-service.
//!
//! Token signing, code mail delivery, and the protocol orchestration that
//! ties them together.

pub mod auth;
mod email;
pub mod error;
mod token;

pub use auth::{AuthService, CODE_COOLDOWN_SECONDS, CODE_TTL_SECONDS, SESSION_TTL_SECONDS};
pub use email::{CodeMailer, LogMailer, MailError, MockMailer, SentCode, SmtpMailer};
pub use error::{AuthError, CodeRejection, ErrorClass};
pub use token::{SignedClaims, TokenClaims, TokenCodec, VerificationError};
