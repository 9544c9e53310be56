//! HTTP handlers for email-auth-service.

pub mod auth;
pub mod well_known;

pub use auth::*;
