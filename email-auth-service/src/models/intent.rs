//! Declared purpose of an authentication attempt.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Intent a code is issued for. A code issued for one intent never
/// authenticates the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Login,
    Signup,
}

impl Intent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::Login => "login",
            Intent::Signup => "signup",
        }
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Intent {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "login" => Ok(Intent::Login),
            "signup" => Ok(Intent::Signup),
            _ => Err(format!("Invalid intent: {}", s)),
        }
    }
}
