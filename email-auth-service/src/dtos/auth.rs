//! Wire schemas for the three protocol operations.
//!
//! Every field is optional at the JSON layer so that a missing field is reported
//! as invalid input by the service instead of as a deserialization failure.

use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RequestCodeRequest {
    #[validate(length(max = 320, message = "Email is too long"))]
    #[schema(example = "user@example.com")]
    pub email: Option<String>,

    /// `login` or `signup`. Also accepted as `mode`.
    #[serde(alias = "mode")]
    #[validate(length(max = 16, message = "Intent is too long"))]
    #[schema(example = "login")]
    pub intent: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RequestCodeResponse {
    #[schema(example = true)]
    pub ok: bool,
    pub proof_token: String,
    #[schema(example = 600)]
    pub expires_in_seconds: i64,
    /// Advisory delay before asking for another code. Not enforced server-side.
    #[schema(example = 60)]
    pub cooldown_seconds: i64,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerifyCodeRequest {
    #[validate(length(max = 320, message = "Email is too long"))]
    #[schema(example = "user@example.com")]
    pub email: Option<String>,

    #[serde(alias = "mode")]
    #[validate(length(max = 16, message = "Intent is too long"))]
    #[schema(example = "login")]
    pub intent: Option<String>,

    /// Digits as a string. A JSON number is accepted too, though leading zeros
    /// are lost and such a code then fails the shape check.
    #[serde(default, deserialize_with = "string_or_number")]
    #[validate(length(max = 16, message = "Code is too long"))]
    #[schema(example = "042137")]
    pub code: Option<String>,

    #[validate(length(max = 4096, message = "Proof token is too long"))]
    pub proof_token: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerifyCodeResponse {
    #[schema(example = true)]
    pub ok: bool,
    pub session_token: String,
    #[schema(example = 604800)]
    pub expires_in_seconds: i64,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ValidateSessionRequest {
    #[validate(length(max = 4096, message = "Session token is too long"))]
    pub session_token: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ValidateSessionResponse {
    #[schema(example = true)]
    pub ok: bool,
    #[schema(example = "user@example.com")]
    pub email: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrNumber {
    String(String),
    Number(serde_json::Number),
}

fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(
        Option::<StringOrNumber>::deserialize(deserializer)?.map(|value| match value {
            StringOrNumber::String(s) => s,
            StringOrNumber::Number(n) => n.to_string(),
        }),
    )
}
