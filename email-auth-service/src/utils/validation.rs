use axum::{
    extract::{rejection::JsonRejection, FromRequest, Request},
    http::StatusCode,
    Json,
};
use serde::de::DeserializeOwned;
use service_core::error::AppError;
use validator::Validate;

/// JSON body extractor that runs `validator` rules before the handler sees it.
///
/// Rejections are invalid input (400) with a message naming what was wrong,
/// except bodies over the size limit, which are 413 whether or not they
/// declared a `Content-Length`.
pub struct ValidatedJson<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate + 'static,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(json_rejection)?;

        value.validate()?;

        Ok(ValidatedJson(value))
    }
}

fn json_rejection(rejection: JsonRejection) -> AppError {
    tracing::debug!(reason = %rejection.body_text(), "Rejected request body");

    match rejection {
        JsonRejection::JsonDataError(e) => AppError::BadRequest(anyhow::anyhow!(e.body_text())),
        JsonRejection::JsonSyntaxError(_) => {
            AppError::BadRequest(anyhow::anyhow!("Request body is not valid JSON"))
        }
        JsonRejection::MissingJsonContentType(_) => AppError::BadRequest(anyhow::anyhow!(
            "Expected request with `Content-Type: application/json`"
        )),
        JsonRejection::BytesRejection(e) if e.status() == StatusCode::PAYLOAD_TOO_LARGE => {
            AppError::PayloadTooLarge
        }
        other => AppError::BadRequest(anyhow::anyhow!(
            "Failed to read request body: {}",
            other.body_text()
        )),
    }
}
