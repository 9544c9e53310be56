pub mod config;
pub mod dtos;
pub mod handlers;
pub mod models;
pub mod services;
pub mod utils;

use service_core::axum::{
    http::{header, HeaderValue, Method},
    middleware::from_fn,
    routing::{get, post},
    Router,
};
use service_core::middleware::{
    security_headers::security_headers_middleware,
    tracing::{request_id_middleware, REQUEST_ID_HEADER},
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};
use utoipa::OpenApi;

use crate::config::AuthConfig;
use crate::services::AuthService;
use service_core::error::AppError;

/// Largest request body accepted on any route.
const MAX_BODY_BYTES: usize = 16 * 1024;

#[derive(OpenApi)]
#[openapi(
    paths(
        health_check,
        handlers::well_known::openapi,
        handlers::auth::request_code,
        handlers::auth::verify_code,
        handlers::auth::validate_session,
    ),
    components(
        schemas(
            dtos::ErrorResponse,
            dtos::auth::RequestCodeRequest,
            dtos::auth::RequestCodeResponse,
            dtos::auth::VerifyCodeRequest,
            dtos::auth::VerifyCodeResponse,
            dtos::auth::ValidateSessionRequest,
            dtos::auth::ValidateSessionResponse,
            models::Intent,
        )
    ),
    tags(
        (name = "Authentication", description = "Email code login and session validation"),
        (name = "Well-Known", description = "Public service metadata"),
        (name = "Observability", description = "Service health"),
    )
)]
pub struct ApiDoc;

#[derive(Clone)]
pub struct AppState {
    pub config: AuthConfig,
    pub auth: AuthService,
}

pub async fn build_router(state: AppState) -> Result<Router, AppError> {
    let cors = cors_layer(&state.config.security.allowed_origins);

    let app = Router::new()
        .route("/health", get(health_check))
        .route(
            "/.well-known/openapi.json",
            get(handlers::well_known::openapi),
        )
        // Protocol routes answer every other verb with 405
        .route(
            "/auth/request-code",
            post(handlers::request_code).fallback(handlers::method_not_allowed),
        )
        .route(
            "/auth/verify-code",
            post(handlers::verify_code).fallback(handlers::method_not_allowed),
        )
        .route(
            "/auth/validate-session",
            post(handlers::validate_session).fallback(handlers::method_not_allowed),
        )
        .with_state(state)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        // Add tracing layer
        .layer(TraceLayer::new_for_http().make_span_with(
            |request: &service_core::axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            },
        ))
        // Add tracing middleware for request_id
        .layer(from_fn(request_id_middleware))
        // Add security headers middleware
        .layer(from_fn(security_headers_middleware))
        // Add CORS layer
        .layer(cors);

    Ok(app)
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origin = if allowed_origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        let origins: Vec<HeaderValue> = allowed_origins
            .iter()
            .filter_map(|o| match o.parse::<HeaderValue>() {
                Ok(value) => Some(value),
                Err(e) => {
                    tracing::error!("Invalid CORS origin '{}': {}. Skipping.", o, e);
                    None
                }
            })
            .collect();
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::POST, Method::GET, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::HeaderName::from_static(REQUEST_ID_HEADER),
        ])
}

/// Service health check
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy")
    ),
    tag = "Observability"
)]
pub async fn health_check(
    service_core::axum::extract::State(state): service_core::axum::extract::State<AppState>,
) -> service_core::axum::Json<serde_json::Value> {
    // Nothing to probe: the service holds no connections between requests.
    service_core::axum::Json(serde_json::json!({
        "status": "healthy",
        "service": state.config.service_name,
        "version": state.config.service_version,
        "environment": format!("{:?}", state.config.environment),
    }))
}
