//! Test helper module for email-auth-service integration tests.
//!
//! Builds the full router around a [`MockMailer`] so tests can read the code
//! that would have been emailed.

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{Request, StatusCode},
    response::Response,
    Router,
};
use email_auth_service::{
    build_router,
    config::AuthConfig,
    services::{AuthService, MockMailer},
    AppState,
};
use http_body_util::BodyExt;
use service_core::config::Config;
use std::collections::HashMap;
use std::sync::Arc;
use tower::util::ServiceExt;

pub const TEST_SECRET: &str = "integration-test-secret-0123456789";

pub struct TestApp {
    pub router: Router,
    pub mailer: Arc<MockMailer>,
    pub config: AuthConfig,
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::with_mailer(MockMailer::new()).await
    }

    pub async fn with_mailer(mailer: MockMailer) -> Self {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("ENVIRONMENT", "dev"),
            ("SERVICE_NAME", "email-auth-service-test"),
            ("LOG_LEVEL", "error"),
            ("AUTH_JWT_SECRET", TEST_SECRET),
            ("SMTP_ENABLED", "false"),
            ("MAIL_DISPATCH_TIMEOUT_SECONDS", "2"),
            ("ALLOWED_ORIGINS", "http://localhost:3000"),
        ]);
        let config = AuthConfig::from_lookup(Config::default(), |key| {
            vars.get(key).map(|v| v.to_string())
        })
        .expect("test config should load");

        let mailer = Arc::new(mailer);
        let auth = AuthService::from_config(&config, mailer.clone())
            .expect("auth service should build");

        let state = AppState {
            config: config.clone(),
            auth,
        };
        let router = build_router(state).await.expect("Failed to build router");

        Self {
            router,
            mailer,
            config,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Response {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible")
    }

    /// POST a raw body as JSON and return the status and parsed JSON reply.
    pub async fn post_raw(&self, uri: &str, body: &str) -> (StatusCode, serde_json::Value) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        read_json(self.send(request).await).await
    }

    pub async fn post_json(
        &self,
        uri: &str,
        body: serde_json::Value,
    ) -> (StatusCode, serde_json::Value) {
        self.post_raw(uri, &body.to_string()).await
    }

    pub async fn request_code(&self, email: &str, intent: &str) -> (StatusCode, serde_json::Value) {
        self.post_json(
            "/auth/request-code",
            serde_json::json!({ "email": email, "intent": intent }),
        )
        .await
    }

    pub async fn verify_code(
        &self,
        email: &str,
        intent: &str,
        code: &str,
        proof_token: &str,
    ) -> (StatusCode, serde_json::Value) {
        self.post_json(
            "/auth/verify-code",
            serde_json::json!({
                "email": email,
                "intent": intent,
                "code": code,
                "proofToken": proof_token,
            }),
        )
        .await
    }

    pub async fn validate_session(&self, session_token: &str) -> (StatusCode, serde_json::Value) {
        self.post_json(
            "/auth/validate-session",
            serde_json::json!({ "sessionToken": session_token }),
        )
        .await
    }
}

pub async fn read_json(response: Response) -> (StatusCode, serde_json::Value) {
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("Failed to read body")
        .to_bytes();
    let body = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("Response body is not JSON")
    };
    (status, body)
}

/// A well-formed code guaranteed to differ from `code`.
pub fn wrong_code(code: &str) -> String {
    if code == "000000" {
        "000001".to_string()
    } else {
        "000000".to_string()
    }
}
