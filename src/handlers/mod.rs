use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::json;
use std::any::Any;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};
use tracing::{debug, error, warn};

pub mod auth;

use crate::commands::{util, CommandRequest, MeetCommand};
use auth::TokenGate;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// State shared by every request handler
#[derive(Clone)]
pub struct AppState {
    pub gate: Arc<TokenGate>,
    pub command: MeetCommand,
}

impl AppState {
    pub fn new(gate: TokenGate, command: MeetCommand) -> Self {
        Self {
            gate: Arc::new(gate),
            command,
        }
    }
}

/// Build the HTTP router for the slash command and health endpoints
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/meet", post(meet_handler))
        .route("/health", get(health_handler))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CatchPanicLayer::custom(panic_response)),
        )
        .with_state(state)
}

/// Compare the media type only; parameters like charset are ignored
fn is_form_content_type(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .map(|media_type| media_type.trim().eq_ignore_ascii_case(FORM_CONTENT_TYPE))
        .unwrap_or(false)
}

/// Handler for the `/meet` slash command
pub async fn meet_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if !is_form_content_type(&headers) {
        warn!(
            "Invalid content type: {:?}",
            headers.get(header::CONTENT_TYPE)
        );
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "text": "Invalid request format" })),
        )
            .into_response();
    }

    let request = CommandRequest::from_form(&body);
    debug!(
        "Received slash command from {} in {}: {:?}",
        request.user_name,
        request.channel_name.as_deref().unwrap_or("<none>"),
        request.text
    );

    if !state.gate.verify(&request.token) {
        warn!("Invalid Mattermost token received");
        return (StatusCode::UNAUTHORIZED, Json(json!({ "text": "Unauthorized" }))).into_response();
    }

    match state.command.handle(&request).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => {
            error!("Error handling meet command: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(util::internal_error_response(&e.to_string())),
            )
                .into_response()
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub timestamp: String,
    pub google_meet_available: bool,
}

/// Handler for the health check
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "healthy",
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        google_meet_available: state.command.is_available(),
    })
}

/// Turn a panic inside a handler into the requester-only error reply
fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unexpected panic".to_string()
    };

    error!("Panic while handling request: {}", detail);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(util::internal_error_response(&detail)),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with(content_type: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_str(content_type).unwrap());
        headers
    }

    #[test]
    fn test_form_content_type() {
        assert!(is_form_content_type(&headers_with("application/x-www-form-urlencoded")));
        assert!(is_form_content_type(&headers_with(
            "application/x-www-form-urlencoded; charset=utf-8"
        )));
        assert!(!is_form_content_type(&headers_with("application/json")));
        assert!(!is_form_content_type(&HeaderMap::new()));
    }

    #[test]
    fn test_panic_response_is_ephemeral_500() {
        let response = panic_response(Box::new("boom"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
