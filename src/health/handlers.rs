//! Probe and metrics endpoints served by technical HTTP listeners.

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;

use crate::observability::metrics;
use crate::service::Service;

const ERROR_DETAILS: &str = "error during request processing";

/// Body of every failed probe. Never carries internal error detail.
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ErrorResponse {
    pub error_code: u16,
    pub error_details: &'static str,
}

impl ErrorResponse {
    pub fn new(status: StatusCode) -> Self {
        Self {
            error_code: status.as_u16(),
            error_details: ERROR_DETAILS,
        }
    }
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.error_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}

pub fn routes(service: Service) -> Router {
    Router::new()
        .route("/health/live", get(live))
        .route("/health/ready", get(ready))
        .route("/health", get(status))
        .route("/metrics", get(render_metrics))
        .with_state(service)
}

pub async fn live(State(service): State<Service>) -> Response {
    if service.is_alive().await {
        StatusCode::OK.into_response()
    } else {
        ErrorResponse::new(StatusCode::SERVICE_UNAVAILABLE).into_response()
    }
}

/// Reports the stored snapshot without recomputing it.
pub async fn ready(State(service): State<Service>) -> Response {
    let snapshot = service.readiness();
    if snapshot.ready {
        (StatusCode::OK, Json(snapshot.as_ref().clone())).into_response()
    } else {
        ErrorResponse::new(StatusCode::SERVICE_UNAVAILABLE).into_response()
    }
}

pub async fn status(State(service): State<Service>) -> Response {
    Json(service.health_status().await).into_response()
}

pub async fn render_metrics() -> Response {
    match metrics::prometheus_handle() {
        Some(handle) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            handle.render(),
        )
            .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
