//! HTTP server for the import validator.
//!
//! # API Endpoints
//!
//! | Method | Path              | Description                          |
//! |--------|-------------------|--------------------------------------|
//! | GET    | `/health`         | Health check                         |
//! | POST   | `/api/validate`   | Validate an import payload (JSON)    |
//! | GET    | `/api/logs`       | SSE stream for real-time logs        |

use axum::{
    extract::{DefaultBodyLimit, State},
    http::{header, Method, StatusCode},
    response::{sse::Event, IntoResponse, Json, Response, Sse},
    routing::{get, post},
    Router,
};
use futures::stream::Stream;
use serde_json::{json, Value};
use std::{convert::Infallible, net::SocketAddr, sync::Arc, time::Duration};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;
use tower_http::cors::CorsLayer;

use super::logs::{log_info, LOG_BROADCASTER};
use super::types::{error_response, ValidateResponse};
use crate::config::MAX_PAYLOAD_SIZE;
use crate::error::{ServerError, ServerResult};
use crate::payload::ImportPayload;
use crate::validation::ImportValidator;

type AppState = Arc<ImportValidator>;

/// Build the router; separate from [`start_server`] so it can be tested
/// without binding a port.
pub fn router(validator: ImportValidator) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/api/validate", post(validate_payload))
        .route("/api/logs", get(sse_logs))
        .layer(DefaultBodyLimit::max(MAX_PAYLOAD_SIZE))
        .layer(cors)
        .with_state(Arc::new(validator))
}

/// Start the HTTP server
pub async fn start_server(port: u16, validator: ImportValidator) -> ServerResult<()> {
    let app = router(validator);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    eprintln!("🚀 Import validator running on http://localhost:{}", port);
    eprintln!("   POST /api/validate - Validate an import payload");
    eprintln!("   GET  /api/logs     - SSE log stream");
    eprintln!("   GET  /health       - Health check");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = match self {
            ServerError::Import(_) => StatusCode::BAD_REQUEST,
            ServerError::Io(_) | ServerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(error_response(&self.to_string()))).into_response()
    }
}

/// Health check endpoint
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "flow-import",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "validate": "POST /api/validate",
            "logs": "GET /api/logs (SSE)"
        }
    }))
}

/// SSE endpoint for real-time log streaming
async fn sse_logs() -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = LOG_BROADCASTER.subscribe();

    // Lagged receivers drop the skipped entries.
    let stream = BroadcastStream::new(rx).filter_map(|result| {
        let entry = result.ok()?;
        let json = serde_json::to_string(&entry).ok()?;
        Some(Ok(Event::default().data(json)))
    });

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

/// Validate endpoint
async fn validate_payload(
    State(validator): State<AppState>,
    Json(body): Json<Value>,
) -> Result<Json<ValidateResponse>, ServerError> {
    let payload = ImportPayload::from_value(body)?;
    log_info(format!("New import: {} records", payload.record_count()));

    let result = validator
        .validate_all_concurrent(payload)
        .await
        .map_err(|e| ServerError::Internal(e.to_string()))?;
    let report = validator.generate_report(&result);

    Ok(Json(ValidateResponse::new(result, report)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ImportError;

    #[tokio::test]
    async fn test_health() {
        let Json(value) = health().await;
        assert_eq!(value["status"], "ok");
        assert_eq!(value["service"], "flow-import");
    }

    #[tokio::test]
    async fn test_validate_handler() {
        let state = Arc::new(ImportValidator::default());
        let body = json!({
            "ventas": [{"id": "V001", "oc": "OC-999", "cantidad": 1, "precioVenta": 10, "totalVenta": 10}]
        });
        let Json(response) = validate_payload(State(state), Json(body)).await.unwrap();
        assert!(response.result.success);
        assert_eq!(response.report.summary.total_warnings, response.result.warnings.len());
    }

    #[tokio::test]
    async fn test_validate_rejects_non_object() {
        let state = Arc::new(ImportValidator::default());
        let err = validate_payload(State(state), Json(json!([1, 2])))
            .await
            .unwrap_err();
        assert!(matches!(err, ServerError::Import(ImportError::NotAnObject(_))));
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }
}
