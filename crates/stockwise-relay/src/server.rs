//! HTTP surface of the relay
//!
//! A single route at `/`:
//!
//! | Method    | Outcome                                      |
//! |-----------|----------------------------------------------|
//! | `OPTIONS` | empty 200, CORS headers only                 |
//! | `POST`    | 200 `{report}`, 400/500 `{error}`            |
//! | other     | 405 `{"error": "Only POST requests allowed"}`|
//!
//! Every response, errors included, carries the same three CORS headers.

use crate::error::RelayError;
use crate::relay::ReportRelay;
use crate::request::ReportResponse;
use axum::body::Bytes;
use axum::extract::State;
use axum::extract::rejection::BytesRejection;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use std::any::Any;
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

pub const ALLOW_ORIGIN: &str = "*";
pub const ALLOW_METHODS: &str = "POST, OPTIONS";
pub const ALLOW_HEADERS: &str = "Content-Type, Authorization";

/// Build the relay router
pub fn router(relay: Arc<ReportRelay>) -> Router {
    let cors = ServiceBuilder::new()
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static(ALLOW_ORIGIN),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(ALLOW_METHODS),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static(ALLOW_HEADERS),
        ));

    Router::new()
        .route(
            "/",
            post(generate_report)
                .options(preflight)
                .fallback(method_not_allowed),
        )
        .fallback(not_found)
        .with_state(relay)
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Bind `addr` and serve until `shutdown` resolves
pub async fn serve<F>(relay: Arc<ReportRelay>, addr: SocketAddr, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "Report relay listening");

    axum::serve(listener, router(relay))
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("Report relay stopped");
    Ok(())
}

async fn generate_report(
    State(relay): State<Arc<ReportRelay>>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<ReportResponse>, RelayError> {
    // Oversized or unreadable bodies take the malformed-body path
    let body = body.map_err(|rejection| {
        warn!(
            status = rejection.status().as_u16(),
            error = %rejection.body_text(),
            "Rejecting unreadable request body"
        );
        RelayError::NoStockData
    })?;
    let report = relay.handle(&body).await?;
    Ok(Json(ReportResponse::report(report)))
}

async fn preflight() -> StatusCode {
    StatusCode::OK
}

async fn method_not_allowed() -> RelayError {
    RelayError::MethodNotAllowed
}

async fn not_found() -> RelayError {
    RelayError::NotFound
}

fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    error!(detail, "Relay handler panicked");
    RelayError::Internal(detail.to_string()).into_response()
}
