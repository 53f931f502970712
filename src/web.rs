//! Local JSON API over the report engine
//!
//! Serves the same reports as the command line for the account stored in
//! the session. Failures carry the banner message as `{"error": ...}`.

use crate::amber::{CurrentPriceOptions, DATE_FORMAT, PricingApi};
use crate::auth;
use crate::dashboard::{Operation, Report, fetch_operation};
use crate::error::MonitorError;
use crate::report::{LiveRange, ReportOptions};
use crate::store::SessionStore;
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use chrono::NaiveDate;
use serde::Deserialize;
use std::future::Future;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

#[derive(Clone)]
pub struct AppState {
    pub api: Arc<dyn PricingApi>,
    pub store: Arc<dyn SessionStore>,
    pub options: ReportOptions,
    /// Range used by `/api/live` when the query names none
    pub default_range: LiveRange,
}

/// Error response carrying the matching HTTP status
#[derive(Debug)]
pub struct ApiError(pub MonitorError);

impl From<MonitorError> for ApiError {
    fn from(err: MonitorError) -> Self {
        Self(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            MonitorError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            MonitorError::MissingCredential | MonitorError::InvalidCredential => {
                StatusCode::UNAUTHORIZED
            }
            MonitorError::NoSiteId | MonitorError::NoActiveSite | MonitorError::NoSitesFound => {
                StatusCode::CONFLICT
            }
            MonitorError::Api { .. }
            | MonitorError::Network { .. }
            | MonitorError::Serialization { .. } => StatusCode::BAD_GATEWAY,
            MonitorError::Validation { .. } => StatusCode::BAD_REQUEST,
            MonitorError::Config { .. } | MonitorError::Io { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let mut body = serde_json::json!({ "error": self.0.to_string() });
        let wait = self.0.wait_seconds();
        if let Some(seconds) = wait {
            body["wait_seconds"] = serde_json::json!(seconds);
        }
        let mut response = (status, Json(body)).into_response();
        if let Some(seconds) = wait
            && let Ok(value) = HeaderValue::from_str(&seconds.to_string())
        {
            response.headers_mut().insert(header::RETRY_AFTER, value);
        }
        response
    }
}

type ApiResult = std::result::Result<Json<Report>, ApiError>;

async fn run(state: &AppState, operation: Operation) -> ApiResult {
    fetch_operation(
        state.api.as_ref(),
        state.store.as_ref(),
        operation,
        &state.options,
    )
    .await
    .map(Json)
    .map_err(ApiError::from)
}

async fn health() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

async fn session(State(state): State<AppState>) -> impl IntoResponse {
    let site_id = state
        .store
        .load()
        .ok()
        .and_then(|s| s.site_id().map(str::to_string));
    Json(serde_json::json!({
        "authenticated": auth::is_authenticated(state.store.as_ref()),
        "site_id": site_id,
    }))
}

async fn overview(State(state): State<AppState>) -> ApiResult {
    run(&state, Operation::Overview).await
}

async fn day(State(state): State<AppState>, Path(date): Path<String>) -> ApiResult {
    let date = NaiveDate::parse_from_str(&date, DATE_FORMAT)
        .map_err(|_| MonitorError::validation("date", "Expected yyyy-MM-dd"))?;
    run(&state, Operation::Detail { date }).await
}

#[derive(Debug, Deserialize)]
pub struct LiveParams {
    pub range: Option<String>,
}

async fn live(State(state): State<AppState>, Query(params): Query<LiveParams>) -> ApiResult {
    let range = match params.range.as_deref() {
        Some(name) => name.parse::<LiveRange>()?,
        None => state.default_range,
    };
    run(&state, Operation::Live { range }).await
}

#[derive(Debug, Default, Deserialize)]
pub struct PriceParams {
    pub previous: Option<u32>,
    pub next: Option<u32>,
    pub resolution: Option<u32>,
}

async fn current_prices(
    State(state): State<AppState>,
    Query(params): Query<PriceParams>,
) -> ApiResult {
    let options = CurrentPriceOptions {
        previous: params.previous,
        next: params.next,
        resolution: params.resolution,
    };
    run(&state, Operation::Prices { options }).await
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/session", get(session))
        .route("/api/overview", get(overview))
        .route("/api/day/{date}", get(day))
        .route("/api/live", get(live))
        .route("/api/prices/current", get(current_prices))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Bind and serve until `shutdown` resolves
pub async fn serve<F>(state: AppState, host: &str, port: u16, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let router = build_router(state);
    let logger = crate::logging::get_logger("web");
    logger.info(&format!(
        "Starting web server; requested host={}, port={}",
        host, port
    ));

    let addr = match host.parse::<IpAddr>() {
        Ok(ip) => SocketAddr::new(ip, port),
        Err(_) => {
            logger.warn(&format!("Invalid host '{}'; falling back to 127.0.0.1", host));
            ([127, 0, 0, 1], port).into()
        }
    };

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let local_addr = listener.local_addr()?;
    logger.info(&format!(
        "Web server listening at http://{}:{} (API /api)",
        local_addr.ip(),
        local_addr.port()
    ));

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await?;
    logger.info("Web server stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_statuses() {
        let cases = [
            (MonitorError::rate_limited(5), StatusCode::TOO_MANY_REQUESTS),
            (MonitorError::InvalidCredential, StatusCode::UNAUTHORIZED),
            (MonitorError::MissingCredential, StatusCode::UNAUTHORIZED),
            (MonitorError::NoSiteId, StatusCode::CONFLICT),
            (MonitorError::api(503), StatusCode::BAD_GATEWAY),
            (
                MonitorError::validation("date", "bad"),
                StatusCode::BAD_REQUEST,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError(err).status(), status);
        }
    }

    #[test]
    fn rate_limit_response_sets_retry_after() {
        let response = ApiError(MonitorError::rate_limited(42)).into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            response.headers().get(header::RETRY_AFTER).unwrap(),
            "42"
        );
    }
}
