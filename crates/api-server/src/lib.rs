use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use market_core::{MarketDataProvider, MarketError};
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use yahoo_client::YahooClient;

mod frontend;
mod strategy_routes;

pub use strategy_routes::strategy_routes;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub provider: Arc<dyn MarketDataProvider>,
}

impl AppState {
    pub fn new(provider: Arc<dyn MarketDataProvider>) -> Self {
        Self { provider }
    }
}

/// Standard JSON envelope for every API response.
#[derive(Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Error wrapper so handlers can use `?` with anyhow.
pub struct AppError(anyhow::Error);

impl AppError {
    fn status(&self) -> StatusCode {
        match self.0.downcast_ref::<MarketError>() {
            Some(MarketError::InvalidParameter(_)) => StatusCode::BAD_REQUEST,
            Some(MarketError::Api(_)) => StatusCode::BAD_GATEWAY,
            Some(_) => StatusCode::UNPROCESSABLE_ENTITY,
            None => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Request failed: {:#}", self.0);
        } else {
            tracing::debug!("Request rejected: {:#}", self.0);
        }
        (status, Json(ApiResponse::<()>::error(self.0.to_string()))).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

/// Build the full application router.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(frontend::frontend_routes())
        .merge(strategy_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Entry point: config from the environment, tracing, then serve.
pub async fn run_server() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let state = AppState::new(Arc::new(YahooClient::new()));

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("nifty-select listening on {}", bind_addr);

    axum::serve(listener, app(state)).await?;
    Ok(())
}
