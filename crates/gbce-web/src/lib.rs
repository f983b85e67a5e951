//! # GBCE Web
//!
//! HTTP/JSON surface for the exchange.
//!
//! | Method & path | Operation |
//! |---------------|-----------|
//! | `POST /stocks` | Create a stock |
//! | `GET /stocks` | List stocks |
//! | `GET /stocks/:symbol` | Get one stock |
//! | `POST /trades` | Record a trade |
//! | `GET /trades?symbol=` | List a stock's trades |
//! | `POST /metrics/dividend_yield` | Dividend yield at a price |
//! | `POST /metrics/pe_ratio` | P/E ratio at a price |
//! | `GET /metrics/vwsp?symbol=&window_minutes=` | Volume-weighted price |
//! | `GET /metrics/all_share_index` | GBCE All-Share Index |
//! | `GET /health` | Liveness |
//!
//! Every response body is a [`gbce_core::Envelope`]. Failures map to
//! status codes through [`error::status_for`].

pub mod error;
pub mod handlers;
pub mod middleware;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use gbce_core::{Exchange, Warehouse};

pub use error::{status_for, ApiError, ApiResponse, ServeError, TRANSACTION_ID_HEADER};
pub use handlers::AppState;

/// Where the server listens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_owned(),
            port: 8080,
        }
    }
}

/// Build the application router.
pub fn router(exchange: Arc<Exchange<Warehouse>>) -> Router {
    Router::new()
        .route(
            "/stocks",
            post(handlers::create_stock).get(handlers::list_stocks),
        )
        .route("/stocks/:symbol", get(handlers::get_stock))
        .route(
            "/trades",
            post(handlers::record_trade).get(handlers::list_trades),
        )
        .route("/metrics/dividend_yield", post(handlers::dividend_yield))
        .route("/metrics/pe_ratio", post(handlers::pe_ratio))
        .route("/metrics/vwsp", get(handlers::vwsp))
        .route("/metrics/all_share_index", get(handlers::all_share_index))
        .route("/health", get(handlers::health))
        .fallback(handlers::no_route)
        .layer(axum::middleware::from_fn(middleware::log_requests))
        .with_state(AppState { exchange })
}

/// Bind `config` and serve until the process stops.
///
/// # Errors
/// Returns an error if the address cannot be bound or the server fails.
pub async fn serve(config: &ServerConfig, exchange: Arc<Exchange<Warehouse>>) -> Result<(), ServeError> {
    let listener = tokio::net::TcpListener::bind((config.host.as_str(), config.port)).await?;
    let local: SocketAddr = listener.local_addr()?;
    tracing::info!(address = %local, "gbce server listening");

    axum::serve(listener, router(exchange)).await?;
    Ok(())
}
