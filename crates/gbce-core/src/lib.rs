//! # GBCE Core
//!
//! Domain types, metric engine and exchange service for the Global Beverage
//! Corporation Exchange.
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`domain`] | Validated models (Stock, Trade, Symbol, UtcDateTime) |
//! | [`metrics`] | Dividend yield, P/E, VWSP and the All-Share Index |
//! | [`store`] | `MarketStore` seam and its DuckDB implementation |
//! | [`exchange`] | Request handling over a store |
//! | [`envelope`] | Response envelope with metadata |
//! | [`audit`] | Audited operations |
//! | [`error`] | Core error types |
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use gbce_core::{CreateStock, Exchange, PriceQuery, Warehouse};
//!
//! let exchange = Exchange::new(Warehouse::open_default()?);
//! exchange.create_stock(CreateStock {
//!     symbol: "GIN".to_string(),
//!     stock_type: "Preferred".to_string(),
//!     par_value: 100.0,
//!     last_dividend: Some(8.0),
//!     fixed_dividend: Some(0.02),
//! })?;
//!
//! let quote = exchange.dividend_yield(PriceQuery {
//!     symbol: "GIN".to_string(),
//!     price: 50.0,
//! })?;
//! assert!((quote.dividend_yield - 0.04).abs() < 1e-12);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────┐
//! │  HTTP / CLI surface  │
//! └──────────┬───────────┘
//!            │ Exchange::handle (transaction id, audit)
//!            ▼
//! ┌──────────────────────┐     ┌──────────────────┐
//! │      Exchange        │────▶│  Metric Engine   │
//! └──────────┬───────────┘     └──────────────────┘
//!            │ MarketStore
//!            ▼
//! ┌──────────────────────┐
//! │  Warehouse (DuckDB)  │
//! └──────────────────────┘
//! ```
//!
//! ## Error Handling
//!
//! Every failure carries an [`ErrorKind`] that transports map to their own
//! codes:
//!
//! ```rust
//! use gbce_core::{ErrorKind, ExchangeError};
//!
//! fn status(error: &ExchangeError) -> u16 {
//!     match error.kind() {
//!         ErrorKind::Validation => 400,
//!         ErrorKind::Conflict => 409,
//!         ErrorKind::NotFound => 404,
//!         ErrorKind::Referential => 422,
//!         ErrorKind::Storage => 500,
//!     }
//! }
//! ```

pub mod audit;
pub mod domain;
pub mod envelope;
pub mod error;
pub mod exchange;
pub mod metrics;
pub mod store;

// Domain models
pub use domain::{
    validate_positive, validate_quantity, Stock, StockType, Symbol, Trade, TradeId, TradeType,
    UtcDateTime,
};

// Envelope types
pub use envelope::{
    Envelope, EnvelopeError, EnvelopeMeta, Handled, Payload, TransactionId, SCHEMA_VERSION,
};

// Error types
pub use error::{ErrorKind, ExchangeError, ValidationError};

// Exchange service
pub use audit::{AuditEntry, Operation};
pub use exchange::{
    AllShareIndex, CreateStock, DividendYield, Exchange, ExchangeSettings, PeRatio, PriceQuery,
    RecordTrade, StockCreated, StockList, TradeList, TradeRecorded, Vwsp,
};
pub use metrics::VwspWindow;
pub use store::{MarketStore, StoreError};

// Warehouse (re-exported from gbce-warehouse)
pub use gbce_warehouse::{Warehouse, WarehouseConfig, WarehouseError};
