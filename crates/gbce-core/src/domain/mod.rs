//! # Domain Models
//!
//! Validated domain types for the GBCE exchange.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Stock`] | Listed stock with par value and dividends |
//! | [`StockType`] | `Common` or `Preferred` |
//! | [`Trade`] | Append-only trade record |
//! | [`TradeType`] | `buy` or `sell` |
//! | [`TradeId`] | UUID v4 trade identifier |
//! | [`Symbol`] | Normalized ticker |
//! | [`UtcDateTime`] | UTC timestamp with microsecond precision |
//!
//! Every constructor validates its invariants, so a value of one of these
//! types is always well formed:
//!
//! ```rust
//! use gbce_core::{Stock, StockType, Symbol, ValidationError};
//!
//! let symbol = Symbol::parse("ale")?;
//! let missing = Stock::new(symbol, StockType::Common, None, 60.0, None);
//! assert!(matches!(missing, Err(ValidationError::MissingDividend)));
//! # Ok::<(), ValidationError>(())
//! ```

mod models;
mod symbol;
mod timestamp;

pub use models::{
    validate_positive, validate_quantity, Stock, StockType, Trade, TradeId, TradeType,
};
pub use symbol::Symbol;
pub use timestamp::UtcDateTime;
