use gbce_warehouse::WarehouseError;
use thiserror::Error;

use crate::store::StoreError;

/// Validation and contract errors exposed by `gbce-core`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("symbol cannot be empty")]
    EmptySymbol,
    #[error("symbol length {len} exceeds max {max}")]
    SymbolTooLong { len: usize, max: usize },
    #[error("symbol must start with an ASCII letter: '{ch}'")]
    SymbolInvalidStart { ch: char },
    #[error("symbol contains invalid character '{ch}' at index {index}")]
    SymbolInvalidChar { ch: char, index: usize },

    #[error("invalid stock type '{value}', expected 'Common' or 'Preferred'")]
    InvalidStockType { value: String },
    #[error("invalid trade type '{value}', expected 'buy' or 'sell'")]
    InvalidTradeType { value: String },
    #[error("invalid trade id '{value}'")]
    InvalidTradeId { value: String },

    #[error("invalid timestamp '{value}', use 'YYYY-MM-DD', 'YYYY-MM-DDTHH:MM[:SS]' or RFC3339")]
    InvalidTimestamp { value: String },

    #[error("field '{field}' must be finite")]
    NonFiniteValue { field: &'static str },
    #[error("field '{field}' must be non-negative")]
    NegativeValue { field: &'static str },
    #[error("field '{field}' must be greater than zero")]
    NonPositiveValue { field: &'static str },

    #[error("either 'last_dividend' or 'fixed_dividend' must be provided")]
    MissingDividend,
    #[error("stock '{symbol}' has no last dividend")]
    MissingLastDividend { symbol: String },

    #[error("window must be between 1 and {max} minutes, got {minutes}")]
    InvalidWindow { minutes: i64, max: i64 },

    #[error("malformed request: {reason}")]
    MalformedRequest { reason: String },
}

/// Failure category surfaced to callers of the exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed or out-of-range input, detected before any write.
    Validation,
    /// Stock symbol already taken.
    Conflict,
    /// No stock, or no trades, for the requested symbol.
    NotFound,
    /// Trade for a stock that does not exist.
    Referential,
    /// Backend failure.
    Storage,
}

impl ErrorKind {
    pub const fn code(self) -> &'static str {
        match self {
            Self::Validation => "VALIDATION",
            Self::Conflict => "CONFLICT",
            Self::NotFound => "NOT_FOUND",
            Self::Referential => "UNKNOWN_STOCK",
            Self::Storage => "STORAGE",
        }
    }
}

/// Errors returned by [`crate::Exchange`] operations.
#[derive(Debug, Error)]
pub enum ExchangeError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("stock with symbol '{symbol}' already exists")]
    StockExists { symbol: String },

    #[error("stock '{symbol}' not found")]
    StockNotFound { symbol: String },

    #[error("no trades found for stock '{symbol}'")]
    NoTrades { symbol: String },

    #[error("stock '{symbol}' does not exist")]
    UnknownStock { symbol: String },

    #[error("stored {entity} is invalid: {source}")]
    CorruptRecord {
        entity: &'static str,
        #[source]
        source: ValidationError,
    },

    #[error("storage error: {0}")]
    Storage(#[source] WarehouseError),
}

impl ExchangeError {
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::StockExists { .. } => ErrorKind::Conflict,
            Self::StockNotFound { .. } | Self::NoTrades { .. } => ErrorKind::NotFound,
            Self::UnknownStock { .. } => ErrorKind::Referential,
            Self::CorruptRecord { .. } | Self::Storage(_) => ErrorKind::Storage,
        }
    }
}

impl From<StoreError> for ExchangeError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::AlreadyExists { symbol } => Self::StockExists { symbol },
            StoreError::NotFound { symbol } => Self::StockNotFound { symbol },
            StoreError::UnknownStock { symbol } => Self::UnknownStock { symbol },
            StoreError::Corrupt { entity, source } => Self::CorruptRecord { entity, source },
            StoreError::Backend(source) => Self::Storage(source),
        }
    }
}
