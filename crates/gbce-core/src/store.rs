//! Storage seam for the exchange.
//!
//! [`MarketStore`] is what [`crate::Exchange`] needs from persistence. The
//! DuckDB [`Warehouse`] is the production implementation; conversions between
//! domain values and warehouse rows live here so the warehouse stays free of
//! domain types.

use gbce_warehouse::{AuditRecord, StockRecord, TradeRecord, Warehouse, WarehouseError};
use thiserror::Error;

use crate::audit::AuditEntry;
use crate::{Stock, StockType, Symbol, Trade, TradeId, TradeType, UtcDateTime, ValidationError};

/// Outcomes of store operations other than success.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("stock '{symbol}' already exists")]
    AlreadyExists { symbol: String },

    #[error("stock '{symbol}' not found")]
    NotFound { symbol: String },

    #[error("trade references unknown stock '{symbol}'")]
    UnknownStock { symbol: String },

    #[error("stored {entity} failed validation: {source}")]
    Corrupt {
        entity: &'static str,
        #[source]
        source: ValidationError,
    },

    #[error(transparent)]
    Backend(#[from] WarehouseError),
}

/// Durable storage of stocks and trades.
///
/// Implementations must decide symbol uniqueness and the stock reference of
/// a trade atomically: concurrent `put_stock` calls for one symbol yield
/// exactly one success.
pub trait MarketStore: Send + Sync {
    /// # Errors
    /// [`StoreError::AlreadyExists`] when the symbol is taken.
    fn put_stock(&self, stock: &Stock) -> Result<(), StoreError>;

    /// # Errors
    /// [`StoreError::NotFound`] when no stock has `symbol`.
    fn get_stock(&self, symbol: &Symbol) -> Result<Stock, StoreError>;

    /// All stocks ordered by symbol.
    fn list_stocks(&self) -> Result<Vec<Stock>, StoreError>;

    /// # Errors
    /// [`StoreError::UnknownStock`] when the trade's stock does not exist.
    fn put_trade(&self, trade: &Trade) -> Result<(), StoreError>;

    /// Trades for `symbol` in insertion order, optionally only those at or
    /// after `since`.
    fn list_trades(
        &self,
        symbol: &Symbol,
        since: Option<UtcDateTime>,
    ) -> Result<Vec<Trade>, StoreError>;

    fn append_audit(&self, entry: &AuditEntry) -> Result<(), StoreError>;
}

impl MarketStore for Warehouse {
    fn put_stock(&self, stock: &Stock) -> Result<(), StoreError> {
        self.insert_stock(&stock_record(stock))
            .map_err(|error| match error {
                WarehouseError::DuplicateKey { .. } => StoreError::AlreadyExists {
                    symbol: stock.symbol.to_string(),
                },
                other => StoreError::Backend(other),
            })
    }

    fn get_stock(&self, symbol: &Symbol) -> Result<Stock, StoreError> {
        let record = self
            .stock(symbol.as_str())?
            .ok_or_else(|| StoreError::NotFound {
                symbol: symbol.to_string(),
            })?;
        stock_from_record(record)
    }

    fn list_stocks(&self) -> Result<Vec<Stock>, StoreError> {
        self.stocks()?.into_iter().map(stock_from_record).collect()
    }

    fn put_trade(&self, trade: &Trade) -> Result<(), StoreError> {
        self.insert_trade(&trade_record(trade)?)
            .map_err(|error| match error {
                WarehouseError::MissingReference { .. } => StoreError::UnknownStock {
                    symbol: trade.stock_symbol.to_string(),
                },
                other => StoreError::Backend(other),
            })
    }

    fn list_trades(
        &self,
        symbol: &Symbol,
        since: Option<UtcDateTime>,
    ) -> Result<Vec<Trade>, StoreError> {
        let since = since.map(UtcDateTime::to_storage_string);
        self.trades(symbol.as_str(), since.as_deref())?
            .into_iter()
            .map(trade_from_record)
            .collect()
    }

    fn append_audit(&self, entry: &AuditEntry) -> Result<(), StoreError> {
        Ok(Warehouse::append_audit(
            self,
            &AuditRecord {
                transaction_id: entry.transaction_id.to_string(),
                operation: entry.operation.as_str().to_owned(),
                symbol: entry.symbol.clone(),
                status: entry.status.clone(),
                latency_ms: entry.latency_ms,
            },
        )?)
    }
}

fn stock_record(stock: &Stock) -> StockRecord {
    StockRecord {
        symbol: stock.symbol.to_string(),
        stock_type: stock.stock_type.as_str().to_owned(),
        last_dividend: stock.last_dividend,
        par_value: stock.par_value,
        fixed_dividend: stock.fixed_dividend,
    }
}

fn stock_from_record(record: StockRecord) -> Result<Stock, StoreError> {
    let corrupt = |source| StoreError::Corrupt {
        entity: "stock",
        source,
    };

    Stock::new(
        Symbol::parse(&record.symbol).map_err(corrupt)?,
        StockType::parse(&record.stock_type).map_err(corrupt)?,
        record.last_dividend,
        record.par_value,
        record.fixed_dividend,
    )
    .map_err(corrupt)
}

fn trade_record(trade: &Trade) -> Result<TradeRecord, StoreError> {
    let quantity = i64::try_from(trade.quantity).map_err(|_| StoreError::Corrupt {
        entity: "trade",
        source: ValidationError::MalformedRequest {
            reason: format!("quantity {} is out of range", trade.quantity),
        },
    })?;

    Ok(TradeRecord {
        id: trade.id.to_string(),
        stock_symbol: trade.stock_symbol.to_string(),
        ts: trade.timestamp.to_storage_string(),
        quantity,
        trade_type: trade.trade_type.as_str().to_owned(),
        price: trade.price,
    })
}

fn trade_from_record(record: TradeRecord) -> Result<Trade, StoreError> {
    let corrupt = |source| StoreError::Corrupt {
        entity: "trade",
        source,
    };
    let quantity = u64::try_from(record.quantity).map_err(|_| {
        corrupt(ValidationError::NonPositiveValue { field: "quantity" })
    })?;

    Trade::new(
        TradeId::parse(&record.id).map_err(corrupt)?,
        Symbol::parse(&record.stock_symbol).map_err(corrupt)?,
        UtcDateTime::parse(&record.ts).map_err(corrupt)?,
        quantity,
        TradeType::parse(&record.trade_type).map_err(corrupt)?,
        record.price,
    )
    .map_err(corrupt)
}
