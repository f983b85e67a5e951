//! # GBCE Warehouse
//!
//! DuckDB-backed storage for the GBCE exchange.
//!
//! ## Overview
//!
//! The warehouse owns three record sets:
//!
//! | Table | Description |
//! |-------|-------------|
//! | `stocks` | Stock metadata keyed by symbol |
//! | `trades` | Append-only trade log keyed by trade id, ordered by `seq` |
//! | `audit_log` | One row per handled request, keyed by transaction id |
//!
//! Records here are plain column values. Validation and normalization live
//! in `gbce-core`; the warehouse only enforces the constraints the schema
//! can express (primary keys, positive quantities and prices, existing
//! stock references).
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use gbce_warehouse::{StockRecord, Warehouse};
//!
//! let warehouse = Warehouse::open_default()?;
//! warehouse.insert_stock(&StockRecord {
//!     symbol: "TEA".to_string(),
//!     stock_type: "Common".to_string(),
//!     last_dividend: Some(0.0),
//!     par_value: 100.0,
//!     fixed_dividend: None,
//! })?;
//! # Ok::<(), gbce_warehouse::WarehouseError>(())
//! ```
//!
//! ## Security
//!
//! Every value reaches DuckDB as a bound parameter; no SQL text is built
//! from caller input.

pub mod migrations;
pub mod pool;

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use ::duckdb::{OptionalExt, ToSql};
use serde::Serialize;
use thiserror::Error;

pub use pool::{ConnectionPool, PooledConnection};

/// Errors that can occur during warehouse operations.
#[derive(Debug, Error)]
pub enum WarehouseError {
    /// `DuckDB` database error.
    #[error(transparent)]
    DuckDb(#[from] ::duckdb::Error),

    /// I/O error (file system operations).
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// A row with the same primary key already exists.
    #[error("duplicate key '{key}' in {table}")]
    DuplicateKey { table: &'static str, key: String },

    /// A row points at a parent row that does not exist.
    #[error("{table} row references missing {referenced} '{key}'")]
    MissingReference {
        table: &'static str,
        referenced: &'static str,
        key: String,
    },
}

/// Configuration for the warehouse database.
#[derive(Debug, Clone)]
pub struct WarehouseConfig {
    /// Root directory for GBCE data.
    pub gbce_home: PathBuf,
    /// Path to the `DuckDB` database file.
    pub db_path: PathBuf,
    /// Maximum number of idle connections kept in the pool.
    pub max_pool_size: usize,
}

impl WarehouseConfig {
    /// Configuration rooted at `gbce_home`, with the database in its `data/` folder.
    pub fn with_home(gbce_home: impl Into<PathBuf>) -> Self {
        let gbce_home = gbce_home.into();
        let db_path = gbce_home.join("data").join("exchange.duckdb");
        Self {
            gbce_home,
            db_path,
            max_pool_size: 4,
        }
    }
}

impl Default for WarehouseConfig {
    fn default() -> Self {
        Self::with_home(resolve_gbce_home())
    }
}

/// A stock row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StockRecord {
    /// Normalized symbol (primary key).
    pub symbol: String,
    /// `Common` or `Preferred`.
    pub stock_type: String,
    pub last_dividend: Option<f64>,
    pub par_value: f64,
    pub fixed_dividend: Option<f64>,
}

/// A trade row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TradeRecord {
    /// Trade id (primary key).
    pub id: String,
    pub stock_symbol: String,
    /// Trade time in UTC, in any form DuckDB casts to `TIMESTAMP`
    /// (e.g. `2026-01-02 10:30:00.000000`). Read back as `YYYY-MM-DD HH:MM:SS[.ffffff]`.
    pub ts: String,
    pub quantity: i64,
    /// `buy` or `sell`.
    pub trade_type: String,
    pub price: f64,
}

/// One handled request, for traceability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditRecord {
    pub transaction_id: String,
    pub operation: String,
    pub symbol: Option<String>,
    /// `ok` or an error code.
    pub status: String,
    pub latency_ms: u64,
}

/// The storage interface for exchange data.
#[derive(Clone)]
pub struct Warehouse {
    config: WarehouseConfig,
    pool: ConnectionPool,
    writes: Arc<Mutex<()>>,
}

impl Warehouse {
    /// Open a warehouse with default configuration.
    pub fn open_default() -> Result<Self, WarehouseError> {
        Self::open(WarehouseConfig::default())
    }

    /// Open a warehouse with the specified configuration.
    pub fn open(config: WarehouseConfig) -> Result<Self, WarehouseError> {
        if let Some(parent) = config.db_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let pool = ConnectionPool::open(config.db_path.clone(), config.max_pool_size)?;
        let warehouse = Self {
            config,
            pool,
            writes: Arc::new(Mutex::new(())),
        };
        warehouse.initialize()?;
        Ok(warehouse)
    }

    /// Apply pending schema migrations.
    pub fn initialize(&self) -> Result<(), WarehouseError> {
        let connection = self.pool.acquire()?;
        migrations::apply_migrations(&connection)?;
        Ok(())
    }

    pub fn config(&self) -> &WarehouseConfig {
        &self.config
    }

    /// Get the path to the database file.
    pub fn db_path(&self) -> &Path {
        self.pool.db_path()
    }

    /// Schema versions applied so far, oldest first.
    pub fn schema_versions(&self) -> Result<Vec<String>, WarehouseError> {
        let connection = self.pool.acquire()?;
        Ok(migrations::applied_versions(&connection)?)
    }

    /// Insert a stock.
    ///
    /// Uniqueness is decided by the primary key in a single statement, so
    /// concurrent inserts of one symbol yield exactly one success.
    ///
    /// # Errors
    /// [`WarehouseError::DuplicateKey`] if the symbol is already stored.
    pub fn insert_stock(&self, row: &StockRecord) -> Result<(), WarehouseError> {
        let connection = self.pool.acquire()?;
        let _guard = self.writes.lock().unwrap_or_else(PoisonError::into_inner);

        let params: [&dyn ToSql; 5] = [
            &row.symbol,
            &row.stock_type,
            &row.last_dividend,
            &row.par_value,
            &row.fixed_dividend,
        ];
        let inserted = connection.execute(
            "INSERT INTO stocks (symbol, stock_type, last_dividend, par_value, fixed_dividend) \
             VALUES (?, ?, ?, ?, ?) \
             ON CONFLICT DO NOTHING",
            params.as_slice(),
        )?;

        if inserted == 0 {
            return Err(WarehouseError::DuplicateKey {
                table: "stocks",
                key: row.symbol.clone(),
            });
        }

        Ok(())
    }

    /// Look up a stock by its normalized symbol.
    pub fn stock(&self, symbol: &str) -> Result<Option<StockRecord>, WarehouseError> {
        let connection = self.pool.acquire()?;
        let record = connection
            .query_row(
                "SELECT symbol, stock_type, last_dividend, par_value, fixed_dividend \
                 FROM stocks WHERE symbol = ?",
                [symbol],
                read_stock,
            )
            .optional()?;
        Ok(record)
    }

    /// All stocks, ordered by symbol.
    pub fn stocks(&self) -> Result<Vec<StockRecord>, WarehouseError> {
        let connection = self.pool.acquire()?;
        let mut statement = connection.prepare(
            "SELECT symbol, stock_type, last_dividend, par_value, fixed_dividend \
             FROM stocks ORDER BY symbol",
        )?;
        let rows = statement
            .query_map([], read_stock)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Append a trade.
    ///
    /// The stock reference is checked inside the insert statement itself.
    ///
    /// # Errors
    /// [`WarehouseError::MissingReference`] if no stock has `row.stock_symbol`.
    pub fn insert_trade(&self, row: &TradeRecord) -> Result<(), WarehouseError> {
        let connection = self.pool.acquire()?;
        let _guard = self.writes.lock().unwrap_or_else(PoisonError::into_inner);

        let params: [&dyn ToSql; 7] = [
            &row.id,
            &row.stock_symbol,
            &row.ts,
            &row.quantity,
            &row.trade_type,
            &row.price,
            &row.stock_symbol,
        ];
        let inserted = connection.execute(
            "INSERT INTO trades (id, stock_symbol, ts, quantity, trade_type, price) \
             SELECT CAST(? AS VARCHAR), CAST(? AS VARCHAR), CAST(? AS TIMESTAMP), \
                    CAST(? AS BIGINT), CAST(? AS VARCHAR), CAST(? AS DOUBLE) \
             WHERE EXISTS (SELECT 1 FROM stocks WHERE symbol = ?)",
            params.as_slice(),
        )?;

        if inserted == 0 {
            return Err(WarehouseError::MissingReference {
                table: "trades",
                referenced: "stock",
                key: row.stock_symbol.clone(),
            });
        }

        Ok(())
    }

    /// Trades for one symbol in insertion order.
    ///
    /// With `since`, only trades at or after that UTC time are returned.
    pub fn trades(
        &self,
        symbol: &str,
        since: Option<&str>,
    ) -> Result<Vec<TradeRecord>, WarehouseError> {
        let connection = self.pool.acquire()?;
        let rows = match since {
            Some(since) => {
                let mut statement = connection.prepare(
                    "SELECT id, stock_symbol, CAST(ts AS VARCHAR), quantity, trade_type, price \
                     FROM trades WHERE stock_symbol = ? AND ts >= CAST(? AS TIMESTAMP) \
                     ORDER BY seq",
                )?;
                let params: [&dyn ToSql; 2] = [&symbol, &since];
                let rows = statement
                    .query_map(params.as_slice(), read_trade)?
                    .collect::<Result<Vec<_>, _>>()?;
                rows
            }
            None => {
                let mut statement = connection.prepare(
                    "SELECT id, stock_symbol, CAST(ts AS VARCHAR), quantity, trade_type, price \
                     FROM trades WHERE stock_symbol = ? ORDER BY seq",
                )?;
                let rows = statement
                    .query_map([symbol], read_trade)?
                    .collect::<Result<Vec<_>, _>>()?;
                rows
            }
        };
        Ok(rows)
    }

    /// Record one handled request in the audit log.
    pub fn append_audit(&self, row: &AuditRecord) -> Result<(), WarehouseError> {
        let connection = self.pool.acquire()?;
        let params: [&dyn ToSql; 5] = [
            &row.transaction_id,
            &row.operation,
            &row.symbol,
            &row.status,
            &row.latency_ms,
        ];
        connection.execute(
            "INSERT INTO audit_log \
             (transaction_id, operation, symbol, status, latency_ms, timestamp) \
             VALUES (?, ?, ?, ?, ?, CURRENT_TIMESTAMP)",
            params.as_slice(),
        )?;
        Ok(())
    }

    /// Look up the audit row written for a transaction id.
    pub fn audit_entry(&self, transaction_id: &str) -> Result<Option<AuditRecord>, WarehouseError> {
        let connection = self.pool.acquire()?;
        let record = connection
            .query_row(
                "SELECT transaction_id, operation, symbol, status, latency_ms \
                 FROM audit_log WHERE transaction_id = ? LIMIT 1",
                [transaction_id],
                |row| {
                    let latency_ms: Option<i64> = row.get(4)?;
                    Ok(AuditRecord {
                        transaction_id: row.get(0)?,
                        operation: row.get(1)?,
                        symbol: row.get(2)?,
                        status: row.get(3)?,
                        latency_ms: latency_ms.map_or(0, |value| value.max(0) as u64),
                    })
                },
            )
            .optional()?;
        Ok(record)
    }
}

fn read_stock(row: &::duckdb::Row<'_>) -> Result<StockRecord, ::duckdb::Error> {
    Ok(StockRecord {
        symbol: row.get(0)?,
        stock_type: row.get(1)?,
        last_dividend: row.get(2)?,
        par_value: row.get(3)?,
        fixed_dividend: row.get(4)?,
    })
}

fn read_trade(row: &::duckdb::Row<'_>) -> Result<TradeRecord, ::duckdb::Error> {
    Ok(TradeRecord {
        id: row.get(0)?,
        stock_symbol: row.get(1)?,
        ts: row.get(2)?,
        quantity: row.get(3)?,
        trade_type: row.get(4)?,
        price: row.get(5)?,
    })
}

/// Resolve the GBCE home directory from environment or default.
fn resolve_gbce_home() -> PathBuf {
    if let Some(path) = env::var_os("GBCE_HOME") {
        let path = PathBuf::from(path);
        if !path.as_os_str().is_empty() {
            return path;
        }
    }

    if let Some(home) = env::var_os("HOME") {
        return PathBuf::from(home).join(".gbce");
    }

    PathBuf::from(".gbce")
}
