//! The exchange service.
//!
//! [`Exchange`] turns raw requests into validated domain values, stores
//! them through a [`MarketStore`] and runs the metric engine. Transports
//! (HTTP, CLI) call [`Exchange::handle`] so every request gets a transaction
//! id, a latency measurement and an audit row.

use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::audit::{AuditEntry, Operation};
use crate::envelope::{Handled, Payload, TransactionId};
use crate::metrics::{self, VwspWindow};
use crate::store::MarketStore;
use crate::{
    validate_quantity, ExchangeError, Stock, StockType, Symbol, Trade, TradeId, TradeType,
    UtcDateTime,
};

/// Request to list a new stock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateStock {
    pub symbol: String,
    #[serde(alias = "type")]
    pub stock_type: String,
    pub par_value: f64,
    #[serde(default)]
    pub last_dividend: Option<f64>,
    #[serde(default)]
    pub fixed_dividend: Option<f64>,
}

/// Request to record a trade. `timestamp` defaults to the time of recording.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordTrade {
    #[serde(alias = "symbol")]
    pub stock_symbol: String,
    #[serde(default)]
    pub timestamp: Option<String>,
    pub quantity: i64,
    #[serde(alias = "side")]
    pub trade_type: String,
    pub price: f64,
}

/// A symbol and a price, for the per-stock price metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceQuery {
    pub symbol: String,
    pub price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StockCreated {
    pub symbol: Symbol,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StockList {
    pub stocks: Vec<Stock>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TradeRecorded {
    pub trade_id: TradeId,
    pub symbol: Symbol,
    pub price: f64,
    pub timestamp: UtcDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TradeList {
    pub symbol: Symbol,
    pub trades: Vec<Trade>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DividendYield {
    pub symbol: Symbol,
    pub price: f64,
    pub dividend_yield: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeRatio {
    pub symbol: Symbol,
    pub price: f64,
    /// `None` when the stock's last dividend is zero or absent.
    pub pe_ratio: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Vwsp {
    pub symbol: Symbol,
    pub window_minutes: i64,
    /// Trades inside the window. Zero means `vwsp` is a placeholder, not a price.
    pub trade_count: usize,
    pub vwsp: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AllShareIndex {
    pub all_share_index: f64,
    /// Stocks with a positive VWSP, i.e. those that contributed.
    pub constituents: usize,
}

impl Payload for StockCreated {}
impl Payload for Stock {}
impl Payload for StockList {}
impl Payload for TradeRecorded {}
impl Payload for TradeList {}
impl Payload for DividendYield {}

impl Payload for PeRatio {
    fn warnings(&self) -> Vec<String> {
        if self.pe_ratio.is_some() {
            return Vec::new();
        }
        vec![format!(
            "pe_ratio for '{}' is undefined: last dividend is zero or absent",
            self.symbol
        )]
    }
}

impl Payload for Vwsp {
    fn warnings(&self) -> Vec<String> {
        if self.trade_count > 0 {
            return Vec::new();
        }
        vec![format!(
            "no trades for '{}' in the last {} minutes",
            self.symbol, self.window_minutes
        )]
    }
}

impl Payload for AllShareIndex {
    fn warnings(&self) -> Vec<String> {
        if self.constituents > 0 {
            return Vec::new();
        }
        vec!["no stock has traded inside the VWSP window".to_owned()]
    }
}

/// Tunables for the exchange service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExchangeSettings {
    /// Window for VWSP when the caller gives none, and for the index.
    pub vwsp_window: VwspWindow,
}

/// Stock and trade operations over a [`MarketStore`].
#[derive(Debug)]
pub struct Exchange<S> {
    store: S,
    settings: ExchangeSettings,
}

impl<S: MarketStore> Exchange<S> {
    pub fn new(store: S) -> Self {
        Self::with_settings(store, ExchangeSettings::default())
    }

    pub fn with_settings(store: S, settings: ExchangeSettings) -> Self {
        Self { store, settings }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn settings(&self) -> ExchangeSettings {
        self.settings
    }

    /// Run one operation as a tracked request.
    ///
    /// The audit row is best effort: a failed write is logged and the
    /// operation's own outcome is returned unchanged.
    pub fn handle<T, F>(&self, operation: Operation, symbol: Option<&str>, run: F) -> Handled<T>
    where
        F: FnOnce(&Self) -> Result<T, ExchangeError>,
    {
        let transaction_id = TransactionId::new();
        let started = Instant::now();
        let outcome = run(self);
        let latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        let status = match &outcome {
            Ok(_) => {
                tracing::debug!(%transaction_id, %operation, latency_ms, "operation succeeded");
                AuditEntry::STATUS_OK.to_owned()
            }
            Err(error) => {
                let code = error.kind().code();
                tracing::info!(%transaction_id, %operation, code, %error, "operation failed");
                code.to_owned()
            }
        };

        let entry = AuditEntry {
            transaction_id,
            operation,
            symbol: symbol.map(audit_symbol),
            status,
            latency_ms,
        };
        if let Err(error) = self.store.append_audit(&entry) {
            tracing::warn!(%transaction_id, %operation, %error, "failed to write audit entry");
        }

        Handled {
            transaction_id,
            latency_ms,
            outcome,
        }
    }

    /// List a new stock.
    ///
    /// # Errors
    /// Validation when the request is malformed, `StockExists` when the
    /// symbol is taken.
    pub fn create_stock(&self, request: CreateStock) -> Result<StockCreated, ExchangeError> {
        let stock = Stock::new(
            Symbol::parse(&request.symbol)?,
            StockType::parse(&request.stock_type)?,
            request.last_dividend,
            request.par_value,
            request.fixed_dividend,
        )?;

        self.store.put_stock(&stock)?;
        tracing::info!(
            symbol = %stock.symbol,
            stock_type = %stock.stock_type,
            par_value = stock.par_value,
            "stock created"
        );

        Ok(StockCreated {
            symbol: stock.symbol,
        })
    }

    pub fn stock(&self, symbol: &str) -> Result<Stock, ExchangeError> {
        let symbol = Symbol::parse(symbol)?;
        Ok(self.store.get_stock(&symbol)?)
    }

    pub fn stocks(&self) -> Result<StockList, ExchangeError> {
        Ok(StockList {
            stocks: self.store.list_stocks()?,
        })
    }

    /// Record a trade against an existing stock.
    ///
    /// # Errors
    /// Validation when the request is malformed, `UnknownStock` when no
    /// stock has the trade's symbol.
    pub fn record_trade(&self, request: RecordTrade) -> Result<TradeRecorded, ExchangeError> {
        let symbol = Symbol::parse(&request.stock_symbol)?;
        let trade_type = TradeType::parse(&request.trade_type)?;
        let quantity = validate_quantity(request.quantity)?;
        let timestamp = match request
            .timestamp
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
        {
            Some(value) => UtcDateTime::parse(value)?,
            None => UtcDateTime::now(),
        };
        let trade = Trade::new(
            TradeId::new_v4(),
            symbol,
            timestamp,
            quantity,
            trade_type,
            request.price,
        )?;

        self.store.put_trade(&trade)?;
        tracing::info!(
            trade_id = %trade.id,
            symbol = %trade.stock_symbol,
            side = %trade.trade_type,
            quantity = trade.quantity,
            price = trade.price,
            "trade recorded"
        );

        Ok(TradeRecorded {
            trade_id: trade.id,
            symbol: trade.stock_symbol,
            price: trade.price,
            timestamp: trade.timestamp,
        })
    }

    /// All trades of an existing stock, oldest recorded first.
    pub fn trades(&self, symbol: &str) -> Result<TradeList, ExchangeError> {
        let symbol = Symbol::parse(symbol)?;
        self.store.get_stock(&symbol)?;
        let trades = self.store.list_trades(&symbol, None)?;
        Ok(TradeList { symbol, trades })
    }

    pub fn dividend_yield(&self, query: PriceQuery) -> Result<DividendYield, ExchangeError> {
        let stock = self.stock(&query.symbol)?;
        let dividend_yield = metrics::dividend_yield(&stock, query.price)?;
        tracing::debug!(symbol = %stock.symbol, price = query.price, dividend_yield, "dividend yield");

        Ok(DividendYield {
            symbol: stock.symbol,
            price: query.price,
            dividend_yield,
        })
    }

    pub fn pe_ratio(&self, query: PriceQuery) -> Result<PeRatio, ExchangeError> {
        let stock = self.stock(&query.symbol)?;
        let pe_ratio = metrics::pe_ratio(&stock, query.price)?;
        tracing::debug!(symbol = %stock.symbol, price = query.price, ?pe_ratio, "pe ratio");

        Ok(PeRatio {
            symbol: stock.symbol,
            price: query.price,
            pe_ratio,
        })
    }

    /// Volume-weighted price over `window_minutes`, or the configured window.
    ///
    /// # Errors
    /// `NoTrades` when the symbol has never traded. A symbol with trades, but
    /// none inside the window, yields `vwsp: 0` and `trade_count: 0`.
    pub fn vwsp(&self, symbol: &str, window_minutes: Option<i64>) -> Result<Vwsp, ExchangeError> {
        let symbol = Symbol::parse(symbol)?;
        let window = match window_minutes {
            Some(minutes) => VwspWindow::from_minutes(minutes)?,
            None => self.settings.vwsp_window,
        };

        let trades = self.store.list_trades(&symbol, None)?;
        if trades.is_empty() {
            return Err(ExchangeError::NoTrades {
                symbol: symbol.to_string(),
            });
        }

        let now = UtcDateTime::now();
        let in_window = metrics::trades_in_window(&trades, window, now).collect::<Vec<_>>();
        let trade_count = in_window.len();
        let vwsp = metrics::vwsp(in_window);
        tracing::debug!(%symbol, window_minutes = window.minutes(), trade_count, vwsp, "vwsp");

        Ok(Vwsp {
            symbol,
            window_minutes: window.minutes(),
            trade_count,
            vwsp,
        })
    }

    /// GBCE All-Share Index over the configured VWSP window.
    pub fn all_share_index(&self) -> Result<AllShareIndex, ExchangeError> {
        let window = self.settings.vwsp_window;
        let now = UtcDateTime::now();

        let mut prices = Vec::new();
        for stock in self.store.list_stocks()? {
            let trades = self.store.list_trades(&stock.symbol, window.start(now))?;
            prices.push(metrics::volume_weighted_price(&trades, window, now));
        }

        let constituents = prices
            .iter()
            .filter(|price| metrics::is_index_constituent(**price))
            .count();
        let all_share_index = metrics::all_share_index(&prices);
        tracing::debug!(stocks = prices.len(), constituents, all_share_index, "all-share index");

        Ok(AllShareIndex {
            all_share_index,
            constituents,
        })
    }
}

fn audit_symbol(raw: &str) -> String {
    Symbol::parse(raw).map_or_else(|_| raw.trim().to_owned(), String::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ErrorKind, StoreError, ValidationError};
    use gbce_warehouse::{Warehouse, WarehouseConfig};
    use tempfile::{tempdir, TempDir};

    fn exchange() -> (TempDir, Exchange<Warehouse>) {
        let temp = tempdir().expect("tempdir");
        let warehouse =
            Warehouse::open(WarehouseConfig::with_home(temp.path())).expect("warehouse");
        (temp, Exchange::new(warehouse))
    }

    fn create(
        exchange: &Exchange<Warehouse>,
        symbol: &str,
        stock_type: &str,
        last_dividend: Option<f64>,
        fixed_dividend: Option<f64>,
    ) {
        exchange
            .create_stock(CreateStock {
                symbol: symbol.to_owned(),
                stock_type: stock_type.to_owned(),
                par_value: 100.0,
                last_dividend,
                fixed_dividend,
            })
            .expect("create stock");
    }

    fn trade(symbol: &str, quantity: i64, price: f64) -> RecordTrade {
        RecordTrade {
            stock_symbol: symbol.to_owned(),
            timestamp: None,
            quantity,
            trade_type: "buy".to_owned(),
            price,
        }
    }

    #[test]
    fn second_creation_of_a_symbol_conflicts() {
        let (_temp, exchange) = exchange();
        create(&exchange, "JOE", "Common", Some(13.0), None);

        let err = exchange
            .create_stock(CreateStock {
                symbol: "joe".to_owned(),
                stock_type: "common".to_owned(),
                par_value: 250.0,
                last_dividend: Some(13.0),
                fixed_dividend: None,
            })
            .expect_err("must conflict");

        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[test]
    fn invalid_stock_requests_are_validation_errors() {
        let (_temp, exchange) = exchange();
        let base = CreateStock {
            symbol: "ALE".to_owned(),
            stock_type: "Common".to_owned(),
            par_value: 60.0,
            last_dividend: Some(23.0),
            fixed_dividend: None,
        };

        let requests = [
            CreateStock {
                last_dividend: None,
                ..base.clone()
            },
            CreateStock {
                stock_type: "Ordinary".to_owned(),
                ..base.clone()
            },
            CreateStock {
                par_value: 0.0,
                ..base.clone()
            },
            CreateStock {
                symbol: "1ALE".to_owned(),
                ..base
            },
        ];

        for request in requests {
            let err = exchange.create_stock(request).expect_err("must fail");
            assert_eq!(err.kind(), ErrorKind::Validation);
        }
        assert!(exchange.stocks().expect("stocks").stocks.is_empty());
    }

    #[test]
    fn trade_for_unknown_stock_is_referential() {
        let (_temp, exchange) = exchange();
        let err = exchange
            .record_trade(trade("ZZZ", 10, 1.0))
            .expect_err("must fail");

        assert_eq!(err.kind(), ErrorKind::Referential);
    }

    #[test]
    fn trade_validation_runs_before_the_store() {
        let (_temp, exchange) = exchange();
        for request in [
            trade("ZZZ", 0, 1.0),
            trade("ZZZ", 10, -1.0),
            RecordTrade {
                trade_type: "hold".to_owned(),
                ..trade("ZZZ", 10, 1.0)
            },
            RecordTrade {
                timestamp: Some("yesterday".to_owned()),
                ..trade("ZZZ", 10, 1.0)
            },
        ] {
            let err = exchange.record_trade(request).expect_err("must fail");
            assert_eq!(err.kind(), ErrorKind::Validation);
        }
    }

    #[test]
    fn price_metrics_follow_the_stock_type() {
        let (_temp, exchange) = exchange();
        create(&exchange, "TEA", "Common", Some(0.0), None);
        create(&exchange, "GIN", "Preferred", Some(8.0), Some(0.02));

        let tea = PriceQuery {
            symbol: "tea".to_owned(),
            price: 50.0,
        };
        assert_eq!(
            exchange.dividend_yield(tea.clone()).expect("yield").dividend_yield,
            0.0
        );
        assert_eq!(exchange.pe_ratio(tea).expect("pe").pe_ratio, None);

        let gin = exchange
            .dividend_yield(PriceQuery {
                symbol: "GIN".to_owned(),
                price: 50.0,
            })
            .expect("yield");
        assert!((gin.dividend_yield - 0.04).abs() < 1e-12);
    }

    #[test]
    fn price_metrics_check_the_symbol_before_the_price() {
        let (_temp, exchange) = exchange();
        let err = exchange
            .dividend_yield(PriceQuery {
                symbol: "ALE".to_owned(),
                price: 0.0,
            })
            .expect_err("must fail");
        assert_eq!(err.kind(), ErrorKind::NotFound);

        create(&exchange, "ALE", "Common", Some(23.0), None);
        let err = exchange
            .pe_ratio(PriceQuery {
                symbol: "ALE".to_owned(),
                price: 0.0,
            })
            .expect_err("must fail");
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn vwsp_weights_recent_trades() {
        let (_temp, exchange) = exchange();
        create(&exchange, "POP", "Common", Some(8.0), None);
        exchange.record_trade(trade("POP", 10, 100.0)).expect("trade");
        exchange.record_trade(trade("POP", 20, 110.0)).expect("trade");

        let vwsp = exchange.vwsp("pop", None).expect("vwsp");
        assert_eq!(vwsp.trade_count, 2);
        assert_eq!(vwsp.window_minutes, 5);
        assert!((vwsp.vwsp - 106.667).abs() < 1e-3);
    }

    #[test]
    fn vwsp_distinguishes_no_trades_from_stale_trades() {
        let (_temp, exchange) = exchange();
        create(&exchange, "POP", "Common", Some(8.0), None);

        let err = exchange.vwsp("POP", None).expect_err("must fail");
        assert!(matches!(err, ExchangeError::NoTrades { .. }));

        exchange
            .record_trade(RecordTrade {
                timestamp: Some("2020-01-01T00:00:00Z".to_owned()),
                ..trade("POP", 10, 100.0)
            })
            .expect("old trade");
        let stale = exchange.vwsp("POP", None).expect("vwsp");
        assert_eq!(stale.trade_count, 0);
        assert_eq!(stale.vwsp, 0.0);
        assert_eq!(stale.warnings().len(), 1);
    }

    #[test]
    fn index_is_zero_without_data_and_skips_idle_stocks() {
        let (_temp, exchange) = exchange();
        let empty = exchange.all_share_index().expect("index");
        assert_eq!(empty.all_share_index, 0.0);
        assert_eq!(empty.constituents, 0);

        create(&exchange, "TEA", "Common", Some(0.0), None);
        create(&exchange, "POP", "Common", Some(8.0), None);
        create(&exchange, "ALE", "Common", Some(23.0), None);
        exchange.record_trade(trade("POP", 10, 2.0)).expect("trade");
        exchange.record_trade(trade("ALE", 10, 8.0)).expect("trade");

        let index = exchange.all_share_index().expect("index");
        assert_eq!(index.constituents, 2);
        assert!((index.all_share_index - 4.0).abs() < 1e-9);
    }

    #[test]
    fn trades_outside_the_common_era_are_rejected_before_storage() {
        let (_temp, exchange) = exchange();
        create(&exchange, "POP", "Common", Some(8.0), None);

        for timestamp in ["-0001-01-01", "0000-01-01", "0001-01-01T00:00:00+01:00"] {
            let err = exchange
                .record_trade(RecordTrade {
                    timestamp: Some(timestamp.to_owned()),
                    ..trade("POP", 10, 100.0)
                })
                .expect_err(timestamp);
            assert!(matches!(
                err,
                ExchangeError::Validation(ValidationError::InvalidTimestamp { .. })
            ));
        }

        assert!(exchange.trades("POP").expect("trades").trades.is_empty());
        exchange.record_trade(trade("POP", 10, 100.0)).expect("trade");
        assert_eq!(exchange.vwsp("POP", None).expect("vwsp").trade_count, 1);
    }

    #[test]
    fn huge_notionals_keep_vwsp_and_index_finite() {
        let (_temp, exchange) = exchange();
        create(&exchange, "POP", "Common", Some(8.0), None);
        create(&exchange, "ALE", "Common", Some(23.0), None);
        exchange.record_trade(trade("POP", 10_000_000_000, 1e300)).expect("trade");
        exchange.record_trade(trade("POP", 10_000_000_000, 1e300)).expect("trade");
        exchange.record_trade(trade("ALE", 10, 4.0)).expect("trade");

        let vwsp = exchange.vwsp("POP", None).expect("vwsp");
        assert!(vwsp.vwsp.is_finite());
        assert!((vwsp.vwsp / 1e300 - 1.0).abs() < 1e-9);

        let index = exchange.all_share_index().expect("index");
        assert_eq!(index.constituents, 2);
        let expected = (1e300_f64.ln() / 2.0 + 4.0_f64.ln() / 2.0).exp();
        assert!((index.all_share_index / expected - 1.0).abs() < 1e-9);
    }

    #[test]
    fn configured_window_applies_to_vwsp_and_index() {
        let temp = tempdir().expect("tempdir");
        let warehouse =
            Warehouse::open(WarehouseConfig::with_home(temp.path())).expect("warehouse");
        let settings = ExchangeSettings {
            vwsp_window: VwspWindow::from_minutes(60).expect("window"),
        };
        let exchange = Exchange::with_settings(warehouse, settings);
        create(&exchange, "POP", "Common", Some(8.0), None);
        let half_hour_ago = UtcDateTime::now()
            .checked_sub(time::Duration::minutes(30))
            .expect("timestamp");
        exchange
            .record_trade(RecordTrade {
                timestamp: Some(half_hour_ago.to_string()),
                ..trade("POP", 10, 120.0)
            })
            .expect("trade");

        let vwsp = exchange.vwsp("POP", None).expect("vwsp");
        assert_eq!(vwsp.window_minutes, 60);
        assert_eq!((vwsp.trade_count, vwsp.vwsp), (1, 120.0));
        assert_eq!(exchange.all_share_index().expect("index").constituents, 1);
        assert_eq!(exchange.settings(), settings);
    }

    #[test]
    fn handled_requests_are_audited() {
        let (_temp, exchange) = exchange();

        let ok = exchange.handle(Operation::ListStocks, None, Exchange::stocks);
        let failed = exchange.handle(Operation::Vwsp, Some(" pop "), |exchange| {
            exchange.vwsp(" pop ", None)
        });

        let ok_row = exchange
            .store()
            .audit_entry(&ok.transaction_id.to_string())
            .expect("lookup")
            .expect("audit row");
        assert_eq!(ok_row.operation, "list_stocks");
        assert_eq!(ok_row.status, "ok");

        let failed_row = exchange
            .store()
            .audit_entry(&failed.transaction_id.to_string())
            .expect("lookup")
            .expect("audit row");
        assert_eq!(failed_row.symbol.as_deref(), Some("POP"));
        assert_eq!(failed_row.status, "NOT_FOUND");
        assert!(matches!(failed.outcome, Err(ExchangeError::NoTrades { .. })));
    }

    #[test]
    fn store_errors_surface_through_the_exchange() {
        let err = ExchangeError::from(StoreError::UnknownStock {
            symbol: "ZZZ".to_owned(),
        });
        assert_eq!(err.kind(), ErrorKind::Referential);
    }
}
