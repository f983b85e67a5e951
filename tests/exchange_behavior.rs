//! Behavior-driven tests for the exchange service
//!
//! These tests verify what a caller of `Exchange` observes: created stocks,
//! recorded trades and the metrics computed from them.

use std::sync::Arc;
use std::thread;

use gbce_core::{ErrorKind, ExchangeError, Operation, PriceQuery, RecordTrade};
use gbce_tests::{buy, common, preferred, TestExchange};

fn at(symbol: &str, price: f64) -> PriceQuery {
    PriceQuery {
        symbol: symbol.to_string(),
        price,
    }
}

// =============================================================================
// Exchange: Stock Listing
// =============================================================================

#[test]
fn when_a_symbol_is_listed_twice_the_second_listing_conflicts() {
    // Given: JOE is listed
    let fixture = TestExchange::new();
    fixture
        .exchange
        .create_stock(common("JOE", 13.0, 250.0))
        .expect("first listing");

    // When: JOE is listed again
    let error = fixture
        .exchange
        .create_stock(common("JOE", 13.0, 250.0))
        .expect_err("second listing");

    // Then: The caller gets a conflict and the original stays untouched
    assert_eq!(error.kind(), ErrorKind::Conflict);
    assert_eq!(fixture.exchange.stocks().expect("stocks").stocks.len(), 1);
}

#[test]
fn when_many_callers_list_one_symbol_at_once_exactly_one_wins() {
    // Given: Eight concurrent callers
    let fixture = TestExchange::new();

    // When: They all list RACE at the same time
    let handles = (0..8)
        .map(|_| {
            let exchange = Arc::clone(&fixture.exchange);
            thread::spawn(move || exchange.create_stock(common("RACE", 1.0, 100.0)))
        })
        .collect::<Vec<_>>();
    let results = handles
        .into_iter()
        .map(|handle| handle.join().expect("thread"))
        .collect::<Vec<_>>();

    // Then: One succeeds and the rest conflict
    let winners = results.iter().filter(|result| result.is_ok()).count();
    let conflicts = results
        .iter()
        .filter(|result| matches!(result, Err(ExchangeError::StockExists { .. })))
        .count();
    assert_eq!((winners, conflicts), (1, 7));
}

#[test]
fn symbols_are_normalized_before_lookup() {
    // Given: A stock listed in lowercase with padding
    let fixture = TestExchange::new();
    fixture
        .exchange
        .create_stock(common(" ale ", 23.0, 60.0))
        .expect("listing");

    // When/Then: It is found under its uppercase symbol
    let stock = fixture.exchange.stock("ALE").expect("lookup");
    assert_eq!(stock.symbol.as_str(), "ALE");
    assert_eq!(stock.par_value, 60.0);
}

// =============================================================================
// Exchange: Trades
// =============================================================================

#[test]
fn when_a_trade_names_an_unknown_stock_it_is_rejected() {
    // Given: An exchange without ZZZ
    let fixture = TestExchange::new();

    // When: A trade for ZZZ is recorded
    let error = fixture
        .exchange
        .record_trade(buy("ZZZ", 10, 1.0))
        .expect_err("must fail");

    // Then: The failure is referential, not validation
    assert_eq!(error.kind(), ErrorKind::Referential);
    assert_eq!(error.kind().code(), "UNKNOWN_STOCK");
}

#[test]
fn recorded_trades_keep_their_order_and_normalized_timestamps() {
    // Given: POP is listed
    let fixture = TestExchange::new();
    fixture
        .exchange
        .create_stock(common("POP", 8.0, 100.0))
        .expect("listing");

    // When: Two trades are recorded with explicit, differently shaped times
    for (timestamp, side) in [("2026-01-02T10:00:00+01:00", "SELL"), ("2026-01-01", "buy")] {
        fixture
            .exchange
            .record_trade(RecordTrade {
                timestamp: Some(timestamp.to_string()),
                trade_type: side.to_string(),
                ..buy("pop", 10, 100.0)
            })
            .expect("trade");
    }

    // Then: They come back in recording order, in UTC
    let trades = fixture.exchange.trades("POP").expect("trades").trades;
    let stamps = trades
        .iter()
        .map(|trade| trade.timestamp.to_string())
        .collect::<Vec<_>>();
    assert_eq!(stamps, vec!["2026-01-02T09:00:00Z", "2026-01-01T00:00:00Z"]);
    assert_eq!(trades[0].trade_type.as_str(), "sell");
}

// =============================================================================
// Exchange: Metrics
// =============================================================================

#[test]
fn tea_at_fifty_has_zero_yield_and_undefined_pe() {
    // Given: TEA, a common stock with no dividend
    let fixture = TestExchange::new();
    fixture
        .exchange
        .create_stock(common("TEA", 0.0, 100.0))
        .expect("listing");

    // When: Price metrics are computed at 50
    let dividend_yield = fixture
        .exchange
        .dividend_yield(at("TEA", 50.0))
        .expect("yield");
    let pe_ratio = fixture.exchange.pe_ratio(at("TEA", 50.0)).expect("pe");

    // Then: The yield is zero and P/E is undefined rather than infinite
    assert_eq!(dividend_yield.dividend_yield, 0.0);
    assert_eq!(pe_ratio.pe_ratio, None);
}

#[test]
fn gin_at_fifty_yields_its_fixed_dividend_share_of_par() {
    // Given: GIN, preferred with a 2% fixed dividend on par 100
    let fixture = TestExchange::new();
    fixture
        .exchange
        .create_stock(preferred("GIN", Some(8.0), 0.02, 100.0))
        .expect("listing");

    // When: The yield is computed at 50
    let result = fixture
        .exchange
        .dividend_yield(at("GIN", 50.0))
        .expect("yield");

    // Then: 0.02 * 100 / 50
    assert!((result.dividend_yield - 0.04).abs() < 1e-12);
}

#[test]
fn price_metrics_reject_non_positive_prices() {
    // Given: ALE is listed
    let fixture = TestExchange::new();
    fixture
        .exchange
        .create_stock(common("ALE", 23.0, 60.0))
        .expect("listing");

    // When/Then: Zero and negative prices are validation errors
    for price in [0.0, -10.0] {
        let yield_error = fixture
            .exchange
            .dividend_yield(at("ALE", price))
            .expect_err("yield");
        let pe_error = fixture
            .exchange
            .pe_ratio(at("ALE", price))
            .expect_err("pe");
        assert_eq!(yield_error.kind(), ErrorKind::Validation);
        assert_eq!(pe_error.kind(), ErrorKind::Validation);
    }
}

#[test]
fn pop_vwsp_weights_each_price_by_its_quantity() {
    // Given: POP trades 10 at 100 and 20 at 110
    let fixture = TestExchange::new();
    fixture
        .exchange
        .create_stock(common("POP", 8.0, 100.0))
        .expect("listing");
    fixture
        .exchange
        .record_trade(buy("POP", 10, 100.0))
        .expect("trade");
    fixture
        .exchange
        .record_trade(buy("POP", 20, 110.0))
        .expect("trade");

    // When: VWSP is computed over the default window
    let vwsp = fixture.exchange.vwsp("POP", None).expect("vwsp");

    // Then: (100*10 + 110*20) / 30
    assert!((vwsp.vwsp - 106.667).abs() < 1e-3);
    assert_eq!(vwsp.trade_count, 2);
}

#[test]
fn vwsp_for_a_stock_that_never_traded_is_not_found() {
    // Given: POP is listed without trades
    let fixture = TestExchange::new();
    fixture
        .exchange
        .create_stock(common("POP", 8.0, 100.0))
        .expect("listing");

    // When/Then: VWSP reports not found
    let error = fixture.exchange.vwsp("POP", None).expect_err("must fail");
    assert_eq!(error.kind(), ErrorKind::NotFound);
}

#[test]
fn vwsp_honours_a_wider_window() {
    // Given: A POP trade from half an hour ago
    let fixture = TestExchange::new();
    fixture
        .exchange
        .create_stock(common("POP", 8.0, 100.0))
        .expect("listing");
    let half_hour_ago = gbce_core::UtcDateTime::now()
        .checked_sub(time::Duration::minutes(30))
        .expect("timestamp");
    fixture
        .exchange
        .record_trade(RecordTrade {
            timestamp: Some(half_hour_ago.to_string()),
            ..buy("POP", 10, 120.0)
        })
        .expect("trade");

    // When: VWSP is computed over 5 and over 60 minutes
    let narrow = fixture.exchange.vwsp("POP", None).expect("narrow");
    let wide = fixture.exchange.vwsp("POP", Some(60)).expect("wide");

    // Then: Only the wide window sees the trade
    assert_eq!((narrow.trade_count, narrow.vwsp), (0, 0.0));
    assert_eq!((wide.trade_count, wide.vwsp), (1, 120.0));
}

#[test]
fn all_share_index_is_zero_until_something_trades() {
    // Given: Listed stocks but no trades
    let fixture = TestExchange::new();
    fixture
        .exchange
        .create_stock(common("TEA", 0.0, 100.0))
        .expect("listing");

    // When/Then: The index is zero
    let index = fixture.exchange.all_share_index().expect("index");
    assert_eq!(index.all_share_index, 0.0);
    assert_eq!(index.constituents, 0);
}

#[test]
fn all_share_index_is_the_geometric_mean_of_traded_stocks() {
    // Given: Three stocks, two of which trade at 3 and 12
    let fixture = TestExchange::new();
    for request in [
        common("TEA", 0.0, 100.0),
        common("POP", 8.0, 100.0),
        preferred("GIN", Some(8.0), 0.02, 100.0),
    ] {
        fixture.exchange.create_stock(request).expect("listing");
    }
    fixture
        .exchange
        .record_trade(buy("POP", 5, 3.0))
        .expect("trade");
    fixture
        .exchange
        .record_trade(buy("GIN", 7, 12.0))
        .expect("trade");

    // When: The index is computed
    let index = fixture.exchange.all_share_index().expect("index");

    // Then: sqrt(3 * 12), with TEA left out
    assert!((index.all_share_index - 6.0).abs() < 1e-9);
    assert_eq!(index.constituents, 2);
}

// =============================================================================
// Exchange: Request Tracking
// =============================================================================

#[test]
fn every_handled_request_gets_its_own_audited_transaction_id() {
    // Given: An exchange
    let fixture = TestExchange::new();

    // When: The same operation is handled twice
    let first = fixture
        .exchange
        .handle(Operation::AllShareIndex, None, |exchange| {
            exchange.all_share_index()
        });
    let second = fixture
        .exchange
        .handle(Operation::AllShareIndex, None, |exchange| {
            exchange.all_share_index()
        });

    // Then: Each has a distinct id with its own audit row
    assert_ne!(first.transaction_id, second.transaction_id);
    for handled in [first, second] {
        let row = fixture
            .exchange
            .store()
            .audit_entry(&handled.transaction_id.to_string())
            .expect("lookup")
            .expect("audit row");
        assert_eq!(row.operation, "all_share_index");
        assert_eq!(row.status, "ok");
    }
}
