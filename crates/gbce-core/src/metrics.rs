//! # Metric Engine
//!
//! Pure functions over stocks and trades. Nothing here touches storage or
//! the clock: callers pass `now` explicitly so results are reproducible.
//!
//! | Metric | Formula |
//! |--------|---------|
//! | Dividend yield (Common) | `last_dividend / price` |
//! | Dividend yield (Preferred, fixed) | `fixed_dividend * par_value / price` |
//! | P/E ratio | `price / last_dividend`, undefined when the dividend is zero |
//! | VWSP | `Σ(price · quantity) / Σ(quantity)` over a trailing window |
//! | All-Share Index | geometric mean of the positive VWSP values |

use time::Duration;

use crate::domain::validate_positive;
use crate::{Stock, StockType, Trade, UtcDateTime, ValidationError};

/// Trailing time window used for VWSP.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VwspWindow {
    minutes: i64,
}

impl VwspWindow {
    pub const DEFAULT_MINUTES: i64 = 5;
    /// One week.
    pub const MAX_MINUTES: i64 = 10_080;

    pub fn from_minutes(minutes: i64) -> Result<Self, ValidationError> {
        if !(1..=Self::MAX_MINUTES).contains(&minutes) {
            return Err(ValidationError::InvalidWindow {
                minutes,
                max: Self::MAX_MINUTES,
            });
        }
        Ok(Self { minutes })
    }

    pub const fn minutes(self) -> i64 {
        self.minutes
    }

    pub fn duration(self) -> Duration {
        Duration::minutes(self.minutes)
    }

    /// Earliest timestamp inside the window ending at `now`.
    ///
    /// `None` when the subtraction leaves the representable range, in which
    /// case every trade is inside the window.
    pub fn start(self, now: UtcDateTime) -> Option<UtcDateTime> {
        now.checked_sub(self.duration())
    }

    pub fn contains(self, timestamp: UtcDateTime, now: UtcDateTime) -> bool {
        self.start(now).map_or(true, |start| timestamp >= start)
    }
}

impl Default for VwspWindow {
    fn default() -> Self {
        Self {
            minutes: Self::DEFAULT_MINUTES,
        }
    }
}

/// Dividend yield of `stock` at `price`.
///
/// Preferred stocks with a fixed dividend use `fixed_dividend * par_value`;
/// every other stock uses `last_dividend`.
///
/// # Errors
/// [`ValidationError::NonPositiveValue`] for a non-positive price, and
/// [`ValidationError::MissingLastDividend`] when the formula needs a last
/// dividend the stock does not have.
pub fn dividend_yield(stock: &Stock, price: f64) -> Result<f64, ValidationError> {
    validate_positive("price", price)?;

    if let (StockType::Preferred, Some(fixed)) = (stock.stock_type, stock.fixed_dividend) {
        return Ok(fixed * stock.par_value / price);
    }

    let last_dividend = stock
        .last_dividend
        .ok_or_else(|| ValidationError::MissingLastDividend {
            symbol: stock.symbol.to_string(),
        })?;
    Ok(last_dividend / price)
}

/// Price/earnings ratio of `stock` at `price`.
///
/// Returns `Ok(None)` when the last dividend is zero or absent.
pub fn pe_ratio(stock: &Stock, price: f64) -> Result<Option<f64>, ValidationError> {
    validate_positive("price", price)?;

    Ok(stock
        .last_dividend
        .filter(|dividend| *dividend > 0.0)
        .map(|dividend| price / dividend))
}

/// Trades that fall inside `window` ending at `now`.
pub fn trades_in_window<'a>(
    trades: &'a [Trade],
    window: VwspWindow,
    now: UtcDateTime,
) -> impl Iterator<Item = &'a Trade> + 'a {
    let start = window.start(now);
    trades
        .iter()
        .filter(move |trade| start.map_or(true, |start| trade.timestamp >= start))
}

/// Volume-weighted price of the given trades, or `0.0` when there are none.
///
/// Each price is weighted by its share of the total quantity, so the result
/// stays within the traded price range even when `price * quantity` would
/// overflow.
pub fn vwsp<'a>(trades: impl IntoIterator<Item = &'a Trade>) -> f64 {
    let trades = trades.into_iter().collect::<Vec<_>>();
    let volume = trades
        .iter()
        .map(|trade| trade.quantity as f64)
        .sum::<f64>();
    if volume <= 0.0 {
        return 0.0;
    }

    trades
        .iter()
        .map(|trade| trade.price * (trade.quantity as f64 / volume))
        .sum()
}

/// Whether a VWSP takes part in the All-Share Index.
pub fn is_index_constituent(price: f64) -> bool {
    price.is_finite() && price > 0.0
}

/// VWSP over the trades inside `window` ending at `now`.
pub fn volume_weighted_price(trades: &[Trade], window: VwspWindow, now: UtcDateTime) -> f64 {
    vwsp(trades_in_window(trades, window, now))
}

/// GBCE All-Share Index: geometric mean of the positive, finite prices.
///
/// Computed as `exp(mean(ln p))` so large universes do not overflow.
/// Returns `0.0` when no price qualifies.
pub fn all_share_index(prices: &[f64]) -> f64 {
    let (log_sum, count) = prices
        .iter()
        .filter(|price| is_index_constituent(**price))
        .fold((0.0_f64, 0_usize), |(sum, count), price| {
            (sum + price.ln(), count + 1)
        });

    if count == 0 {
        return 0.0;
    }
    (log_sum / count as f64).exp()
}
