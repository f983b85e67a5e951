use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Symbol, UtcDateTime, ValidationError};

/// Class of a listed stock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum StockType {
    Common,
    Preferred,
}

impl StockType {
    /// Case-insensitive parse of `Common` or `Preferred`.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let trimmed = input.trim();
        if trimmed.eq_ignore_ascii_case("common") {
            Ok(Self::Common)
        } else if trimmed.eq_ignore_ascii_case("preferred") {
            Ok(Self::Preferred)
        } else {
            Err(ValidationError::InvalidStockType {
                value: input.to_owned(),
            })
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Common => "Common",
            Self::Preferred => "Preferred",
        }
    }
}

impl Display for StockType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StockType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for StockType {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<StockType> for String {
    fn from(value: StockType) -> Self {
        value.as_str().to_owned()
    }
}

/// A listed stock. Built only through [`Stock::new`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stock {
    pub symbol: Symbol,
    pub stock_type: StockType,
    pub last_dividend: Option<f64>,
    pub par_value: f64,
    /// Fraction of par paid as dividend, e.g. `0.02` for 2%.
    pub fixed_dividend: Option<f64>,
}

impl Stock {
    pub fn new(
        symbol: Symbol,
        stock_type: StockType,
        last_dividend: Option<f64>,
        par_value: f64,
        fixed_dividend: Option<f64>,
    ) -> Result<Self, ValidationError> {
        validate_positive("par_value", par_value)?;
        validate_optional_non_negative("last_dividend", last_dividend)?;
        validate_optional_non_negative("fixed_dividend", fixed_dividend)?;

        if last_dividend.is_none() && fixed_dividend.is_none() {
            return Err(ValidationError::MissingDividend);
        }

        Ok(Self {
            symbol,
            stock_type,
            last_dividend,
            par_value,
            fixed_dividend,
        })
    }
}

/// System-generated trade identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TradeId(Uuid);

impl TradeId {
    pub fn new_v4() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        Uuid::parse_str(input.trim())
            .map(Self)
            .map_err(|_| ValidationError::InvalidTradeId {
                value: input.to_owned(),
            })
    }
}

impl Display for TradeId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

/// Side of a trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TradeType {
    Buy,
    Sell,
}

impl TradeType {
    /// Case-insensitive parse of `buy` or `sell`.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let trimmed = input.trim();
        if trimmed.eq_ignore_ascii_case("buy") {
            Ok(Self::Buy)
        } else if trimmed.eq_ignore_ascii_case("sell") {
            Ok(Self::Sell)
        } else {
            Err(ValidationError::InvalidTradeType {
                value: input.to_owned(),
            })
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Buy => "buy",
            Self::Sell => "sell",
        }
    }
}

impl Display for TradeType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TradeType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for TradeType {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<TradeType> for String {
    fn from(value: TradeType) -> Self {
        value.as_str().to_owned()
    }
}

/// A recorded trade. Trades are append-only and built only through [`Trade::new`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trade {
    pub id: TradeId,
    pub stock_symbol: Symbol,
    pub timestamp: UtcDateTime,
    pub quantity: u64,
    pub trade_type: TradeType,
    pub price: f64,
}

impl Trade {
    pub fn new(
        id: TradeId,
        stock_symbol: Symbol,
        timestamp: UtcDateTime,
        quantity: u64,
        trade_type: TradeType,
        price: f64,
    ) -> Result<Self, ValidationError> {
        if quantity == 0 {
            return Err(ValidationError::NonPositiveValue { field: "quantity" });
        }
        validate_positive("price", price)?;

        Ok(Self {
            id,
            stock_symbol,
            timestamp,
            quantity,
            trade_type,
            price,
        })
    }
}

/// Accept a signed quantity from the outside world and require it to be positive.
pub fn validate_quantity(quantity: i64) -> Result<u64, ValidationError> {
    u64::try_from(quantity)
        .ok()
        .filter(|value| *value > 0)
        .ok_or(ValidationError::NonPositiveValue { field: "quantity" })
}

pub fn validate_positive(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NonFiniteValue { field });
    }
    if value <= 0.0 {
        return Err(ValidationError::NonPositiveValue { field });
    }
    Ok(())
}

fn validate_non_negative(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NonFiniteValue { field });
    }
    if value < 0.0 {
        return Err(ValidationError::NegativeValue { field });
    }
    Ok(())
}

fn validate_optional_non_negative(
    field: &'static str,
    value: Option<f64>,
) -> Result<(), ValidationError> {
    if let Some(value) = value {
        validate_non_negative(field, value)?;
    }
    Ok(())
}
