use std::fmt::{Display, Formatter};

use serde::Serialize;

use crate::envelope::TransactionId;

/// Exchange operations that are audited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    CreateStock,
    GetStock,
    ListStocks,
    RecordTrade,
    ListTrades,
    DividendYield,
    PeRatio,
    Vwsp,
    AllShareIndex,
}

impl Operation {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CreateStock => "create_stock",
            Self::GetStock => "get_stock",
            Self::ListStocks => "list_stocks",
            Self::RecordTrade => "record_trade",
            Self::ListTrades => "list_trades",
            Self::DividendYield => "dividend_yield",
            Self::PeRatio => "pe_ratio",
            Self::Vwsp => "vwsp",
            Self::AllShareIndex => "all_share_index",
        }
    }
}

impl Display for Operation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One handled request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEntry {
    pub transaction_id: TransactionId,
    pub operation: Operation,
    pub symbol: Option<String>,
    /// `ok`, or the error code of the failure.
    pub status: String,
    pub latency_ms: u64,
}

impl AuditEntry {
    pub const STATUS_OK: &'static str = "ok";
}
