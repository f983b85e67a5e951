use gbce_core::{Exchange, Operation, PriceQuery, Warehouse};

use crate::cli::{PriceArgs, VwspArgs};
use crate::error::CliError;

use super::Report;

fn price_query(args: &PriceArgs) -> PriceQuery {
    PriceQuery {
        symbol: args.symbol.clone(),
        price: args.price,
    }
}

pub fn dividend_yield(
    args: &PriceArgs,
    exchange: &Exchange<Warehouse>,
) -> Result<Report, CliError> {
    Report::from_handled(exchange.handle(
        Operation::DividendYield,
        Some(args.symbol.as_str()),
        |exchange| exchange.dividend_yield(price_query(args)),
    ))
}

pub fn pe_ratio(args: &PriceArgs, exchange: &Exchange<Warehouse>) -> Result<Report, CliError> {
    Report::from_handled(exchange.handle(
        Operation::PeRatio,
        Some(args.symbol.as_str()),
        |exchange| exchange.pe_ratio(price_query(args)),
    ))
}

pub fn vwsp(args: &VwspArgs, exchange: &Exchange<Warehouse>) -> Result<Report, CliError> {
    Report::from_handled(exchange.handle(Operation::Vwsp, Some(args.symbol.as_str()), |exchange| {
        exchange.vwsp(&args.symbol, args.window_minutes)
    }))
}

pub fn index(exchange: &Exchange<Warehouse>) -> Result<Report, CliError> {
    Report::from_handled(exchange.handle(
        Operation::AllShareIndex,
        None,
        Exchange::all_share_index,
    ))
}
