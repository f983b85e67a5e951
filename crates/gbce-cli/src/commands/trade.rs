use gbce_core::{Exchange, Operation, RecordTrade, Warehouse};

use crate::cli::{TradeCommand, TradeRecordArgs};
use crate::error::CliError;

use super::Report;

pub fn run(command: &TradeCommand, exchange: &Exchange<Warehouse>) -> Result<Report, CliError> {
    match command {
        TradeCommand::Record(args) => record(args, exchange),
        TradeCommand::List(args) => Report::from_handled(exchange.handle(
            Operation::ListTrades,
            Some(args.symbol.as_str()),
            |exchange| exchange.trades(&args.symbol),
        )),
    }
}

fn record(args: &TradeRecordArgs, exchange: &Exchange<Warehouse>) -> Result<Report, CliError> {
    let request = RecordTrade {
        stock_symbol: args.symbol.clone(),
        timestamp: args.timestamp.clone(),
        quantity: args.quantity,
        trade_type: args.side.clone(),
        price: args.price,
    };

    Report::from_handled(exchange.handle(
        Operation::RecordTrade,
        Some(args.symbol.as_str()),
        |exchange| exchange.record_trade(request),
    ))
}
