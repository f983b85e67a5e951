use gbce_core::{CreateStock, Exchange, Operation, Warehouse};

use crate::cli::{StockAddArgs, StockCommand};
use crate::error::CliError;

use super::Report;

pub fn run(command: &StockCommand, exchange: &Exchange<Warehouse>) -> Result<Report, CliError> {
    match command {
        StockCommand::Add(args) => add(args, exchange),
        StockCommand::List => Report::from_handled(exchange.handle(
            Operation::ListStocks,
            None,
            Exchange::stocks,
        )),
        StockCommand::Get(args) => Report::from_handled(exchange.handle(
            Operation::GetStock,
            Some(args.symbol.as_str()),
            |exchange| exchange.stock(&args.symbol),
        )),
    }
}

fn add(args: &StockAddArgs, exchange: &Exchange<Warehouse>) -> Result<Report, CliError> {
    let request = CreateStock {
        symbol: args.symbol.clone(),
        stock_type: args.stock_type.clone(),
        par_value: args.par_value,
        last_dividend: args.last_dividend,
        fixed_dividend: args.fixed_dividend,
    };

    Report::from_handled(exchange.handle(
        Operation::CreateStock,
        Some(args.symbol.as_str()),
        |exchange| exchange.create_stock(request),
    ))
}
