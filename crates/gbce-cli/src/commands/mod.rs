mod metrics;
mod serve;
mod stock;
mod trade;

use gbce_core::{
    Envelope, ErrorKind, Exchange, ExchangeSettings, Handled, Payload, VwspWindow, Warehouse,
    WarehouseConfig,
};
use serde_json::Value;

use crate::cli::{Cli, Command};
use crate::error::CliError;

/// The rendered outcome of one command.
#[derive(Debug)]
pub struct Report {
    pub envelope: Envelope<Value>,
    pub error_kind: Option<ErrorKind>,
}

impl Report {
    pub fn from_handled<T: Payload>(handled: Handled<T>) -> Result<Self, CliError> {
        let error_kind = handled.error_kind();
        Ok(Self {
            envelope: handled.into_envelope()?,
            error_kind,
        })
    }

    /// `Err` carrying the exit category when the operation failed.
    pub fn into_result(self) -> Result<(), CliError> {
        let Some(kind) = self.error_kind else {
            return Ok(());
        };

        let message = self
            .envelope
            .errors
            .into_iter()
            .next()
            .map_or_else(|| kind.code().to_owned(), |error| error.message);
        Err(CliError::Operation { kind, message })
    }
}

/// Warehouse settings from `--home` and `--db`, falling back to the environment.
pub fn warehouse_config(cli: &Cli) -> WarehouseConfig {
    let mut config = match &cli.home {
        Some(home) => WarehouseConfig::with_home(home),
        None => WarehouseConfig::default(),
    };
    if let Some(db) = &cli.db {
        config.db_path = db.clone();
    }
    config
}

/// Exchange settings from `--vwsp-window`.
pub fn exchange_settings(cli: &Cli) -> Result<ExchangeSettings, CliError> {
    let mut settings = ExchangeSettings::default();
    if let Some(minutes) = cli.vwsp_window {
        settings.vwsp_window = VwspWindow::from_minutes(minutes)?;
    }
    Ok(settings)
}

/// Run the selected command. `serve` blocks until shutdown and yields no report.
pub fn run(cli: &Cli) -> Result<Option<Report>, CliError> {
    let settings = exchange_settings(cli)?;
    let warehouse = Warehouse::open(warehouse_config(cli))?;
    tracing::debug!(
        db_path = %warehouse.db_path().display(),
        vwsp_window = settings.vwsp_window.minutes(),
        "warehouse opened"
    );
    let exchange = Exchange::with_settings(warehouse, settings);

    let report = match &cli.command {
        Command::Stock(command) => stock::run(command, &exchange)?,
        Command::Trade(command) => trade::run(command, &exchange)?,
        Command::DividendYield(args) => metrics::dividend_yield(args, &exchange)?,
        Command::PeRatio(args) => metrics::pe_ratio(args, &exchange)?,
        Command::Vwsp(args) => metrics::vwsp(args, &exchange)?,
        Command::Index => metrics::index(&exchange)?,
        Command::Serve(args) => {
            serve::run(args, exchange)?;
            return Ok(None);
        }
    };

    Ok(Some(report))
}
