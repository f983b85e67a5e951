//! CLI argument definitions for `gbce`.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `stock add` / `stock list` / `stock get` | Manage listed stocks |
//! | `trade record` / `trade list` | Record and inspect trades |
//! | `dividend-yield` | Dividend yield at a price |
//! | `pe-ratio` | P/E ratio at a price |
//! | `vwsp` | Volume-weighted stock price |
//! | `index` | GBCE All-Share Index |
//! | `serve` | Run the HTTP API |
//!
//! # Global Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--home` | `$GBCE_HOME`, else `~/.gbce` | Data directory |
//! | `--db` | `<home>/data/exchange.duckdb` | Database file |
//! | `--format` | `json` | Output format (json, table) |
//! | `--pretty` | `false` | Pretty-print JSON output |
//! | `--log` | `$RUST_LOG`, else `gbce=info` | Log filter |
//! | `--vwsp-window` | `5` | Default VWSP window in minutes |
//!
//! # Examples
//!
//! ```bash
//! gbce stock add --symbol GIN --type preferred --par-value 100 --last-dividend 8 --fixed-dividend 0.02
//! gbce trade record --symbol GIN --quantity 10 --side buy --price 101.5
//! gbce vwsp GIN --window-minutes 15 --pretty
//! gbce --vwsp-window 15 serve --port 8080
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// GBCE - Global Beverage Corporation Exchange
///
/// Record stocks and trades, and compute dividend yield, P/E ratio,
/// volume-weighted stock price and the GBCE All-Share Index.
#[derive(Debug, Parser)]
#[command(name = "gbce", author, version, about = "Global Beverage Corporation Exchange")]
pub struct Cli {
    /// Data directory. The database lives in its `data/` folder.
    #[arg(long, global = true)]
    pub home: Option<PathBuf>,

    /// Database file, overriding the one under `--home`.
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Output format for results.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,

    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    /// Log filter, e.g. `debug` or `gbce_core=debug`. Logs go to stderr.
    #[arg(long, global = true)]
    pub log: Option<String>,

    /// Default VWSP window in minutes, also used by `index` and `serve`.
    #[arg(long, global = true, allow_hyphen_values = true)]
    pub vwsp_window: Option<i64>,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Single JSON envelope.
    Json,
    /// Aligned text for terminal display.
    Table,
}

/// Available CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage listed stocks.
    #[command(subcommand)]
    Stock(StockCommand),

    /// Record and list trades.
    #[command(subcommand)]
    Trade(TradeCommand),

    /// Dividend yield of a stock at a given price.
    DividendYield(PriceArgs),

    /// Price/earnings ratio of a stock at a given price.
    PeRatio(PriceArgs),

    /// Volume-weighted stock price over a trailing window.
    Vwsp(VwspArgs),

    /// GBCE All-Share Index across every listed stock.
    Index,

    /// Run the HTTP API.
    Serve(ServeArgs),
}

#[derive(Debug, Subcommand)]
pub enum StockCommand {
    /// List a new stock.
    ///
    ///   gbce stock add --symbol TEA --type common --par-value 100 --last-dividend 0
    Add(StockAddArgs),
    /// List every stock, ordered by symbol.
    List,
    /// Show one stock.
    Get(SymbolArgs),
}

#[derive(Debug, Args)]
pub struct StockAddArgs {
    #[arg(long)]
    pub symbol: String,

    /// `common` or `preferred` (case-insensitive).
    #[arg(long = "type", value_name = "TYPE")]
    pub stock_type: String,

    #[arg(long, allow_hyphen_values = true)]
    pub par_value: f64,

    #[arg(long, allow_hyphen_values = true)]
    pub last_dividend: Option<f64>,

    /// Fraction of par, e.g. 0.02 for 2%.
    #[arg(long, allow_hyphen_values = true)]
    pub fixed_dividend: Option<f64>,
}

#[derive(Debug, Subcommand)]
pub enum TradeCommand {
    /// Record a trade against a listed stock.
    ///
    ///   gbce trade record --symbol POP --quantity 10 --side sell --price 100
    Record(TradeRecordArgs),
    /// List a stock's trades in the order they were recorded.
    List(SymbolArgs),
}

#[derive(Debug, Args)]
pub struct TradeRecordArgs {
    #[arg(long)]
    pub symbol: String,

    #[arg(long, allow_hyphen_values = true)]
    pub quantity: i64,

    /// `buy` or `sell` (case-insensitive).
    #[arg(long)]
    pub side: String,

    #[arg(long, allow_hyphen_values = true)]
    pub price: f64,

    /// Trade time: `YYYY-MM-DD`, `YYYY-MM-DDTHH:MM[:SS]` or RFC3339.
    /// Defaults to now.
    #[arg(long)]
    pub timestamp: Option<String>,
}

#[derive(Debug, Args)]
pub struct SymbolArgs {
    pub symbol: String,
}

#[derive(Debug, Args)]
pub struct PriceArgs {
    pub symbol: String,

    #[arg(long, allow_hyphen_values = true)]
    pub price: f64,
}

#[derive(Debug, Args)]
pub struct VwspArgs {
    pub symbol: String,

    /// Window length in minutes (default 5).
    #[arg(long, allow_hyphen_values = true)]
    pub window_minutes: Option<i64>,
}

#[derive(Debug, Args)]
pub struct ServeArgs {
    #[arg(long, default_value = "0.0.0.0")]
    pub host: String,

    #[arg(long, default_value_t = 8080)]
    pub port: u16,
}
