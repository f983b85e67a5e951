use std::sync::Arc;

use gbce_core::{Exchange, Warehouse};
use gbce_web::ServerConfig;

use crate::cli::ServeArgs;
use crate::error::CliError;

/// Run the HTTP API on a multi-threaded runtime until the process stops.
pub fn run(args: &ServeArgs, exchange: Exchange<Warehouse>) -> Result<(), CliError> {
    let config = ServerConfig {
        host: args.host.clone(),
        port: args.port,
    };

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(gbce_web::serve(&config, Arc::new(exchange)))?;
    Ok(())
}
