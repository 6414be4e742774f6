use clap::Parser;
use tracing::{debug, info};

mod cli;
mod config;
mod error;
mod logging;
mod runner;

use cli::Cli;
use error::CliError;
use logging::init_logging;

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let cli = Cli::parse();

    init_logging(cli.verbose)?;

    info!("attest CLI starting");
    debug!("CLI arguments: {:?}", cli);

    match cli.run().await {
        Ok(_) => {
            info!("attest CLI completed successfully");
            Ok(())
        }
        Err(e) => {
            tracing::error!("CLI error: {:?}", e);
            std::process::exit(e.exit_code());
        }
    }
}
