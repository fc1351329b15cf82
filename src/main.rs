//! AppForge - local project workspace with mock AI generation
//!
//! This is the binary entry point. All logic lives in the library.

use clap::Parser;
use tracing::{error, info};

use appforge::cli::Cli;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    // Logs go to a file so command output stays clean
    if let Err(e) = appforge_core::logging::init() {
        eprintln!("Logging disabled: {}", e);
    }
    info!("AppForge starting: {:?}", cli.command);

    match appforge::run(cli).await {
        Ok(true) => Ok(()),
        Ok(false) => std::process::exit(1),
        Err(e) => {
            error!("Application error: {:?}", e);
            Err(e)
        }
    }
}
