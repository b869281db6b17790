//! Main entry point for miq-bootstrap.
//!
//! Assigns the default alert profiles to the enterprise and enables the C&U
//! roles on this appliance's server. Exits non-zero when a phase fails.

use std::process::ExitCode;

use miq_bootstrap_cli::{Configuration, Execution, execute, init_logging, open_store, render};
use tracing::error;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(execution) if execution.is_success() => ExitCode::SUCCESS,
        Ok(_) => ExitCode::FAILURE,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("miq-bootstrap: {:#}", e);
            ExitCode::from(2)
        }
    }
}

async fn run() -> anyhow::Result<Execution> {
    let configuration = Configuration::new()?;
    let _logging_guard = init_logging(&configuration.logging_config())?;

    let store = open_store(&configuration).await?;
    let execution = execute(&configuration, store.as_ref()).await?;

    println!("{}", render(&execution)?);
    Ok(execution)
}
