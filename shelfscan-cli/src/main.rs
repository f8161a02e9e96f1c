//! shelfscan -- barcode product lookup command-line tool

mod cli;
mod commands;
mod error;
mod logging;
mod output;

use std::path::Path;

use clap::Parser;
use tracing::debug;

use shelfscan_core::config::{GeneralConfig, ShelfscanConfig};
use shelfscan_core::types::Locale;

use crate::cli::{Cli, Commands};
use crate::error::CliError;
use crate::output::OutputWriter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("error: {e}");
        std::process::exit(e.exit_code());
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let Cli {
        config: config_path,
        log_level,
        output,
        locale,
        command,
    } = cli;
    let writer = OutputWriter::new(output);

    match command {
        // validate/show must be able to report a broken file themselves
        Commands::Config(args) => {
            let mut general = GeneralConfig::default();
            if let Some(level) = log_level {
                general.log_level = level;
            }
            start_logging(&general)?;
            commands::config::execute(args, &config_path, &writer).await
        }
        Commands::Lookup(args) => {
            let config = prepare(&config_path, log_level, locale.as_deref()).await?;
            commands::lookup::execute(args, &config, &writer).await
        }
        Commands::Scan(args) => {
            let config = prepare(&config_path, log_level, locale.as_deref()).await?;
            commands::scan::execute(args, &config, &writer).await
        }
    }
}

/// Loads the configuration, applies command-line overrides and starts logging.
async fn prepare(
    config_path: &Path,
    log_level: Option<String>,
    locale: Option<&str>,
) -> Result<ShelfscanConfig, CliError> {
    let mut config = ShelfscanConfig::load_or_default(config_path).await?;
    apply_overrides(&mut config, log_level, locale)?;
    start_logging(&config.general)?;
    debug!(
        path = %config_path.display(),
        locale = %config.general.locale,
        "configuration loaded"
    );
    Ok(config)
}

fn apply_overrides(
    config: &mut ShelfscanConfig,
    log_level: Option<String>,
    locale: Option<&str>,
) -> Result<(), CliError> {
    if let Some(level) = log_level {
        config.general.log_level = level;
    }
    if let Some(raw) = locale {
        config.general.locale = Locale::from_str_loose(raw).ok_or_else(|| {
            CliError::Config(format!("unknown locale '{raw}' (expected: de, fr, it, en)"))
        })?;
    }
    config.validate()?;
    Ok(())
}

fn start_logging(general: &GeneralConfig) -> Result<(), CliError> {
    logging::init_tracing(general).map_err(|e| CliError::Config(e.to_string()))?;
    shelfscan_core::metrics::describe_all();
    Ok(())
}
