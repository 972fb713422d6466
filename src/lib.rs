pub mod cli;
pub mod core;
pub mod providers;
pub mod store;

use crate::core::config::AppConfig;
use crate::core::forecast::ForecastHorizon;
use anyhow::Result;
use chrono::Local;
use std::path::PathBuf;
use tracing::{debug, info};

/// Commands that run against a loaded configuration.
#[derive(Debug, Clone)]
pub enum AppCommand {
    Forecast {
        ticker: String,
        horizon: ForecastHorizon,
        input: Option<PathBuf>,
    },
    Export {
        ticker: String,
        horizon: ForecastHorizon,
        input: Option<PathBuf>,
        out_dir: Option<PathBuf>,
    },
    Learn,
    Lesson {
        module: u32,
        lesson: u32,
    },
    Quiz {
        module: u32,
    },
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("stockcast starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");
    let today = Local::now().date_naive();

    match command {
        AppCommand::Forecast {
            ticker,
            horizon,
            input,
        } => {
            let provider = providers::forecast_provider(&config, input.as_deref())?;
            cli::forecast::run(provider.as_ref(), &ticker.to_uppercase(), horizon).await
        }
        AppCommand::Export {
            ticker,
            horizon,
            input,
            out_dir,
        } => {
            let provider = providers::forecast_provider(&config, input.as_deref())?;
            let out_dir = out_dir.unwrap_or_else(|| PathBuf::from(&config.export.out_dir));
            cli::export::run(
                provider.as_ref(),
                &ticker.to_uppercase(),
                horizon,
                &out_dir,
                today,
            )
            .await
            .map(|_| ())
        }
        AppCommand::Learn => {
            let store = store::open_store(&config);
            cli::learn::run(&config, store.as_ref())
        }
        AppCommand::Lesson { module, lesson } => {
            let store = store::open_store(&config);
            cli::lesson::run(&config, store.as_ref(), module, lesson, today)
        }
        AppCommand::Quiz { module } => {
            let store = store::open_store(&config);
            let stdin = std::io::stdin();
            cli::quiz::run(
                &config,
                store.as_ref(),
                module,
                today,
                &mut stdin.lock(),
                &mut std::io::stdout(),
            )
            .map(|_| ())
        }
    }
}
