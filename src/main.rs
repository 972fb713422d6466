use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use std::path::PathBuf;
use stockcast::core::forecast::ForecastHorizon;
use stockcast::core::log::init_logging;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Show historical prices, the forecast and market sentiment
    Forecast {
        /// Ticker symbol, e.g. AAPL
        ticker: String,
        /// Forecast horizon in days: 3, 7, 14 or 30
        #[arg(short, long, default_value_t = ForecastHorizon::default())]
        days: ForecastHorizon,
        /// Read a saved forecast JSON file instead of calling the service
        #[arg(short, long)]
        input: Option<PathBuf>,
    },
    /// Save the forecast and price history as CSV files
    Export {
        /// Ticker symbol, e.g. AAPL
        ticker: String,
        /// Forecast horizon in days: 3, 7, 14 or 30
        #[arg(short, long, default_value_t = ForecastHorizon::default())]
        days: ForecastHorizon,
        /// Read a saved forecast JSON file instead of calling the service
        #[arg(short, long)]
        input: Option<PathBuf>,
        /// Directory to write the files to
        #[arg(short, long)]
        out_dir: Option<PathBuf>,
    },
    /// Display learning progress
    Learn,
    /// Read a lesson and mark it complete
    Lesson { module: u32, lesson: u32 },
    /// Take a module quiz
    Quiz { module: u32 },
}

impl From<Commands> for stockcast::AppCommand {
    fn from(cmd: Commands) -> stockcast::AppCommand {
        match cmd {
            Commands::Forecast {
                ticker,
                days,
                input,
            } => stockcast::AppCommand::Forecast {
                ticker,
                horizon: days,
                input,
            },
            Commands::Export {
                ticker,
                days,
                input,
                out_dir,
            } => stockcast::AppCommand::Export {
                ticker,
                horizon: days,
                input,
                out_dir,
            },
            Commands::Learn => stockcast::AppCommand::Learn,
            Commands::Lesson { module, lesson } => {
                stockcast::AppCommand::Lesson { module, lesson }
            }
            Commands::Quiz { module } => stockcast::AppCommand::Quiz { module },
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose)?;

    let result = match cli.command {
        Some(Commands::Setup) => match cli.config_path.as_deref() {
            Some(path) => stockcast::cli::setup::setup_at_path(path),
            None => stockcast::cli::setup::setup(),
        },
        Some(cmd) => stockcast::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
