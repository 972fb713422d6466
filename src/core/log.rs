use anyhow::{Context, Result};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{
    EnvFilter, filter::Targets, fmt, prelude::__tracing_subscriber_SubscriberExt,
    util::SubscriberInitExt,
};

/// Events from this crate are the only ones shown by `--verbose`.
const APP_TARGET: &str = env!("CARGO_CRATE_NAME");

fn app_level(verbose: bool) -> LevelFilter {
    if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::OFF
    }
}

/// Installs the global subscriber, writing to stderr so command output on
/// stdout stays clean. `RUST_LOG` overrides the default level.
pub fn init_logging(verbose: bool) -> Result<()> {
    let level = app_level(verbose);
    let env_filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    tracing_subscriber::registry()
        .with(fmt::layer().pretty().without_time().with_writer(std::io::stderr))
        .with(Targets::new().with_target(APP_TARGET, level))
        .with(env_filter)
        .try_init()
        .context("Failed to install the log subscriber")
}
