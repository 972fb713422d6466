pub mod caching;
pub mod file;
pub mod forecast_service;
pub mod util;

use crate::core::config::AppConfig;
use crate::core::forecast::ForecastProvider;
use anyhow::Result;
use caching::CachingForecastProvider;
use file::FileForecastProvider;
use forecast_service::HttpForecastProvider;
use std::path::Path;

/// Picks the forecast source: a saved payload when `input` is given,
/// otherwise the configured service behind a cache.
pub fn forecast_provider(
    config: &AppConfig,
    input: Option<&Path>,
) -> Result<Box<dyn ForecastProvider>> {
    match input {
        Some(path) => Ok(Box::new(FileForecastProvider::load(path)?)),
        None => {
            let service = HttpForecastProvider::new(config.forecast_base_url())?
                .with_retry_policy(config.forecast_retry_policy());
            Ok(Box::new(CachingForecastProvider::new(service)))
        }
    }
}
