//! Serves a forecast saved to disk, for working without the service.
use crate::core::forecast::{ForecastHorizon, ForecastPayload, ForecastProvider};
use crate::core::sentiment::SentimentReading;
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use std::path::Path;
use tracing::{debug, warn};

pub struct FileForecastProvider {
    payload: ForecastPayload,
}

impl FileForecastProvider {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read forecast file: {}", path.display()))?;
        let payload: ForecastPayload = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse forecast file: {}", path.display()))?;
        debug!(ticker = %payload.ticker, "Loaded forecast from {}", path.display());
        Ok(Self { payload })
    }
}

#[async_trait]
impl ForecastProvider for FileForecastProvider {
    /// The saved payload is returned whatever horizon is asked for.
    async fn fetch_forecast(
        &self,
        ticker: &str,
        _horizon: ForecastHorizon,
    ) -> Result<ForecastPayload> {
        if !self.payload.ticker.eq_ignore_ascii_case(ticker) {
            warn!(
                requested = %ticker,
                saved = %self.payload.ticker,
                "Forecast file is for a different ticker"
            );
        }
        Ok(self.payload.clone())
    }

    async fn fetch_sentiment(&self, _ticker: &str) -> Result<SentimentReading> {
        self.payload
            .sentiment
            .clone()
            .ok_or_else(|| anyhow!("Forecast file has no sentiment reading"))
    }
}
