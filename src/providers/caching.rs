use crate::core::forecast::{ForecastHorizon, ForecastPayload, ForecastProvider};
use crate::core::sentiment::SentimentReading;
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

type Cached<T> = Arc<Mutex<HashMap<String, Result<T, String>>>>;

/// Memoizes forecasts per ticker and horizon, and sentiment per ticker.
/// Failures are cached too, so a bad ticker is only asked for once.
#[derive(Clone)]
pub struct CachingForecastProvider<T: ForecastProvider> {
    inner: T,
    forecasts: Cached<ForecastPayload>,
    sentiments: Cached<SentimentReading>,
}

impl<T: ForecastProvider> CachingForecastProvider<T> {
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            forecasts: Arc::new(Mutex::new(HashMap::new())),
            sentiments: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

#[async_trait]
impl<T: ForecastProvider + Send + Sync> ForecastProvider for CachingForecastProvider<T> {
    async fn fetch_forecast(
        &self,
        ticker: &str,
        horizon: ForecastHorizon,
    ) -> Result<ForecastPayload> {
        let key = format!("{ticker}-{horizon}");
        let mut cache = self.forecasts.lock().await;
        if let Some(cached_result) = cache.get(&key) {
            debug!("Cache hit for forecast: {}", key);
            return match cached_result {
                Ok(payload) => Ok(payload.clone()),
                Err(e) => Err(anyhow!(e.clone())),
            };
        }
        debug!("Cache miss for forecast: {}", key);
        let result = self.inner.fetch_forecast(ticker, horizon).await;
        cache.insert(key, result.as_ref().map(Clone::clone).map_err(|e| e.to_string()));
        result
    }

    async fn fetch_sentiment(&self, ticker: &str) -> Result<SentimentReading> {
        let mut cache = self.sentiments.lock().await;
        if let Some(cached_result) = cache.get(ticker) {
            debug!("Cache hit for sentiment: {}", ticker);
            return match cached_result {
                Ok(reading) => Ok(reading.clone()),
                Err(e) => Err(anyhow!(e.clone())),
            };
        }
        debug!("Cache miss for sentiment: {}", ticker);
        let result = self.inner.fetch_sentiment(ticker).await;
        cache.insert(
            ticker.to_string(),
            result.as_ref().map(Clone::clone).map_err(|e| e.to_string()),
        );
        result
    }
}
