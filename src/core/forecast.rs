//! Forecast payloads and the upstream provider abstraction

use crate::core::error::CoreError;
use crate::core::reconcile::{ReconciledSeries, reconcile};
use crate::core::sentiment::SentimentReading;
use crate::core::series::{ForecastPoint, HistoricalPoint};
use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

/// Forecast lengths offered to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Default)]
pub enum ForecastHorizon {
    ThreeDays,
    #[default]
    SevenDays,
    FourteenDays,
    ThirtyDays,
}

impl ForecastHorizon {
    pub const ALL: [ForecastHorizon; 4] = [
        ForecastHorizon::ThreeDays,
        ForecastHorizon::SevenDays,
        ForecastHorizon::FourteenDays,
        ForecastHorizon::ThirtyDays,
    ];

    pub fn days(&self) -> u32 {
        match self {
            ForecastHorizon::ThreeDays => 3,
            ForecastHorizon::SevenDays => 7,
            ForecastHorizon::FourteenDays => 14,
            ForecastHorizon::ThirtyDays => 30,
        }
    }
}

impl Display for ForecastHorizon {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.days())
    }
}

impl FromStr for ForecastHorizon {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().trim_end_matches(['d', 'D']);
        ForecastHorizon::ALL
            .into_iter()
            .find(|h| h.days().to_string() == trimmed)
            .ok_or_else(|| anyhow::anyhow!("Invalid forecast horizon: {s} (expected 3, 7, 14 or 30)"))
    }
}

/// Everything the forecasting service returns for one ticker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPayload {
    pub ticker: String,
    pub historical: Vec<HistoricalPoint>,
    #[serde(default)]
    pub predictions: Vec<ForecastPoint>,
    #[serde(default)]
    pub sentiment: Option<SentimentReading>,
}

impl ForecastPayload {
    pub fn reconcile(&self) -> Result<ReconciledSeries, CoreError> {
        reconcile(&self.historical, &self.predictions)
    }
}

#[async_trait]
pub trait ForecastProvider: Send + Sync {
    async fn fetch_forecast(&self, ticker: &str, horizon: ForecastHorizon)
    -> Result<ForecastPayload>;

    async fn fetch_sentiment(&self, ticker: &str) -> Result<SentimentReading>;
}
