//! Forecast reconciliation and learning engines

pub mod config;
pub mod curriculum;
pub mod error;
pub mod export;
pub mod forecast;
pub mod log;
pub mod progress;
pub mod quiz;
pub mod reconcile;
pub mod sentiment;
pub mod series;

// Re-export main types for cleaner imports
pub use error::CoreError;
pub use forecast::{ForecastHorizon, ForecastPayload, ForecastProvider};
pub use progress::{LearnerProgress, ProgressEngine};
pub use quiz::QuizSession;
pub use reconcile::{ReconciledSeries, reconcile};
pub use sentiment::{SentimentReading, map_sentiment};
