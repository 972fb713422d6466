//! Market sentiment readings and their gauge position

use crate::core::error::CoreError;
use serde::{Deserialize, Serialize};

pub const MIN_SCORE: i32 = -100;
pub const MAX_SCORE: i32 = 100;

/// Needle position on a half-circle gauge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GaugePosition {
    /// 0 at extreme fear, 100 at extreme greed.
    pub percentage: f64,
    /// -90 points left, 90 points right.
    pub angle_degrees: f64,
}

/// Maps a score in [-100, 100] onto the gauge.
pub fn map_sentiment(score: i32) -> Result<GaugePosition, CoreError> {
    if !(MIN_SCORE..=MAX_SCORE).contains(&score) {
        return Err(CoreError::OutOfRange(score));
    }
    let percentage = (f64::from(score) + 100.0) / 2.0;
    Ok(GaugePosition {
        percentage,
        angle_degrees: percentage / 100.0 * 180.0 - 90.0,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SentimentLabel {
    #[serde(rename = "Extreme Fear")]
    ExtremeFear,
    Fear,
    Neutral,
    Greed,
    #[serde(rename = "Extreme Greed")]
    ExtremeGreed,
}

impl SentimentLabel {
    /// Same thresholds the forecasting service labels its scores with.
    pub fn classify(score: i32) -> Self {
        match score {
            s if s >= 75 => SentimentLabel::ExtremeGreed,
            s if s >= 25 => SentimentLabel::Greed,
            s if s >= -25 => SentimentLabel::Neutral,
            s if s >= -75 => SentimentLabel::Fear,
            _ => SentimentLabel::ExtremeFear,
        }
    }
}

impl std::fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                SentimentLabel::ExtremeFear => "Extreme Fear",
                SentimentLabel::Fear => "Fear",
                SentimentLabel::Neutral => "Neutral",
                SentimentLabel::Greed => "Greed",
                SentimentLabel::ExtremeGreed => "Extreme Greed",
            }
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsItem {
    pub title: String,
    pub source: String,
    pub time: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentReading {
    pub score: i32,
    #[serde(default)]
    pub label: Option<SentimentLabel>,
    #[serde(default)]
    pub color: Option<String>,
    /// Headlines in the order the service returned them.
    #[serde(default)]
    pub news: Vec<NewsItem>,
}

impl SentimentReading {
    pub fn gauge(&self) -> Result<GaugePosition, CoreError> {
        map_sentiment(self.score)
    }

    /// The label sent upstream, or one derived from the score.
    pub fn label(&self) -> SentimentLabel {
        self.label
            .unwrap_or_else(|| SentimentLabel::classify(self.score))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gauge_scenarios() {
        let neutral = map_sentiment(0).unwrap();
        assert_eq!(neutral.percentage, 50.0);
        assert_eq!(neutral.angle_degrees, 0.0);

        let greed = map_sentiment(100).unwrap();
        assert_eq!(greed.percentage, 100.0);
        assert_eq!(greed.angle_degrees, 90.0);

        let fear = map_sentiment(-100).unwrap();
        assert_eq!(fear.percentage, 0.0);
        assert_eq!(fear.angle_degrees, -90.0);
    }

    #[test]
    fn test_gauge_is_monotonic() {
        let a = map_sentiment(-30).unwrap();
        let b = map_sentiment(45).unwrap();
        assert!(a.angle_degrees < b.angle_degrees);
        assert_eq!(b.percentage, 72.5);
    }

    #[test]
    fn test_out_of_range_score() {
        assert_eq!(map_sentiment(101), Err(CoreError::OutOfRange(101)));
        assert_eq!(map_sentiment(-101), Err(CoreError::OutOfRange(-101)));
    }

    #[test]
    fn test_classify_thresholds() {
        assert_eq!(SentimentLabel::classify(75), SentimentLabel::ExtremeGreed);
        assert_eq!(SentimentLabel::classify(74), SentimentLabel::Greed);
        assert_eq!(SentimentLabel::classify(25), SentimentLabel::Greed);
        assert_eq!(SentimentLabel::classify(-25), SentimentLabel::Neutral);
        assert_eq!(SentimentLabel::classify(-26), SentimentLabel::Fear);
        assert_eq!(SentimentLabel::classify(-76), SentimentLabel::ExtremeFear);
    }

    #[test]
    fn test_deserialize_service_reading() {
        let json = r##"{
            "ticker": "AAPL",
            "score": 32,
            "label": "Greed",
            "color": "lightgreen",
            "news": [
                {"title": "AAPL launches new product line", "source": "Reuters", "time": "3h ago", "url": "#"},
                {"title": "Tech sector rally boosts AAPL", "source": "CNBC", "time": "5h ago", "url": "#"}
            ]
        }"##;
        let reading: SentimentReading = serde_json::from_str(json).unwrap();
        assert_eq!(reading.label(), SentimentLabel::Greed);
        assert_eq!(reading.news.len(), 2);
        assert_eq!(reading.news[0].source, "Reuters");
        assert_eq!(reading.gauge().unwrap().percentage, 66.0);
    }

    #[test]
    fn test_missing_label_is_classified() {
        let reading: SentimentReading =
            serde_json::from_str(r#"{"score": -80}"#).unwrap();
        assert_eq!(reading.label(), SentimentLabel::ExtremeFear);
        assert_eq!(reading.label().to_string(), "Extreme Fear");
        assert!(reading.news.is_empty());
    }
}
