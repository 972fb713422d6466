//! Time-indexed market observations and forecast values

use crate::core::error::{CoreError, SeriesKind};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Open/high/low/close breakdown of a trading day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ohlc {
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

/// One historical observation. The scalar `value` is the close when an
/// OHLC breakdown exists, otherwise the single price reported upstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawHistoricalPoint", into = "RawHistoricalPoint")]
pub struct HistoricalPoint {
    date: NaiveDate,
    value: f64,
    ohlc: Option<Ohlc>,
    volume: Option<u64>,
}

impl HistoricalPoint {
    pub fn new(date: NaiveDate, ohlc: Ohlc, volume: Option<u64>) -> Result<Self, CoreError> {
        for (field, v) in [
            ("open", ohlc.open),
            ("high", ohlc.high),
            ("low", ohlc.low),
            ("close", ohlc.close),
        ] {
            validate_price(date, field, v)?;
        }
        if ohlc.low > ohlc.high {
            return Err(invalid(date, "low is above high"));
        }
        if ohlc.open < ohlc.low || ohlc.open > ohlc.high {
            return Err(invalid(date, "open is outside [low, high]"));
        }
        if ohlc.close < ohlc.low || ohlc.close > ohlc.high {
            return Err(invalid(date, "close is outside [low, high]"));
        }

        Ok(Self {
            date,
            value: ohlc.close,
            ohlc: Some(ohlc),
            volume,
        })
    }

    /// Builds a point from a bare closing price, as the forecasting
    /// service reports its chart history.
    pub fn from_price(date: NaiveDate, price: f64) -> Result<Self, CoreError> {
        validate_price(date, "price", price)?;
        Ok(Self {
            date,
            value: price,
            ohlc: None,
            volume: None,
        })
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn ohlc(&self) -> Option<Ohlc> {
        self.ohlc
    }

    pub fn volume(&self) -> Option<u64> {
        self.volume
    }
}

/// One model-generated forecast value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawForecastPoint")]
pub struct ForecastPoint {
    date: NaiveDate,
    price: f64,
}

impl ForecastPoint {
    pub fn new(date: NaiveDate, price: f64) -> Result<Self, CoreError> {
        validate_price(date, "price", price)?;
        Ok(Self { date, price })
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn price(&self) -> f64 {
        self.price
    }
}

/// Checks that dates within one source are strictly ascending.
pub fn ensure_ascending<I>(kind: SeriesKind, dates: I) -> Result<(), CoreError>
where
    I: IntoIterator<Item = NaiveDate>,
{
    let mut previous: Option<NaiveDate> = None;
    for date in dates {
        if let Some(prev) = previous {
            if date <= prev {
                return Err(CoreError::UnsortedInput { kind, date });
            }
        }
        previous = Some(date);
    }
    Ok(())
}

fn validate_price(date: NaiveDate, field: &str, value: f64) -> Result<(), CoreError> {
    if !value.is_finite() {
        return Err(invalid(date, &format!("{field} must be finite")));
    }
    if value < 0.0 {
        return Err(invalid(date, &format!("{field} must be non-negative")));
    }
    Ok(())
}

fn invalid(date: NaiveDate, reason: &str) -> CoreError {
    CoreError::InvalidPoint {
        date,
        reason: reason.to_string(),
    }
}

// Wire shape: either `{date, price}` or `{date, open, high, low, close, volume}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawHistoricalPoint {
    date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    open: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    high: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    low: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    close: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    volume: Option<u64>,
}

impl TryFrom<RawHistoricalPoint> for HistoricalPoint {
    type Error = CoreError;

    fn try_from(raw: RawHistoricalPoint) -> Result<Self, Self::Error> {
        match (raw.open, raw.high, raw.low, raw.close, raw.price) {
            (Some(open), Some(high), Some(low), Some(close), _) => HistoricalPoint::new(
                raw.date,
                Ohlc {
                    open,
                    high,
                    low,
                    close,
                },
                raw.volume,
            ),
            (None, None, None, None, Some(price)) => HistoricalPoint::from_price(raw.date, price),
            (_, _, _, Some(close), None) => HistoricalPoint::from_price(raw.date, close),
            _ => Err(invalid(raw.date, "expected either price or open/high/low/close")),
        }
    }
}

impl From<HistoricalPoint> for RawHistoricalPoint {
    fn from(point: HistoricalPoint) -> Self {
        match point.ohlc {
            Some(ohlc) => RawHistoricalPoint {
                date: point.date,
                price: None,
                open: Some(ohlc.open),
                high: Some(ohlc.high),
                low: Some(ohlc.low),
                close: Some(ohlc.close),
                volume: point.volume,
            },
            None => RawHistoricalPoint {
                date: point.date,
                price: Some(point.value),
                open: None,
                high: None,
                low: None,
                close: None,
                volume: point.volume,
            },
        }
    }
}

// The service also sends `change_percent`; it is recomputed during
// reconciliation so it is ignored here.
#[derive(Debug, Deserialize)]
struct RawForecastPoint {
    date: NaiveDate,
    price: f64,
}

impl TryFrom<RawForecastPoint> for ForecastPoint {
    type Error = CoreError;

    fn try_from(raw: RawForecastPoint) -> Result<Self, Self::Error> {
        ForecastPoint::new(raw.date, raw.price)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[test]
    fn test_valid_ohlc_point() {
        let ohlc = Ohlc {
            open: 101.0,
            high: 105.0,
            low: 99.5,
            close: 104.0,
        };
        let point = HistoricalPoint::new(day(2), ohlc, Some(1_200)).unwrap();
        assert_eq!(point.value(), 104.0);
        assert_eq!(point.volume(), Some(1_200));
        assert_eq!(point.ohlc(), Some(ohlc));
    }

    #[test]
    fn test_low_above_high_is_rejected() {
        let ohlc = Ohlc {
            open: 100.0,
            high: 95.0,
            low: 105.0,
            close: 100.0,
        };
        let err = HistoricalPoint::new(day(2), ohlc, None).unwrap_err();
        assert!(matches!(err, CoreError::InvalidPoint { .. }));
        assert!(err.to_string().contains("low is above high"));
    }

    #[test]
    fn test_close_outside_range_is_rejected() {
        let ohlc = Ohlc {
            open: 100.0,
            high: 105.0,
            low: 95.0,
            close: 110.0,
        };
        assert!(HistoricalPoint::new(day(2), ohlc, None).is_err());
    }

    #[test]
    fn test_negative_values_are_rejected() {
        assert!(HistoricalPoint::from_price(day(1), -1.0).is_err());
        assert!(ForecastPoint::new(day(1), -0.01).is_err());
        assert!(ForecastPoint::new(day(1), f64::NAN).is_err());
    }

    #[test]
    fn test_deserialize_price_only_history() {
        let json = r#"[{"date": "2024-01-01", "price": 187.5}]"#;
        let points: Vec<HistoricalPoint> = serde_json::from_str(json).unwrap();
        assert_eq!(points[0].date(), day(1));
        assert_eq!(points[0].value(), 187.5);
        assert!(points[0].ohlc().is_none());
    }

    #[test]
    fn test_deserialize_ohlc_history() {
        let json = r#"{"date": "2024-01-03", "open": 10.0, "high": 12.0, "low": 9.0, "close": 11.0, "volume": 5000}"#;
        let point: HistoricalPoint = serde_json::from_str(json).unwrap();
        assert_eq!(point.value(), 11.0);
        assert_eq!(point.volume(), Some(5000));
    }

    #[test]
    fn test_deserialize_invalid_ohlc_fails() {
        let json = r#"{"date": "2024-01-03", "open": 10.0, "high": 8.0, "low": 9.0, "close": 11.0}"#;
        assert!(serde_json::from_str::<HistoricalPoint>(json).is_err());
    }

    #[test]
    fn test_forecast_ignores_upstream_change_percent() {
        let json = r#"{"date": "2024-01-04", "price": 190.25, "change_percent": 1.3}"#;
        let point: ForecastPoint = serde_json::from_str(json).unwrap();
        assert_eq!(point.price(), 190.25);
    }

    #[test]
    fn test_ensure_ascending() {
        assert!(ensure_ascending(SeriesKind::Historical, [day(1), day(2), day(5)]).is_ok());
        assert_eq!(
            ensure_ascending(SeriesKind::Forecast, [day(1), day(3), day(3)]),
            Err(CoreError::UnsortedInput {
                kind: SeriesKind::Forecast,
                date: day(3)
            })
        );
    }
}
