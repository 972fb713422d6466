//! Merges a historical series with a forecast into one render-ready timeline.
//!
//! The merged timeline holds every distinct date of both inputs exactly
//! once, in ascending order. At the last historical date the forecast
//! line is anchored to the historical value (the bridging point) so a
//! chart draws the two segments as one continuous line.
use crate::core::error::{CoreError, SeriesKind};
use crate::core::series::{ForecastPoint, HistoricalPoint, Ohlc, ensure_ascending};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

/// Factors applied to the lowest and highest value to pad the chart axis.
pub const DOMAIN_LOWER_MARGIN: f64 = 0.98;
pub const DOMAIN_UPPER_MARGIN: f64 = 1.02;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReconciledPoint {
    pub date: NaiveDate,
    pub historical: Option<f64>,
    pub forecast: Option<f64>,
    pub ohlc: Option<Ohlc>,
    pub volume: Option<u64>,
    /// Set when `forecast` was synthesized from the historical value.
    pub is_bridge: bool,
}

impl ReconciledPoint {
    fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            historical: None,
            forecast: None,
            ohlc: None,
            volume: None,
            is_bridge: false,
        }
    }

    /// Value shown as the close in tooltips and tables.
    pub fn display_close(&self) -> Option<f64> {
        self.ohlc
            .map(|o| o.close)
            .or(self.historical)
            .or(self.forecast)
    }
}

/// Padded value range for the price axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PriceDomain {
    pub min: f64,
    pub max: f64,
}

impl PriceDomain {
    fn from_values(values: impl IntoIterator<Item = f64>) -> Option<Self> {
        let (lo, hi) = values
            .into_iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                (lo.min(v), hi.max(v))
            });
        if lo.is_finite() && hi.is_finite() {
            Some(Self {
                min: lo * DOMAIN_LOWER_MARGIN,
                max: hi * DOMAIN_UPPER_MARGIN,
            })
        } else {
            None
        }
    }
}

/// A forecast value with its change relative to the current price.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastMetric {
    pub date: NaiveDate,
    pub price: f64,
    pub change_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReconciledSeries {
    pub points: Vec<ReconciledPoint>,
    pub domain: PriceDomain,
    /// Last historical value, the reference for every change percent.
    pub current_price: f64,
    pub forecasts: Vec<ForecastMetric>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeDirection {
    Up,
    Flat,
    Down,
}

impl ChangeDirection {
    pub fn of(change: f64) -> Self {
        if change > 0.0 {
            ChangeDirection::Up
        } else if change == 0.0 {
            ChangeDirection::Flat
        } else {
            ChangeDirection::Down
        }
    }

    pub fn arrow(&self) -> &'static str {
        match self {
            ChangeDirection::Up => "▲",
            ChangeDirection::Flat => "-",
            ChangeDirection::Down => "▼",
        }
    }
}

/// Headline figures for the stats cards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForecastSummary {
    pub current_price: f64,
    pub final_price: f64,
    pub final_change_percent: f64,
    pub horizon: usize,
}

impl ForecastSummary {
    pub fn direction(&self) -> ChangeDirection {
        ChangeDirection::of(self.final_change_percent)
    }
}

impl ReconciledSeries {
    /// Returns `None` when there is no forecast to summarize.
    pub fn summary(&self) -> Option<ForecastSummary> {
        self.forecasts.last().map(|last| ForecastSummary {
            current_price: self.current_price,
            final_price: last.price,
            final_change_percent: last.change_percent,
            horizon: self.forecasts.len(),
        })
    }

    pub fn bridge(&self) -> Option<&ReconciledPoint> {
        self.points.iter().find(|p| p.is_bridge)
    }
}

/// Percentage change of `price` against `current_price`.
pub fn change_percent(price: f64, current_price: f64) -> Result<f64, CoreError> {
    if current_price == 0.0 {
        return Err(CoreError::ZeroReferencePrice);
    }
    Ok((price - current_price) / current_price * 100.0)
}

/// Merges `historical` and `forecast` into a single gap-aware series.
///
/// Both inputs must be strictly ascending by date. Forecast dates may
/// start at the last historical date (the join date) but not before it.
/// On the join date the historical value is kept for both lines.
pub fn reconcile(
    historical: &[HistoricalPoint],
    forecast: &[ForecastPoint],
) -> Result<ReconciledSeries, CoreError> {
    let last = historical.last().ok_or(CoreError::EmptySeries)?;
    ensure_ascending(SeriesKind::Historical, historical.iter().map(|p| p.date()))?;
    ensure_ascending(SeriesKind::Forecast, forecast.iter().map(|p| p.date()))?;

    if let Some(first) = forecast.first() {
        if first.date() < last.date() {
            return Err(CoreError::ForecastBeforeHistory {
                date: first.date(),
                last_historical: last.date(),
            });
        }
    }

    let current_price = last.value();
    let forecasts = forecast
        .iter()
        .map(|p| -> Result<ForecastMetric, CoreError> {
            Ok(ForecastMetric {
                date: p.date(),
                price: p.price(),
                change_percent: change_percent(p.price(), current_price)?,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut timeline: BTreeMap<NaiveDate, ReconciledPoint> = BTreeMap::new();
    for point in historical {
        let entry = timeline
            .entry(point.date())
            .or_insert_with(|| ReconciledPoint::empty(point.date()));
        entry.historical = Some(point.value());
        entry.ohlc = point.ohlc();
        entry.volume = point.volume();
    }
    for point in forecast {
        let entry = timeline
            .entry(point.date())
            .or_insert_with(|| ReconciledPoint::empty(point.date()));
        // Historical values win on shared dates; the bridge below fills them
        if entry.historical.is_none() {
            entry.forecast = Some(point.price());
        }
    }

    if !forecast.is_empty() {
        if let Some(join) = timeline.get_mut(&last.date()) {
            join.forecast = join.historical;
            join.is_bridge = true;
            debug!("Bridged forecast onto {}", join.date);
        }
    }

    let values = historical
        .iter()
        .map(|p| p.value())
        .chain(forecast.iter().map(|p| p.price()));
    let domain = PriceDomain::from_values(values).ok_or(CoreError::EmptySeries)?;

    let points: Vec<ReconciledPoint> = timeline.into_values().collect();
    debug!(
        points = points.len(),
        forecasts = forecasts.len(),
        "Reconciled series"
    );

    Ok(ReconciledSeries {
        points,
        domain,
        current_price,
        forecasts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn hist(d: u32, price: f64) -> HistoricalPoint {
        HistoricalPoint::from_price(day(d), price).unwrap()
    }

    fn fc(d: u32, price: f64) -> ForecastPoint {
        ForecastPoint::new(day(d), price).unwrap()
    }

    #[test]
    fn test_single_day_each_side() {
        let series = reconcile(&[hist(1, 100.0)], &[fc(2, 105.0)]).unwrap();

        assert_eq!(series.points.len(), 2);
        assert_eq!(series.points[0].date, day(1));
        assert_eq!(series.points[0].historical, Some(100.0));
        // Last historical date carries the bridge value
        assert_eq!(series.points[0].forecast, Some(100.0));
        assert!(series.points[0].is_bridge);
        assert_eq!(series.points[1].historical, None);
        assert_eq!(series.points[1].forecast, Some(105.0));

        assert!((series.domain.min - 98.0).abs() < 1e-9);
        assert!((series.domain.max - 107.1).abs() < 1e-9);
    }

    #[test]
    fn test_every_date_appears_once_in_order() {
        let historical = [hist(1, 10.0), hist(2, 11.0), hist(4, 12.0)];
        let forecast = [fc(4, 12.5), fc(5, 13.0), fc(8, 14.0)];
        let series = reconcile(&historical, &forecast).unwrap();

        let dates: Vec<NaiveDate> = series.points.iter().map(|p| p.date).collect();
        assert_eq!(dates, vec![day(1), day(2), day(4), day(5), day(8)]);
    }

    #[test]
    fn test_historical_value_anchors_shared_date() {
        let series =
            reconcile(&[hist(1, 10.0), hist(2, 11.0)], &[fc(2, 11.5), fc(3, 12.0)]).unwrap();
        assert_eq!(series.points.len(), 3);
        let join = &series.points[1];
        assert_eq!(join.historical, Some(11.0));
        assert_eq!(join.forecast, Some(11.0));
        assert!(join.is_bridge);
        assert_eq!(series.bridge(), Some(join));

        // The model's own price on that date is still reported as a forecast
        assert_eq!(series.forecasts.len(), 2);
        assert_eq!(series.forecasts[0].price, 11.5);
        assert!((series.domain.max - 12.0 * DOMAIN_UPPER_MARGIN).abs() < 1e-9);
    }

    #[test]
    fn test_only_one_side_present_away_from_join() {
        let series =
            reconcile(&[hist(1, 10.0), hist(2, 11.0)], &[fc(3, 12.0), fc(4, 13.0)]).unwrap();
        for point in &series.points {
            if point.date == day(2) {
                assert_eq!(point.forecast, point.historical);
            } else {
                assert!(point.historical.is_some() ^ point.forecast.is_some());
            }
        }
    }

    #[test]
    fn test_empty_forecast_has_no_forecast_values() {
        let series = reconcile(&[hist(1, 10.0), hist(2, 11.0)], &[]).unwrap();
        assert!(series.points.iter().all(|p| p.forecast.is_none()));
        assert!(series.forecasts.is_empty());
        assert!(series.summary().is_none());
    }

    #[test]
    fn test_single_point_domain_is_widened() {
        let series = reconcile(&[hist(1, 50.0)], &[]).unwrap();
        assert!((series.domain.min - 49.0).abs() < 1e-9);
        assert!((series.domain.max - 51.0).abs() < 1e-9);
    }

    #[test]
    fn test_domain_covers_all_values() {
        let historical = [hist(1, 80.0), hist(2, 120.0)];
        let forecast = [fc(3, 60.0), fc(4, 140.0)];
        let series = reconcile(&historical, &forecast).unwrap();
        assert!(series.domain.min <= 60.0);
        assert!(series.domain.max >= 140.0);
    }

    #[test]
    fn test_change_percent_uses_last_historical_value() {
        let series = reconcile(&[hist(1, 90.0), hist(2, 100.0)], &[fc(3, 110.0), fc(4, 95.0)])
            .unwrap();
        assert_eq!(series.current_price, 100.0);
        assert!((series.forecasts[0].change_percent - 10.0).abs() < 1e-9);
        assert!((series.forecasts[1].change_percent + 5.0).abs() < 1e-9);

        let summary = series.summary().unwrap();
        assert_eq!(summary.final_price, 95.0);
        assert_eq!(summary.horizon, 2);
        assert_eq!(summary.direction(), ChangeDirection::Down);
    }

    #[test]
    fn test_display_close_fallback_order() {
        let ohlc = Ohlc {
            open: 9.0,
            high: 11.0,
            low: 8.0,
            close: 10.0,
        };
        let historical = [HistoricalPoint::new(day(1), ohlc, Some(100)).unwrap()];
        let series = reconcile(&historical, &[fc(2, 12.0)]).unwrap();
        assert_eq!(series.points[0].display_close(), Some(10.0));
        assert_eq!(series.points[0].volume, Some(100));
        assert_eq!(series.points[1].display_close(), Some(12.0));
    }

    #[test]
    fn test_empty_history_fails() {
        assert_eq!(reconcile(&[], &[fc(1, 1.0)]), Err(CoreError::EmptySeries));
    }

    #[test]
    fn test_unsorted_input_fails() {
        let err = reconcile(&[hist(2, 10.0), hist(1, 11.0)], &[]).unwrap_err();
        assert!(matches!(
            err,
            CoreError::UnsortedInput {
                kind: SeriesKind::Historical,
                ..
            }
        ));

        let err = reconcile(&[hist(1, 10.0)], &[fc(3, 1.0), fc(2, 1.0)]).unwrap_err();
        assert!(matches!(
            err,
            CoreError::UnsortedInput {
                kind: SeriesKind::Forecast,
                ..
            }
        ));
    }

    #[test]
    fn test_forecast_before_history_fails() {
        let err = reconcile(&[hist(1, 10.0), hist(5, 11.0)], &[fc(3, 12.0)]).unwrap_err();
        assert_eq!(
            err,
            CoreError::ForecastBeforeHistory {
                date: day(3),
                last_historical: day(5)
            }
        );
    }

    #[test]
    fn test_zero_current_price_with_forecast_fails() {
        assert_eq!(
            reconcile(&[hist(1, 0.0)], &[fc(2, 1.0)]),
            Err(CoreError::ZeroReferencePrice)
        );
        assert!(reconcile(&[hist(1, 0.0)], &[]).is_ok());
    }

    #[test]
    fn test_change_direction() {
        assert_eq!(ChangeDirection::of(0.5), ChangeDirection::Up);
        assert_eq!(ChangeDirection::of(0.0), ChangeDirection::Flat);
        assert_eq!(ChangeDirection::of(-0.5), ChangeDirection::Down);
        assert_eq!(ChangeDirection::Down.arrow(), "▼");
    }
}
