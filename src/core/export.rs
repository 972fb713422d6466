//! Delimited-text exports of forecasts and price history.
//!
//! Both exports are comma separated with a fixed header row and one
//! record per input row in input order. Prices are written with two
//! decimals; volume is written as an integer.
use crate::core::error::CoreError;
use crate::core::reconcile::{ReconciledSeries, change_percent};
use crate::core::series::HistoricalPoint;

pub const PREDICTIONS_HEADER: [&str; 4] = ["Date", "Predicted Price", "Change %", "Current Price"];
pub const HISTORICAL_HEADER: [&str; 6] = ["Date", "Open", "High", "Low", "Close", "Volume"];

const DATE_FORMAT: &str = "%Y-%m-%d";

/// One row per forecast value of `reconciled`, relative to `current_price`.
///
/// The synthesized bridge point is not a forecast and is not exported.
pub fn serialize_predictions(
    reconciled: &ReconciledSeries,
    current_price: f64,
) -> Result<String, CoreError> {
    if reconciled.forecasts.is_empty() {
        return Err(CoreError::EmptyData("prediction"));
    }

    let mut lines = Vec::with_capacity(reconciled.forecasts.len() + 1);
    lines.push(PREDICTIONS_HEADER.join(","));
    for forecast in &reconciled.forecasts {
        let change = change_percent(forecast.price, current_price)?;
        lines.push(format!(
            "{},{:.2},{:.2},{:.2}",
            forecast.date.format(DATE_FORMAT),
            forecast.price,
            change,
            current_price
        ));
    }
    Ok(lines.join("\n"))
}

/// One row per historical point.
///
/// Points reported as a bare price have no open/high/low or volume; those
/// cells are left empty and the price goes in the close column.
pub fn serialize_historical(historical: &[HistoricalPoint]) -> Result<String, CoreError> {
    if historical.is_empty() {
        return Err(CoreError::EmptyData("historical"));
    }

    let mut lines = Vec::with_capacity(historical.len() + 1);
    lines.push(HISTORICAL_HEADER.join(","));
    for point in historical {
        let date = point.date().format(DATE_FORMAT);
        let volume = point.volume().map(|v| v.to_string()).unwrap_or_default();
        let line = match point.ohlc() {
            Some(ohlc) => format!(
                "{date},{:.2},{:.2},{:.2},{:.2},{volume}",
                ohlc.open, ohlc.high, ohlc.low, ohlc.close
            ),
            None => format!("{date},,,,{:.2},{volume}", point.value()),
        };
        lines.push(line);
    }
    Ok(lines.join("\n"))
}
