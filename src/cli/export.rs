use super::ui;
use crate::core::error::CoreError;
use crate::core::export::{serialize_historical, serialize_predictions};
use crate::core::forecast::{ForecastHorizon, ForecastPayload, ForecastProvider};
use crate::core::reconcile::reconcile;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use tracing::info;

/// Files written by one export run. `None` means there was nothing to export.
#[derive(Debug, Default)]
pub struct ExportReport {
    pub predictions: Option<PathBuf>,
    pub historical: Option<PathBuf>,
}

pub fn export_file_name(ticker: &str, kind: &str, date: NaiveDate) -> String {
    format!("{ticker}_{kind}_{}.csv", date.format("%Y-%m-%d"))
}

/// Writes the prediction and history CSVs for `payload` into `out_dir`.
pub fn write_exports(
    payload: &ForecastPayload,
    ticker: &str,
    out_dir: &Path,
    today: NaiveDate,
) -> Result<ExportReport> {
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create directory: {}", out_dir.display()))?;

    let predictions = reconcile(&payload.historical, &payload.predictions)
        .and_then(|series| serialize_predictions(&series, series.current_price));
    let historical = serialize_historical(&payload.historical);

    Ok(ExportReport {
        predictions: write_or_skip(predictions, out_dir.join(export_file_name(ticker, "predictions", today)))?,
        historical: write_or_skip(historical, out_dir.join(export_file_name(ticker, "historical", today)))?,
    })
}

fn write_or_skip(content: Result<String, CoreError>, path: PathBuf) -> Result<Option<PathBuf>> {
    match content {
        Ok(text) => {
            std::fs::write(&path, text)
                .with_context(|| format!("Failed to write export to {}", path.display()))?;
            info!("Exported {}", path.display());
            Ok(Some(path))
        }
        Err(e @ (CoreError::EmptyData(_) | CoreError::EmptySeries)) => {
            eprintln!("{}", ui::style_text(&format!("Skipped: {e}"), ui::StyleType::Error));
            Ok(None)
        }
        Err(e) => Err(e).context("Failed to build export"),
    }
}

pub async fn run(
    provider: &dyn ForecastProvider,
    ticker: &str,
    horizon: ForecastHorizon,
    out_dir: &Path,
    today: NaiveDate,
) -> Result<ExportReport> {
    let spinner = ui::new_spinner(&format!("Fetching {horizon}-day forecast for {ticker}..."));
    let payload = provider.fetch_forecast(ticker, horizon).await;
    spinner.finish_and_clear();
    let payload = payload.with_context(|| format!("Failed to fetch forecast for {ticker}"))?;

    let report = write_exports(&payload, ticker, out_dir, today)?;
    for path in [&report.predictions, &report.historical].into_iter().flatten() {
        println!(
            "{} {}",
            ui::style_text("Saved", ui::StyleType::Success),
            path.display()
        );
    }
    Ok(report)
}
