use super::ui;
use crate::core::forecast::{ForecastHorizon, ForecastProvider};
use crate::core::reconcile::{ReconciledSeries, reconcile};
use crate::core::sentiment::SentimentReading;
use anyhow::{Context, Result};
use comfy_table::{Cell, Color};
use tracing::{debug, warn};

/// Historical rows shown before the forecast; older rows are elided.
const HISTORY_ROWS: usize = 10;

impl ReconciledSeries {
    pub fn display_as_table(&self, ticker: &str) -> String {
        let mut table = ui::new_styled_table();
        table.set_header(vec![
            ui::header_cell("Date"),
            ui::header_cell("Open"),
            ui::header_cell("High"),
            ui::header_cell("Low"),
            ui::header_cell("Close"),
            ui::header_cell("Forecast"),
            ui::header_cell("Change"),
        ]);

        let historical_rows = self.points.iter().filter(|p| p.historical.is_some()).count();
        let skip = historical_rows.saturating_sub(HISTORY_ROWS);
        for point in self.points.iter().skip(skip) {
            let ohlc = point.ohlc;
            let forecast = match (point.forecast, point.is_bridge) {
                (Some(_), true) => Cell::new("◆ bridge").fg(Color::DarkGrey),
                (value, _) => ui::format_optional_cell(value, |v| format!("{v:.2}")),
            };
            let change = self
                .forecasts
                .iter()
                .find(|f| f.date == point.date)
                .map_or(Cell::new(""), |f| ui::change_cell(f.change_percent));

            table.add_row(vec![
                Cell::new(point.date.format("%Y-%m-%d")),
                ui::format_optional_cell(ohlc.map(|o| o.open), |v| format!("{v:.2}")),
                ui::format_optional_cell(ohlc.map(|o| o.high), |v| format!("{v:.2}")),
                ui::format_optional_cell(ohlc.map(|o| o.low), |v| format!("{v:.2}")),
                ui::format_optional_cell(point.historical, |v| format!("{v:.2}")),
                forecast,
                change,
            ]);
        }

        let mut output = format!(
            "Forecast: {}\n\n",
            ui::style_text(ticker, ui::StyleType::Title)
        );
        if skip > 0 {
            output.push_str(&ui::style_text(
                &format!("({skip} earlier rows not shown)\n"),
                ui::StyleType::Subtle,
            ));
        }
        output.push_str(&table.to_string());
        output.push_str(&format!(
            "\n\nPrice range: {:.2} - {:.2}",
            self.domain.min, self.domain.max
        ));
        output
    }

    pub fn display_summary(&self) -> String {
        let mut output = format!(
            "{}: {}",
            ui::style_text("Current Price", ui::StyleType::TotalLabel),
            ui::style_text(&format!("{:.2}", self.current_price), ui::StyleType::TotalValue)
        );
        match self.summary() {
            Some(summary) => output.push_str(&format!(
                "\n{}: {} ({}) after {} days",
                ui::style_text("Predicted Price", ui::StyleType::TotalLabel),
                ui::style_text(&format!("{:.2}", summary.final_price), ui::StyleType::TotalValue),
                ui::change_text(summary.final_change_percent),
                summary.horizon
            )),
            None => output.push_str(&format!(
                "\n{}",
                ui::style_text("No forecast available", ui::StyleType::Subtle)
            )),
        }
        output
    }
}

impl SentimentReading {
    pub fn display_gauge(&self) -> Result<String> {
        let gauge = self.gauge().context("Invalid sentiment score")?;
        let mut output = format!(
            "{}: {} ({})\n{} {:.0}%  needle {:+.0}°",
            ui::style_text("Market Sentiment", ui::StyleType::TotalLabel),
            ui::style_text(&self.label().to_string(), ui::StyleType::TotalValue),
            self.score,
            ui::text_bar(gauge.percentage, 100.0, 20),
            gauge.percentage,
            gauge.angle_degrees
        );
        if !self.news.is_empty() {
            output.push_str(&format!(
                "\n\n{}",
                ui::style_text("Latest News", ui::StyleType::Title)
            ));
            for (i, item) in self.news.iter().enumerate() {
                output.push_str(&format!(
                    "\n{}. {}\n   {}",
                    i + 1,
                    item.title,
                    ui::style_text(
                        &format!("{} · {} · {}", item.source, item.time, item.url),
                        ui::StyleType::Subtle
                    )
                ));
            }
        }
        Ok(output)
    }
}

/// Fetches a forecast and sentiment for `ticker` and prints them.
pub async fn run(
    provider: &dyn ForecastProvider,
    ticker: &str,
    horizon: ForecastHorizon,
) -> Result<()> {
    let spinner = ui::new_spinner(&format!("Fetching {horizon}-day forecast for {ticker}..."));
    let (forecast, sentiment) = futures::join!(
        provider.fetch_forecast(ticker, horizon),
        provider.fetch_sentiment(ticker)
    );
    spinner.finish_and_clear();

    let payload = forecast.with_context(|| format!("Failed to fetch forecast for {ticker}"))?;
    let series = reconcile(&payload.historical, &payload.predictions)
        .with_context(|| format!("Forecast data for {ticker} is inconsistent"))?;
    debug!(points = series.points.len(), "Reconciled forecast");

    println!("{}", series.display_as_table(ticker));
    ui::print_separator();
    println!("{}", series.display_summary());

    match sentiment {
        Ok(reading) => {
            ui::print_separator();
            println!("{}", reading.display_gauge()?);
        }
        Err(e) => {
            warn!(error = %e, "Sentiment unavailable");
            println!(
                "\n{}",
                ui::style_text("Sentiment unavailable", ui::StyleType::Subtle)
            );
        }
    }
    Ok(())
}
