use crate::core::reconcile::ChangeDirection;
use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Defines different styles for text elements.
pub enum StyleType {
    Title,
    TotalLabel,
    TotalValue,
    Success,
    Error,
    Subtle,
}

/// Applies a consistent style to a string.
pub fn style_text(text: &str, style_type: StyleType) -> String {
    let styled = match style_type {
        StyleType::Title => style(text).bold().underlined(),
        StyleType::TotalLabel => style(text).bold(),
        StyleType::TotalValue => style(text).cyan().bold(),
        StyleType::Success => style(text).green().bold(),
        StyleType::Error => style(text).red(),
        StyleType::Subtle => style(text).dim(),
    };
    styled.to_string()
}

/// Creates a new `comfy_table::Table` with standard styling.
pub fn new_styled_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Creates a styled header cell for a table.
pub fn header_cell(text: &str) -> Cell {
    Cell::new(text)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

/// Formats an `Option<T>` into a `Cell`. `None` is displayed as a dash.
pub fn format_optional_cell<T>(value: Option<T>, format_fn: impl Fn(T) -> String) -> Cell {
    value.map_or(
        Cell::new("-")
            .fg(Color::DarkGrey)
            .set_alignment(CellAlignment::Right),
        |v| Cell::new(format_fn(v)).set_alignment(CellAlignment::Right),
    )
}

/// Creates a cell for displaying percentage change with color coding.
pub fn change_cell(change: f64) -> Cell {
    let direction = ChangeDirection::of(change);
    let text = format!("{} {change:.2}%", direction.arrow());
    let color = match direction {
        ChangeDirection::Up => Color::Green,
        ChangeDirection::Flat => Color::DarkGrey,
        ChangeDirection::Down => Color::Red,
    };
    Cell::new(text).fg(color).set_alignment(CellAlignment::Right)
}

/// Formats a percentage change with arrow and color.
pub fn change_text(change: f64) -> String {
    let direction = ChangeDirection::of(change);
    let text = format!("{} {change:+.2}%", direction.arrow());
    match direction {
        ChangeDirection::Up => style(text).green().to_string(),
        ChangeDirection::Flat => style(text).dim().to_string(),
        ChangeDirection::Down => style(text).red().to_string(),
    }
}

/// Renders a fixed-width text bar, e.g. `[#####-----]`.
pub fn text_bar(value: f64, max: f64, width: usize) -> String {
    let ratio = if max > 0.0 {
        (value / max).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let filled = (ratio * width as f64).round() as usize;
    format!("[{}{}]", "#".repeat(filled), "-".repeat(width - filled))
}

/// Creates a spinner shown while waiting on the network.
pub fn new_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(spinner_style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}")
    {
        pb.set_style(spinner_style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Prints a separator line matching the terminal width.
pub fn print_separator() {
    let term_width = console::Term::stdout()
        .size_checked()
        .map(|(_, w)| w as usize)
        .unwrap_or(80);
    println!("\n{}", "─".repeat(term_width));
}
