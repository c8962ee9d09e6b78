//! Output formatting for query results.
//!
//! Used by the interactive client to render a [`QueryResult`] as an ASCII
//! table (like the MySQL CLI), a markdown table, or raw JSON.

use crate::models::{QueryResult, SqlValue};
use clap::ValueEnum;
use unicode_width::UnicodeWidthStr;

/// Output format for query results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// ASCII table format (default)
    #[default]
    Table,
    /// Markdown table format
    Markdown,
    /// Pretty-printed JSON of the full result
    Json,
}

/// Render a result in the requested format. Failures always render as
/// `Error: <message>`.
pub fn render(result: &QueryResult, format: OutputFormat) -> String {
    if let Some(message) = result.error() {
        return format!("Error: {}", message);
    }
    match format {
        OutputFormat::Table => format_as_table(result),
        OutputFormat::Markdown => format_as_markdown(result),
        OutputFormat::Json => serde_json::to_string_pretty(result)
            .unwrap_or_else(|e| format!("Error: {}", e)),
    }
}

pub fn format_as_table(result: &QueryResult) -> String {
    if let Some(message) = result.error() {
        return format!("Error: {}", message);
    }

    let columns = result.columns();
    if columns.is_empty() {
        return affected_summary(result.row_count());
    }

    let rows: Vec<Vec<String>> = result
        .result_rows()
        .iter()
        .map(|row| row.iter().map(SqlValue::to_plain_string).collect())
        .collect();

    let mut widths: Vec<usize> = columns.iter().map(|c| c.width()).collect();
    for row in &rows {
        for (i, cell) in row.iter().enumerate().take(widths.len()) {
            widths[i] = widths[i].max(cell.width());
        }
    }

    let mut output = String::new();
    let separator: String = widths
        .iter()
        .map(|w| format!("+{}", "-".repeat(w + 2)))
        .collect::<String>()
        + "+\n";

    output.push_str(&separator);
    let header: String = columns
        .iter()
        .zip(&widths)
        .map(|(name, w)| format!("| {} ", pad_center(name, *w)))
        .collect::<String>()
        + "|\n";
    output.push_str(&header);
    output.push_str(&separator);

    for (raw, cells) in result.result_rows().iter().zip(&rows) {
        let row_str: String = widths
            .iter()
            .enumerate()
            .map(|(i, w)| {
                let cell = cells.get(i).map(String::as_str).unwrap_or("NULL");
                let numeric = raw.get(i).is_some_and(SqlValue::is_numeric);
                format!("| {} ", pad(cell, *w, numeric))
            })
            .collect::<String>()
            + "|\n";
        output.push_str(&row_str);
    }

    output.push_str(&separator);

    let count = result.row_count();
    if count == 0 {
        output.push_str("Empty set\n");
    } else {
        let row_text = if count == 1 { "row" } else { "rows" };
        output.push_str(&format!("{} {} in set\n", count, row_text));
    }

    output
}

pub fn format_as_markdown(result: &QueryResult) -> String {
    if let Some(message) = result.error() {
        return format!("Error: {}", message);
    }

    let columns = result.columns();
    if columns.is_empty() {
        return format!("*{}*", affected_summary(result.row_count()));
    }

    let mut output = String::new();

    let header: String = columns
        .iter()
        .map(|c| format!("| {} ", c))
        .collect::<String>()
        + "|\n";
    output.push_str(&header);

    let sep: String = columns.iter().map(|_| "|---").collect::<String>() + "|\n";
    output.push_str(&sep);

    for row in result.result_rows() {
        let row_str: String = row
            .iter()
            .map(|value| format!("| {} ", value.to_plain_string().replace('|', "\\|")))
            .collect::<String>()
            + "|\n";
        output.push_str(&row_str);
    }

    output.push_str(&format!("\n*{} rows*", result.row_count()));

    output
}

fn affected_summary(count: u64) -> String {
    let row_text = if count == 1 { "row" } else { "rows" };
    format!("Query OK, {} {} affected", count, row_text)
}

/// Pad by display width; `format!` width counts chars, which misaligns
/// wide (CJK, emoji) text.
fn pad(text: &str, width: usize, right_align: bool) -> String {
    let fill = " ".repeat(width.saturating_sub(text.width()));
    if right_align {
        format!("{}{}", fill, text)
    } else {
        format!("{}{}", text, fill)
    }
}

fn pad_center(text: &str, width: usize) -> String {
    let total = width.saturating_sub(text.width());
    let left = total / 2;
    format!("{}{}{}", " ".repeat(left), text, " ".repeat(total - left))
}
