//! Output formatting: table, JSON, YAML, plain.
//!
//! Collections are untyped JSON rows, so the table view derives its
//! columns from the rows themselves. Structured formats go through serde,
//! plain emits one identifier per line.

use std::io::{self, Write};

use serde_json::Value;
use tabled::{builder::Builder, settings::Style};

use crate::cli::OutputFormat;
use crate::error::CliError;

/// Cells longer than this are cut with an ellipsis in table view.
const MAX_CELL_WIDTH: usize = 48;

// ── Render dispatchers ───────────────────────────────────────────────

/// Render a list of rows in the chosen format.
pub fn render_list(format: &OutputFormat, rows: &[Value]) -> Result<String, CliError> {
    match format {
        OutputFormat::Table => Ok(render_table(rows)),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(rows)?),
        OutputFormat::JsonCompact => Ok(serde_json::to_string(rows)?),
        OutputFormat::Yaml => Ok(serde_yaml::to_string(rows)?),
        OutputFormat::Plain => Ok(rows.iter().map(row_id).collect::<Vec<_>>().join("\n")),
    }
}

/// Render a single item. Table view is a two-column field/value listing.
pub fn render_single(format: &OutputFormat, item: &Value) -> Result<String, CliError> {
    match format {
        OutputFormat::Table => Ok(render_detail(item)),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(item)?),
        OutputFormat::JsonCompact => Ok(serde_json::to_string(item)?),
        OutputFormat::Yaml => Ok(serde_yaml::to_string(item)?),
        OutputFormat::Plain => Ok(row_id(item)),
    }
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

/// Status lines (pagination footer, confirmations) on stderr.
pub fn print_status(message: &str, quiet: bool) {
    if quiet {
        return;
    }
    let mut stderr = io::stderr().lock();
    let _ = writeln!(stderr, "{message}");
}

// ── Table rendering ──────────────────────────────────────────────────

/// Column order: `id` first when present, then every other top-level
/// key in order of first appearance.
fn columns(rows: &[Value]) -> Vec<String> {
    let mut columns: Vec<String> = Vec::new();
    for row in rows {
        if let Value::Object(map) = row {
            for key in map.keys() {
                if !columns.iter().any(|c| c == key) {
                    columns.push(key.clone());
                }
            }
        }
    }
    if let Some(pos) = columns.iter().position(|c| c == "id") {
        let id = columns.remove(pos);
        columns.insert(0, id);
    }
    columns
}

fn render_table(rows: &[Value]) -> String {
    if rows.is_empty() {
        return "No items.".into();
    }
    let columns = columns(rows);
    let mut builder = Builder::default();

    if columns.is_empty() {
        // Scalar rows
        builder.push_record([String::from("value")]);
        for row in rows {
            builder.push_record([cell(row)]);
        }
    } else {
        builder.push_record(columns.iter().cloned());
        for row in rows {
            builder.push_record(
                columns
                    .iter()
                    .map(|column| row.get(column).map(cell).unwrap_or_default()),
            );
        }
    }

    builder.build().with(Style::rounded()).to_string()
}

fn render_detail(item: &Value) -> String {
    let Value::Object(map) = item else {
        return cell(item);
    };
    let mut builder = Builder::default();
    for (key, value) in map {
        builder.push_record([key.clone(), cell(value)]);
    }
    builder.build().with(Style::rounded()).to_string()
}

fn cell(value: &Value) -> String {
    let text = match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    truncate(&text, MAX_CELL_WIDTH)
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_owned();
    }
    let mut cut: String = text.chars().take(max.saturating_sub(1)).collect();
    cut.push('…');
    cut
}

/// Identifier for plain output: `id` when present, otherwise compact JSON.
fn row_id(row: &Value) -> String {
    match row.get("id") {
        Some(Value::String(id)) => id.clone(),
        Some(id) => id.to_string(),
        None => row.to_string(),
    }
}
