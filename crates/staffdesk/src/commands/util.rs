//! Shared helpers for command handlers.

use std::path::Path;

use chrono::NaiveDate;
use serde_json::Value;

use staffdesk_core::{Console, FilterState, FilterValue, Resource};

use crate::cli::{BodyArgs, QueryArgs};
use crate::error::CliError;

/// Prompt for confirmation, auto-approving if `--yes` was passed.
pub fn confirm(message: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    if !std::io::IsTerminal::is_terminal(&std::io::stdin()) {
        return Err(CliError::NonInteractiveRequiresYes {
            action: message.into(),
        });
    }
    let confirmed = dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Io(std::io::Error::other(e)))?;
    Ok(confirmed)
}

/// Read and parse a JSON file for `--from-file` flags.
pub fn read_json_file(path: &Path) -> Result<Value, CliError> {
    let contents = std::fs::read_to_string(path)?;
    serde_json::from_str(&contents).map_err(|e| CliError::Validation {
        field: "from-file".into(),
        reason: format!("invalid JSON: {e}"),
    })
}

/// Resolve the JSON body from `--data` or `--from-file`.
pub fn read_body(body: &BodyArgs) -> Result<Value, CliError> {
    if let Some(ref path) = body.from_file {
        return read_json_file(path);
    }
    let raw = body.data.as_deref().unwrap_or_default();
    serde_json::from_str(raw).map_err(|e| CliError::Validation {
        field: "data".into(),
        reason: format!("invalid JSON: {e}"),
    })
}

// ── Filters ──────────────────────────────────────────────────────────

/// Parse `FIELD=VALUE`.
///
/// `true`/`false` become boolean filters, `FROM..TO` (either side may be
/// empty) a date range, anything else text.
pub fn parse_filter(raw: &str) -> Result<(String, FilterValue), CliError> {
    let (field, value) = split_pair(raw, "filter")?;

    let parsed = match value.as_str() {
        "true" => FilterValue::Bool(true),
        "false" => FilterValue::Bool(false),
        _ => match value.split_once("..") {
            Some((from, to)) => FilterValue::DateRange {
                from: parse_date(from)?,
                to: parse_date(to)?,
            },
            None => FilterValue::Text(value),
        },
    };
    Ok((field, parsed))
}

fn parse_date(raw: &str) -> Result<Option<NaiveDate>, CliError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map(Some)
        .map_err(|e| CliError::Validation {
            field: "filter".into(),
            reason: format!("'{raw}' is not a YYYY-MM-DD date: {e}"),
        })
}

/// Parse `FIELD=PARAM` for `--alias`.
pub fn parse_alias(raw: &str) -> Result<(String, String), CliError> {
    split_pair(raw, "alias")
}

fn split_pair(raw: &str, flag: &str) -> Result<(String, String), CliError> {
    let Some((field, value)) = raw.split_once('=') else {
        return Err(CliError::Validation {
            field: flag.into(),
            reason: format!("expected FIELD=VALUE, got '{raw}'"),
        });
    };
    let field = field.trim();
    if field.is_empty() {
        return Err(CliError::Validation {
            field: flag.into(),
            reason: format!("missing field name in '{raw}'"),
        });
    }
    Ok((field.to_owned(), value.to_owned()))
}

/// Filter state from `--search` and `--filter` flags.
pub fn filter_from_args(args: &QueryArgs) -> Result<FilterState, CliError> {
    let mut filter = FilterState::new();
    for raw in &args.filters {
        let (field, value) = parse_filter(raw)?;
        filter.set(field, Some(value));
    }
    if let Some(ref search) = args.search {
        filter.set("Search", Some(FilterValue::Text(search.clone())));
    }
    Ok(filter)
}

/// JSON-row resource for `args.resource` with any `--alias` entries.
pub fn resource_from_args(console: &Console, args: &QueryArgs) -> Result<Resource<Value>, CliError> {
    let mut resource = console.resource::<Value>(&args.resource);
    for raw in &args.aliases {
        let (field, param) = parse_alias(raw)?;
        resource = resource.alias(field, param);
    }
    Ok(resource)
}
