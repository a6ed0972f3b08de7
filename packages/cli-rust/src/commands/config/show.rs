//! Config show subcommand
//!
//! Displays the effective configuration in table or JSON format.
//! Uses serde serialization so every Config field is included.

use anyhow::Result;
use comfy_table::{Cell, Color, Table};
use opsdesk_core::{Config, config::paths};
use serde_json::Value;

/// Show the effective configuration
///
/// Nested sections are flattened to dotted keys (`launcher.venv_dir`).
pub fn cmd_config_show(config: &Config, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(config)?);
        return Ok(());
    }

    let value = serde_json::to_value(config)?;
    let mut rows = Vec::new();
    flatten("", &value, &mut rows);

    let mut table = Table::new();
    table.set_header(vec!["Key", "Value"]);
    for (key, val) in &rows {
        table.add_row(vec![Cell::new(key), value_cell(val)]);
    }
    println!("{table}");

    println!();
    if let Some(path) = paths::get_config_path() {
        let note = if path.exists() { "" } else { " (not created, using defaults)" };
        println!("Config file:  {}{note}", path.display());
    }
    if let Some(dir) = paths::get_profiles_dir(config.profiles_dir.as_ref()) {
        println!("Profiles dir: {}", dir.display());
    }
    Ok(())
}

fn flatten(prefix: &str, value: &Value, rows: &mut Vec<(String, Value)>) {
    match value {
        Value::Object(obj) => {
            for (key, val) in obj {
                let key = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                flatten(&key, val, rows);
            }
        }
        other => rows.push((prefix.to_string(), other.clone())),
    }
}

fn format_value(value: &Value) -> String {
    match value {
        Value::Null => "(not set)".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Array(arr) if arr.is_empty() => "(none)".to_string(),
        Value::Array(arr) => arr
            .iter()
            .map(|v| v.as_str().map(str::to_string).unwrap_or_else(|| v.to_string()))
            .collect::<Vec<_>>()
            .join(", "),
        Value::Object(_) => value.to_string(),
    }
}

fn value_cell(value: &Value) -> Cell {
    let cell = Cell::new(format_value(value));
    if value.is_null() {
        cell.fg(Color::DarkGrey)
    } else {
        cell
    }
}
