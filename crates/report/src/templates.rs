//! Template loading and filters

use endpoint_coverage_common::{CoverageError, Result};
use std::collections::HashMap;
use tera::{Tera, Value};

/// Load the summary template with its filters registered
pub fn load_templates() -> Result<Tera> {
    let mut tera = Tera::default();

    tera.register_filter("percent", percent_filter);
    tera.register_filter("pad", pad_filter);

    tera.add_raw_template("summary.txt", include_str!("../templates/summary.txt.tera"))
        .map_err(|e| {
            CoverageError::Report(format!("Failed to load summary template: {}", e))
        })?;

    Ok(tera)
}

/// Render a 0..1 rate as a percentage with one decimal
fn percent_filter(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    let rate = value
        .as_f64()
        .ok_or_else(|| tera::Error::msg("percent filter expects a number"))?;
    Ok(Value::String(format!("{:.1}%", rate * 100.0)))
}

/// Left-align a value in a column of `width` characters
fn pad_filter(value: &Value, args: &HashMap<String, Value>) -> tera::Result<Value> {
    let text = match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    let width = args
        .get("width")
        .and_then(Value::as_u64)
        .ok_or_else(|| tera::Error::msg("pad filter expects a numeric `width` argument"))?
        as usize;

    Ok(Value::String(format!("{text:<width$}")))
}
