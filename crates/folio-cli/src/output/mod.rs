pub mod csv_out;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use rust_decimal::Decimal;
use serde_json::Value;

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => match serde_json::to_string_pretty(value) {
            Ok(s) => println!("{}", s),
            Err(e) => eprintln!("JSON serialization error: {}", e),
        },
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}

/// Decimal strings are printed to at most `dp` places for human formats.
pub(crate) fn round_decimal_str(s: &str, dp: u32) -> String {
    match s.parse::<Decimal>() {
        Ok(d) => d.round_dp(dp).normalize().to_string(),
        Err(_) => s.to_string(),
    }
}

/// Sharpe ratios serialise as `{"defined": "x"}` or `"undefined"`.
pub(crate) fn format_sharpe(value: &Value, dp: u32) -> String {
    match value {
        Value::Object(map) => map
            .get("defined")
            .and_then(|v| v.as_str())
            .map(|s| round_decimal_str(s, dp))
            .unwrap_or_default(),
        Value::String(s) if s == "undefined" => "undefined".to_string(),
        other => other.to_string(),
    }
}
