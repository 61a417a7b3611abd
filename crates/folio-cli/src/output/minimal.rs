use serde_json::Value;

use super::{format_sharpe, round_decimal_str};

/// Print just the key answer from the output.
///
/// Portfolio builds print one line per strategy and estimate listings one
/// line per instrument; anything else prints the first well-known field.
pub fn print_minimal(value: &Value) {
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    if let Some(Value::Array(portfolios)) = result_obj.get("portfolios") {
        for p in portfolios {
            println!(
                "{}: return {} risk {} sharpe {}",
                text(p, "method"),
                text(p, "expected_return"),
                text(p, "portfolio_risk"),
                p.get("sharpe_ratio")
                    .map(|s| format_sharpe(s, 4))
                    .unwrap_or_default()
            );
        }
        return;
    }
    if let Some(Value::Array(estimates)) = result_obj.get("estimates") {
        for e in estimates {
            println!("{} {}", text(e, "ticker"), text(e, "expected_return"));
        }
        return;
    }

    let priority_keys = ["label", "leftover", "mean", "expected_return"];

    if let Value::Object(map) = result_obj {
        for key in &priority_keys {
            if let Some(val) = map.get(*key) {
                if !val.is_null() {
                    println!("{}", format_minimal(val));
                    return;
                }
            }
        }

        if let Some((key, val)) = map.iter().next() {
            println!("{}: {}", key, format_minimal(val));
            return;
        }
    }

    println!("{}", format_minimal(result_obj));
}

fn text(value: &Value, key: &str) -> String {
    value.get(key).map(format_minimal).unwrap_or_default()
}

fn format_minimal(value: &Value) -> String {
    match value {
        Value::String(s) => round_decimal_str(s, 4),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
