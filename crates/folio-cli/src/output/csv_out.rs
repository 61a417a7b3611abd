use serde_json::{Map, Value};
use std::io;

use super::format_sharpe;

type StdoutWriter<'a> = csv::Writer<io::StdoutLock<'a>>;

/// Write output as CSV to stdout.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    match value {
        Value::Object(map) => match map.get("result") {
            Some(Value::Object(result)) => write_result_csv(&mut wtr, result),
            _ => write_field_value(&mut wtr, map),
        },
        Value::Array(arr) => write_array_csv(&mut wtr, arr),
        _ => {
            let _ = wtr.write_record([&format_csv_value(value)]);
        }
    }

    let _ = wtr.flush();
}

fn write_result_csv(wtr: &mut StdoutWriter<'_>, result: &Map<String, Value>) {
    if let Some(Value::Array(portfolios)) = result.get("portfolios") {
        write_holdings_csv(wtr, portfolios);
    } else if let Some(Value::Array(estimates)) = result.get("estimates") {
        write_array_csv(wtr, estimates);
    } else {
        write_field_value(wtr, result);
    }
}

/// One row per (strategy, instrument) with the portfolio-level figures repeated.
fn write_holdings_csv(wtr: &mut StdoutWriter<'_>, portfolios: &[Value]) {
    let _ = wtr.write_record([
        "strategy",
        "ticker",
        "sector",
        "weight",
        "price",
        "shares",
        "amount_used",
        "percent_of_capital",
        "expected_return",
        "portfolio_risk",
        "sharpe_ratio",
    ]);
    for p in portfolios {
        let method = field(p, "method");
        let expected_return = field(p, "expected_return");
        let risk = field(p, "portfolio_risk");
        let sharpe = p
            .get("sharpe_ratio")
            .map(|s| format_sharpe(s, 28))
            .unwrap_or_default();
        if let Some(Value::Array(holdings)) = p.get("holdings") {
            for h in holdings {
                let _ = wtr.write_record([
                    method.clone(),
                    field(h, "ticker"),
                    field(h, "sector"),
                    field(h, "weight"),
                    field(h, "price"),
                    field(h, "shares"),
                    field(h, "amount_used"),
                    field(h, "percent_of_capital"),
                    expected_return.clone(),
                    risk.clone(),
                    sharpe.clone(),
                ]);
            }
        }
    }
}

fn write_field_value(wtr: &mut StdoutWriter<'_>, map: &Map<String, Value>) {
    let _ = wtr.write_record(["field", "value"]);
    for (key, val) in map {
        let _ = wtr.write_record([key.as_str(), &format_csv_value(val)]);
    }
}

fn write_array_csv(wtr: &mut StdoutWriter<'_>, arr: &[Value]) {
    if arr.is_empty() {
        return;
    }

    if let Some(Value::Object(first)) = arr.first() {
        let headers: Vec<&str> = first.keys().map(|k| k.as_str()).collect();
        let _ = wtr.write_record(&headers);

        for item in arr {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| map.get(*h).map(format_csv_value).unwrap_or_default())
                    .collect();
                let _ = wtr.write_record(&row);
            }
        }
    } else {
        for item in arr {
            let _ = wtr.write_record([&format_csv_value(item)]);
        }
    }
}

fn field(value: &Value, key: &str) -> String {
    value.get(key).map(format_csv_value).unwrap_or_default()
}

fn format_csv_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
