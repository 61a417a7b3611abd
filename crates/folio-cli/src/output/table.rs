use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

use super::{format_sharpe, round_decimal_str};

const DISPLAY_DP: u32 = 4;

/// Format output as tables using the tabled crate.
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) => {
            if let Some(result) = map.get("result") {
                print_result(result);
                print_envelope_notes(map);
            } else {
                print_flat_object(map);
            }
        }
        Value::Array(arr) => print_array_table(arr),
        _ => println!("{}", value),
    }
}

fn print_result(result: &Value) {
    let Value::Object(res_map) = result else {
        println!("{}", format_value(result));
        return;
    };

    if let Some(Value::Array(portfolios)) = res_map.get("portfolios") {
        if let Some(Value::String(label)) = res_map.get("investor_label") {
            println!("Investor profile: {}\n", label);
        }
        print_portfolio_overview(portfolios);
        for p in portfolios {
            print_portfolio_detail(p);
        }
    } else if let Some(Value::Array(estimates)) = res_map.get("estimates") {
        print_array_table(estimates);
    } else {
        print_flat_object(res_map);
    }
}

fn print_portfolio_overview(portfolios: &[Value]) {
    let mut builder = Builder::default();
    builder.push_record([
        "Strategy",
        "Expected Return",
        "Risk",
        "Sharpe",
        "Tier",
        "VaR",
        "Future Value",
        "Invested",
        "Leftover",
    ]);
    for p in portfolios {
        builder.push_record([
            field(p, "method"),
            field(p, "expected_return"),
            field(p, "portfolio_risk"),
            p.get("sharpe_ratio")
                .map(|s| format_sharpe(s, DISPLAY_DP))
                .unwrap_or_default(),
            field(p, "performance_tier"),
            field(p, "value_at_risk"),
            field(p, "future_value"),
            field(p, "total_invested"),
            field(p, "uninvested_amount"),
        ]);
    }
    println!("{}", Table::from(builder));
}

fn print_portfolio_detail(portfolio: &Value) {
    println!("\n{}", field(portfolio, "method"));
    if let Some(Value::String(insight)) = portfolio.get("insight") {
        println!("{}", insight);
    }

    if let Some(Value::Array(holdings)) = portfolio.get("holdings") {
        let mut builder = Builder::default();
        builder.push_record([
            "Ticker",
            "Sector",
            "Weight",
            "Price",
            "Shares",
            "Amount",
            "% of Capital",
        ]);
        for h in holdings {
            builder.push_record([
                field(h, "ticker"),
                field(h, "sector"),
                field(h, "weight"),
                field(h, "price"),
                field(h, "shares"),
                field(h, "amount_used"),
                field(h, "percent_of_capital"),
            ]);
        }
        println!("{}", Table::from(builder));
    }

    if let Some(Value::Object(sectors)) = portfolio.get("sector_exposure") {
        let parts: Vec<String> = sectors
            .iter()
            .map(|(k, v)| format!("{} {}%", k, format_value(v)))
            .collect();
        println!("Sector exposure: {}", parts.join(", "));
    }
}

fn print_envelope_notes(envelope: &Map<String, Value>) {
    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings {
                if let Value::String(s) = w {
                    println!("  - {}", s);
                }
            }
        }
    }

    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}

fn print_flat_object(map: &Map<String, Value>) {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (key, val) in map {
        builder.push_record([key.as_str(), &format_value(val)]);
    }
    println!("{}", Table::from(builder));
}

fn print_array_table(arr: &[Value]) {
    if arr.is_empty() {
        println!("(empty)");
        return;
    }

    if let Some(Value::Object(first)) = arr.first() {
        let headers: Vec<String> = first.keys().cloned().collect();
        let mut builder = Builder::default();
        builder.push_record(&headers);

        for item in arr {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| map.get(h.as_str()).map(format_value).unwrap_or_default())
                    .collect();
                builder.push_record(row);
            }
        }

        println!("{}", Table::from(builder));
    } else {
        for item in arr {
            println!("{}", format_value(item));
        }
    }
}

fn field(value: &Value, key: &str) -> String {
    value.get(key).map(format_value).unwrap_or_default()
}

fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => round_decimal_str(s, DISPLAY_DP),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        Value::Array(arr) => {
            let items: Vec<String> = arr.iter().map(format_value).collect();
            items.join(", ")
        }
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}
