use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::*;

/// One historical observation: a `YYYY-MM` label and the price recorded
/// for that month. A missing price is a gap, not an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub month: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<Money>,
}

impl PricePoint {
    pub fn new(month: impl Into<String>, price: Option<Money>) -> Self {
        PricePoint {
            month: month.into(),
            price,
        }
    }

    /// First day of the labelled month, if the label is a valid `YYYY-MM`.
    pub fn period(&self) -> Option<NaiveDate> {
        month_start(&self.month)
    }

    /// The price if it is usable as a future sample (present and positive).
    pub fn valid_price(&self) -> Option<Money> {
        self.price.filter(|p| *p > Decimal::ZERO)
    }
}

/// Immutable input record for one instrument on the shortlist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentRecord {
    pub ticker: String,
    pub sector: String,
    pub current_price: Money,
    /// Annualised volatility as a fraction (0.25 = 25%)
    pub volatility: Rate,
    /// Monthly observations in chronological order
    #[serde(default)]
    pub history: Vec<PricePoint>,
}

impl InstrumentRecord {
    /// Eligible for construction: positive price and non-negative volatility.
    pub fn is_eligible(&self) -> bool {
        self.current_price > Decimal::ZERO && self.volatility >= Decimal::ZERO
    }
}

/// Returns `true` for labels of the form `YYYY-MM` naming a real month.
pub fn is_month_label(label: &str) -> bool {
    month_start(label).is_some()
}

fn month_start(label: &str) -> Option<NaiveDate> {
    let bytes = label.as_bytes();
    if bytes.len() != 7 || bytes[4] != b'-' {
        return None;
    }
    if !label
        .bytes()
        .enumerate()
        .all(|(i, b)| i == 4 || b.is_ascii_digit())
    {
        return None;
    }
    NaiveDate::parse_from_str(&format!("{label}-01"), "%Y-%m-%d").ok()
}

/// Sort observations chronologically. Labels that are not months sort last,
/// keeping their relative order.
pub fn order_history(history: &mut [PricePoint]) {
    history.sort_by_key(|p| (p.period().is_none(), p.period()));
}

/// Split a universe into eligible records and a count of excluded ones.
pub fn eligible_instruments(universe: &[InstrumentRecord]) -> (Vec<&InstrumentRecord>, usize) {
    let eligible: Vec<&InstrumentRecord> = universe.iter().filter(|r| r.is_eligible()).collect();
    let excluded = universe.len() - eligible.len();
    (eligible, excluded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn record(price: Decimal, vol: Decimal) -> InstrumentRecord {
        InstrumentRecord {
            ticker: "ABC".into(),
            sector: "Energy".into(),
            current_price: price,
            volatility: vol,
            history: vec![],
        }
    }

    #[test]
    fn test_month_labels() {
        assert!(is_month_label("2024-01"));
        assert!(is_month_label("1999-12"));
        assert!(!is_month_label("2024-13"));
        assert!(!is_month_label("2024-1"));
        assert!(!is_month_label("Ticker"));
        assert!(!is_month_label("2024/01"));
        assert!(!is_month_label("+024-01"));
    }

    #[test]
    fn test_valid_price_rejects_gaps_and_non_positive() {
        assert_eq!(PricePoint::new("2024-01", None).valid_price(), None);
        assert_eq!(PricePoint::new("2024-01", Some(dec!(0))).valid_price(), None);
        assert_eq!(PricePoint::new("2024-01", Some(dec!(-3))).valid_price(), None);
        assert_eq!(
            PricePoint::new("2024-01", Some(dec!(12.5))).valid_price(),
            Some(dec!(12.5))
        );
    }

    #[test]
    fn test_order_history() {
        let mut history = vec![
            PricePoint::new("2025-03", Some(dec!(3))),
            PricePoint::new("notes", None),
            PricePoint::new("2024-11", Some(dec!(1))),
            PricePoint::new("2025-01", Some(dec!(2))),
        ];
        order_history(&mut history);
        let labels: Vec<&str> = history.iter().map(|p| p.month.as_str()).collect();
        assert_eq!(labels, vec!["2024-11", "2025-01", "2025-03", "notes"]);
    }

    #[test]
    fn test_eligibility() {
        let universe = vec![
            record(dec!(100), dec!(0.2)),
            record(dec!(0), dec!(0.2)),
            record(dec!(50), dec!(-0.1)),
            record(dec!(50), dec!(0)),
        ];
        let (eligible, excluded) = eligible_instruments(&universe);
        assert_eq!(eligible.len(), 2);
        assert_eq!(excluded, 2);
    }
}
