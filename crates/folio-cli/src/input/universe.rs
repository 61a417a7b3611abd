use folio_core::instrument::{is_month_label, order_history, InstrumentRecord, PricePoint};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::fs::File;
use std::io;

use super::file::resolve_path;

const SECTOR: &str = "sector";
const TICKER: &str = "ticker";
const CURRENT_PRICE: &str = "current price";
const STD_DEV_PCT: &str = "std dev (%)";

/// Instruments parsed from a shortlist file plus the rows that were dropped.
#[derive(Debug)]
pub struct LoadedUniverse {
    pub instruments: Vec<InstrumentRecord>,
    pub rejected_rows: usize,
}

/// Load a shortlist CSV: `Sector, Ticker, Current Price, Std Dev (%)` and
/// any number of `YYYY-MM` price columns.
pub fn load_universe(path: &str) -> Result<LoadedUniverse, Box<dyn std::error::Error>> {
    let canonical = resolve_path(path)?;
    let file = File::open(&canonical)
        .map_err(|e| format!("Failed to read '{}': {}", canonical.display(), e))?;
    parse_universe(file)
        .map_err(|e| format!("Failed to parse '{}': {}", canonical.display(), e).into())
}

/// Parse shortlist rows from any reader.
///
/// Rows with a missing ticker, a non-numeric or non-positive price, or a
/// non-numeric standard deviation are rejected and counted. Blank or
/// non-numeric month cells become gaps.
pub fn parse_universe<R: io::Read>(
    reader: R,
) -> Result<LoadedUniverse, Box<dyn std::error::Error>> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers: Vec<String> = rdr.headers()?.iter().map(String::from).collect();
    let column = |name: &str| -> Result<usize, Box<dyn std::error::Error>> {
        headers
            .iter()
            .position(|h| h.eq_ignore_ascii_case(name))
            .ok_or_else(|| format!("Missing required column '{name}'").into())
    };
    let sector_col = column(SECTOR)?;
    let ticker_col = column(TICKER)?;
    let price_col = column(CURRENT_PRICE)?;
    let std_col = column(STD_DEV_PCT)?;
    let month_cols: Vec<(usize, &String)> = headers
        .iter()
        .enumerate()
        .filter(|(_, h)| is_month_label(h))
        .collect();

    let mut instruments = Vec::new();
    let mut rejected_rows = 0usize;

    for row in rdr.records() {
        let Ok(row) = row else {
            rejected_rows += 1;
            continue;
        };
        let cell = |i: usize| row.get(i).unwrap_or("");

        let ticker = cell(ticker_col);
        let price = parse_decimal(cell(price_col));
        let std_pct = parse_decimal(cell(std_col));
        let (Some(price), Some(std_pct)) = (price, std_pct) else {
            rejected_rows += 1;
            continue;
        };
        if ticker.is_empty() || price <= Decimal::ZERO {
            rejected_rows += 1;
            continue;
        }

        let mut history: Vec<PricePoint> = month_cols
            .iter()
            .map(|(i, label)| PricePoint::new(label.as_str(), parse_decimal(cell(*i))))
            .collect();
        order_history(&mut history);

        instruments.push(InstrumentRecord {
            ticker: ticker.to_string(),
            sector: cell(sector_col).to_string(),
            current_price: price,
            volatility: std_pct / dec!(100),
            history,
        });
    }

    Ok(LoadedUniverse {
        instruments,
        rejected_rows,
    })
}

fn parse_decimal(s: &str) -> Option<Decimal> {
    if s.is_empty() {
        return None;
    }
    s.parse::<Decimal>()
        .ok()
        .or_else(|| Decimal::from_scientific(s).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHORTLIST: &str = "\
Sector,Ticker,Current Price,Std Dev (%),2025-02,2025-01,Notes
IT,INFY,1500.5,22.5,1600,1580,core
Banking,HDFC,1650,18,,1700,
Energy,BAD,n/a,30,100,100,
Pharma,ZERO,0,25,10,10,
FMCG,,250,12,260,255,
Auto,TATA,900,abc,950,940,
";

    #[test]
    fn test_parses_valid_rows_and_counts_rejects() {
        let loaded = parse_universe(SHORTLIST.as_bytes()).unwrap();
        let tickers: Vec<&str> = loaded.instruments.iter().map(|i| i.ticker.as_str()).collect();
        assert_eq!(tickers, vec!["INFY", "HDFC"]);
        assert_eq!(loaded.rejected_rows, 4);
    }

    #[test]
    fn test_std_dev_percent_to_fraction() {
        let loaded = parse_universe(SHORTLIST.as_bytes()).unwrap();
        assert_eq!(loaded.instruments[0].volatility, dec!(0.225));
        assert_eq!(loaded.instruments[1].volatility, dec!(0.18));
    }

    #[test]
    fn test_months_ordered_with_gaps() {
        let loaded = parse_universe(SHORTLIST.as_bytes()).unwrap();
        let hdfc = &loaded.instruments[1];
        let labels: Vec<&str> = hdfc.history.iter().map(|p| p.month.as_str()).collect();
        assert_eq!(labels, vec!["2025-01", "2025-02"]);
        assert_eq!(hdfc.history[0].price, Some(dec!(1700)));
        assert_eq!(hdfc.history[1].price, None);
    }

    #[test]
    fn test_missing_required_column() {
        let csv = "Sector,Ticker,Std Dev (%)\nIT,INFY,20\n";
        assert!(parse_universe(csv.as_bytes()).is_err());
    }
}
