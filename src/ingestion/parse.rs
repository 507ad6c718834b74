//! Parse functions - transform normalized sales CSV into Transaction structs

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use tracing::{info, warn};

use crate::analytics::types::Transaction;
use crate::ingestion::utils::{clean_amount, parse_sale_date, parse_unit_field};

/// Sales CSV row structure
#[derive(Debug, Deserialize)]
struct SalesRow {
    #[serde(rename = "Block")]
    block: String,

    #[serde(rename = "Unit")]
    unit: String, // Format: #05-21

    #[serde(rename = "Sale Date")]
    sale_date: String, // Format: DD/MM/YYYY

    #[serde(rename = "Price")]
    price: String, // May carry $ and commas

    #[serde(rename = "Area (sqft)")]
    area_sqft: String,

    #[serde(rename = "Type")]
    unit_type: Option<String>,

    #[serde(rename = "PSF")]
    psf: Option<String>, // Cross-checked against price/area when present
}

/// Result of one CSV parse run: the validated rows plus a rejection count.
/// Rejected rows are dropped loudly (logged), never zero-filled.
#[derive(Debug)]
pub struct ParseOutcome {
    pub transactions: Vec<Transaction>,
    pub rejected: usize,
}

/// Parse a sales CSV into validated transactions.
///
/// Malformed rows fail per-record: they are counted and the first few are
/// logged, but one bad row never aborts the load and no field is ever
/// silently substituted.
pub fn parse_sales_csv(path: &Path) -> Result<ParseOutcome> {
    info!("Parsing sales CSV from {:?}", path);

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("opening sales CSV {:?}", path))?;

    let mut transactions = Vec::new();
    let mut rejected = 0;

    for (idx, result) in reader.deserialize::<SalesRow>().enumerate() {
        match result.map_err(anyhow::Error::from).and_then(parse_row) {
            Ok(tx) => transactions.push(tx),
            Err(e) => {
                rejected += 1;
                if rejected <= 10 {
                    // Only log first 10 rejections
                    warn!("Rejected row {}: {:#}", idx, e);
                }
            }
        }
    }

    info!(
        "Parsed {} transactions from sales CSV ({} rejected)",
        transactions.len(),
        rejected
    );

    Ok(ParseOutcome {
        transactions,
        rejected,
    })
}

fn parse_row(row: SalesRow) -> Result<Transaction> {
    let (floor, stack) =
        parse_unit_field(&row.unit).ok_or_else(|| anyhow!("bad unit field {:?}", row.unit))?;

    let sale_date = parse_sale_date(&row.sale_date)
        .ok_or_else(|| anyhow!("bad sale date {:?}", row.sale_date))?;

    let price =
        clean_amount(&row.price).ok_or_else(|| anyhow!("bad price {:?}", row.price))?;

    let area_sqft = clean_amount(&row.area_sqft)
        .ok_or_else(|| anyhow!("bad area {:?}", row.area_sqft))?;

    // An unparseable PSF column is treated as absent; a parseable one is
    // cross-checked by the Transaction constructor
    let supplied_psf = row.psf.as_deref().and_then(clean_amount);

    let unit_type = row
        .unit_type
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty());

    let tx = Transaction::new(
        row.block.trim().to_string(),
        stack,
        floor,
        sale_date,
        price,
        area_sqft,
        unit_type,
        supplied_psf,
    )?;
    Ok(tx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::types::Category;
    use std::io::Write;

    fn row(block: &str, unit: &str, date: &str, price: &str, area: &str) -> SalesRow {
        SalesRow {
            block: block.to_string(),
            unit: unit.to_string(),
            sale_date: date.to_string(),
            price: price.to_string(),
            area_sqft: area.to_string(),
            unit_type: Some("3BR".to_string()),
            psf: None,
        }
    }

    #[test]
    fn test_parse_row() {
        let tx = parse_row(row("10A", "#05-21", "15/06/2023", "$1,250,000", "1033")).unwrap();

        assert_eq!(tx.block, "10A");
        assert_eq!(tx.stack, "21");
        assert_eq!(tx.floor, 5);
        assert_eq!(tx.category, Category::Tower);
        assert!((tx.price - 1_250_000.0).abs() < 1e-9);
        assert!((tx.psf - 1_250_000.0 / 1_033.0).abs() < 1e-9);
        assert_eq!(tx.unit_type.as_deref(), Some("3BR"));
    }

    #[test]
    fn test_parse_row_rejects_garbage() {
        assert!(parse_row(row("10A", "#05-21", "15/06/2023", "TBC", "1033")).is_err());
        assert!(parse_row(row("10A", "penthouse", "15/06/2023", "$1", "1033")).is_err());
        assert!(parse_row(row("10A", "#05-21", "June 2023", "$1", "1033")).is_err());
        // Validation failures propagate too - zero price is not a sale
        assert!(parse_row(row("10A", "#05-21", "15/06/2023", "0", "1033")).is_err());
    }

    #[test]
    fn test_parse_row_cross_checks_psf() {
        let mut bad = row("10A", "#05-21", "15/06/2023", "$1,000,000", "1000");
        bad.psf = Some("1500".to_string());
        assert!(parse_row(bad).is_err());

        let mut good = row("10A", "#05-21", "15/06/2023", "$1,000,000", "1000");
        good.psf = Some("$1,000".to_string());
        let tx = parse_row(good).unwrap();
        assert!((tx.psf - 1_000.0).abs() < 1e-9);
    }

    #[test]
    fn test_parse_sales_csv_counts_rejections() {
        let dir = std::env::temp_dir();
        let path = dir.join("condo_analytics_parse_test.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "Block,Unit,Sale Date,Price,Area (sqft),Type,PSF").unwrap();
        writeln!(file, "10A,#05-21,15/06/2023,\"$1,250,000\",1033,3BR,").unwrap();
        writeln!(file, "10A,#06-21,01/07/2023,not-a-price,1033,3BR,").unwrap();
        writeln!(file, "2,#02-04,20/08/2023,880000,915,2BR,").unwrap();
        drop(file);

        let outcome = parse_sales_csv(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(outcome.transactions.len(), 2);
        assert_eq!(outcome.rejected, 1);
        assert_eq!(outcome.transactions[1].category, Category::LowRise);
    }
}
