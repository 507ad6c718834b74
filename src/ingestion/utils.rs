//! Utility functions for cleaning and splitting raw CSV fields

use chrono::NaiveDate;

/// Parse a currency-ish amount, stripping $ signs and thousands separators
pub fn clean_amount(raw: &str) -> Option<f64> {
    let cleaned = raw.replace('$', "").replace(',', "");
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok()
}

/// Parse a sale date in DD/MM/YYYY format, falling back to ISO YYYY-MM-DD
pub fn parse_sale_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    NaiveDate::parse_from_str(trimmed, "%d/%m/%Y")
        .or_else(|_| NaiveDate::parse_from_str(trimmed, "%Y-%m-%d"))
        .ok()
}

/// Split a unit column like "#05-21" into (floor, stack)
pub fn parse_unit_field(raw: &str) -> Option<(u32, String)> {
    let trimmed = raw.trim().trim_start_matches('#');
    let (floor, stack) = trimmed.split_once('-')?;
    let floor = floor.trim().parse::<u32>().ok()?;
    let stack = stack.trim();
    if stack.is_empty() {
        return None;
    }
    Some((floor, stack.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_amount() {
        assert_eq!(clean_amount("$1,234,567"), Some(1_234_567.0));
        assert_eq!(clean_amount(" 850000 "), Some(850_000.0));
        assert_eq!(clean_amount("1234.50"), Some(1_234.5));
        assert_eq!(clean_amount(""), None);
        assert_eq!(clean_amount("n/a"), None);
    }

    #[test]
    fn test_parse_sale_date() {
        assert_eq!(
            parse_sale_date("25/12/2023"),
            Some(NaiveDate::from_ymd_opt(2023, 12, 25).unwrap())
        );
        assert_eq!(
            parse_sale_date("2023-12-25"),
            Some(NaiveDate::from_ymd_opt(2023, 12, 25).unwrap())
        );
        assert_eq!(parse_sale_date("invalid"), None);
    }

    #[test]
    fn test_parse_unit_field() {
        assert_eq!(parse_unit_field("#05-21"), Some((5, "21".to_string())));
        assert_eq!(parse_unit_field("12-03A"), Some((12, "03A".to_string())));
        assert_eq!(parse_unit_field(" #07-04 "), Some((7, "04".to_string())));
        assert_eq!(parse_unit_field("no-dash?"), None);
        assert_eq!(parse_unit_field("#xx-21"), None);
        assert_eq!(parse_unit_field("#05-"), None);
    }
}
