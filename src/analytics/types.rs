//! Core data types for the analytics engine
//! Pure data structures with validated construction

use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;

use crate::analytics::classify::classify;

/// Relative tolerance when cross-checking a supplied PSF against price/area
const PSF_TOLERANCE: f64 = 0.01;

/// Unit categories derived from block identifier patterns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Tower,
    LowRise,
    Duplex,
    Other,
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Category::Tower => write!(f, "tower"),
            Category::LowRise => write!(f, "low_rise"),
            Category::Duplex => write!(f, "duplex"),
            Category::Other => write!(f, "other"),
        }
    }
}

/// Per-record validation failures, surfaced at the ingestion boundary.
/// A record that fails here is rejected outright - fields are never
/// zero-substituted.
#[derive(Debug, Error, PartialEq)]
pub enum MalformedRecord {
    #[error("sale price must be a positive amount, got {0}")]
    InvalidPrice(f64),
    #[error("floor area must be a positive amount, got {0}")]
    InvalidArea(f64),
    #[error("floor number must be 1 or higher")]
    InvalidFloor,
    #[error("supplied PSF {supplied} disagrees with price/area = {computed:.2}")]
    PsfMismatch { supplied: f64, computed: f64 },
}

/// Grouping key for a physical unit: (block, stack, floor)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct UnitKey {
    pub block: String,
    pub stack: String,
    pub floor: u32,
}

impl UnitKey {
    pub fn label(&self) -> String {
        format!("{} #{:02}-{}", self.block, self.floor, self.stack)
    }
}

/// One recorded sale - validated, strongly typed fields built once at the
/// ingestion boundary
#[derive(Debug, Clone, Serialize)]
pub struct Transaction {
    pub block: String,
    pub stack: String,
    pub floor: u32,
    pub sale_date: NaiveDate,
    pub price: f64,
    pub area_sqft: f64,
    /// Always recomputed as price / area, never taken from input
    pub psf: f64,
    pub unit_type: Option<String>,
    pub category: Category,
}

impl Transaction {
    /// Build a validated transaction. PSF is derived from price and area;
    /// when the input carries its own PSF column it is cross-checked within
    /// a rounding tolerance and the record is rejected on disagreement.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        block: String,
        stack: String,
        floor: u32,
        sale_date: NaiveDate,
        price: f64,
        area_sqft: f64,
        unit_type: Option<String>,
        supplied_psf: Option<f64>,
    ) -> Result<Self, MalformedRecord> {
        if !price.is_finite() || price <= 0.0 {
            return Err(MalformedRecord::InvalidPrice(price));
        }
        if !area_sqft.is_finite() || area_sqft <= 0.0 {
            return Err(MalformedRecord::InvalidArea(area_sqft));
        }
        if floor < 1 {
            return Err(MalformedRecord::InvalidFloor);
        }

        let psf = price / area_sqft;
        if let Some(supplied) = supplied_psf {
            if (supplied - psf).abs() > psf * PSF_TOLERANCE {
                return Err(MalformedRecord::PsfMismatch {
                    supplied,
                    computed: psf,
                });
            }
        }

        let category = classify(&block);

        Ok(Transaction {
            block,
            stack,
            floor,
            sale_date,
            price,
            area_sqft,
            psf,
            unit_type,
            category,
        })
    }

    pub fn unit_key(&self) -> UnitKey {
        UnitKey {
            block: self.block.clone(),
            stack: self.stack.clone(),
            floor: self.floor,
        }
    }

    /// Display label, e.g. "12A #05-21"
    pub fn unit_label(&self) -> String {
        format!("{} #{:02}-{}", self.block, self.floor, self.stack)
    }

    /// True when this transaction belongs to the given physical unit
    pub fn is_unit(&self, key: &UnitKey) -> bool {
        self.block == key.block && self.stack == key.stack && self.floor == key.floor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_psf_recomputed_from_price_and_area() {
        let tx = Transaction::new(
            "10A".to_string(),
            "03".to_string(),
            5,
            date(2021, 6, 15),
            1_200_000.0,
            1_000.0,
            None,
            None,
        )
        .unwrap();

        assert!((tx.psf - tx.price / tx.area_sqft).abs() < 1e-9);
        assert!((tx.psf - 1_200.0).abs() < 1e-9);
    }

    #[test]
    fn test_supplied_psf_within_tolerance_accepted() {
        // 1,203 vs computed 1,200 is inside the 1% tolerance
        let tx = Transaction::new(
            "10A".to_string(),
            "03".to_string(),
            5,
            date(2021, 6, 15),
            1_200_000.0,
            1_000.0,
            None,
            Some(1_203.0),
        )
        .unwrap();

        // Stored PSF is still the recomputed value, not the supplied one
        assert!((tx.psf - 1_200.0).abs() < 1e-9);
    }

    #[test]
    fn test_supplied_psf_mismatch_rejected() {
        let err = Transaction::new(
            "10A".to_string(),
            "03".to_string(),
            5,
            date(2021, 6, 15),
            1_200_000.0,
            1_000.0,
            None,
            Some(1_500.0),
        )
        .unwrap_err();

        assert!(matches!(err, MalformedRecord::PsfMismatch { .. }));
    }

    #[test]
    fn test_invalid_fields_rejected() {
        let bad_price = Transaction::new(
            "10A".into(),
            "03".into(),
            5,
            date(2021, 6, 15),
            0.0,
            1_000.0,
            None,
            None,
        );
        assert_eq!(bad_price.unwrap_err(), MalformedRecord::InvalidPrice(0.0));

        let bad_area = Transaction::new(
            "10A".into(),
            "03".into(),
            5,
            date(2021, 6, 15),
            1_000_000.0,
            -50.0,
            None,
            None,
        );
        assert_eq!(bad_area.unwrap_err(), MalformedRecord::InvalidArea(-50.0));

        let bad_floor = Transaction::new(
            "10A".into(),
            "03".into(),
            0,
            date(2021, 6, 15),
            1_000_000.0,
            1_000.0,
            None,
            None,
        );
        assert_eq!(bad_floor.unwrap_err(), MalformedRecord::InvalidFloor);
    }

    #[test]
    fn test_unit_label_format() {
        let tx = Transaction::new(
            "12A".to_string(),
            "21".to_string(),
            5,
            date(2022, 1, 1),
            800_000.0,
            650.0,
            None,
            None,
        )
        .unwrap();

        assert_eq!(tx.unit_label(), "12A #05-21");
        assert_eq!(tx.unit_key().label(), "12A #05-21");
    }
}
