//! Seller stamp duty (SSD) schedule and status lookup
//! Tier values are operational parameters, never hard-coded in the logic

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Tier-table validation failures, raised when configuration is loaded
#[derive(Debug, Error, PartialEq)]
pub enum ScheduleError {
    #[error("schedule must contain at least one tier")]
    Empty,
    #[error("first tier must start at month 0, got {0}")]
    FirstTierStart(u32),
    #[error("tier upper bound {max} must exceed lower bound {min}")]
    EmptyTier { min: u32, max: u32 },
    #[error("expected a tier starting at month {expected}, got {got}")]
    NotContiguous { expected: u32, got: u32 },
    #[error("only the final tier may be unbounded")]
    UnboundedMidTable,
    #[error("final tier must be unbounded")]
    BoundedFinalTier,
    #[error("rates must not increase with holding time ({earlier} before {later})")]
    RateIncreases { earlier: f64, later: f64 },
    #[error("final tier rate must be zero, got {0}")]
    NonZeroTerminalRate(f64),
    #[error("rate {0} is not a valid fraction")]
    InvalidRate(f64),
}

/// One duty tier: a holding-month range, the rate charged inside it, and
/// its display fields
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SsdTier {
    pub min_months: u32,
    /// None marks the terminal, unbounded tier
    pub max_months: Option<u32>,
    /// Duty rate as a fraction of the sale price
    pub rate: f64,
    pub label: String,
    pub marker: String,
}

impl SsdTier {
    fn contains(&self, months: u32) -> bool {
        months >= self.min_months && self.max_months.map_or(true, |max| months < max)
    }
}

/// Coarse urgency classification used by opportunity scans
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SsdUrgency {
    AlreadyFree,
    /// Within the short window of the next step-down
    NearExpiry,
    /// Within the medium window of the next step-down
    Approaching,
    HighRate,
}

impl SsdUrgency {
    /// Scan ordering: most actionable first
    pub fn rank(&self) -> u8 {
        match self {
            SsdUrgency::NearExpiry => 0,
            SsdUrgency::Approaching => 1,
            SsdUrgency::HighRate => 2,
            SsdUrgency::AlreadyFree => 3,
        }
    }
}

/// Duty position of one transaction at a given as-of date
#[derive(Debug, Clone, Serialize)]
pub struct SsdStatus {
    pub rate: f64,
    pub label: String,
    pub marker: String,
    pub urgency: SsdUrgency,
    pub months_held: u32,
    /// Months until the holding period crosses into the next (lower-rate)
    /// tier; None once the terminal tier is reached
    pub months_to_next_tier: Option<u32>,
}

/// Ordered, validated tier table covering [0, ∞) with non-increasing rates
#[derive(Debug, Clone, Serialize)]
pub struct SsdSchedule {
    tiers: Vec<SsdTier>,
    short_window_months: u32,
    medium_window_months: u32,
}

impl SsdSchedule {
    /// Validate and build a schedule. Tiers must be contiguous and
    /// non-overlapping from month 0, rates must never increase with
    /// holding time, and the final tier must be unbounded at rate 0.
    pub fn new(
        tiers: Vec<SsdTier>,
        short_window_months: u32,
        medium_window_months: u32,
    ) -> Result<Self, ScheduleError> {
        let Some(first) = tiers.first() else {
            return Err(ScheduleError::Empty);
        };
        if first.min_months != 0 {
            return Err(ScheduleError::FirstTierStart(first.min_months));
        }

        let mut expected_start = 0u32;
        for (i, tier) in tiers.iter().enumerate() {
            if !tier.rate.is_finite() || tier.rate < 0.0 || tier.rate > 1.0 {
                return Err(ScheduleError::InvalidRate(tier.rate));
            }
            if tier.min_months != expected_start {
                return Err(ScheduleError::NotContiguous {
                    expected: expected_start,
                    got: tier.min_months,
                });
            }
            match tier.max_months {
                Some(max) if max <= tier.min_months => {
                    return Err(ScheduleError::EmptyTier {
                        min: tier.min_months,
                        max,
                    });
                }
                Some(max) => expected_start = max,
                None if i + 1 != tiers.len() => {
                    return Err(ScheduleError::UnboundedMidTable);
                }
                None => {}
            }
            if i > 0 && tier.rate > tiers[i - 1].rate {
                return Err(ScheduleError::RateIncreases {
                    earlier: tiers[i - 1].rate,
                    later: tier.rate,
                });
            }
        }

        let Some(last) = tiers.last() else {
            return Err(ScheduleError::Empty);
        };
        if last.max_months.is_some() {
            return Err(ScheduleError::BoundedFinalTier);
        }
        if last.rate != 0.0 {
            return Err(ScheduleError::NonZeroTerminalRate(last.rate));
        }

        Ok(SsdSchedule {
            tiers,
            short_window_months,
            medium_window_months,
        })
    }

    pub fn tiers(&self) -> &[SsdTier] {
        &self.tiers
    }

    /// Duty position for a sale held from `sale_date` to `as_of`.
    /// Pure, deterministic, total.
    pub fn status(&self, sale_date: NaiveDate, as_of: NaiveDate) -> SsdStatus {
        let months_held = months_between(sale_date, as_of);
        let tier = self
            .tiers
            .iter()
            .find(|t| t.contains(months_held))
            .expect("validated tier table covers every holding period");

        let months_to_next_tier = tier.max_months.map(|max| max - months_held);
        let urgency = if tier.rate == 0.0 {
            SsdUrgency::AlreadyFree
        } else {
            match months_to_next_tier {
                Some(m) if m <= self.short_window_months => SsdUrgency::NearExpiry,
                Some(m) if m <= self.medium_window_months => SsdUrgency::Approaching,
                _ => SsdUrgency::HighRate,
            }
        };

        SsdStatus {
            rate: tier.rate,
            label: tier.label.clone(),
            marker: tier.marker.clone(),
            urgency,
            months_held,
            months_to_next_tier,
        }
    }
}

/// Whole calendar months between two dates, truncating any partial month.
/// An `as_of` before the sale date clamps to zero.
fn months_between(from: NaiveDate, to: NaiveDate) -> u32 {
    if to <= from {
        return 0;
    }
    let mut months =
        (to.year() - from.year()) * 12 + to.month() as i32 - from.month() as i32;
    if to.day() < from.day() {
        months -= 1;
    }
    months.max(0) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn tier(min: u32, max: Option<u32>, rate: f64, label: &str) -> SsdTier {
        SsdTier {
            min_months: min,
            max_months: max,
            rate,
            label: label.to_string(),
            marker: String::new(),
        }
    }

    fn schedule() -> SsdSchedule {
        SsdSchedule::new(
            vec![
                tier(0, Some(12), 0.12, "1st year"),
                tier(12, Some(24), 0.08, "2nd year"),
                tier(24, Some(36), 0.04, "3rd year"),
                tier(36, None, 0.0, "SSD-free"),
            ],
            3,
            6,
        )
        .unwrap()
    }

    #[test]
    fn test_months_between_truncates_partial_months() {
        assert_eq!(months_between(date(2021, 1, 15), date(2021, 4, 14)), 2);
        assert_eq!(months_between(date(2021, 1, 15), date(2021, 4, 15)), 3);
        assert_eq!(months_between(date(2021, 1, 15), date(2021, 4, 16)), 3);
        assert_eq!(months_between(date(2021, 1, 15), date(2021, 1, 15)), 0);
        // as_of before the sale clamps to zero
        assert_eq!(months_between(date(2021, 1, 15), date(2020, 1, 15)), 0);
    }

    #[test]
    fn test_exactly_36_months_is_free() {
        let status = schedule().status(date(2021, 1, 15), date(2024, 1, 15));
        assert_eq!(status.months_held, 36);
        assert_eq!(status.rate, 0.0);
        assert_eq!(status.urgency, SsdUrgency::AlreadyFree);
        assert_eq!(status.months_to_next_tier, None);
    }

    #[test]
    fn test_34_months_is_last_paid_tier() {
        let status = schedule().status(date(2021, 3, 15), date(2024, 1, 15));
        assert_eq!(status.months_held, 34);
        assert!((status.rate - 0.04).abs() < 1e-12);
        assert_eq!(status.label, "3rd year");
        assert_eq!(status.months_to_next_tier, Some(2));
        assert_eq!(status.urgency, SsdUrgency::NearExpiry);
    }

    #[test]
    fn test_urgency_windows() {
        let sched = schedule();

        // 30 months held: 6 to the next tier, inside the medium window
        let status = sched.status(date(2021, 7, 15), date(2024, 1, 15));
        assert_eq!(status.months_held, 30);
        assert_eq!(status.urgency, SsdUrgency::Approaching);

        // 2 months held: deep inside the first tier
        let status = sched.status(date(2023, 11, 15), date(2024, 1, 15));
        assert_eq!(status.months_held, 2);
        assert!((status.rate - 0.12).abs() < 1e-12);
        assert_eq!(status.urgency, SsdUrgency::HighRate);

        // 10 months held: 2 to the next tier, but the next tier still
        // charges duty - urgency reflects the step-down, not freedom
        let status = sched.status(date(2023, 3, 15), date(2024, 1, 15));
        assert_eq!(status.months_held, 10);
        assert_eq!(status.urgency, SsdUrgency::NearExpiry);
    }

    #[test]
    fn test_future_sale_date_is_first_tier() {
        let status = schedule().status(date(2024, 6, 1), date(2024, 1, 15));
        assert_eq!(status.months_held, 0);
        assert!((status.rate - 0.12).abs() < 1e-12);
    }

    #[test]
    fn test_rejects_gap() {
        let err = SsdSchedule::new(
            vec![
                tier(0, Some(12), 0.12, "a"),
                tier(18, None, 0.0, "b"),
            ],
            3,
            6,
        )
        .unwrap_err();
        assert_eq!(
            err,
            ScheduleError::NotContiguous {
                expected: 12,
                got: 18
            }
        );
    }

    #[test]
    fn test_rejects_overlap() {
        let err = SsdSchedule::new(
            vec![
                tier(0, Some(12), 0.12, "a"),
                tier(6, None, 0.0, "b"),
            ],
            3,
            6,
        )
        .unwrap_err();
        assert!(matches!(err, ScheduleError::NotContiguous { .. }));
    }

    #[test]
    fn test_rejects_increasing_rate() {
        let err = SsdSchedule::new(
            vec![
                tier(0, Some(12), 0.04, "a"),
                tier(12, Some(24), 0.08, "b"),
                tier(24, None, 0.0, "c"),
            ],
            3,
            6,
        )
        .unwrap_err();
        assert!(matches!(err, ScheduleError::RateIncreases { .. }));
    }

    #[test]
    fn test_rejects_nonzero_terminal_rate() {
        let err = SsdSchedule::new(vec![tier(0, None, 0.04, "a")], 3, 6).unwrap_err();
        assert_eq!(err, ScheduleError::NonZeroTerminalRate(0.04));
    }

    #[test]
    fn test_rejects_bounded_final_tier() {
        let err = SsdSchedule::new(
            vec![
                tier(0, Some(12), 0.12, "a"),
                tier(12, Some(24), 0.0, "b"),
            ],
            3,
            6,
        )
        .unwrap_err();
        assert_eq!(err, ScheduleError::BoundedFinalTier);
    }

    #[test]
    fn test_rejects_unbounded_mid_table() {
        let err = SsdSchedule::new(
            vec![
                tier(0, None, 0.12, "a"),
                tier(12, None, 0.0, "b"),
            ],
            3,
            6,
        )
        .unwrap_err();
        assert_eq!(err, ScheduleError::UnboundedMidTable);
    }

    #[test]
    fn test_rejects_empty_schedule() {
        assert_eq!(
            SsdSchedule::new(vec![], 3, 6).unwrap_err(),
            ScheduleError::Empty
        );
    }
}
