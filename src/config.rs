//! Operational parameters for the analytics engine
//!
//! Regulatory tier values and valuation policy knobs live here, not in the
//! logic, so a jurisdiction or policy change is a configuration edit.

use std::path::Path;

use anyhow::Context;
use serde::Deserialize;
use tracing::info;

use crate::analytics::ssd::{ScheduleError, SsdSchedule, SsdTier};

/// Valuation and SSD policy, with defaults matching the current schedule
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    /// Comparable pool is capped to the most recent N transactions
    pub max_comparables: usize,
    /// Below this pool size the engine reports insufficient data
    pub min_comparables: usize,
    /// Floor adjustment is clamped to this fraction of the base PSF so a
    /// subject far outside the observed floor range cannot produce a
    /// pathological extrapolation
    pub floor_adjustment_cap: f64,
    /// Half-width of the uncertainty band around the point estimate
    pub valuation_band: f64,
    /// "Due shortly" window for the SSD urgency marker, in months
    pub ssd_short_window_months: u32,
    /// "Approaching" window for the SSD urgency marker, in months
    pub ssd_medium_window_months: u32,
    pub ssd_tiers: Vec<SsdTier>,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        AnalyticsConfig {
            max_comparables: 20,
            min_comparables: 3,
            floor_adjustment_cap: 0.25,
            valuation_band: 0.10,
            ssd_short_window_months: 3,
            ssd_medium_window_months: 6,
            ssd_tiers: default_ssd_tiers(),
        }
    }
}

impl AnalyticsConfig {
    /// Load policy overrides from a JSON file, or fall back to defaults
    /// when no path is given.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path)
                    .with_context(|| format!("reading policy file {:?}", path))?;
                let config: AnalyticsConfig = serde_json::from_str(&raw)
                    .with_context(|| format!("parsing policy file {:?}", path))?;
                info!("Loaded analytics policy from {:?}", path);
                Ok(config)
            }
            None => Ok(AnalyticsConfig::default()),
        }
    }

    /// Build the validated SSD schedule from the configured tier table
    pub fn schedule(&self) -> Result<SsdSchedule, ScheduleError> {
        SsdSchedule::new(
            self.ssd_tiers.clone(),
            self.ssd_short_window_months,
            self.ssd_medium_window_months,
        )
    }
}

/// Current seller-stamp-duty regime: 12/8/4% stepping down yearly, free
/// after three full years of holding
fn default_ssd_tiers() -> Vec<SsdTier> {
    vec![
        SsdTier {
            min_months: 0,
            max_months: Some(12),
            rate: 0.12,
            label: "1st year".to_string(),
            marker: "🔴".to_string(),
        },
        SsdTier {
            min_months: 12,
            max_months: Some(24),
            rate: 0.08,
            label: "2nd year".to_string(),
            marker: "🟠".to_string(),
        },
        SsdTier {
            min_months: 24,
            max_months: Some(36),
            rate: 0.04,
            label: "3rd year".to_string(),
            marker: "🟡".to_string(),
        },
        SsdTier {
            min_months: 36,
            max_months: None,
            rate: 0.0,
            label: "SSD-free".to_string(),
            marker: "🟢".to_string(),
        },
    ]
}
