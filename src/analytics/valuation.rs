//! Valuation engine - comparable pool statistics plus floor adjustment

use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::analytics::classify::classify;
use crate::analytics::comps::{fit_floor_premium, select_comparables};
use crate::analytics::snapshot::ProjectSnapshot;
use crate::analytics::ssd::SsdSchedule;
use crate::analytics::types::{Category, UnitKey};
use crate::config::AnalyticsConfig;

/// Typed "cannot value" outcomes. Recoverable and distinct from malformed
/// input: callers render these, they never crash on them.
#[derive(Debug, Error, PartialEq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum InsufficientData {
    #[error("no recorded floor area for stack {block}-{stack}")]
    UnknownArea { block: String, stack: String },
    #[error("only {found} comparable sales available, need at least {required}")]
    TooFewComparables { found: usize, required: usize },
}

/// A pool entry annotated with its floor-adjusted PSF, normalized to the
/// subject's floor for display and audit
#[derive(Debug, Clone, Serialize)]
pub struct AdjustedComparable {
    pub unit_label: String,
    pub sale_date: NaiveDate,
    pub price: f64,
    pub area_sqft: f64,
    pub floor: u32,
    pub psf: f64,
    pub adjusted_psf: f64,
}

/// Investment outcome attached to a valuation. Realized when the unit has
/// a prior transaction; otherwise simulated against the category's
/// earliest-year average PSF and tagged as such.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "basis", rename_all = "snake_case")]
pub enum GainAnalysis {
    Realized {
        last_sale_date: NaiveDate,
        last_sale_price: f64,
        gross_gain: f64,
        ssd_rate: f64,
        ssd_cost: f64,
        net_gain: f64,
    },
    Simulated {
        reference_year: i32,
        baseline_psf: f64,
        assumed_cost: f64,
        gross_gain: f64,
        ssd_rate: f64,
        ssd_cost: f64,
        net_gain: f64,
    },
}

/// Point estimate with its evidence and uncertainty envelope
#[derive(Debug, Clone, Serialize)]
pub struct Valuation {
    pub block: String,
    pub stack: String,
    pub floor: u32,
    pub unit_label: String,
    pub category: Category,
    pub area_sqft: f64,
    /// Mean PSF of the comparable pool
    pub base_psf: f64,
    /// Fitted PSF premium per floor
    pub premium_per_floor: f64,
    /// Subject floor minus the pool's mean floor
    pub floor_difference: f64,
    pub adjusted_psf: f64,
    pub estimate: f64,
    pub band_low: f64,
    pub band_high: f64,
    pub comparables: Vec<AdjustedComparable>,
    pub gain: Option<GainAnalysis>,
}

/// Value a unit from comparable evidence.
///
/// Resolves the subject's area from its stack history, selects a
/// category-matched pool (excluding the subject's own transactions), fits
/// the floor premium, and prices the unit at the pool's mean PSF adjusted
/// for the subject's floor offset. The adjustment is clamped to a
/// configured fraction of the base PSF.
pub fn valuate(
    snapshot: &ProjectSnapshot,
    config: &AnalyticsConfig,
    schedule: &SsdSchedule,
    block: &str,
    stack: &str,
    floor: u32,
    as_of: NaiveDate,
) -> Result<Valuation, InsufficientData> {
    let area_sqft = snapshot.stack_area_mode(block, stack).ok_or_else(|| {
        InsufficientData::UnknownArea {
            block: block.to_string(),
            stack: stack.to_string(),
        }
    })?;

    let category = classify(block);
    let subject = UnitKey {
        block: block.to_string(),
        stack: stack.to_string(),
        floor,
    };

    let pool = select_comparables(snapshot, category, None, &subject, config.max_comparables);
    if pool.len() < config.min_comparables {
        return Err(InsufficientData::TooFewComparables {
            found: pool.len(),
            required: config.min_comparables,
        });
    }

    let fit = fit_floor_premium(&pool);
    let floor_difference = floor as f64 - fit.mean_floor;
    let cap = config.floor_adjustment_cap * fit.mean_psf;
    let adjustment = (fit.slope * floor_difference).clamp(-cap, cap);
    let adjusted_psf = fit.mean_psf + adjustment;
    let estimate = adjusted_psf * area_sqft;

    debug!(
        "Valued {} at {:.0} ({} comps, slope {:.2}, floor diff {:.1})",
        subject.label(),
        estimate,
        pool.len(),
        fit.slope,
        floor_difference
    );

    let comparables = pool
        .iter()
        .map(|t| AdjustedComparable {
            unit_label: t.unit_label(),
            sale_date: t.sale_date,
            price: t.price,
            area_sqft: t.area_sqft,
            floor: t.floor,
            psf: t.psf,
            adjusted_psf: t.psf + fit.slope * (floor as f64 - t.floor as f64),
        })
        .collect();

    let gain = gain_analysis(snapshot, schedule, &subject, category, estimate, area_sqft, as_of);

    Ok(Valuation {
        block: block.to_string(),
        stack: stack.to_string(),
        floor,
        unit_label: subject.label(),
        category,
        area_sqft,
        base_psf: fit.mean_psf,
        premium_per_floor: fit.slope,
        floor_difference,
        adjusted_psf,
        estimate,
        band_low: estimate * (1.0 - config.valuation_band),
        band_high: estimate * (1.0 + config.valuation_band),
        comparables,
        gain,
    })
}

/// Realized gain against the unit's own last transaction, or a simulated
/// gain anchored to the category's earliest-year average PSF when the unit
/// has never transacted.
fn gain_analysis(
    snapshot: &ProjectSnapshot,
    schedule: &SsdSchedule,
    subject: &UnitKey,
    category: Category,
    estimate: f64,
    area_sqft: f64,
    as_of: NaiveDate,
) -> Option<GainAnalysis> {
    let history = snapshot.unit_history(subject);

    if let Some(last) = history.last() {
        let status = schedule.status(last.sale_date, as_of);
        let gross_gain = estimate - last.price;
        let ssd_cost = estimate * status.rate;
        return Some(GainAnalysis::Realized {
            last_sale_date: last.sale_date,
            last_sale_price: last.price,
            gross_gain,
            ssd_rate: status.rate,
            ssd_cost,
            net_gain: gross_gain - ssd_cost,
        });
    }

    let (reference_year, baseline_psf) = snapshot.category_baseline_psf(category)?;
    let anchor = NaiveDate::from_ymd_opt(reference_year, 1, 1)?;
    let status = schedule.status(anchor, as_of);
    let assumed_cost = baseline_psf * area_sqft;
    let gross_gain = estimate - assumed_cost;
    let ssd_cost = estimate * status.rate;
    Some(GainAnalysis::Simulated {
        reference_year,
        baseline_psf,
        assumed_cost,
        gross_gain,
        ssd_rate: status.rate,
        ssd_cost,
        net_gain: gross_gain - ssd_cost,
    })
}
