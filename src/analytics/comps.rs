//! Comparable selection and floor-premium estimation

use serde::Serialize;

use crate::analytics::snapshot::ProjectSnapshot;
use crate::analytics::types::{Category, Transaction, UnitKey};

/// Select valuation evidence for a subject unit: category-matched
/// transactions, most recent first, capped to keep the estimate responsive
/// to current conditions rather than decade-old prices.
///
/// The subject unit's own history is always excluded to avoid
/// self-reference bias. `block_filter` optionally restricts the pool to a
/// single block.
pub fn select_comparables<'a>(
    snapshot: &'a ProjectSnapshot,
    category: Category,
    block_filter: Option<&str>,
    exclude_unit: &UnitKey,
    cap: usize,
) -> Vec<&'a Transaction> {
    snapshot
        .category_transactions(category)
        .filter(|t| block_filter.map_or(true, |block| t.block == block))
        .filter(|t| !t.is_unit(exclude_unit))
        .take(cap)
        .collect()
}

/// Linear trend of PSF against floor level over a comparable pool
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FloorFit {
    /// PSF premium per floor
    pub slope: f64,
    pub mean_floor: f64,
    pub mean_psf: f64,
}

/// Ordinary least squares of PSF on floor number. The premium is estimated
/// from the pool itself, not assumed constant. A pool with zero floor
/// variance has no identifiable slope and yields a flat fit rather than a
/// numerical error.
pub fn fit_floor_premium(pool: &[&Transaction]) -> FloorFit {
    if pool.is_empty() {
        return FloorFit {
            slope: 0.0,
            mean_floor: 0.0,
            mean_psf: 0.0,
        };
    }

    let n = pool.len() as f64;
    let mean_floor = pool.iter().map(|t| t.floor as f64).sum::<f64>() / n;
    let mean_psf = pool.iter().map(|t| t.psf).sum::<f64>() / n;

    let sxx: f64 = pool
        .iter()
        .map(|t| (t.floor as f64 - mean_floor).powi(2))
        .sum();
    let slope = if sxx > f64::EPSILON {
        let sxy: f64 = pool
            .iter()
            .map(|t| (t.floor as f64 - mean_floor) * (t.psf - mean_psf))
            .sum();
        sxy / sxx
    } else {
        0.0
    };

    FloorFit {
        slope,
        mean_floor,
        mean_psf,
    }
}
