//! Block category classifier

use crate::analytics::types::Category;

/// Classify a block identifier into its unit category.
///
/// Pattern rules run in a fixed priority order and the first match wins,
/// so identifiers that could match more than one rule resolve
/// deterministically:
///
/// 1. trailing `M` - maisonette blocks (duplex layouts)
/// 2. all-numeric identifier - the walk-up low-rise blocks, which carry
///    no tower letter
/// 3. leading letter - service structures (carpark, clubhouse annex)
/// 4. everything else, including unknown identifiers, defaults to the
///    tower category (the most populous class)
///
/// Total and idempotent: every input yields exactly one category.
pub fn classify(block: &str) -> Category {
    let id = block.trim().to_ascii_uppercase();

    if id.ends_with('M') {
        Category::Duplex
    } else if !id.is_empty() && id.chars().all(|c| c.is_ascii_digit()) {
        Category::LowRise
    } else if id.chars().next().is_some_and(|c| c.is_ascii_alphabetic()) {
        Category::Other
    } else {
        Category::Tower
    }
}
