//! Valuation, SSD, and resale analytics over a per-project snapshot

pub mod classify;
pub mod comps;
pub mod resale;
pub mod snapshot;
pub mod ssd;
pub mod types;
pub mod valuation;

pub use types::*;
