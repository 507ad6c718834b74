//! Resale metrics - one event per consecutive transaction pair of a unit

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::debug;

use crate::analytics::snapshot::ProjectSnapshot;
use crate::analytics::types::{Category, UnitKey};
use crate::annualized_return;

/// One buy-then-sell cycle for a single physical unit
#[derive(Debug, Clone, Serialize)]
pub struct ResaleEvent {
    pub unit: UnitKey,
    pub unit_label: String,
    pub category: Category,
    pub buy_date: NaiveDate,
    pub buy_price: f64,
    pub sell_date: NaiveDate,
    pub sell_price: f64,
    pub holding_years: f64,
    pub gain: f64,
    /// None when the pair has zero elapsed time - the event stays in the
    /// list for audit but is excluded from rate aggregates
    pub annualized_return: Option<f64>,
}

/// Emit one event per chronologically adjacent transaction pair of each
/// unit. Units with fewer than two transactions emit nothing, and no
/// transitive event is ever produced across non-adjacent transactions.
pub fn compute_resale_events(snapshot: &ProjectSnapshot) -> Vec<ResaleEvent> {
    let mut events = Vec::new();

    for unit in snapshot.units() {
        let history = snapshot.unit_history(unit);
        for pair in history.windows(2) {
            let (buy, sell) = (pair[0], pair[1]);
            let holding_days = (sell.sale_date - buy.sale_date).num_days();
            let holding_years = holding_days as f64 / 365.25;
            let rate = annualized_return(buy.price, sell.price, holding_years);

            if rate.is_none() {
                debug!(
                    "Zero holding period for {} ({} -> {}), flagging event as non-computable",
                    buy.unit_label(),
                    buy.sale_date,
                    sell.sale_date
                );
            }

            events.push(ResaleEvent {
                unit: unit.clone(),
                unit_label: buy.unit_label(),
                category: buy.category,
                buy_date: buy.sale_date,
                buy_price: buy.price,
                sell_date: sell.sale_date,
                sell_price: sell.price,
                holding_years,
                gain: sell.price - buy.price,
                annualized_return: rate,
            });
        }
    }

    events
}

/// Per-category slice of the resale summary
#[derive(Debug, Clone, Serialize)]
pub struct CategoryResales {
    pub category: Category,
    pub event_count: usize,
    pub avg_gain: f64,
    pub avg_holding_years: f64,
}

/// Aggregate statistics over a set of resale events
#[derive(Debug, Clone, Serialize)]
pub struct ResaleSummary {
    pub event_count: usize,
    /// Events whose annualized return is undefined (zero elapsed time)
    pub non_computable: usize,
    pub profitable: usize,
    pub avg_holding_years: Option<f64>,
    /// Share of events that closed at a gain
    pub profit_ratio: Option<f64>,
    /// Mean compound rate over computable events only
    pub avg_annualized_return: Option<f64>,
    pub by_category: Vec<CategoryResales>,
}

pub fn summarize_resales(events: &[ResaleEvent]) -> ResaleSummary {
    let event_count = events.len();
    let non_computable = events
        .iter()
        .filter(|e| e.annualized_return.is_none())
        .count();
    let profitable = events.iter().filter(|e| e.gain > 0.0).count();

    let avg_holding_years = (event_count > 0).then(|| {
        events.iter().map(|e| e.holding_years).sum::<f64>() / event_count as f64
    });
    let profit_ratio = (event_count > 0).then(|| profitable as f64 / event_count as f64);

    let rates: Vec<f64> = events.iter().filter_map(|e| e.annualized_return).collect();
    let avg_annualized_return =
        (!rates.is_empty()).then(|| rates.iter().sum::<f64>() / rates.len() as f64);

    let mut grouped: HashMap<Category, Vec<&ResaleEvent>> = HashMap::new();
    for event in events {
        grouped.entry(event.category).or_default().push(event);
    }
    let mut by_category: Vec<CategoryResales> = grouped
        .into_iter()
        .map(|(category, evs)| {
            let n = evs.len() as f64;
            CategoryResales {
                category,
                event_count: evs.len(),
                avg_gain: evs.iter().map(|e| e.gain).sum::<f64>() / n,
                avg_holding_years: evs.iter().map(|e| e.holding_years).sum::<f64>() / n,
            }
        })
        .collect();
    by_category.sort_by(|a, b| {
        b.event_count
            .cmp(&a.event_count)
            .then_with(|| a.category.to_string().cmp(&b.category.to_string()))
    });

    ResaleSummary {
        event_count,
        non_computable,
        profitable,
        avg_holding_years,
        profit_ratio,
        avg_annualized_return,
        by_category,
    }
}
