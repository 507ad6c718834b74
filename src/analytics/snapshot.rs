//! Immutable per-project transaction view
//! Built once per data load; safe to read concurrently, replaced wholesale

use std::collections::HashMap;

use chrono::Datelike;

use crate::analytics::types::{Category, Transaction, UnitKey};

/// Validated snapshot of one project's transactions, indexed for fast
/// grouping by unit and by category.
///
/// Nothing here mutates after `build`; a data reload produces a fresh
/// snapshot that callers swap in atomically.
#[derive(Debug)]
pub struct ProjectSnapshot {
    /// All transactions, sale date ascending
    transactions: Vec<Transaction>,
    /// Indices into `transactions`, date-ascending within each unit
    by_unit: HashMap<UnitKey, Vec<usize>>,
    /// Indices into `transactions`, date-ascending within each category
    by_category: HashMap<Category, Vec<usize>>,
}

impl ProjectSnapshot {
    pub fn build(mut transactions: Vec<Transaction>) -> Self {
        transactions.sort_by(|a, b| {
            a.sale_date
                .cmp(&b.sale_date)
                .then_with(|| a.block.cmp(&b.block))
                .then_with(|| a.stack.cmp(&b.stack))
                .then_with(|| a.floor.cmp(&b.floor))
        });

        let mut by_unit: HashMap<UnitKey, Vec<usize>> = HashMap::new();
        let mut by_category: HashMap<Category, Vec<usize>> = HashMap::new();

        for (idx, tx) in transactions.iter().enumerate() {
            by_unit.entry(tx.unit_key()).or_default().push(idx);
            by_category.entry(tx.category).or_default().push(idx);
        }

        ProjectSnapshot {
            transactions,
            by_unit,
            by_category,
        }
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    /// All transactions, sale date ascending
    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    /// Every physical unit seen in the data, in (block, stack, floor) order
    pub fn units(&self) -> Vec<&UnitKey> {
        let mut units: Vec<&UnitKey> = self.by_unit.keys().collect();
        units.sort();
        units
    }

    /// Transaction history for one unit, sale date ascending
    pub fn unit_history(&self, unit: &UnitKey) -> Vec<&Transaction> {
        self.by_unit
            .get(unit)
            .into_iter()
            .flatten()
            .map(|&i| &self.transactions[i])
            .collect()
    }

    /// Transactions of a category, most recent first
    pub fn category_transactions(
        &self,
        category: Category,
    ) -> impl Iterator<Item = &Transaction> + '_ {
        self.by_category
            .get(&category)
            .into_iter()
            .flatten()
            .rev()
            .map(|&i| &self.transactions[i])
    }

    /// Each unit paired with its most recent transaction, in unit order
    pub fn latest_per_unit(&self) -> Vec<(&UnitKey, &Transaction)> {
        let mut rows: Vec<(&UnitKey, &Transaction)> = self
            .by_unit
            .iter()
            .filter_map(|(unit, idxs)| {
                idxs.last().map(|&i| (unit, &self.transactions[i]))
            })
            .collect();
        rows.sort_by(|a, b| a.0.cmp(b.0));
        rows
    }

    /// Most frequent recorded floor area for a (block, stack) column.
    /// Unit layouts are discrete and repeat exactly across a stack, so the
    /// mode is the right resolver where a mean would blur distinct layouts.
    pub fn stack_area_mode(&self, block: &str, stack: &str) -> Option<f64> {
        let mut counts: HashMap<u64, (usize, f64)> = HashMap::new();
        for tx in self
            .transactions
            .iter()
            .filter(|t| t.block == block && t.stack == stack)
        {
            let entry = counts
                .entry(tx.area_sqft.to_bits())
                .or_insert((0, tx.area_sqft));
            entry.0 += 1;
        }

        // Tie-break on the smaller area so the result is deterministic
        counts
            .into_values()
            .max_by(|a, b| a.0.cmp(&b.0).then_with(|| b.1.total_cmp(&a.1)))
            .map(|(_, area)| area)
    }

    /// First calendar year in which a category transacted, with the mean
    /// PSF over that year. Used as the synthetic acquisition baseline for
    /// simulated-gain analysis.
    pub fn category_baseline_psf(&self, category: Category) -> Option<(i32, f64)> {
        let first_year = self
            .by_category
            .get(&category)?
            .first()
            .map(|&i| self.transactions[i].sale_date.year())?;

        let psfs: Vec<f64> = self
            .by_category
            .get(&category)
            .into_iter()
            .flatten()
            .map(|&i| &self.transactions[i])
            .take_while(|t| t.sale_date.year() == first_year)
            .map(|t| t.psf)
            .collect();

        if psfs.is_empty() {
            return None;
        }
        Some((first_year, psfs.iter().sum::<f64>() / psfs.len() as f64))
    }
}
