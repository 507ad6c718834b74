//! Offline market report - runs parse, snapshot, resale, and SSD scan stages

use anyhow::Result;
use chrono::Utc;
use condo_analytics::analytics::resale::{compute_resale_events, summarize_resales};
use condo_analytics::analytics::snapshot::ProjectSnapshot;
use condo_analytics::analytics::ssd::SsdUrgency;
use condo_analytics::analytics::valuation::{valuate, GainAnalysis};
use condo_analytics::config::AnalyticsConfig;
use condo_analytics::ingestion::parse_sales_csv;
use std::env;
use std::path::PathBuf;
use tracing::{info, warn};

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_target(false)
        .with_thread_ids(false)
        .with_level(true)
        .init();

    info!("Starting market report pipeline");

    // Load configuration from environment
    let config = Config::from_env();
    let analytics = AnalyticsConfig::load(config.policy_path.as_deref())?;
    let schedule = analytics.schedule()?;
    let as_of = Utc::now().date_naive();
    info!("Configuration loaded, reporting as of {}", as_of);

    // Step 1: Parse the sales CSV
    info!("Step 1/4: Parsing transaction data...");
    let outcome = parse_sales_csv(&config.data_csv)?;
    if outcome.rejected > 0 {
        warn!("{} rows rejected during parse", outcome.rejected);
    }
    info!("✓ Parsed {} transactions", outcome.transactions.len());

    // Step 2: Build the snapshot
    info!("Step 2/4: Building project snapshot...");
    let snapshot = ProjectSnapshot::build(outcome.transactions);
    info!(
        "✓ Snapshot ready: {} transactions across {} units",
        snapshot.len(),
        snapshot.units().len()
    );

    // Step 3: Resale performance
    info!("Step 3/4: Computing resale performance...");
    let events = compute_resale_events(&snapshot);
    let summary = summarize_resales(&events);
    info!("✓ {} resale events", summary.event_count);
    if let Some(avg_holding) = summary.avg_holding_years {
        info!("  average holding: {:.1} years", avg_holding);
    }
    if let Some(ratio) = summary.profit_ratio {
        info!("  profitable trades: {:.0}%", ratio * 100.0);
    }
    if let Some(rate) = summary.avg_annualized_return {
        info!("  average annualized return: {:.2}%", rate * 100.0);
    }
    if summary.non_computable > 0 {
        warn!(
            "  {} event(s) with zero elapsed time excluded from rate averages",
            summary.non_computable
        );
    }
    for slice in &summary.by_category {
        info!(
            "  {}: {} events, avg gain {:.0}, avg holding {:.1}y",
            slice.category, slice.event_count, slice.avg_gain, slice.avg_holding_years
        );
    }

    // Step 4: SSD opportunity scan over each unit's latest transaction
    info!("Step 4/4: Scanning SSD positions...");
    let mut scan: Vec<_> = snapshot
        .latest_per_unit()
        .into_iter()
        .map(|(unit, tx)| (unit, tx, schedule.status(tx.sale_date, as_of)))
        .collect();
    scan.sort_by_key(|(_, _, status)| {
        (
            status.urgency.rank(),
            status.months_to_next_tier.unwrap_or(u32::MAX),
        )
    });

    let free = scan
        .iter()
        .filter(|(_, _, s)| s.urgency == SsdUrgency::AlreadyFree)
        .count();
    info!("✓ {} units scanned, {} already SSD-free", scan.len(), free);

    for (unit, tx, status) in scan
        .iter()
        .filter(|(_, _, s)| s.urgency == SsdUrgency::NearExpiry)
    {
        let months = status.months_to_next_tier.unwrap_or(0);
        info!(
            "  {} {} held {} months - steps down in {} month(s) (last sale {})",
            status.marker,
            unit.label(),
            status.months_held,
            months,
            tx.sale_date
        );

        // Valuation sweep for units about to step down a tier
        match valuate(
            &snapshot,
            &analytics,
            &schedule,
            &unit.block,
            &unit.stack,
            unit.floor,
            as_of,
        ) {
            Ok(valuation) => {
                if let Some(GainAnalysis::Realized { net_gain, ssd_cost, .. }) = valuation.gain {
                    info!(
                        "    estimate {:.0} ({:.0}-{:.0}), net gain after SSD {:.0} (duty {:.0})",
                        valuation.estimate,
                        valuation.band_low,
                        valuation.band_high,
                        net_gain,
                        ssd_cost
                    );
                }
            }
            Err(e) => {
                info!("    no valuation: {}", e);
            }
        }
    }

    info!("Market report complete");

    Ok(())
}

/// Configuration loaded from environment variables
#[derive(Debug, Clone)]
struct Config {
    data_csv: PathBuf,
    policy_path: Option<PathBuf>,
}

impl Config {
    fn from_env() -> Self {
        Config {
            data_csv: env::var("DATA_CSV")
                .unwrap_or_else(|_| "data/transactions.csv".to_string())
                .into(),

            policy_path: env::var("POLICY_PATH").ok().map(PathBuf::from),
        }
    }
}
