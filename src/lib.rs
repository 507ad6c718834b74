// Library module for the valuation/analytics core and its collaborators

pub mod analytics;
pub mod config;
pub mod ingestion;
pub mod registry;

/// Compound annualized return between a buy and a sell price
/// Formula: (sell / buy)^(1 / years) − 1
///
/// Returns None when the holding period is not positive, since the
/// compound rate is undefined for a same-day flip.
pub fn annualized_return(buy_price: f64, sell_price: f64, holding_years: f64) -> Option<f64> {
    if holding_years <= 0.0 || buy_price <= 0.0 {
        return None;
    }
    Some((sell_price / buy_price).powf(1.0 / holding_years) - 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_annualized_return_doubling() {
        // Doubling over two years is ~41.4% per year
        let rate = annualized_return(100.0, 200.0, 2.0).unwrap();
        assert!((rate - 0.4142).abs() < 0.001);
    }

    #[test]
    fn test_annualized_return_flat() {
        let rate = annualized_return(500_000.0, 500_000.0, 3.0).unwrap();
        assert!(rate.abs() < 1e-12);
    }

    #[test]
    fn test_annualized_return_loss() {
        // Selling at a loss gives a negative compound rate
        let rate = annualized_return(1_000_000.0, 810_000.0, 2.0).unwrap();
        assert!((rate - (-0.1)).abs() < 1e-9);
    }

    #[test]
    fn test_annualized_return_zero_holding() {
        // Same-day resale has no defined compound rate
        assert!(annualized_return(100.0, 150.0, 0.0).is_none());
    }

    #[test]
    fn test_annualized_return_negative_holding() {
        assert!(annualized_return(100.0, 150.0, -1.0).is_none());
    }
}
