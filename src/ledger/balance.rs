//! Cost and balance arithmetic
//!
//! Splits fuel cost over drivers by kilometers driven. Fuel price is the
//! average over recorded purchases, falling back to a configured default
//! until the first purchase exists.

use crate::config::LedgerSettings;

use super::{FuelPurchase, Ride};

/// Per-driver share of the ledger
#[derive(Debug, Clone, PartialEq)]
pub struct DriverBalance {
    /// Driver name
    pub driver: String,
    /// Kilometers driven
    pub km: f64,
    /// Fuel paid for (EUR)
    pub paid_eur: f64,
    /// Cost of the kilometers driven (EUR)
    pub usage_cost_eur: f64,
    /// Paid minus usage cost; negative means the driver owes
    pub balance_eur: f64,
}

/// Fleet-wide totals and per-driver balances
#[derive(Debug, Clone)]
pub struct BalanceSummary {
    /// Consumption used for the calculation (km per liter)
    pub km_per_liter: f64,
    /// Average fuel price over purchases, or the configured default (EUR/L)
    pub price_per_liter: f64,
    /// Derived cost of one kilometer (EUR)
    pub cost_per_km: f64,
    /// Kilometers driven, all drivers
    pub total_km: f64,
    /// Fuel paid, all drivers (EUR)
    pub total_paid_eur: f64,
    /// Liters bought, all drivers
    pub total_liters: f64,
    /// Calculated cost of all driven kilometers (EUR)
    pub total_cost_eur: f64,
    /// Per-driver breakdown, in configured order
    pub drivers: Vec<DriverBalance>,
}

/// Summarize the ledger
///
/// Drivers come from the settings; when none are configured, every name
/// appearing in the records is included in order of first appearance.
pub fn summarize(
    rides: &[Ride],
    purchases: &[FuelPurchase],
    settings: &LedgerSettings,
) -> BalanceSummary {
    let total_paid_eur: f64 = purchases.iter().map(|p| p.amount_eur).sum();
    let total_liters: f64 = purchases.iter().map(|p| p.liters).sum();

    let price_per_liter = if total_liters > 0.0 {
        total_paid_eur / total_liters
    } else {
        settings.default_fuel_price
    };
    let cost_per_km = price_per_liter / settings.km_per_liter;

    let mut names = settings.drivers.clone();
    if names.is_empty() {
        for name in rides
            .iter()
            .map(|r| r.driver.as_str())
            .chain(purchases.iter().map(|p| p.payer.as_str()))
        {
            if !names.iter().any(|n| n == name) {
                names.push(name.to_string());
            }
        }
    }

    let total_km: f64 = rides.iter().map(|r| r.distance_km).sum();

    let drivers = names
        .into_iter()
        .map(|driver| {
            let km: f64 = rides
                .iter()
                .filter(|r| r.driver == driver)
                .map(|r| r.distance_km)
                .sum();
            let paid_eur: f64 = purchases
                .iter()
                .filter(|p| p.payer == driver)
                .map(|p| p.amount_eur)
                .sum();
            let usage_cost_eur = km * cost_per_km;

            DriverBalance {
                driver,
                km,
                paid_eur,
                usage_cost_eur,
                balance_eur: paid_eur - usage_cost_eur,
            }
        })
        .collect();

    BalanceSummary {
        km_per_liter: settings.km_per_liter,
        price_per_liter,
        cost_per_km,
        total_km,
        total_paid_eur,
        total_liters,
        total_cost_eur: total_km * cost_per_km,
        drivers,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 14).unwrap()
    }

    fn ride(driver: &str, start: f64, end: f64) -> Ride {
        Ride::new(date(), driver, start, end, None).unwrap()
    }

    fn fuel(payer: &str, amount: f64, liters: f64) -> FuelPurchase {
        FuelPurchase::new(date(), payer, amount, liters).unwrap()
    }

    fn settings(drivers: &[&str]) -> LedgerSettings {
        LedgerSettings {
            drivers: drivers.iter().map(|d| d.to_string()).collect(),
            ..LedgerSettings::default()
        }
    }

    #[test]
    fn test_default_price_without_purchases() {
        let summary = summarize(&[ride("Roos", 0.0, 190.0)], &[], &settings(&["Roos"]));

        assert_eq!(summary.price_per_liter, 1.90);
        // 1.90 / 19 = 0.10 per km, 190 km -> 19.00
        assert!((summary.cost_per_km - 0.10).abs() < 1e-9);
        assert!((summary.total_cost_eur - 19.0).abs() < 1e-9);
    }

    #[test]
    fn test_average_price_from_purchases() {
        let purchases = vec![fuel("Roos", 60.0, 30.0), fuel("Meggy", 40.0, 20.0)];
        let summary = summarize(&[], &purchases, &settings(&["Roos", "Meggy"]));

        // 100 EUR / 50 L = 2.00 EUR/L
        assert!((summary.price_per_liter - 2.0).abs() < 1e-9);
        assert!((summary.total_paid_eur - 100.0).abs() < 1e-9);
        assert!((summary.total_liters - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_driver_balances() {
        let rides = vec![ride("Roos", 0.0, 190.0), ride("Meggy", 190.0, 380.0)];
        let purchases = vec![fuel("Roos", 38.0, 20.0)];
        let summary = summarize(&rides, &purchases, &settings(&["Roos", "Meggy"]));

        // 38 / 20 = 1.90 EUR/L -> 0.10 EUR/km; each drove 190 km = 19 EUR
        let roos = &summary.drivers[0];
        assert!((roos.balance_eur - 19.0).abs() < 1e-9);

        let meggy = &summary.drivers[1];
        assert!((meggy.balance_eur + 19.0).abs() < 1e-9);

        assert!((summary.total_km - 380.0).abs() < 1e-9);
    }

    #[test]
    fn test_unknown_driver_counts_toward_total_only() {
        let rides = vec![ride("Roos", 0.0, 100.0), ride("Gast", 100.0, 200.0)];
        let summary = summarize(&rides, &[], &settings(&["Roos"]));

        assert_eq!(summary.drivers.len(), 1);
        assert!((summary.total_km - 200.0).abs() < 1e-9);
    }

    #[test]
    fn test_drivers_derived_when_unconfigured() {
        let rides = vec![ride("Puck", 0.0, 50.0)];
        let purchases = vec![fuel("Pien", 20.0, 10.0)];
        let summary = summarize(&rides, &purchases, &settings(&[]));

        let names: Vec<&str> = summary.drivers.iter().map(|d| d.driver.as_str()).collect();
        assert_eq!(names, vec!["Puck", "Pien"]);
    }
}
