//! Ledger records
//!
//! Rides and fuel purchases for one shared vehicle. The odometer scan
//! subsystem fills ride end readings; everything here is plain bookkeeping.

pub mod balance;

use anyhow::{bail, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One recorded ride
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ride {
    /// Storage id; assigned on insert
    pub id: i64,
    /// Day of the ride
    pub date: NaiveDate,
    /// Who drove
    pub driver: String,
    /// Odometer at departure (km)
    pub start_km: f64,
    /// Odometer at arrival (km)
    pub end_km: f64,
    /// Distance driven, rounded to 0.1 km
    pub distance_km: f64,
    /// Free-form note
    pub description: Option<String>,
}

impl Ride {
    /// Create a ride from odometer readings
    ///
    /// The end reading must not be below the start reading.
    pub fn new(
        date: NaiveDate,
        driver: impl Into<String>,
        start_km: f64,
        end_km: f64,
        description: Option<String>,
    ) -> Result<Self> {
        if end_km < start_km {
            bail!(
                "end reading {} is below start reading {}",
                end_km,
                start_km
            );
        }

        Ok(Self {
            id: 0,
            date,
            driver: driver.into(),
            start_km,
            end_km,
            distance_km: round_tenth(end_km - start_km),
            description,
        })
    }
}

/// One fuel purchase
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FuelPurchase {
    /// Storage id; assigned on insert
    pub id: i64,
    /// Day of the purchase
    pub date: NaiveDate,
    /// Who paid
    pub payer: String,
    /// Amount paid (EUR)
    pub amount_eur: f64,
    /// Liters bought
    pub liters: f64,
}

impl FuelPurchase {
    /// Create a fuel purchase record
    pub fn new(date: NaiveDate, payer: impl Into<String>, amount_eur: f64, liters: f64) -> Result<Self> {
        if amount_eur <= 0.0 || liters <= 0.0 {
            bail!("amount and liters must be positive");
        }

        Ok(Self {
            id: 0,
            date,
            payer: payer.into(),
            amount_eur,
            liters,
        })
    }
}

fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 14).unwrap()
    }

    #[test]
    fn test_ride_distance_rounded() {
        let ride = Ride::new(date(), "Roos", 4521.0, 4543.25, None).unwrap();
        assert_eq!(ride.distance_km, 22.3);
    }

    #[test]
    fn test_ride_rejects_decreasing_odometer() {
        assert!(Ride::new(date(), "Roos", 4600.0, 4521.0, None).is_err());
    }

    #[test]
    fn test_ride_zero_distance_allowed() {
        let ride = Ride::new(date(), "Puck", 4600.0, 4600.0, None).unwrap();
        assert_eq!(ride.distance_km, 0.0);
    }

    #[test]
    fn test_fuel_purchase_requires_positive_values() {
        assert!(FuelPurchase::new(date(), "Pien", 0.0, 30.0).is_err());
        assert!(FuelPurchase::new(date(), "Pien", 55.0, -1.0).is_err());
        assert!(FuelPurchase::new(date(), "Pien", 55.0, 30.0).is_ok());
    }
}
