//! Vehicle rental pricing packages.

use super::Money;
use serde::{Deserialize, Serialize};

/// One billing scheme for a rented vehicle.
///
/// A vehicle may offer several packages at once (pay-per-minute,
/// bundle-with-included-time, …). The search tracks the running sub-prices
/// of *every* package of the current vehicle and treats the cheapest as
/// active, so the reported price is minimal for the realized usage no
/// matter which package a rider would have had to pick up front.
///
/// Sub-prices are always recomputed from *cumulative* usage, which makes
/// each package's running total monotonically non-decreasing while the
/// rental lasts. Only [`compute_final_price`](Self::compute_final_price)
/// may adjust the total at drop-off (minimum charge, price cap).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PricingPackage {
    /// Charged once when the rental begins (unlock fee plus any upfront
    /// package price).
    pub start_price: Money,
    /// Riding time included in the start price.
    pub free_seconds: u32,
    /// Charged per started minute beyond the included time.
    pub price_per_minute: Money,
    /// Charged per started kilometer.
    pub price_per_kilometer: Money,
    /// Minimum total charged at drop-off.
    pub final_minimum: Money,
    /// Cap on the total charged at drop-off, if any.
    pub price_cap: Option<Money>,
}

impl Default for PricingPackage {
    fn default() -> Self {
        PricingPackage {
            start_price: Money::ZERO,
            free_seconds: 0,
            price_per_minute: Money::ZERO,
            price_per_kilometer: Money::ZERO,
            final_minimum: Money::ZERO,
            price_cap: None,
        }
    }
}

impl PricingPackage {
    /// The price due the moment the rental begins.
    pub fn compute_start_price(&self) -> Money {
        self.start_price
    }

    /// The time-associated sub-price for `seconds` of cumulative riding.
    pub fn compute_time_price(&self, seconds: i64) -> Money {
        let billable = seconds - i64::from(self.free_seconds);
        if billable <= 0 {
            return Money::ZERO;
        }
        // Started minutes, i.e. ceil(billable / 60).
        let minutes = (billable + 59) / 60;
        self.price_per_minute * minutes
    }

    /// The distance-associated sub-price for `meters` of cumulative riding.
    pub fn compute_distance_price(&self, meters: f64) -> Money {
        if meters <= 0.0 {
            return Money::ZERO;
        }
        // Started kilometers.
        let kilometers = (meters / 1000.0).ceil() as i64;
        self.price_per_kilometer * kilometers
    }

    /// The total charged at drop-off, given the accumulated total.
    pub fn compute_final_price(&self, total: Money) -> Money {
        let with_minimum = total.max(self.final_minimum);
        match self.price_cap {
            Some(cap) => with_minimum.min(cap),
            None => with_minimum,
        }
    }
}
