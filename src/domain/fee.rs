//! Hourly fee calculation.
//!
//! Every strategy bills whole elapsed hours, truncated rather than rounded,
//! with a minimum charge of one hour.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{Car, Category};

/// Multiplier applied to the hourly rate by [`FeeStrategy::Weekend`].
pub const WEEKEND_DISCOUNT: f64 = 0.8;

/// Number of hours billed for a stay of `elapsed`.
///
/// Partial hours are dropped, and anything under an hour (including zero or
/// negative durations) bills one hour.
#[must_use]
pub fn billable_hours(elapsed: TimeDelta) -> u32 {
    let hours = elapsed.num_hours().max(1);
    u32::try_from(hours).unwrap_or(u32::MAX)
}

/// Hourly rates per slot category.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rates {
    /// Rate charged in staff slots.
    pub staff: f64,
    /// Rate charged in visitor slots.
    pub visitor: f64,
}

impl Rates {
    /// Staff 3.0 per hour, visitors 5.0 per hour.
    pub const STANDARD: Self = Self {
        staff: 3.0,
        visitor: 5.0,
    };

    /// The hourly rate for a category.
    #[must_use]
    pub const fn for_category(&self, category: Category) -> f64 {
        match category {
            Category::Staff => self.staff,
            Category::Visitor => self.visitor,
        }
    }
}

impl Default for Rates {
    fn default() -> Self {
        Self::STANDARD
    }
}

/// A pricing policy turning a parked duration into a fee.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FeeStrategy {
    /// Billable hours times the hourly rate.
    Standard {
        /// Price per hour.
        rate: f64,
    },
    /// As [`FeeStrategy::Standard`], discounted by [`WEEKEND_DISCOUNT`].
    Weekend {
        /// Undiscounted price per hour.
        rate: f64,
    },
    /// As [`FeeStrategy::Standard`], but never more than `max`.
    DailyMax {
        /// Price per hour.
        rate: f64,
        /// Upper bound on a single charge.
        max: f64,
    },
}

impl FeeStrategy {
    /// The fee for a stay of `elapsed`.
    #[must_use]
    pub fn fee(&self, elapsed: TimeDelta) -> f64 {
        let hours = f64::from(billable_hours(elapsed));
        match *self {
            Self::Standard { rate } => hours * rate,
            Self::Weekend { rate } => hours * rate * WEEKEND_DISCOUNT,
            Self::DailyMax { rate, max } => (hours * rate).min(max),
        }
    }

    /// The fee owed by `car` at `now`; zero if the car is not parked.
    #[must_use]
    pub fn fee_for(&self, car: &Car, now: DateTime<Utc>) -> f64 {
        if car.parked_at().is_none() {
            return 0.0;
        }
        self.fee(car.elapsed_at(now))
    }

    /// The effective price per hour after any discount.
    #[must_use]
    pub fn hourly_rate(&self) -> f64 {
        match *self {
            Self::Standard { rate } | Self::DailyMax { rate, .. } => rate,
            Self::Weekend { rate } => rate * WEEKEND_DISCOUNT,
        }
    }

    /// One-line summary for display.
    #[must_use]
    pub fn description(&self) -> String {
        match *self {
            Self::Standard { rate } => format!("Standard Rate: ${rate:.2}/hour"),
            Self::Weekend { .. } => {
                format!("Weekend Rate: ${:.2}/hour (20% off)", self.hourly_rate())
            }
            Self::DailyMax { rate, max } => {
                format!("Daily Max: ${rate:.2}/hour (max ${max:.2}/day)")
            }
        }
    }
}
