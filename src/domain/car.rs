use std::{
    fmt,
    hash::{Hash, Hasher},
};

use chrono::{DateTime, Local, TimeDelta, Utc};
use non_empty_string::NonEmptyString;
use serde::{Deserialize, Serialize};

use crate::domain::Registration;

/// Format used whenever a parking timestamp is shown or saved, in local time.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Who a slot is reserved for, and who a car belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    /// Members of staff. Billed at the lower rate.
    Staff,
    /// Everyone else. Billed at the higher rate.
    Visitor,
}

impl Category {
    /// Maps an "is staff" answer onto a category.
    #[must_use]
    pub const fn from_staff_flag(is_staff: bool) -> Self {
        if is_staff { Self::Staff } else { Self::Visitor }
    }

    /// Returns `true` for [`Category::Staff`].
    #[must_use]
    pub const fn is_staff(self) -> bool {
        matches!(self, Self::Staff)
    }

    /// Human-readable label (`Staff` or `Visitor`).
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Staff => "Staff",
            Self::Visitor => "Visitor",
        }
    }

    /// Parses a label produced by [`Category::label`].
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "Staff" => Some(Self::Staff),
            "Visitor" => Some(Self::Visitor),
            _ => None,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.label())
    }
}

/// A vehicle, identified by its registration.
///
/// The parking timestamp is managed by the slot the car is parked in: it is
/// set when the car is parked and cleared when it leaves.
#[derive(Debug, Clone)]
pub struct Car {
    registration: Registration,
    owner: NonEmptyString,
    category: Category,
    parked_at: Option<DateTime<Utc>>,
}

impl Car {
    /// Creates a car that is not parked anywhere yet.
    #[must_use]
    pub const fn new(registration: Registration, owner: NonEmptyString, category: Category) -> Self {
        Self {
            registration,
            owner,
            category,
            parked_at: None,
        }
    }

    /// The car's registration number.
    #[must_use]
    pub const fn registration(&self) -> &Registration {
        &self.registration
    }

    /// Name of the car's owner.
    #[must_use]
    pub fn owner(&self) -> &str {
        self.owner.as_str()
    }

    /// Whether the car belongs to staff or a visitor.
    #[must_use]
    pub const fn category(&self) -> Category {
        self.category
    }

    /// Returns `true` if the car belongs to a member of staff.
    #[must_use]
    pub const fn is_staff(&self) -> bool {
        self.category.is_staff()
    }

    /// When the car was parked, if it currently is.
    #[must_use]
    pub const fn parked_at(&self) -> Option<DateTime<Utc>> {
        self.parked_at
    }

    pub(crate) fn set_parked_at(&mut self, at: DateTime<Utc>) {
        self.parked_at = Some(at);
    }

    pub(crate) fn clear_parked_at(&mut self) {
        self.parked_at = None;
    }

    /// The parking timestamp in local time, rendered with [`TIMESTAMP_FORMAT`].
    #[must_use]
    pub fn formatted_parked_at(&self) -> Option<String> {
        self.parked_at
            .map(|at| at.with_timezone(&Local).format(TIMESTAMP_FORMAT).to_string())
    }

    /// Time since the car was parked, or zero if it is not parked.
    #[must_use]
    pub fn elapsed(&self) -> TimeDelta {
        self.elapsed_at(Utc::now())
    }

    /// Time between parking and `now`.
    ///
    /// Zero if the car is not parked, or if `now` is before the parking time.
    #[must_use]
    pub fn elapsed_at(&self, now: DateTime<Utc>) -> TimeDelta {
        self.parked_at
            .map_or_else(TimeDelta::zero, |at| (now - at).max(TimeDelta::zero()))
    }
}

/// Formats a duration as `H hours M minutes S seconds`.
#[must_use]
pub fn format_elapsed(elapsed: TimeDelta) -> String {
    let hours = elapsed.num_hours();
    let minutes = elapsed.num_minutes() % 60;
    let seconds = elapsed.num_seconds() % 60;
    format!("{hours} hours {minutes} minutes {seconds} seconds")
}

impl PartialEq for Car {
    fn eq(&self, other: &Self) -> bool {
        self.registration == other.registration
    }
}

impl Eq for Car {}

impl Hash for Car {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.registration.hash(state);
    }
}

impl fmt::Display for Car {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Car[{}, Owner: {}, Type: {}]",
            self.registration, self.owner, self.category
        )
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn car(registration: &str, owner: &str, category: Category) -> Car {
        Car::new(
            registration.parse().unwrap(),
            NonEmptyString::new(owner.to_string()).unwrap(),
            category,
        )
    }

    #[test]
    fn identity_is_registration() {
        let a = car("A1234", "John", Category::Staff);
        let b = car("A1234", "Someone Else", Category::Visitor);
        let c = car("B1234", "John", Category::Staff);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn unparked_car_has_no_elapsed_time() {
        let car = car("A1234", "John", Category::Staff);
        assert_eq!(car.elapsed(), TimeDelta::zero());
        assert!(car.formatted_parked_at().is_none());
    }

    #[test]
    fn elapsed_is_measured_from_parking_time() {
        let mut car = car("A1234", "John", Category::Staff);
        let parked = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        car.set_parked_at(parked);

        let now = parked + TimeDelta::minutes(135);
        assert_eq!(car.elapsed_at(now), TimeDelta::minutes(135));
        assert_eq!(car.elapsed_at(parked - TimeDelta::hours(1)), TimeDelta::zero());
        let shown = parked.with_timezone(&Local).format(TIMESTAMP_FORMAT).to_string();
        assert_eq!(car.formatted_parked_at(), Some(shown));

        car.clear_parked_at();
        assert_eq!(car.elapsed_at(now), TimeDelta::zero());
    }

    #[test]
    fn display_matches_listing_format() {
        let car = car("A1234", "John", Category::Staff);
        assert_eq!(car.to_string(), "Car[A1234, Owner: John, Type: Staff]");
    }

    #[test]
    fn elapsed_formatting() {
        let elapsed = TimeDelta::seconds(2 * 3600 + 10 * 60 + 5);
        assert_eq!(format_elapsed(elapsed), "2 hours 10 minutes 5 seconds");
    }

    #[test]
    fn category_labels_round_trip() {
        for category in [Category::Staff, Category::Visitor] {
            assert_eq!(Category::from_label(category.label()), Some(category));
        }
        assert_eq!(Category::from_label("staff"), None);
        assert_eq!(Category::from_staff_flag(true), Category::Staff);
        assert!(!Category::from_staff_flag(false).is_staff());
    }
}
