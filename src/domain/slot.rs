use std::fmt;

use chrono::{DateTime, Utc};

use crate::domain::{Car, Category, FeeStrategy, ParkingError, Rates, SlotId};

/// A parking space.
///
/// A slot is either empty or holds exactly one car, and that car's
/// [`Category`] always equals the slot's.
#[derive(Debug, Clone)]
pub struct Slot {
    id: SlotId,
    category: Category,
    hourly_rate: f64,
    car: Option<Car>,
}

impl Slot {
    /// Creates an empty slot billed at the standard rate for its category.
    #[must_use]
    pub const fn new(id: SlotId, category: Category) -> Self {
        Self::with_rates(id, category, &Rates::STANDARD)
    }

    /// Creates an empty slot billed at `rates` for its category.
    #[must_use]
    pub const fn with_rates(id: SlotId, category: Category, rates: &Rates) -> Self {
        Self {
            id,
            category,
            hourly_rate: rates.for_category(category),
            car: None,
        }
    }

    /// Creates an empty staff slot.
    ///
    /// # Errors
    ///
    /// Returns [`ParkingError::InvalidSlotId`] if `id` is malformed.
    pub fn staff(id: &str) -> Result<Self, ParkingError> {
        Ok(Self::new(id.parse()?, Category::Staff))
    }

    /// Creates an empty visitor slot.
    ///
    /// # Errors
    ///
    /// Returns [`ParkingError::InvalidSlotId`] if `id` is malformed.
    pub fn visitor(id: &str) -> Result<Self, ParkingError> {
        Ok(Self::new(id.parse()?, Category::Visitor))
    }

    /// Picks the category from the ID prefix where it is unambiguous.
    ///
    /// `S..` is always staff and `V..` always visitor; any other prefix
    /// takes `fallback`.
    #[must_use]
    pub fn inferred_category(id: &SlotId, fallback: Category) -> Category {
        match id.prefix() {
            'S' => Category::Staff,
            'V' => Category::Visitor,
            _ => fallback,
        }
    }

    /// The slot's identifier.
    #[must_use]
    pub const fn id(&self) -> &SlotId {
        &self.id
    }

    /// Who may park here.
    #[must_use]
    pub const fn category(&self) -> Category {
        self.category
    }

    /// Price per started hour (minimum one hour).
    #[must_use]
    pub const fn hourly_rate(&self) -> f64 {
        self.hourly_rate
    }

    /// The car currently parked here.
    #[must_use]
    pub const fn car(&self) -> Option<&Car> {
        self.car.as_ref()
    }

    /// Returns `true` if a car is parked here.
    #[must_use]
    pub const fn is_occupied(&self) -> bool {
        self.car.is_some()
    }

    /// Parks `car` here, stamping it with the current time.
    ///
    /// # Errors
    ///
    /// - [`ParkingError::SlotOccupied`] if a car is already parked here
    /// - [`ParkingError::SlotTypeMismatch`] if the car's category differs
    pub fn park(&mut self, car: Car) -> Result<(), ParkingError> {
        self.park_at(car, Utc::now())
    }

    /// Parks `car` here, stamping it with `at`.
    ///
    /// # Errors
    ///
    /// As [`Slot::park`].
    pub fn park_at(&mut self, mut car: Car, at: DateTime<Utc>) -> Result<(), ParkingError> {
        self.check_accepts(&car)?;
        car.set_parked_at(at);
        self.car = Some(car);
        Ok(())
    }

    pub(crate) fn check_accepts(&self, car: &Car) -> Result<(), ParkingError> {
        if self.is_occupied() {
            return Err(ParkingError::SlotOccupied(self.id.clone()));
        }
        if car.category() != self.category {
            return Err(ParkingError::SlotTypeMismatch {
                slot: self.id.clone(),
                slot_category: self.category,
                car_category: car.category(),
            });
        }
        Ok(())
    }

    /// Takes the parked car out of the slot and clears its timestamp.
    ///
    /// # Errors
    ///
    /// Returns [`ParkingError::SlotEmpty`] if there is no car to remove.
    pub fn remove_car(&mut self) -> Result<Car, ParkingError> {
        let mut car = self
            .car
            .take()
            .ok_or_else(|| ParkingError::SlotEmpty(self.id.clone()))?;
        car.clear_parked_at();
        Ok(car)
    }

    /// The fee owed right now by the parked car, or zero if empty.
    #[must_use]
    pub fn calculate_fee(&self) -> f64 {
        self.calculate_fee_at(Utc::now())
    }

    /// The fee owed at `now` at this slot's hourly rate.
    #[must_use]
    pub fn calculate_fee_at(&self, now: DateTime<Utc>) -> f64 {
        self.fee_with(
            &FeeStrategy::Standard {
                rate: self.hourly_rate,
            },
            now,
        )
    }

    /// The fee owed at `now` under a caller-supplied strategy.
    #[must_use]
    pub fn fee_with(&self, strategy: &FeeStrategy, now: DateTime<Utc>) -> f64 {
        self.car
            .as_ref()
            .map_or(0.0, |car| strategy.fee_for(car, now))
    }
}

impl PartialEq for Slot {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Slot {}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Slot {} [{}] - ", self.id, self.category)?;
        match &self.car {
            Some(car) => write!(
                f,
                "OCCUPIED by {} (Owner: {})",
                car.registration(),
                car.owner()
            ),
            None => f.write_str("EMPTY"),
        }
    }
}
