//! The in-memory car park registry.
//!
//! The [`CarPark`] knows nothing about files or prompts. It owns every
//! [`Slot`] and a secondary index from registration to slot, and keeps the
//! two consistent across every operation.

use std::collections::HashMap;

use chrono::{DateTime, TimeDelta, Utc};
use tracing::{debug, instrument};

use crate::domain::{Car, Category, ParkingError, Rates, Registration, Slot, SlotId};

/// Largest number of slots that can be generated per category at startup.
///
/// Generated IDs have two digits, so `S99` is the last one.
pub const MAX_SLOTS_PER_CATEGORY: usize = 99;

/// The result of taking a car out of the car park.
#[derive(Debug, Clone)]
pub struct Departure {
    /// The car, with its parking timestamp cleared.
    pub car: Car,
    /// The slot the car was parked in.
    pub slot: SlotId,
    /// How long the car was parked.
    pub duration: TimeDelta,
    /// The fee charged for the stay.
    pub fee: f64,
}

/// An in-memory registry of parking slots and the cars parked in them.
///
/// Storage is decomposed into:
/// - Slot data: `HashMap<SlotId, Slot>`
/// - Listing order: `Vec<SlotId>` in insertion order
/// - Occupancy index: `HashMap<Registration, SlotId>`
///
/// Every occupied slot's registration appears in the index and every index
/// entry points at the slot holding that car.
#[derive(Debug, Default)]
pub struct CarPark {
    slots: HashMap<SlotId, Slot>,

    order: Vec<SlotId>,

    by_registration: HashMap<Registration, SlotId>,

    /// Rates applied to slots created through [`CarPark::create_slot`].
    rates: Rates,
}

impl CarPark {
    /// Creates an empty car park using the standard rates.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty car park whose new slots are billed at `rates`.
    #[must_use]
    pub fn with_rates(rates: Rates) -> Self {
        Self {
            rates,
            ..Self::default()
        }
    }

    /// The rates applied to newly created slots.
    #[must_use]
    pub const fn rates(&self) -> &Rates {
        &self.rates
    }

    /// Creates `staff` staff slots (`S01`, `S02`, ...) and `visitor` visitor
    /// slots (`V01`, `V02`, ...).
    ///
    /// # Errors
    ///
    /// - [`ParkingError::InvalidSlotId`] if a count exceeds
    ///   [`MAX_SLOTS_PER_CATEGORY`]
    /// - [`ParkingError::DuplicateSlot`] if a generated ID is already taken
    #[instrument(level = "debug", skip(self))]
    pub fn populate(&mut self, staff: usize, visitor: usize) -> Result<(), ParkingError> {
        let counts = [
            ('S', Category::Staff, staff),
            ('V', Category::Visitor, visitor),
        ];
        if let Some((prefix, _, count)) = counts
            .iter()
            .find(|(_, _, count)| *count > MAX_SLOTS_PER_CATEGORY)
        {
            return Err(ParkingError::InvalidSlotId(format!("{prefix}{count}")));
        }

        let mut planned = Vec::with_capacity(staff + visitor);
        for (prefix, category, count) in counts {
            for n in 1..=count {
                planned.push((SlotId::numbered(prefix, n)?, category));
            }
        }

        // Nothing is inserted unless every generated ID is free.
        if let Some((taken, _)) = planned.iter().find(|(id, _)| self.slots.contains_key(id)) {
            return Err(ParkingError::DuplicateSlot(taken.clone()));
        }
        for (id, category) in planned {
            self.create_slot(id, category)?;
        }
        Ok(())
    }

    /// Adds a slot.
    ///
    /// # Errors
    ///
    /// Returns [`ParkingError::DuplicateSlot`] if a slot with the same ID
    /// already exists. The car park is unchanged.
    #[instrument(level = "debug", skip(self, slot), fields(slot = %slot.id()))]
    pub fn add_slot(&mut self, slot: Slot) -> Result<(), ParkingError> {
        let id = slot.id().clone();
        if self.slots.contains_key(&id) {
            return Err(ParkingError::DuplicateSlot(id));
        }
        if let Some(car) = slot.car() {
            if self.by_registration.contains_key(car.registration()) {
                return Err(ParkingError::DuplicateCar(car.registration().clone()));
            }
            self.by_registration
                .insert(car.registration().clone(), id.clone());
        }
        self.order.push(id.clone());
        self.slots.insert(id, slot);
        debug!("slot added");
        Ok(())
    }

    /// Creates and adds an empty slot billed at this car park's rates.
    ///
    /// # Errors
    ///
    /// As [`CarPark::add_slot`].
    pub fn create_slot(&mut self, id: SlotId, category: Category) -> Result<&Slot, ParkingError> {
        let slot = Slot::with_rates(id.clone(), category, &self.rates);
        self.add_slot(slot)?;
        Ok(&self.slots[&id])
    }

    /// Removes an empty slot and returns it.
    ///
    /// # Errors
    ///
    /// - [`ParkingError::SlotNotFound`] if no such slot exists
    /// - [`ParkingError::SlotOccupied`] if a car is parked in it
    #[instrument(level = "debug", skip(self), fields(slot = %id))]
    pub fn remove_slot(&mut self, id: &SlotId) -> Result<Slot, ParkingError> {
        let slot = self
            .slots
            .get(id)
            .ok_or_else(|| ParkingError::SlotNotFound(id.clone()))?;
        if slot.is_occupied() {
            return Err(ParkingError::SlotOccupied(id.clone()));
        }
        self.order.retain(|existing| existing != id);
        let removed = self
            .slots
            .remove(id)
            .ok_or_else(|| ParkingError::SlotNotFound(id.clone()))?;
        debug!("slot removed");
        Ok(removed)
    }

    /// Looks up a slot by ID.
    #[must_use]
    pub fn slot(&self, id: &SlotId) -> Option<&Slot> {
        self.slots.get(id)
    }

    /// Finds the slot a car is parked in.
    #[must_use]
    pub fn find_by_registration(&self, registration: &Registration) -> Option<&Slot> {
        self.by_registration
            .get(registration)
            .and_then(|id| self.slots.get(id))
    }

    /// Parks a car in the given slot, stamping it with the current time.
    ///
    /// # Errors
    ///
    /// - [`ParkingError::DuplicateCar`] if the car is already parked
    /// - [`ParkingError::SlotNotFound`] if no such slot exists
    /// - [`ParkingError::SlotOccupied`] if the slot already holds a car
    /// - [`ParkingError::SlotTypeMismatch`] if the categories differ
    pub fn park_car(&mut self, id: &SlotId, car: Car) -> Result<&Slot, ParkingError> {
        self.park_car_at(id, car, Utc::now())
    }

    /// Parks a car in the given slot, stamping it with `at`.
    ///
    /// # Errors
    ///
    /// As [`CarPark::park_car`].
    #[instrument(level = "debug", skip(self, car, at), fields(slot = %id, car = %car.registration()))]
    pub fn park_car_at(
        &mut self,
        id: &SlotId,
        car: Car,
        at: DateTime<Utc>,
    ) -> Result<&Slot, ParkingError> {
        if self.by_registration.contains_key(car.registration()) {
            return Err(ParkingError::DuplicateCar(car.registration().clone()));
        }
        let slot = self
            .slots
            .get_mut(id)
            .ok_or_else(|| ParkingError::SlotNotFound(id.clone()))?;

        let registration = car.registration().clone();
        slot.park_at(car, at)?;
        self.by_registration.insert(registration, id.clone());
        debug!("car parked");
        Ok(&self.slots[id])
    }

    /// Takes a car out of the car park and bills it at the current time.
    ///
    /// # Errors
    ///
    /// Returns [`ParkingError::CarNotFound`] if no parked car has this
    /// registration.
    pub fn remove_car(&mut self, registration: &Registration) -> Result<Departure, ParkingError> {
        self.remove_car_at(registration, Utc::now())
    }

    /// Takes a car out of the car park and bills it at `now`.
    ///
    /// The duration and fee are computed before the car's timestamp is
    /// cleared.
    ///
    /// # Errors
    ///
    /// As [`CarPark::remove_car`].
    #[instrument(level = "debug", skip(self, now), fields(car = %registration))]
    pub fn remove_car_at(
        &mut self,
        registration: &Registration,
        now: DateTime<Utc>,
    ) -> Result<Departure, ParkingError> {
        let id = self
            .by_registration
            .get(registration)
            .cloned()
            .ok_or_else(|| ParkingError::CarNotFound(registration.clone()))?;
        let slot = self
            .slots
            .get_mut(&id)
            .ok_or_else(|| ParkingError::CarNotFound(registration.clone()))?;

        let duration = slot.car().map_or_else(TimeDelta::zero, |car| car.elapsed_at(now));
        let fee = slot.calculate_fee_at(now);
        let car = slot.remove_car()?;
        self.by_registration.remove(registration);
        debug!(%fee, "car removed");

        Ok(Departure {
            car,
            slot: id,
            duration,
            fee,
        })
    }

    /// Removes every slot without a parked car, returning how many were
    /// removed.
    #[instrument(level = "debug", skip(self))]
    pub fn remove_all_unoccupied_slots(&mut self) -> usize {
        let before = self.slots.len();
        self.slots.retain(|_, slot| slot.is_occupied());
        let slots = &self.slots;
        self.order.retain(|id| slots.contains_key(id));
        let removed = before - self.slots.len();
        debug!(removed, "unoccupied slots removed");
        removed
    }

    /// Number of slots.
    #[must_use]
    pub fn total_slots(&self) -> usize {
        self.slots.len()
    }

    /// Number of slots with a car parked in them.
    #[must_use]
    pub fn occupied_count(&self) -> usize {
        self.by_registration.len()
    }

    /// Number of empty slots.
    #[must_use]
    pub fn available_count(&self) -> usize {
        self.total_slots() - self.occupied_count()
    }

    /// All slots, in the order they were added.
    pub fn slots(&self) -> impl Iterator<Item = &Slot> {
        self.order.iter().filter_map(|id| self.slots.get(id))
    }

    /// Empty slots, in the order they were added.
    pub fn available_slots(&self) -> impl Iterator<Item = &Slot> {
        self.slots().filter(|slot| !slot.is_occupied())
    }

    /// Occupied slots, in the order they were added.
    pub fn occupied_slots(&self) -> impl Iterator<Item = &Slot> {
        self.slots().filter(|slot| slot.is_occupied())
    }
}
