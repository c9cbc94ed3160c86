use thiserror::Error;

use crate::domain::{Category, Registration, SlotId};

/// Every way a car park operation can be refused.
///
/// None of these are fatal. The registry is left unchanged whenever one is
/// returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParkingError {
    /// A slot ID is not one uppercase letter followed by two digits.
    #[error("Invalid slot ID '{0}': use a letter followed by 2 digits (e.g. D01)")]
    InvalidSlotId(String),

    /// A registration is not one uppercase letter followed by four digits.
    #[error("Invalid registration '{0}': use a letter followed by 4 digits (e.g. T1234)")]
    InvalidRegistration(String),

    /// A slot with this ID is already registered.
    #[error("Slot {0} already exists")]
    DuplicateSlot(SlotId),

    /// A car with this registration is already parked somewhere.
    #[error("Car {0} is already parked")]
    DuplicateCar(Registration),

    /// No slot with this ID is registered.
    #[error("Slot {0} not found")]
    SlotNotFound(SlotId),

    /// No parked car has this registration.
    #[error("Car {0} not found")]
    CarNotFound(Registration),

    /// The slot already holds a car.
    #[error("Slot {0} is occupied")]
    SlotOccupied(SlotId),

    /// The slot holds no car, so there is nothing to remove.
    #[error("Slot {0} is empty")]
    SlotEmpty(SlotId),

    /// The car's category does not match the slot's category.
    #[error("Type mismatch: {slot_category} slot {slot} cannot accept {car_category} car")]
    SlotTypeMismatch {
        /// The slot that refused the car.
        slot: SlotId,
        /// Category of the slot.
        slot_category: Category,
        /// Category of the car.
        car_category: Category,
    },
}

impl ParkingError {
    /// A short, stable code identifying the kind of failure.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidSlotId(_) => "INVALID_SLOT_ID",
            Self::InvalidRegistration(_) => "INVALID_REGISTRATION",
            Self::DuplicateSlot(_) => "DUPLICATE_SLOT",
            Self::DuplicateCar(_) => "DUPLICATE_CAR",
            Self::SlotNotFound(_) => "SLOT_NOT_FOUND",
            Self::CarNotFound(_) => "CAR_NOT_FOUND",
            Self::SlotOccupied(_) => "SLOT_OCCUPIED",
            Self::SlotEmpty(_) => "SLOT_EMPTY",
            Self::SlotTypeMismatch { .. } => "TYPE_MISMATCH",
        }
    }
}
