//! In-memory car park registry
//!
//! Parking slots are reserved for staff or visitors. Cars are parked in slots
//! of their own category and billed per whole hour when they leave.

pub mod domain;
pub use domain::{
    Car, CarPark, Category, Config, Departure, FeeStrategy, ParkingError, Rates, Registration,
    Slot, SlotId,
};

/// JSON snapshots of a car park.
pub mod storage;
pub use storage::{Snapshot, StorageError};
