//! Domain models for the car park.
//!
//! This module contains the core domain types: validated identifiers, cars,
//! slots, fee calculation, and the [`CarPark`] registry itself.

/// Slot ID and registration validation.
pub mod ident;
pub use ident::{
    Registration, SlotId, is_valid_registration, is_valid_slot_id, validate_registration,
    validate_slot_id,
};

mod error;
pub use error::ParkingError;

mod car;
pub use car::{Car, Category, TIMESTAMP_FORMAT, format_elapsed};

pub mod fee;
pub use fee::{FeeStrategy, Rates};

mod slot;
pub use slot::Slot;

pub mod car_park;
pub use car_park::{CarPark, Departure};

mod config;
pub use config::{Config, ConfigError, is_valid_rate};
