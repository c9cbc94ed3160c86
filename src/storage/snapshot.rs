//! JSON snapshots of a [`CarPark`].
//!
//! A snapshot is a flat record of every slot and parked car, written on an
//! explicit save. Restoring a snapshot rebuilds an equivalent car park with
//! the original parking times (to the second).

use std::{fs, path::Path};

use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use non_empty_string::NonEmptyString;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::domain::{
    Car, CarPark, Category, ParkingError, Rates, Registration, Slot, SlotId, TIMESTAMP_FORMAT,
};

/// Format version written into every snapshot.
pub const FORMAT_VERSION: &str = "2.0";

const SAVED_AT_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Errors raised while saving, loading, or restoring a snapshot.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The snapshot file could not be read or written.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// The snapshot is not valid JSON of the expected shape.
    #[error("malformed snapshot: {0}")]
    Json(#[from] serde_json::Error),

    /// A record violates a car park rule (bad ID, duplicate, wrong category).
    #[error(transparent)]
    Parking(#[from] ParkingError),

    /// A slot record has a type other than `Staff` or `Visitor`.
    #[error("slot {slot} has unknown type '{slot_type}'")]
    UnknownSlotType {
        /// The slot record's ID.
        slot: String,
        /// The unrecognised type label.
        slot_type: String,
    },

    /// A slot record's `isOccupied` flag disagrees with whether it holds a car.
    #[error("slot {slot} is marked {} but {}", occupancy(*.is_occupied), car_presence(*.is_occupied))]
    OccupancyMismatch {
        /// The slot record's ID.
        slot: String,
        /// The recorded flag.
        is_occupied: bool,
    },

    /// A car record has an empty owner name.
    #[error("car {0} has no owner name")]
    MissingOwner(String),

    /// A car record's parking time could not be parsed.
    #[error("car {registration} has invalid parking time '{value}'")]
    ParkingTime {
        /// The car record's registration.
        registration: String,
        /// The unparseable timestamp.
        value: String,
        /// Why parsing failed.
        #[source]
        source: chrono::ParseError,
    },

    /// A car record's parking time falls in a daylight-saving gap of the
    /// local time zone.
    #[error("car {registration} has parking time '{value}', which does not exist locally")]
    NonexistentParkingTime {
        /// The car record's registration.
        registration: String,
        /// The skipped local timestamp.
        value: String,
    },
}

const fn occupancy(is_occupied: bool) -> &'static str {
    if is_occupied { "occupied" } else { "empty" }
}

const fn car_presence(is_occupied: bool) -> &'static str {
    if is_occupied { "has no car" } else { "holds a car" }
}

/// The on-disk representation of a car park.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    /// Format version tag.
    pub version: String,
    /// When the snapshot was taken (`YYYY-MM-DDTHH:MM:SS`, local time).
    pub saved_at: String,
    /// Number of slots at save time.
    pub total_slots: usize,
    /// Number of occupied slots at save time.
    pub occupied_slots: usize,
    /// Every slot, in listing order.
    pub slots: Vec<SlotRecord>,
}

/// One slot in a [`Snapshot`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotRecord {
    /// The slot ID.
    pub slot_id: String,
    /// `Staff` or `Visitor`.
    pub slot_type: String,
    /// Whether a car is parked in the slot.
    pub is_occupied: bool,
    /// The parked car, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub car: Option<CarRecord>,
}

/// A parked car in a [`SlotRecord`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CarRecord {
    /// The car's registration.
    pub registration_number: String,
    /// The owner's name.
    pub owner_name: String,
    /// Whether the owner is staff.
    pub is_staff: bool,
    /// When the car was parked (`YYYY-MM-DD HH:MM:SS`, local time).
    pub parking_time: String,
}

impl From<&Slot> for SlotRecord {
    fn from(slot: &Slot) -> Self {
        Self {
            slot_id: slot.id().to_string(),
            slot_type: slot.category().label().to_string(),
            is_occupied: slot.is_occupied(),
            car: slot.car().map(CarRecord::from),
        }
    }
}

impl From<&Car> for CarRecord {
    fn from(car: &Car) -> Self {
        Self {
            registration_number: car.registration().to_string(),
            owner_name: car.owner().to_string(),
            is_staff: car.is_staff(),
            parking_time: car
                .formatted_parked_at()
                .unwrap_or_else(|| "Not parked".to_string()),
        }
    }
}

impl Snapshot {
    /// Records the state of `car_park` as of `saved_at`.
    #[must_use]
    pub fn capture(car_park: &CarPark, saved_at: DateTime<Utc>) -> Self {
        Self {
            version: FORMAT_VERSION.to_string(),
            saved_at: saved_at
                .with_timezone(&Local)
                .format(SAVED_AT_FORMAT)
                .to_string(),
            total_slots: car_park.total_slots(),
            occupied_slots: car_park.occupied_count(),
            slots: car_park.slots().map(SlotRecord::from).collect(),
        }
    }

    /// Writes the snapshot as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    #[instrument(level = "debug", skip(self))]
    pub fn save(&self, path: &Path) -> Result<(), StorageError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        debug!(slots = self.slots.len(), "snapshot written");
        Ok(())
    }

    /// Reads a snapshot written by [`Snapshot::save`].
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a snapshot.
    #[instrument(level = "debug")]
    pub fn load(path: &Path) -> Result<Self, StorageError> {
        let json = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Rebuilds a car park from this snapshot, billing slots at `rates`.
    ///
    /// Every record is re-validated, so a hand-edited file cannot break the
    /// car park's invariants.
    ///
    /// # Errors
    ///
    /// Returns an error for the first record that is malformed or conflicts
    /// with an earlier one.
    pub fn restore(&self, rates: Rates) -> Result<CarPark, StorageError> {
        let mut car_park = CarPark::with_rates(rates);
        for record in &self.slots {
            let id: SlotId = record.slot_id.parse()?;
            let category = Category::from_label(&record.slot_type).ok_or_else(|| {
                StorageError::UnknownSlotType {
                    slot: record.slot_id.clone(),
                    slot_type: record.slot_type.clone(),
                }
            })?;
            if record.is_occupied != record.car.is_some() {
                return Err(StorageError::OccupancyMismatch {
                    slot: record.slot_id.clone(),
                    is_occupied: record.is_occupied,
                });
            }
            car_park.create_slot(id.clone(), category)?;

            if let Some(car) = &record.car {
                let (car, parked_at) = car.restore()?;
                car_park.park_car_at(&id, car, parked_at)?;
            }
        }
        Ok(car_park)
    }
}

impl CarRecord {
    fn restore(&self) -> Result<(Car, DateTime<Utc>), StorageError> {
        let registration: Registration = self.registration_number.parse()?;
        let owner = NonEmptyString::new(self.owner_name.clone())
            .map_err(|_| StorageError::MissingOwner(self.registration_number.clone()))?;
        let local = NaiveDateTime::parse_from_str(&self.parking_time, TIMESTAMP_FORMAT)
            .map_err(|source| StorageError::ParkingTime {
                registration: self.registration_number.clone(),
                value: self.parking_time.clone(),
                source,
            })?;
        // An hour repeated by a clock change resolves to its first occurrence.
        let parked_at = Local
            .from_local_datetime(&local)
            .earliest()
            .ok_or_else(|| StorageError::NonexistentParkingTime {
                registration: self.registration_number.clone(),
                value: self.parking_time.clone(),
            })?
            .with_timezone(&Utc);
        let car = Car::new(registration, owner, Category::from_staff_flag(self.is_staff));
        Ok((car, parked_at))
    }
}

/// Returns `true` if a snapshot file exists at `path`.
#[must_use]
pub fn data_file_exists(path: &Path) -> bool {
    path.is_file()
}

#[cfg(test)]
mod tests {
    use chrono::{TimeDelta, TimeZone};

    use super::*;

    fn nine_am() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
    }

    fn local(at: DateTime<Utc>, format: &str) -> String {
        at.with_timezone(&Local).format(format).to_string()
    }

    fn car_park() -> CarPark {
        let mut car_park = CarPark::new();
        car_park.populate(2, 1).unwrap();
        car_park.create_slot("D01".parse().unwrap(), Category::Visitor).unwrap();
        let car = Car::new(
            "A1234".parse().unwrap(),
            NonEmptyString::new("John".to_string()).unwrap(),
            Category::Staff,
        );
        car_park
            .park_car_at(&"S02".parse().unwrap(), car, nine_am())
            .unwrap();
        car_park
    }

    #[test]
    fn capture_records_counts_and_cars() {
        let snapshot = Snapshot::capture(&car_park(), nine_am() + TimeDelta::hours(1));

        assert_eq!(snapshot.version, "2.0");
        assert_eq!(
            snapshot.saved_at,
            local(nine_am() + TimeDelta::hours(1), SAVED_AT_FORMAT)
        );
        assert_eq!(snapshot.total_slots, 4);
        assert_eq!(snapshot.occupied_slots, 1);

        let occupied = &snapshot.slots[1];
        assert_eq!(occupied.slot_id, "S02");
        assert_eq!(occupied.slot_type, "Staff");
        assert!(occupied.is_occupied);
        let car = occupied.car.as_ref().unwrap();
        assert_eq!(car.registration_number, "A1234");
        assert_eq!(car.owner_name, "John");
        assert!(car.is_staff);
        assert_eq!(car.parking_time, local(nine_am(), TIMESTAMP_FORMAT));

        assert!(snapshot.slots[0].car.is_none());
    }

    #[test]
    fn json_uses_camel_case_keys() {
        let snapshot = Snapshot::capture(&car_park(), nine_am());
        let json = serde_json::to_value(&snapshot).unwrap();

        assert_eq!(json["totalSlots"], 4);
        assert_eq!(json["occupiedSlots"], 1);
        assert_eq!(json["slots"][1]["slotId"], "S02");
        assert_eq!(json["slots"][1]["car"]["registrationNumber"], "A1234");
        assert_eq!(json["slots"][1]["car"]["isStaff"], true);
        assert!(json["slots"][0].get("car").is_none());
    }

    #[test]
    fn save_load_restore_round_trip() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("parking_data.json");
        let original = car_park();

        assert!(!data_file_exists(&path));
        Snapshot::capture(&original, nine_am()).save(&path).unwrap();
        assert!(data_file_exists(&path));

        let loaded = Snapshot::load(&path).unwrap();
        assert_eq!(loaded, Snapshot::capture(&original, nine_am()));

        let restored = loaded.restore(Rates::default()).unwrap();
        let ids: Vec<_> = restored.slots().map(|s| s.id().to_string()).collect();
        assert_eq!(ids, ["S01", "S02", "V01", "D01"]);

        let slot = restored
            .find_by_registration(&"A1234".parse().unwrap())
            .unwrap();
        assert_eq!(slot.id().as_str(), "S02");
        assert_eq!(slot.car().unwrap().parked_at(), Some(nine_am()));
        assert_eq!(slot.car().unwrap().owner(), "John");
        assert_eq!(
            restored.slot(&"D01".parse().unwrap()).unwrap().category(),
            Category::Visitor
        );
    }

    #[test]
    fn restore_rejects_unknown_slot_type() {
        let mut snapshot = Snapshot::capture(&car_park(), nine_am());
        snapshot.slots[0].slot_type = "Disabled".to_string();

        let error = snapshot.restore(Rates::default()).unwrap_err();
        assert!(matches!(error, StorageError::UnknownSlotType { .. }));
    }

    #[test]
    fn restore_rejects_category_mismatch() {
        let mut snapshot = Snapshot::capture(&car_park(), nine_am());
        snapshot.slots[1].car.as_mut().unwrap().is_staff = false;

        let error = snapshot.restore(Rates::default()).unwrap_err();
        assert!(matches!(
            error,
            StorageError::Parking(ParkingError::SlotTypeMismatch { .. })
        ));
    }

    #[test]
    fn restore_rejects_bad_timestamp() {
        let mut snapshot = Snapshot::capture(&car_park(), nine_am());
        snapshot.slots[1].car.as_mut().unwrap().parking_time = "yesterday".to_string();

        let error = snapshot.restore(Rates::default()).unwrap_err();
        assert!(matches!(error, StorageError::ParkingTime { .. }));
    }

    #[test]
    fn restore_rejects_occupied_slot_without_car() {
        let mut snapshot = Snapshot::capture(&car_park(), nine_am());
        snapshot.slots[0].is_occupied = true;

        let error = snapshot.restore(Rates::default()).unwrap_err();
        assert!(matches!(
            error,
            StorageError::OccupancyMismatch { ref slot, is_occupied: true } if slot == "S01"
        ));
        assert_eq!(error.to_string(), "slot S01 is marked occupied but has no car");
    }

    #[test]
    fn restore_rejects_empty_slot_with_car() {
        let mut snapshot = Snapshot::capture(&car_park(), nine_am());
        snapshot.slots[1].is_occupied = false;

        let error = snapshot.restore(Rates::default()).unwrap_err();
        assert_eq!(error.to_string(), "slot S02 is marked empty but holds a car");
    }

    #[test]
    fn parking_times_are_saved_as_local_wall_clock() {
        let snapshot = Snapshot::capture(&car_park(), nine_am());
        let saved = &snapshot.slots[1].car.as_ref().unwrap().parking_time;

        let naive = NaiveDateTime::parse_from_str(saved, TIMESTAMP_FORMAT).unwrap();
        let back = Local.from_local_datetime(&naive).earliest().unwrap();
        assert_eq!(back.with_timezone(&Utc), nine_am());
    }

    #[test]
    fn restore_rejects_duplicate_cars() {
        let mut snapshot = Snapshot::capture(&car_park(), nine_am());
        let car = snapshot.slots[1].car.clone();
        snapshot.slots[0].is_occupied = true;
        snapshot.slots[0].car = car;

        let error = snapshot.restore(Rates::default()).unwrap_err();
        assert!(matches!(
            error,
            StorageError::Parking(ParkingError::DuplicateCar(_))
        ));
    }

    #[test]
    fn load_rejects_garbage() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("parking_data.json");
        std::fs::write(&path, "{ not json").unwrap();

        assert!(matches!(
            Snapshot::load(&path).unwrap_err(),
            StorageError::Json(_)
        ));
    }
}
