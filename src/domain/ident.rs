use std::{fmt, ops::Deref, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::domain::ParkingError;

const SLOT_ID_DIGITS: usize = 2;
const REGISTRATION_DIGITS: usize = 4;

/// One uppercase ASCII letter followed by exactly `digits` ASCII digits.
fn is_letter_then_digits(s: &str, digits: usize) -> bool {
    let bytes = s.as_bytes();
    bytes.len() == digits + 1
        && bytes[0].is_ascii_uppercase()
        && bytes[1..].iter().all(u8::is_ascii_digit)
}

/// Returns `true` if `s` is a well-formed slot ID such as `S01` or `D42`.
///
/// Never fails; any malformed input (including the empty string) is simply
/// `false`.
#[must_use]
pub fn is_valid_slot_id(s: &str) -> bool {
    is_letter_then_digits(s, SLOT_ID_DIGITS)
}

/// Returns `true` if `s` is a well-formed registration such as `A1234`.
#[must_use]
pub fn is_valid_registration(s: &str) -> bool {
    is_letter_then_digits(s, REGISTRATION_DIGITS)
}

/// Checks the format of a slot ID.
///
/// # Errors
///
/// Returns [`ParkingError::InvalidSlotId`] carrying the offending string.
pub fn validate_slot_id(s: &str) -> Result<(), ParkingError> {
    if is_valid_slot_id(s) {
        Ok(())
    } else {
        Err(ParkingError::InvalidSlotId(s.to_string()))
    }
}

/// Checks the format of a registration number.
///
/// # Errors
///
/// Returns [`ParkingError::InvalidRegistration`] carrying the offending
/// string.
pub fn validate_registration(s: &str) -> Result<(), ParkingError> {
    if is_valid_registration(s) {
        Ok(())
    } else {
        Err(ParkingError::InvalidRegistration(s.to_string()))
    }
}

/// A validated slot identifier: one uppercase letter and two digits.
///
/// Examples: `S01`, `V12`, `D99`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SlotId(String);

impl SlotId {
    /// Builds the `n`th slot ID for a prefix letter, e.g. `('S', 3)` → `S03`.
    ///
    /// # Errors
    ///
    /// Returns [`ParkingError::InvalidSlotId`] if the prefix is not an
    /// uppercase letter or `n` does not fit in two digits.
    pub fn numbered(prefix: char, n: usize) -> Result<Self, ParkingError> {
        format!("{prefix}{n:02}").parse()
    }

    /// Returns the string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The leading letter of the ID.
    #[must_use]
    pub fn prefix(&self) -> char {
        char::from(self.0.as_bytes()[0])
    }
}

impl FromStr for SlotId {
    type Err = ParkingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        validate_slot_id(s)?;
        Ok(Self(s.to_string()))
    }
}

impl TryFrom<String> for SlotId {
    type Error = ParkingError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        validate_slot_id(&value)?;
        Ok(Self(value))
    }
}

impl From<SlotId> for String {
    fn from(id: SlotId) -> Self {
        id.0
    }
}

impl Deref for SlotId {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A validated car registration: one uppercase letter and four digits.
///
/// Two cars are the same car exactly when their registrations are equal.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Registration(String);

impl Registration {
    /// Returns the string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Registration {
    type Err = ParkingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        validate_registration(s)?;
        Ok(Self(s.to_string()))
    }
}

impl TryFrom<String> for Registration {
    type Error = ParkingError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        validate_registration(&value)?;
        Ok(Self(value))
    }
}

impl From<Registration> for String {
    fn from(registration: Registration) -> Self {
        registration.0
    }
}

impl Deref for Registration {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl fmt::Display for Registration {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}
