use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{Rates, car_park::MAX_SLOTS_PER_CATEGORY};

/// Settings for a car park session.
///
/// Loaded from an optional TOML file. Every field has a default, so an empty
/// file (apart from the version tag) is valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Versions", into = "Versions")]
pub struct Config {
    /// Hourly rates for staff and visitor slots.
    rates: Rates,

    /// Number of staff slots to create at startup.
    ///
    /// If `None`, the user is asked.
    pub staff_slots: Option<usize>,

    /// Number of visitor slots to create at startup.
    ///
    /// If `None`, the user is asked.
    pub visitor_slots: Option<usize>,

    /// Where "save" writes the JSON snapshot.
    pub data_file: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rates: Rates::default(),
            staff_slots: None,
            visitor_slots: None,
            data_file: default_data_file(),
        }
    }
}

/// Failure to read or write a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("Failed to read config file: {0}")]
    Read(#[source] std::io::Error),

    /// The file is not valid configuration TOML.
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// The configuration could not be rendered as TOML.
    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// The file could not be written.
    #[error("Failed to write config file: {0}")]
    Write(#[source] std::io::Error),

    /// A startup slot count is outside `1..=MAX_SLOTS_PER_CATEGORY`.
    #[error(
        "{field} must be between 1 and {max}, got {value}",
        max = MAX_SLOTS_PER_CATEGORY
    )]
    SlotCount {
        /// The offending setting.
        field: &'static str,
        /// The configured count.
        value: usize,
    },

    /// An hourly rate is negative or not a finite number.
    #[error("{field} must be a non-negative amount, got {value}")]
    Rate {
        /// The offending setting.
        field: &'static str,
        /// The configured rate.
        value: f64,
    },
}

impl Config {
    /// Loads the configuration from a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, if the TOML content is
    /// invalid, or if a value is out of range (see [`Config::validate`]).
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::Read)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that slot counts fit the two-digit slot IDs and that rates are
    /// non-negative amounts.
    ///
    /// # Errors
    ///
    /// Returns the first setting that is out of range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, count) in [
            ("staff_slots", self.staff_slots),
            ("visitor_slots", self.visitor_slots),
        ] {
            if let Some(value) = count.filter(|n| !(1..=MAX_SLOTS_PER_CATEGORY).contains(n)) {
                return Err(ConfigError::SlotCount { field, value });
            }
        }
        for (field, value) in [
            ("staff_rate", self.rates.staff),
            ("visitor_rate", self.rates.visitor),
        ] {
            if !is_valid_rate(value) {
                return Err(ConfigError::Rate { field, value });
            }
        }
        Ok(())
    }

    /// Saves the configuration to a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be serialized to TOML or if
    /// the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(ConfigError::Write)
    }

    /// The configured hourly rates.
    #[must_use]
    pub const fn rates(&self) -> Rates {
        self.rates
    }

    /// Overrides the hourly rates.
    pub const fn set_rates(&mut self, rates: Rates) {
        self.rates = rates;
    }
}

/// Whether `value` can be used as an hourly rate.
#[must_use]
pub fn is_valid_rate(value: f64) -> bool {
    value.is_finite() && value >= 0.0
}

const fn default_staff_rate() -> f64 {
    Rates::STANDARD.staff
}

const fn default_visitor_rate() -> f64 {
    Rates::STANDARD.visitor
}

fn default_data_file() -> PathBuf {
    PathBuf::from("parking_data.json")
}

/// The serialized versions of the configuration.
/// This allows for future changes to the configuration format and to the domain
/// type without breaking compatibility.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "_version")]
enum Versions {
    #[serde(rename = "1")]
    V1 {
        #[serde(default = "default_staff_rate")]
        staff_rate: f64,

        #[serde(default = "default_visitor_rate")]
        visitor_rate: f64,

        #[serde(default, skip_serializing_if = "Option::is_none")]
        staff_slots: Option<usize>,

        #[serde(default, skip_serializing_if = "Option::is_none")]
        visitor_slots: Option<usize>,

        #[serde(default = "default_data_file")]
        data_file: PathBuf,
    },
}

impl From<Versions> for Config {
    fn from(versions: Versions) -> Self {
        match versions {
            Versions::V1 {
                staff_rate,
                visitor_rate,
                staff_slots,
                visitor_slots,
                data_file,
            } => Self {
                rates: Rates {
                    staff: staff_rate,
                    visitor: visitor_rate,
                },
                staff_slots,
                visitor_slots,
                data_file,
            },
        }
    }
}

impl From<Config> for Versions {
    fn from(config: Config) -> Self {
        Self::V1 {
            staff_rate: config.rates.staff,
            visitor_rate: config.rates.visitor,
            staff_slots: config.staff_slots,
            visitor_slots: config.visitor_slots,
            data_file: config.data_file,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn load_reads_valid_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(
            b"_version = \"1\"\nstaff_rate = 2.5\nvisitor_rate = 6.0\nstaff_slots = 4\nvisitor_slots = 8\ndata_file = \"lot.json\"\n",
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();

        assert!((config.rates().staff - 2.5).abs() < f64::EPSILON);
        assert!((config.rates().visitor - 6.0).abs() < f64::EPSILON);
        assert_eq!(config.staff_slots, Some(4));
        assert_eq!(config.visitor_slots, Some(8));
        assert_eq!(config.data_file, PathBuf::from("lot.json"));
    }

    #[test]
    fn load_missing_file_returns_error() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("missing.toml");

        let error = Config::load(&missing).unwrap_err();
        assert!(error.to_string().starts_with("Failed to read config file:"));
    }

    #[test]
    fn load_invalid_toml_returns_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"_version = \"1\"\nstaff_rate = \"cheap\"\n")
            .unwrap();

        let error = Config::load(file.path()).unwrap_err();
        assert!(error.to_string().starts_with("Failed to parse config file:"));
    }

    #[test]
    fn load_rejects_out_of_range_slot_counts() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"_version = \"1\"\nstaff_slots = 4611686018427387903\n")
            .unwrap();

        let error = Config::load(file.path()).unwrap_err();
        assert!(matches!(
            error,
            ConfigError::SlotCount {
                field: "staff_slots",
                value: 4_611_686_018_427_387_903
            }
        ));
    }

    #[test]
    fn load_rejects_zero_slots() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"_version = \"1\"\nvisitor_slots = 0\n")
            .unwrap();

        let error = Config::load(file.path()).unwrap_err();
        assert!(matches!(
            error,
            ConfigError::SlotCount {
                field: "visitor_slots",
                value: 0
            }
        ));
    }

    #[test]
    fn load_rejects_negative_rate() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"_version = \"1\"\nstaff_rate = -3.0\n")
            .unwrap();

        let error = Config::load(file.path()).unwrap_err();
        assert_eq!(
            error.to_string(),
            "staff_rate must be a non-negative amount, got -3"
        );
    }

    #[test]
    fn rates_must_be_finite_and_non_negative() {
        assert!(is_valid_rate(0.0));
        assert!(is_valid_rate(4.5));
        assert!(!is_valid_rate(-0.5));
        assert!(!is_valid_rate(f64::NAN));
        assert!(!is_valid_rate(f64::INFINITY));
    }

    #[test]
    fn empty_file_returns_default() {
        // Tests that deserialising an empty file returns the default configuration.
        let expected = Config::default();
        let actual: Config = toml::from_str(r#"_version = "1""#).unwrap();
        assert_eq!(actual, expected);
    }

    #[test]
    fn save_then_load() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("carpark.toml");

        let mut config = Config {
            staff_slots: Some(3),
            ..Config::default()
        };
        config.set_rates(Rates {
            staff: 1.0,
            visitor: 9.0,
        });
        config.save(&path).unwrap();

        assert_eq!(Config::load(&path).unwrap(), config);
    }
}
