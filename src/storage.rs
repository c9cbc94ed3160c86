pub mod snapshot;

pub use snapshot::{CarRecord, Snapshot, SlotRecord, StorageError, data_file_exists};
