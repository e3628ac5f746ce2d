//! Data model for room observations
//!
//! - `RoomRecord`: one observed room (id + attribute fingerprint)
//! - `Snapshot`: all rooms seen in one run, keyed by id
//! - `PersistedState`: the last snapshot, or the never-initialized marker

mod record;
mod snapshot;

pub use record::{keys, Attributes, RoomRecord};
pub use snapshot::{PersistedState, Snapshot};
