//! Metadata for an object held in the flat storage namespace.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// What the store knows about one named object, taken straight from the
/// filesystem. The name is the bare leaf within the flat namespace; there is
/// no path structure to expose.
#[derive(Serialize, Clone, Debug)]
pub struct ObjectMeta {
    /// Object name, unique within the namespace.
    pub name: String,

    /// Size in bytes as currently on disk.
    pub size: u64,

    /// Timestamp of the last write or append.
    pub last_modified: DateTime<Utc>,
}
