use serde::{Deserialize, Serialize};

use crate::core::FilterState;
use crate::source::DataField;

/// Observable pipeline step, queued until the host drains it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EngineEvent {
    FiltersChanged { filters: FilterState },
    BatchIssued { version: u64 },
    BatchCancelled { version: u64 },
    SnapshotPublished { version: u64 },
    SnapshotDiscarded { version: u64 },
    FieldDegraded { version: u64, field: DataField },
    /// Message the host must show to the user.
    UserNotice { message: String },
}
