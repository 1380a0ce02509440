use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use warden_core::{Aggregate, EventId};

use crate::EventType;

/// Generic persisted event record, as returned by the store.
///
/// This is what mappers turn back into typed events. The payload is kept as
/// raw JSON bytes; only the mapper for `event_type` knows its shape.
///
/// Notes:
/// - **Append-only**: rows are never updated or deleted.
/// - `sequence` is a strictly increasing log position; per aggregate it is
///   therefore strictly increasing as well.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredEvent {
    pub id: EventId,
    pub aggregate: Aggregate,
    pub event_type: EventType,

    pub sequence: u64,
    /// Latest sequence of the same aggregate before this event (0 if none).
    pub previous_aggregate_sequence: u64,
    /// Latest sequence of any aggregate of the same type before this event.
    pub previous_aggregate_type_sequence: u64,

    pub creation_date: DateTime<Utc>,
    pub editor_service: String,
    pub editor_user: String,

    pub data: Option<Vec<u8>>,
}
