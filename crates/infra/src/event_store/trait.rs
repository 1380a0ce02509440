use std::sync::Arc;

use thiserror::Error;

use warden_core::{Aggregate, AggregateId, AggregateType, EventId, ExpectedSequence};
use warden_events::{
    EventError, EventType, PushCommand, SearchQuery, StoredEvent, UniqueConstraint,
};

/// An event ready to be appended (not yet assigned a sequence).
///
/// Built from a [`PushCommand`] by [`PendingEvent::from_command`], which
/// marshals the command payload. The store assigns the sequence fields and
/// the creation date when the batch commits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingEvent {
    pub id: EventId,
    pub aggregate: Aggregate,
    pub event_type: EventType,

    pub editor_service: String,
    pub editor_user: String,

    pub data: Option<Vec<u8>>,

    pub unique_constraints: Vec<UniqueConstraint>,
    /// Latest sequence of the aggregate the command was decided against.
    pub expected_sequence: ExpectedSequence,
}

impl PendingEvent {
    /// Marshal a command into a pending event.
    ///
    /// Fails with [`EventError::Serialization`] when the payload cannot be
    /// turned into JSON; nothing has been stored at that point.
    pub fn from_command(push: &PushCommand) -> Result<Self, EventError> {
        let command = push.command();
        Ok(Self {
            id: EventId::new(),
            aggregate: command.aggregate().clone(),
            event_type: command.event_type().clone(),
            editor_service: command.editor_service().to_string(),
            editor_user: command.editor_user().to_string(),
            data: command.data().marshal()?,
            unique_constraints: push.unique_constraints().to_vec(),
            expected_sequence: push.expected_sequence(),
        })
    }
}

/// Ordered, finite stream of stored events returned by [`EventStore::filter`].
///
/// Every call to `filter` yields a fresh stream; a stream cannot be
/// restarted once consumed.
pub struct EventStream {
    inner: Box<dyn Iterator<Item = StoredEvent> + Send>,
}

impl EventStream {
    pub fn new<I>(events: I) -> Self
    where
        I: IntoIterator<Item = StoredEvent>,
        I::IntoIter: Send + 'static,
    {
        Self {
            inner: Box::new(events.into_iter()),
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }
}

impl Iterator for EventStream {
    type Item = StoredEvent;

    fn next(&mut self) -> Option<StoredEvent> {
        self.inner.next()
    }
}

impl core::fmt::Debug for EventStream {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("EventStream").finish_non_exhaustive()
    }
}

/// Event store errors.
///
/// Only [`EventStoreError::SequenceConflict`] is worth retrying: the caller
/// rebuilds its write model from the newer events and decides again.
#[derive(Debug, Error)]
pub enum EventStoreError {
    #[error(
        "sequence conflict on {aggregate_type}/{aggregate_id}: expected {expected:?}, found {actual}"
    )]
    SequenceConflict {
        aggregate_type: AggregateType,
        aggregate_id: AggregateId,
        expected: ExpectedSequence,
        actual: u64,
    },

    /// A unique value is already claimed. `error_message` is the message key
    /// declared by the colliding constraint.
    #[error("unique constraint violated ({unique_type}): {error_message}")]
    UniqueConstraint {
        unique_type: String,
        unique_field: String,
        error_message: String,
    },

    #[error("invalid append: {0}")]
    InvalidAppend(String),

    #[error("invalid query: {0}")]
    InvalidQuery(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error(transparent)]
    Event(#[from] EventError),
}

impl EventStoreError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, EventStoreError::SequenceConflict { .. })
    }
}

/// Append-only, tenant-aware event store.
///
/// Implementations must:
/// - commit an `append` batch atomically (all events and all constraint
///   changes, or nothing)
/// - check every `expected_sequence` against the aggregate's latest sequence
///   before the batch
/// - assign strictly increasing sequences in batch order
/// - return `filter` results ordered by sequence (descending when the query
///   asks for it)
pub trait EventStore: Send + Sync {
    fn append(&self, events: Vec<PendingEvent>) -> Result<Vec<StoredEvent>, EventStoreError>;

    fn filter(&self, query: &SearchQuery) -> Result<EventStream, EventStoreError>;

    /// Highest sequence matching `query`, `0` if nothing matches.
    fn latest_sequence(&self, query: &SearchQuery) -> Result<u64, EventStoreError>;
}

impl<S> EventStore for Arc<S>
where
    S: EventStore + ?Sized,
{
    fn append(&self, events: Vec<PendingEvent>) -> Result<Vec<StoredEvent>, EventStoreError> {
        (**self).append(events)
    }

    fn filter(&self, query: &SearchQuery) -> Result<EventStream, EventStoreError> {
        (**self).filter(query)
    }

    fn latest_sequence(&self, query: &SearchQuery) -> Result<u64, EventStoreError> {
        (**self).latest_sequence(query)
    }
}
