//! Append-only event store boundary.
//!
//! The store persists [`PendingEvent`] batches atomically, enforces expected
//! aggregate sequences and unique constraints, and answers [`SearchQuery`]s
//! with ordered [`StoredEvent`] streams. It knows nothing about typed events;
//! mapping happens in [`crate::Eventstore`].
//!
//! [`SearchQuery`]: warden_events::SearchQuery
//! [`StoredEvent`]: warden_events::StoredEvent

pub mod in_memory;
pub mod r#trait;

pub use in_memory::InMemoryEventStore;
pub use r#trait::{EventStore, EventStoreError, EventStream, PendingEvent};
