//! Infrastructure layer: event store, the `Eventstore` facade and its config.

pub mod config;
pub mod event_store;
pub mod eventstore;

pub use config::EventstoreConfig;
pub use event_store::{EventStore, EventStoreError, EventStream, InMemoryEventStore, PendingEvent};
pub use eventstore::Eventstore;
