//! Push/filter facade over an [`EventStore`].
//!
//! Turns [`PushCommand`]s into pending events, appends them and maps the
//! stored records back into typed events through the injected
//! [`EventRegistry`].

use std::sync::Arc;

use tracing::{debug, instrument};

use warden_events::{Event, EventRegistry, Projection, PushCommand, Reducer, SearchQuery};

use crate::config::EventstoreConfig;
use crate::event_store::{EventStore, EventStoreError, PendingEvent};

#[derive(Debug)]
pub struct Eventstore<S> {
    store: S,
    registry: EventRegistry,
    config: EventstoreConfig,
}

impl<S: EventStore> Eventstore<S> {
    pub fn new(store: S, registry: EventRegistry) -> Self {
        Self::with_config(store, registry, EventstoreConfig::default())
    }

    pub fn with_config(store: S, registry: EventRegistry, config: EventstoreConfig) -> Self {
        Self {
            store,
            registry,
            config,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn registry(&self) -> &EventRegistry {
        &self.registry
    }

    pub fn config(&self) -> &EventstoreConfig {
        &self.config
    }

    /// Append the commands as one atomic batch and return the stored events.
    ///
    /// Payloads are marshaled before anything reaches the store; a marshal
    /// failure aborts the whole push.
    #[instrument(skip_all, fields(command_count = commands.len()), err)]
    pub fn push(&self, commands: Vec<PushCommand>) -> Result<Vec<Arc<dyn Event>>, EventStoreError> {
        if commands.len() > self.config.max_push_batch {
            return Err(EventStoreError::InvalidAppend(format!(
                "push of {} commands exceeds the limit of {}",
                commands.len(),
                self.config.max_push_batch
            )));
        }

        let pending = commands
            .iter()
            .map(PendingEvent::from_command)
            .collect::<Result<Vec<_>, _>>()?;

        let stored = self.store.append(pending)?;
        Ok(self.registry.map_all(&stored)?)
    }

    #[instrument(skip_all, err)]
    pub fn filter_events(&self, query: &SearchQuery) -> Result<Vec<Arc<dyn Event>>, EventStoreError> {
        let stored: Vec<_> = self.store.filter(query)?.collect();
        debug!(event_count = stored.len(), "events loaded");
        Ok(self.registry.map_all(&stored)?)
    }

    pub fn latest_sequence(&self, query: &SearchQuery) -> Result<u64, EventStoreError> {
        self.store.latest_sequence(query)
    }

    /// Load the events matching `query` and fold them into `reducer`.
    pub fn filter_to_reducer<R>(&self, query: &SearchQuery, reducer: &mut R) -> Result<(), EventStoreError>
    where
        R: Reducer + ?Sized,
    {
        let events = self.filter_events(query)?;
        reducer.append_and_reduce(&events)?;
        Ok(())
    }

    /// Bring `projection` up to date using its own query.
    pub fn filter_to_projection<P>(&self, projection: &mut P) -> Result<(), EventStoreError>
    where
        P: Projection + ?Sized,
    {
        let query = projection.query();
        self.filter_to_reducer(&query, projection)
    }
}

#[cfg(test)]
mod tests {
    use warden_core::{Aggregate, AggregateId, AggregateType, TenantId};
    use warden_events::{
        BaseEvent, Columns, Command, Editor, EventData, EventMeta, EventType, downcast, impl_event,
    };

    use super::*;
    use crate::event_store::InMemoryEventStore;

    const NOTE: AggregateType = AggregateType::from_static("note");

    #[derive(Debug)]
    struct Unmarshalable {
        base: BaseEvent,
    }

    impl_event!(Unmarshalable);

    impl Command for Unmarshalable {
        fn data(&self) -> EventData<'_> {
            EventData::Raw(b"{not json")
        }
    }

    #[derive(Debug)]
    struct Noted {
        base: BaseEvent,
    }

    impl_event!(Noted);

    impl Command for Noted {
        fn data(&self) -> EventData<'_> {
            EventData::Empty
        }
    }

    fn note(id: &str) -> Aggregate {
        Aggregate::new(NOTE, AggregateId::new(id), TenantId::new())
    }

    fn editor() -> Editor {
        Editor::new("admin-api", "user-1").unwrap()
    }

    fn noted(id: &str) -> PushCommand {
        PushCommand::new(Noted {
            base: BaseEvent::for_push(&editor(), &note(id), EventType::from_static("note.added")),
        })
    }

    #[test]
    fn marshal_failure_aborts_push_before_storing() {
        let es = Eventstore::new(InMemoryEventStore::new(), EventRegistry::new());
        let bad = PushCommand::new(Unmarshalable {
            base: BaseEvent::for_push(&editor(), &note("n1"), EventType::from_static("note.added")),
        });

        let err = es.push(vec![noted("n0"), bad]).unwrap_err();
        assert!(matches!(err, EventStoreError::Event(_)));
        assert!(es.store().is_empty());
    }

    #[test]
    fn push_over_batch_limit_is_invalid() {
        let es = Eventstore::with_config(
            InMemoryEventStore::new(),
            EventRegistry::new(),
            EventstoreConfig { max_push_batch: 1 },
        );
        let err = es.push(vec![noted("n1"), noted("n2")]).unwrap_err();
        assert!(matches!(err, EventStoreError::InvalidAppend(_)));
        assert!(es.store().is_empty());
    }

    #[test]
    fn unregistered_types_come_back_as_base_events() {
        let es = Eventstore::new(InMemoryEventStore::new(), EventRegistry::new());
        let pushed = es.push(vec![noted("n1")]).unwrap();

        let base = downcast::<BaseEvent>(pushed[0].as_ref()).unwrap();
        assert_eq!(base.sequence(), 1);
        assert_eq!(pushed[0].event_type(), &EventType::from_static("note.added"));

        let query = SearchQuery::new(Columns::Event).aggregate_types([NOTE]);
        assert_eq!(es.filter_events(&query).unwrap().len(), 1);
        assert_eq!(es.latest_sequence(&query).unwrap(), 1);
    }
}
