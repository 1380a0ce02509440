//! Event type → mapper registry.

use std::collections::HashMap;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use tracing::warn;

use crate::{BaseEvent, Event, EventError, EventType, StoredEvent};

/// Rebuilds a concrete event from its stored record.
///
/// Mappers are pure: they either return the whole event or fail with an
/// [`EventError::Serialization`] carrying their own diagnostic code.
pub type EventMapper = fn(&StoredEvent) -> Result<Arc<dyn Event>, EventError>;

/// Explicit mapping from event type to mapper.
///
/// Built once at startup by the aggregate modules' `register_event_mappers`
/// and handed to whatever reads from the store.
#[derive(Debug, Default, Clone)]
pub struct EventRegistry {
    mappers: HashMap<EventType, EventMapper>,
}

impl EventRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `mapper` for `event_type`. A later registration wins.
    pub fn register(&mut self, event_type: EventType, mapper: EventMapper) -> &mut Self {
        if self.mappers.insert(event_type.clone(), mapper).is_some() {
            warn!(event_type = %event_type, "event mapper replaced");
        }
        self
    }

    pub fn is_registered(&self, event_type: &EventType) -> bool {
        self.mappers.contains_key(event_type)
    }

    pub fn len(&self) -> usize {
        self.mappers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappers.is_empty()
    }

    /// Map one stored record. Types without a mapper surface as a plain
    /// [`BaseEvent`].
    pub fn map(&self, stored: &StoredEvent) -> Result<Arc<dyn Event>, EventError> {
        match self.mappers.get(&stored.event_type) {
            Some(mapper) => mapper(stored),
            None => Ok(Arc::new(BaseEvent::from_stored(stored))),
        }
    }

    /// Map records in order; the first failure aborts the whole batch.
    pub fn map_all<'a, I>(&self, stored: I) -> Result<Vec<Arc<dyn Event>>, EventError>
    where
        I: IntoIterator<Item = &'a StoredEvent>,
    {
        stored.into_iter().map(|s| self.map(s)).collect()
    }
}

/// Decode the payload of `stored` into `T`.
///
/// A missing payload is an error as well: every mapper using this helper
/// expects its event to carry data.
pub fn unmarshal<T: DeserializeOwned>(
    stored: &StoredEvent,
    code: &'static str,
) -> Result<T, EventError> {
    let data = stored.data.as_deref().ok_or_else(|| {
        EventError::serialization(
            code,
            format!("event {} (sequence {}) has no payload", stored.event_type, stored.sequence),
        )
    })?;
    serde_json::from_slice(data).map_err(|e| EventError::serialization(code, e))
}
