use std::any::Any;

use chrono::{DateTime, Utc};

use warden_core::Aggregate;

use crate::{BaseEvent, EventError, EventType};

/// Identity and provenance accessors shared by commands and events.
///
/// Implementors only provide [`EventMeta::base`].
pub trait EventMeta {
    fn base(&self) -> &BaseEvent;

    fn event_type(&self) -> &EventType {
        self.base().event_type()
    }

    fn aggregate(&self) -> &Aggregate {
        self.base().aggregate()
    }

    /// Service that pushed the event.
    fn editor_service(&self) -> &str {
        self.base().editor().service()
    }

    /// User that pushed the event.
    fn editor_user(&self) -> &str {
        self.base().editor().user()
    }
}

/// Upcast to [`Any`] so typed events can be recovered from `dyn Event`.
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A persisted event (read side).
///
/// Events are:
/// - **immutable** (facts)
/// - **ordered** by `sequence`
/// - produced by a mapper from a [`crate::StoredEvent`]
pub trait Event: EventMeta + AsAny + core::fmt::Debug + Send + Sync {
    fn sequence(&self) -> u64 {
        self.base().sequence()
    }

    fn creation_date(&self) -> DateTime<Utc> {
        self.base().creation_date()
    }

    /// Previous sequence of the aggregate root (e.g. of `org/42508134`).
    fn previous_aggregate_sequence(&self) -> u64 {
        self.base().previous_aggregate_sequence()
    }

    /// Previous sequence of the aggregate type (e.g. of all `org`s).
    fn previous_aggregate_type_sequence(&self) -> u64 {
        self.base().previous_aggregate_type_sequence()
    }

    /// Raw stored payload, for consumers that do not need typed access.
    fn data_as_bytes(&self) -> Option<&[u8]> {
        self.base().data()
    }
}

/// Typed view of an event, if it is an `E`.
pub fn downcast<E: Event>(event: &dyn Event) -> Option<&E> {
    event.as_any().downcast_ref::<E>()
}

/// Like [`downcast`], but a mismatch is a reduction failure.
///
/// Happens when a read model routes an event type to a handler but the
/// registry produced a different representation (usually a plain
/// [`BaseEvent`] because no mapper was registered).
pub fn expect_event<'a, E: Event>(
    event: &'a dyn Event,
    code: &'static str,
) -> Result<&'a E, EventError> {
    downcast::<E>(event).ok_or_else(|| {
        EventError::reduction(
            code,
            format!(
                "event {} (sequence {}) has an unexpected representation",
                event.event_type(),
                event.sequence()
            ),
        )
    })
}

/// Whether `event` is of one of `types`.
pub fn is_event_types<E: EventMeta + ?Sized>(event: &E, types: &[EventType]) -> bool {
    types.iter().any(|t| t == event.event_type())
}

/// Implements [`EventMeta`] and [`Event`] for event structs that embed their
/// [`BaseEvent`] in a field named `base`.
#[macro_export]
macro_rules! impl_event {
    ($($t:ty),+ $(,)?) => {
        $(
            impl $crate::EventMeta for $t {
                fn base(&self) -> &$crate::BaseEvent {
                    &self.base
                }
            }

            impl $crate::Event for $t {}
        )+
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Editor, StoredEvent};
    use warden_core::{AggregateId, AggregateType, EventId, TenantId};

    #[derive(Debug)]
    struct Renamed {
        base: BaseEvent,
    }

    impl_event!(Renamed);

    fn stored(event_type: &'static str, sequence: u64) -> StoredEvent {
        StoredEvent {
            id: EventId::new(),
            aggregate: Aggregate::new(
                AggregateType::from_static("org"),
                AggregateId::new("42508134"),
                TenantId::new(),
            ),
            event_type: EventType::from_static(event_type),
            sequence,
            previous_aggregate_sequence: 0,
            previous_aggregate_type_sequence: 0,
            creation_date: Utc::now(),
            editor_service: "svc".to_string(),
            editor_user: "usr".to_string(),
            data: None,
        }
    }

    #[test]
    fn is_event_types_matches_any_candidate() {
        let event = BaseEvent::from_stored(&stored("org.changed", 1));
        assert!(is_event_types(
            &event,
            &[
                EventType::from_static("org.added"),
                EventType::from_static("org.changed"),
            ]
        ));
        assert!(!is_event_types(&event, &[EventType::from_static("org.removed")]));
        assert!(!is_event_types(&event, &[]));
    }

    #[test]
    fn downcast_recovers_the_concrete_type() {
        let renamed = Renamed {
            base: BaseEvent::from_stored(&stored("org.changed", 7)),
        };
        let event: &dyn Event = &renamed;
        assert!(downcast::<Renamed>(event).is_some());
        assert!(downcast::<BaseEvent>(event).is_none());
        assert_eq!(event.sequence(), 7);
    }

    #[test]
    fn expect_event_reports_code_on_mismatch() {
        let editor = Editor::new("svc", "usr").unwrap();
        let aggregate = stored("org.changed", 1).aggregate;
        let base = BaseEvent::for_push(&editor, &aggregate, EventType::from_static("org.changed"));
        let err = expect_event::<Renamed>(&base, "TEST-x1").unwrap_err();
        assert_eq!(err.code(), Some("TEST-x1"));
    }
}
