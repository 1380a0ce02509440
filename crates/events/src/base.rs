//! Identity and provenance shared by every event.

use chrono::{DateTime, Utc};

use warden_core::Aggregate;

use crate::{Event, EventError, EventMeta, EventType, StoredEvent};

/// Who is pushing an event: the calling service and the acting user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Editor {
    service: String,
    user: String,
}

impl Editor {
    /// Both parts are required for the audit trail.
    pub fn new(service: impl Into<String>, user: impl Into<String>) -> Result<Self, EventError> {
        let service = service.into();
        let user = user.into();
        if service.trim().is_empty() {
            return Err(EventError::InvalidEditor("editor service is empty".to_string()));
        }
        if user.trim().is_empty() {
            return Err(EventError::InvalidEditor("editor user is empty".to_string()));
        }
        Ok(Self { service, user })
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    pub fn user(&self) -> &str {
        &self.user
    }
}

/// Base of every concrete event.
///
/// Concrete events embed it as a `base` field and expose it through
/// [`EventMeta::base`]. On the push side only aggregate, type, editor and
/// creation date are meaningful; the sequence fields are assigned by the store
/// and filled in when the event is mapped back from a [`StoredEvent`].
///
/// `BaseEvent` is itself an [`Event`]: types without a registered mapper are
/// surfaced as plain base events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseEvent {
    aggregate: Aggregate,
    event_type: EventType,
    editor: Editor,

    sequence: u64,
    previous_aggregate_sequence: u64,
    previous_aggregate_type_sequence: u64,
    creation_date: DateTime<Utc>,

    data: Option<Vec<u8>>,
}

impl BaseEvent {
    /// Base for an event about to be pushed.
    pub fn for_push(editor: &Editor, aggregate: &Aggregate, event_type: EventType) -> Self {
        Self {
            aggregate: aggregate.clone(),
            event_type,
            editor: editor.clone(),
            sequence: 0,
            previous_aggregate_sequence: 0,
            previous_aggregate_type_sequence: 0,
            creation_date: Utc::now(),
            data: None,
        }
    }

    /// Base of an event read back from the store.
    pub fn from_stored(stored: &StoredEvent) -> Self {
        Self {
            aggregate: stored.aggregate.clone(),
            event_type: stored.event_type.clone(),
            editor: Editor {
                service: stored.editor_service.clone(),
                user: stored.editor_user.clone(),
            },
            sequence: stored.sequence,
            previous_aggregate_sequence: stored.previous_aggregate_sequence,
            previous_aggregate_type_sequence: stored.previous_aggregate_type_sequence,
            creation_date: stored.creation_date,
            data: stored.data.clone(),
        }
    }

    pub fn aggregate(&self) -> &Aggregate {
        &self.aggregate
    }

    pub fn event_type(&self) -> &EventType {
        &self.event_type
    }

    pub fn editor(&self) -> &Editor {
        &self.editor
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn previous_aggregate_sequence(&self) -> u64 {
        self.previous_aggregate_sequence
    }

    pub fn previous_aggregate_type_sequence(&self) -> u64 {
        self.previous_aggregate_type_sequence
    }

    pub fn creation_date(&self) -> DateTime<Utc> {
        self.creation_date
    }

    pub fn data(&self) -> Option<&[u8]> {
        self.data.as_deref()
    }
}

impl EventMeta for BaseEvent {
    fn base(&self) -> &BaseEvent {
        self
    }
}

impl Event for BaseEvent {}

#[cfg(test)]
mod tests {
    use super::*;
    use warden_core::{AggregateId, AggregateType, EventId, TenantId};

    #[test]
    fn editor_requires_service_and_user() {
        assert!(matches!(
            Editor::new("", "user-1"),
            Err(EventError::InvalidEditor(_))
        ));
        assert!(matches!(
            Editor::new("admin-api", "  "),
            Err(EventError::InvalidEditor(_))
        ));
        let editor = Editor::new("admin-api", "user-1").unwrap();
        assert_eq!(editor.service(), "admin-api");
        assert_eq!(editor.user(), "user-1");
    }

    #[test]
    fn from_stored_copies_sequence_fields_and_payload() {
        let aggregate = Aggregate::new(
            AggregateType::from_static("org"),
            AggregateId::new("42508134"),
            TenantId::new(),
        );
        let stored = StoredEvent {
            id: EventId::new(),
            aggregate: aggregate.clone(),
            event_type: EventType::from_static("org.added"),
            sequence: 12,
            previous_aggregate_sequence: 4,
            previous_aggregate_type_sequence: 11,
            creation_date: Utc::now(),
            editor_service: "admin-api".to_string(),
            editor_user: "user-1".to_string(),
            data: Some(br#"{"name":"Acme"}"#.to_vec()),
        };

        let base = BaseEvent::from_stored(&stored);
        assert_eq!(base.aggregate(), &aggregate);
        assert_eq!(base.sequence(), 12);
        assert_eq!(base.previous_aggregate_sequence(), 4);
        assert_eq!(base.previous_aggregate_type_sequence(), 11);
        assert_eq!(base.editor().user(), "user-1");
        assert_eq!(base.data_as_bytes(), Some(&br#"{"name":"Acme"}"#[..]));
    }
}
