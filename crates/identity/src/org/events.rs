//! Organization lifecycle events.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use warden_core::{Aggregate, AggregateType};
use warden_events::{
    BaseEvent, Command, Editor, Event, EventData, EventError, EventMeta, EventType, StoredEvent,
    UniqueConstraint, UniqueConstraints, impl_event, unmarshal,
};

use crate::org::domain::remove_org_domain_constraint;
use crate::project::remove_saml_entity_id_constraint;
use crate::user::{UserIdpLink, remove_idp_link_constraint, remove_username_constraint};

pub const AGGREGATE_TYPE: AggregateType = AggregateType::from_static("org");

pub const ORG_ADDED: EventType = EventType::from_static("org.added");
pub const ORG_CHANGED: EventType = EventType::from_static("org.changed");
pub const ORG_DEACTIVATED: EventType = EventType::from_static("org.deactivated");
pub const ORG_REACTIVATED: EventType = EventType::from_static("org.reactivated");
pub const ORG_REMOVED: EventType = EventType::from_static("org.removed");

pub const UNIQUE_ORG_NAME: &str = "org_name";

pub fn add_org_name_constraint(name: &str) -> UniqueConstraint {
    UniqueConstraint::add(UNIQUE_ORG_NAME, name, "Errors.Org.AlreadyExists")
}

pub fn remove_org_name_constraint(name: &str) -> UniqueConstraint {
    UniqueConstraint::remove(UNIQUE_ORG_NAME, name)
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
struct NamePayload {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    name: String,
}

/// `org.added`: an organization was created with `name`.
#[derive(Debug, Clone)]
pub struct OrgAddedEvent {
    base: BaseEvent,
    payload: NamePayload,
}

impl_event!(OrgAddedEvent);

impl OrgAddedEvent {
    pub fn new(editor: &Editor, aggregate: &Aggregate, name: impl Into<String>) -> Self {
        Self {
            base: BaseEvent::for_push(editor, aggregate, ORG_ADDED),
            payload: NamePayload { name: name.into() },
        }
    }

    pub fn name(&self) -> &str {
        &self.payload.name
    }
}

impl Command for OrgAddedEvent {
    fn data(&self) -> EventData<'_> {
        EventData::structured(&self.payload)
    }
}

impl UniqueConstraints for OrgAddedEvent {
    type Context = ();

    fn unique_constraints(&self, _: &()) -> Vec<UniqueConstraint> {
        vec![add_org_name_constraint(self.name())]
    }
}

pub fn org_added_mapper(stored: &StoredEvent) -> Result<Arc<dyn Event>, EventError> {
    let payload = unmarshal(stored, "ORG-Bren2")?;
    Ok(Arc::new(OrgAddedEvent {
        base: BaseEvent::from_stored(stored),
        payload,
    }))
}

/// The name an org had before a rename. Needed to release it, never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrgRename {
    pub old_name: String,
}

/// `org.changed`: the organization was renamed.
#[derive(Debug, Clone)]
pub struct OrgChangedEvent {
    base: BaseEvent,
    payload: NamePayload,
}

impl_event!(OrgChangedEvent);

impl OrgChangedEvent {
    pub fn new(editor: &Editor, aggregate: &Aggregate, new_name: impl Into<String>) -> Self {
        Self {
            base: BaseEvent::for_push(editor, aggregate, ORG_CHANGED),
            payload: NamePayload {
                name: new_name.into(),
            },
        }
    }

    pub fn name(&self) -> &str {
        &self.payload.name
    }
}

impl Command for OrgChangedEvent {
    fn data(&self) -> EventData<'_> {
        EventData::structured(&self.payload)
    }
}

impl UniqueConstraints for OrgChangedEvent {
    type Context = OrgRename;

    /// Release the old name before claiming the new one.
    fn unique_constraints(&self, rename: &OrgRename) -> Vec<UniqueConstraint> {
        vec![
            remove_org_name_constraint(&rename.old_name),
            add_org_name_constraint(self.name()),
        ]
    }
}

pub fn org_changed_mapper(stored: &StoredEvent) -> Result<Arc<dyn Event>, EventError> {
    let payload = unmarshal(stored, "ORG-Gsq4p")?;
    Ok(Arc::new(OrgChangedEvent {
        base: BaseEvent::from_stored(stored),
        payload,
    }))
}

/// `org.deactivated`
#[derive(Debug, Clone)]
pub struct OrgDeactivatedEvent {
    base: BaseEvent,
}

impl_event!(OrgDeactivatedEvent);

impl OrgDeactivatedEvent {
    pub fn new(editor: &Editor, aggregate: &Aggregate) -> Self {
        Self {
            base: BaseEvent::for_push(editor, aggregate, ORG_DEACTIVATED),
        }
    }
}

impl Command for OrgDeactivatedEvent {
    fn data(&self) -> EventData<'_> {
        EventData::Empty
    }
}

pub fn org_deactivated_mapper(stored: &StoredEvent) -> Result<Arc<dyn Event>, EventError> {
    Ok(Arc::new(OrgDeactivatedEvent {
        base: BaseEvent::from_stored(stored),
    }))
}

/// `org.reactivated`
#[derive(Debug, Clone)]
pub struct OrgReactivatedEvent {
    base: BaseEvent,
}

impl_event!(OrgReactivatedEvent);

impl OrgReactivatedEvent {
    pub fn new(editor: &Editor, aggregate: &Aggregate) -> Self {
        Self {
            base: BaseEvent::for_push(editor, aggregate, ORG_REACTIVATED),
        }
    }
}

impl Command for OrgReactivatedEvent {
    fn data(&self) -> EventData<'_> {
        EventData::Empty
    }
}

pub fn org_reactivated_mapper(stored: &StoredEvent) -> Result<Arc<dyn Event>, EventError> {
    Ok(Arc::new(OrgReactivatedEvent {
        base: BaseEvent::from_stored(stored),
    }))
}

/// Everything an org owns whose uniqueness claim must be released when the
/// org is removed. Gathered by the caller, never stored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrgRemoval {
    pub name: String,
    pub usernames: Vec<String>,
    pub login_must_be_domain: bool,
    pub domains: Vec<String>,
    pub idp_links: Vec<UserIdpLink>,
    pub saml_entity_ids: Vec<String>,
}

/// `org.removed`. Carries no payload.
#[derive(Debug, Clone)]
pub struct OrgRemovedEvent {
    base: BaseEvent,
}

impl_event!(OrgRemovedEvent);

impl OrgRemovedEvent {
    pub fn new(editor: &Editor, aggregate: &Aggregate) -> Self {
        Self {
            base: BaseEvent::for_push(editor, aggregate, ORG_REMOVED),
        }
    }
}

impl Command for OrgRemovedEvent {
    fn data(&self) -> EventData<'_> {
        EventData::Empty
    }
}

impl UniqueConstraints for OrgRemovedEvent {
    type Context = OrgRemoval;

    fn unique_constraints(&self, removal: &OrgRemoval) -> Vec<UniqueConstraint> {
        let org_id = self.aggregate().id().as_str();

        let mut constraints = Vec::with_capacity(
            1 + removal.usernames.len()
                + removal.domains.len()
                + removal.idp_links.len()
                + removal.saml_entity_ids.len(),
        );
        constraints.push(remove_org_name_constraint(&removal.name));
        constraints.extend(removal.usernames.iter().map(|username| {
            remove_username_constraint(username, org_id, removal.login_must_be_domain)
        }));
        constraints.extend(
            removal
                .domains
                .iter()
                .map(|domain| remove_org_domain_constraint(domain)),
        );
        constraints.extend(removal.idp_links.iter().map(remove_idp_link_constraint));
        constraints.extend(
            removal
                .saml_entity_ids
                .iter()
                .map(|id| remove_saml_entity_id_constraint(id)),
        );
        constraints
    }
}

pub fn org_removed_mapper(stored: &StoredEvent) -> Result<Arc<dyn Event>, EventError> {
    Ok(Arc::new(OrgRemovedEvent {
        base: BaseEvent::from_stored(stored),
    }))
}
