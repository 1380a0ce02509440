//! Member events and read models, shared by every aggregate that has members.
//!
//! The event type carries the owning aggregate's prefix (`iam.member.added`),
//! so constructors take it explicitly and one mapper serves every prefix.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use warden_core::{Aggregate, AggregateId, TenantId};
use warden_events::{
    BaseEvent, Command, Editor, Event, EventData, EventError, EventMeta, EventType, ReadModel,
    Reducer, StoredEvent, UniqueConstraint, UniqueConstraints, downcast, impl_event, transact,
    unmarshal,
};

pub const UNIQUE_MEMBER: &str = "member";

fn member_key(aggregate_id: &AggregateId, user_id: &str) -> String {
    format!("{aggregate_id}:{user_id}")
}

pub fn add_member_constraint(aggregate_id: &AggregateId, user_id: &str) -> UniqueConstraint {
    UniqueConstraint::add(
        UNIQUE_MEMBER,
        member_key(aggregate_id, user_id),
        "Errors.Member.AlreadyExists",
    )
}

pub fn remove_member_constraint(aggregate_id: &AggregateId, user_id: &str) -> UniqueConstraint {
    UniqueConstraint::remove(UNIQUE_MEMBER, member_key(aggregate_id, user_id))
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MemberPayload {
    user_id: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    roles: Vec<String>,
}

/// `<prefix>.member.added`
#[derive(Debug, Clone)]
pub struct MemberAddedEvent {
    base: BaseEvent,
    payload: MemberPayload,
}

/// `<prefix>.member.changed`: the member's roles were replaced.
#[derive(Debug, Clone)]
pub struct MemberChangedEvent {
    base: BaseEvent,
    payload: MemberPayload,
}

/// `<prefix>.member.removed`
#[derive(Debug, Clone)]
pub struct MemberRemovedEvent {
    base: BaseEvent,
    payload: MemberPayload,
}

impl_event!(MemberAddedEvent, MemberChangedEvent, MemberRemovedEvent);

impl MemberAddedEvent {
    pub fn new(
        editor: &Editor,
        aggregate: &Aggregate,
        event_type: EventType,
        user_id: impl Into<String>,
        roles: Vec<String>,
    ) -> Self {
        Self {
            base: BaseEvent::for_push(editor, aggregate, event_type),
            payload: MemberPayload {
                user_id: user_id.into(),
                roles,
            },
        }
    }

    pub fn user_id(&self) -> &str {
        &self.payload.user_id
    }

    pub fn roles(&self) -> &[String] {
        &self.payload.roles
    }
}

impl MemberChangedEvent {
    pub fn new(
        editor: &Editor,
        aggregate: &Aggregate,
        event_type: EventType,
        user_id: impl Into<String>,
        roles: Vec<String>,
    ) -> Self {
        Self {
            base: BaseEvent::for_push(editor, aggregate, event_type),
            payload: MemberPayload {
                user_id: user_id.into(),
                roles,
            },
        }
    }

    pub fn user_id(&self) -> &str {
        &self.payload.user_id
    }

    pub fn roles(&self) -> &[String] {
        &self.payload.roles
    }
}

impl MemberRemovedEvent {
    pub fn new(
        editor: &Editor,
        aggregate: &Aggregate,
        event_type: EventType,
        user_id: impl Into<String>,
    ) -> Self {
        Self {
            base: BaseEvent::for_push(editor, aggregate, event_type),
            payload: MemberPayload {
                user_id: user_id.into(),
                roles: Vec::new(),
            },
        }
    }

    pub fn user_id(&self) -> &str {
        &self.payload.user_id
    }
}

impl Command for MemberAddedEvent {
    fn data(&self) -> EventData<'_> {
        EventData::structured(&self.payload)
    }
}

impl Command for MemberChangedEvent {
    fn data(&self) -> EventData<'_> {
        EventData::structured(&self.payload)
    }
}

impl Command for MemberRemovedEvent {
    fn data(&self) -> EventData<'_> {
        EventData::structured(&self.payload)
    }
}

impl UniqueConstraints for MemberAddedEvent {
    type Context = ();

    fn unique_constraints(&self, _: &()) -> Vec<UniqueConstraint> {
        vec![add_member_constraint(self.aggregate().id(), self.user_id())]
    }
}

impl UniqueConstraints for MemberRemovedEvent {
    type Context = ();

    fn unique_constraints(&self, _: &()) -> Vec<UniqueConstraint> {
        vec![remove_member_constraint(self.aggregate().id(), self.user_id())]
    }
}

pub fn member_added_mapper(stored: &StoredEvent) -> Result<Arc<dyn Event>, EventError> {
    let payload = unmarshal(stored, "MEMBER-puqv4")?;
    Ok(Arc::new(MemberAddedEvent {
        base: BaseEvent::from_stored(stored),
        payload,
    }))
}

pub fn member_changed_mapper(stored: &StoredEvent) -> Result<Arc<dyn Event>, EventError> {
    let payload = unmarshal(stored, "MEMBER-Kd8vS")?;
    Ok(Arc::new(MemberChangedEvent {
        base: BaseEvent::from_stored(stored),
        payload,
    }))
}

pub fn member_removed_mapper(stored: &StoredEvent) -> Result<Arc<dyn Event>, EventError> {
    let payload = unmarshal(stored, "MEMBER-Ep4ip")?;
    Ok(Arc::new(MemberRemovedEvent {
        base: BaseEvent::from_stored(stored),
        payload,
    }))
}

/// One member as seen by [`MembersReadModel`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberReadModel {
    pub user_id: String,
    pub roles: Vec<String>,
    pub creation_date: DateTime<Utc>,
    pub change_date: DateTime<Utc>,
    pub sequence: u64,
}

/// Current members of one aggregate, in order of addition.
#[derive(Debug, Clone, PartialEq)]
pub struct MembersReadModel {
    base: ReadModel,
    members: Vec<MemberReadModel>,
}

impl MembersReadModel {
    pub fn new(aggregate_id: AggregateId, tenant_id: TenantId) -> Self {
        Self {
            base: ReadModel::new(aggregate_id, tenant_id),
            members: Vec::new(),
        }
    }

    pub fn members(&self) -> &[MemberReadModel] {
        &self.members
    }

    pub fn member(&self, user_id: &str) -> Option<&MemberReadModel> {
        self.members.iter().find(|m| m.user_id == user_id)
    }

    pub fn processed_sequence(&self) -> u64 {
        self.base.processed_sequence()
    }

    fn apply(&mut self, event: &dyn Event) -> Result<(), EventError> {
        if let Some(e) = downcast::<MemberAddedEvent>(event) {
            self.members.retain(|m| m.user_id != e.user_id());
            self.members.push(MemberReadModel {
                user_id: e.user_id().to_string(),
                roles: e.roles().to_vec(),
                creation_date: e.creation_date(),
                change_date: e.creation_date(),
                sequence: e.sequence(),
            });
        } else if let Some(e) = downcast::<MemberChangedEvent>(event) {
            let Some(member) = self.members.iter_mut().find(|m| m.user_id == e.user_id()) else {
                debug!(
                    user_id = e.user_id(),
                    sequence = e.sequence(),
                    "change of unknown member ignored"
                );
                return Ok(());
            };
            member.roles = e.roles().to_vec();
            member.change_date = e.creation_date();
            member.sequence = e.sequence();
        } else if let Some(e) = downcast::<MemberRemovedEvent>(event) {
            self.members.retain(|m| m.user_id != e.user_id());
        } else {
            return Err(EventError::reduction(
                "MEMBER-Rt6ad",
                format!(
                    "unexpected event {} (sequence {}) for members",
                    event.event_type(),
                    event.sequence()
                ),
            ));
        }
        Ok(())
    }
}

impl Reducer for MembersReadModel {
    fn append_events(&mut self, events: &[Arc<dyn Event>]) -> Result<(), EventError> {
        self.base.append_events(events)
    }

    fn reduce(&mut self) -> Result<(), EventError> {
        transact(self, |m| {
            let pending = m.base.pending().to_vec();
            for event in &pending {
                m.apply(event.as_ref())?;
            }
            m.base.reduce()
        })
    }
}
