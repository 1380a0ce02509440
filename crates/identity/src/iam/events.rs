//! IAM instance events.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use warden_core::{Aggregate, AggregateType};
use warden_events::{
    BaseEvent, Command, Editor, Event, EventData, EventError, EventMeta, EventType, StoredEvent,
    impl_event, unmarshal,
};

pub const AGGREGATE_TYPE: AggregateType = AggregateType::from_static("iam");

pub const SETUP_STARTED: EventType = EventType::from_static("iam.setup.started");
pub const SETUP_DONE: EventType = EventType::from_static("iam.setup.done");
pub const GLOBAL_ORG_SET: EventType = EventType::from_static("iam.global.org.set");
pub const PROJECT_SET: EventType = EventType::from_static("iam.project.iam.set");

pub const MEMBER_ADDED: EventType = EventType::from_static("iam.member.added");
pub const MEMBER_CHANGED: EventType = EventType::from_static("iam.member.changed");
pub const MEMBER_REMOVED: EventType = EventType::from_static("iam.member.removed");

pub const LOGIN_POLICY_ADDED: EventType = EventType::from_static("iam.policy.login.added");
pub const LOGIN_POLICY_CHANGED: EventType = EventType::from_static("iam.policy.login.changed");
pub const LABEL_POLICY_ADDED: EventType = EventType::from_static("iam.policy.label.added");
pub const LABEL_POLICY_CHANGED: EventType = EventType::from_static("iam.policy.label.changed");
pub const ORG_IAM_POLICY_ADDED: EventType = EventType::from_static("iam.policy.org.iam.added");
pub const ORG_IAM_POLICY_CHANGED: EventType =
    EventType::from_static("iam.policy.org.iam.changed");
pub const PASSWORD_COMPLEXITY_POLICY_ADDED: EventType =
    EventType::from_static("iam.policy.password.complexity.added");
pub const PASSWORD_COMPLEXITY_POLICY_CHANGED: EventType =
    EventType::from_static("iam.policy.password.complexity.changed");
pub const PASSWORD_AGE_POLICY_ADDED: EventType =
    EventType::from_static("iam.policy.password.age.added");
pub const PASSWORD_AGE_POLICY_CHANGED: EventType =
    EventType::from_static("iam.policy.password.age.changed");
pub const PASSWORD_LOCKOUT_POLICY_ADDED: EventType =
    EventType::from_static("iam.policy.password.lockout.added");
pub const PASSWORD_LOCKOUT_POLICY_CHANGED: EventType =
    EventType::from_static("iam.policy.password.lockout.changed");

/// Setup step of the instance. Steps run in increasing order.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Step(pub u32);

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
struct StepPayload {
    step: Step,
}

/// `iam.setup.started` / `iam.setup.done`.
///
/// Whether the step is done follows from the event type; it is not part of
/// the payload.
#[derive(Debug, Clone)]
pub struct SetupStepEvent {
    base: BaseEvent,
    payload: StepPayload,
}

impl_event!(SetupStepEvent);

impl SetupStepEvent {
    pub fn new(editor: &Editor, aggregate: &Aggregate, step: Step, done: bool) -> Self {
        let event_type = if done { SETUP_DONE } else { SETUP_STARTED };
        Self {
            base: BaseEvent::for_push(editor, aggregate, event_type),
            payload: StepPayload { step },
        }
    }

    pub fn step(&self) -> Step {
        self.payload.step
    }

    pub fn done(&self) -> bool {
        *self.event_type() == SETUP_DONE
    }
}

impl Command for SetupStepEvent {
    fn data(&self) -> EventData<'_> {
        EventData::structured(&self.payload)
    }
}

pub fn setup_step_mapper(stored: &StoredEvent) -> Result<Arc<dyn Event>, EventError> {
    let payload = unmarshal(stored, "IAM-O6p8z")?;
    Ok(Arc::new(SetupStepEvent {
        base: BaseEvent::from_stored(stored),
        payload,
    }))
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GlobalOrgPayload {
    global_org_id: String,
}

/// `iam.global.org.set`: the org that owns global resources.
#[derive(Debug, Clone)]
pub struct GlobalOrgSetEvent {
    base: BaseEvent,
    payload: GlobalOrgPayload,
}

impl_event!(GlobalOrgSetEvent);

impl GlobalOrgSetEvent {
    pub fn new(editor: &Editor, aggregate: &Aggregate, org_id: impl Into<String>) -> Self {
        Self {
            base: BaseEvent::for_push(editor, aggregate, GLOBAL_ORG_SET),
            payload: GlobalOrgPayload {
                global_org_id: org_id.into(),
            },
        }
    }

    pub fn org_id(&self) -> &str {
        &self.payload.global_org_id
    }
}

impl Command for GlobalOrgSetEvent {
    fn data(&self) -> EventData<'_> {
        EventData::structured(&self.payload)
    }
}

pub fn global_org_set_mapper(stored: &StoredEvent) -> Result<Arc<dyn Event>, EventError> {
    let payload = unmarshal(stored, "IAM-cdFZH")?;
    Ok(Arc::new(GlobalOrgSetEvent {
        base: BaseEvent::from_stored(stored),
        payload,
    }))
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProjectPayload {
    iam_project_id: String,
}

/// `iam.project.iam.set`: the project holding the IAM's own applications.
#[derive(Debug, Clone)]
pub struct ProjectSetEvent {
    base: BaseEvent,
    payload: ProjectPayload,
}

impl_event!(ProjectSetEvent);

impl ProjectSetEvent {
    pub fn new(editor: &Editor, aggregate: &Aggregate, project_id: impl Into<String>) -> Self {
        Self {
            base: BaseEvent::for_push(editor, aggregate, PROJECT_SET),
            payload: ProjectPayload {
                iam_project_id: project_id.into(),
            },
        }
    }

    pub fn project_id(&self) -> &str {
        &self.payload.iam_project_id
    }
}

impl Command for ProjectSetEvent {
    fn data(&self) -> EventData<'_> {
        EventData::structured(&self.payload)
    }
}

pub fn project_set_mapper(stored: &StoredEvent) -> Result<Arc<dyn Event>, EventError> {
    let payload = unmarshal(stored, "IAM-9uEnS")?;
    Ok(Arc::new(ProjectSetEvent {
        base: BaseEvent::from_stored(stored),
        payload,
    }))
}

#[cfg(test)]
mod tests {
    use warden_core::AggregateId;
    use warden_events::downcast;

    use super::*;
    use crate::test_support::{stored, tenant};

    #[test]
    fn setup_step_done_follows_event_type() {
        let editor = Editor::new("setup", "system").unwrap();
        let iam = Aggregate::new(AGGREGATE_TYPE, AggregateId::new("iam-1"), tenant());

        let started = SetupStepEvent::new(&editor, &iam, Step(3), false);
        assert_eq!(started.event_type(), &SETUP_STARTED);
        assert!(!started.done());
        assert_eq!(started.data().marshal().unwrap(), Some(br#"{"step":3}"#.to_vec()));

        let record = stored("iam", "iam-1", "iam.setup.done", 4, Some(r#"{"step":3}"#));
        let event = setup_step_mapper(&record).unwrap();
        let done = downcast::<SetupStepEvent>(event.as_ref()).unwrap();
        assert!(done.done());
        assert_eq!(done.step(), Step(3));
    }

    #[test]
    fn mappers_report_their_own_codes() {
        let record = stored("iam", "iam-1", "iam.global.org.set", 1, Some("[]"));
        assert_eq!(global_org_set_mapper(&record).unwrap_err().code(), Some("IAM-cdFZH"));

        let record = stored("iam", "iam-1", "iam.project.iam.set", 1, None);
        assert_eq!(project_set_mapper(&record).unwrap_err().code(), Some("IAM-9uEnS"));
    }
}
