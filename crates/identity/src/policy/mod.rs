//! Policy events and read models, generic over the policy kind.
//!
//! Every policy is added once with all its fields and then changed field by
//! field. The event type carries the owning aggregate's prefix
//! (`iam.policy.login.added`), so constructors take it explicitly.

pub mod label;
pub mod login;
pub mod org_iam;
pub mod password;

use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;

use warden_core::{Aggregate, AggregateId, DomainError, DomainResult, TenantId};
use warden_events::{
    BaseEvent, Command, Editor, Event, EventData, EventError, EventMeta, EventType, ReadModel,
    Reducer, StoredEvent, downcast, transact, unmarshal,
};

pub use label::{LabelPolicy, LabelPolicyChanges};
pub use login::{LoginPolicy, LoginPolicyChanges};
pub use org_iam::{OrgIamPolicy, OrgIamPolicyChanges};
pub use password::{
    PasswordAgePolicy, PasswordAgePolicyChanges, PasswordComplexityPolicy,
    PasswordComplexityPolicyChanges, PasswordLockoutPolicy, PasswordLockoutPolicyChanges,
};

/// A policy kind: the full set of its settings.
pub trait Policy:
    Serialize + DeserializeOwned + Clone + PartialEq + core::fmt::Debug + Send + Sync + 'static
{
    /// Partial update of the policy.
    type Changes: PolicyChanges<Self>;

    /// Diagnostic codes of this policy's failure sites.
    const CODES: PolicyCodes;
}

/// One diagnostic code per failure site of a policy kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PolicyCodes {
    /// Payload of an added event could not be read.
    pub added: &'static str,
    /// Payload of a changed event could not be read.
    pub changed: &'static str,
    /// An event the policy model does not fold reached it.
    pub unexpected: &'static str,
    /// A change arrived before the policy was added.
    pub not_added: &'static str,
}

/// The changed fields of a policy; unset fields keep their value.
pub trait PolicyChanges<P>:
    Serialize + DeserializeOwned + Clone + Default + core::fmt::Debug + Send + Sync + 'static
{
    fn is_empty(&self) -> bool;

    fn apply_to(&self, policy: &mut P);
}

/// `<prefix>.policy.<kind>.added`
#[derive(Debug, Clone)]
pub struct PolicyAddedEvent<P: Policy> {
    base: BaseEvent,
    policy: P,
}

impl<P: Policy> PolicyAddedEvent<P> {
    pub fn new(editor: &Editor, aggregate: &Aggregate, event_type: EventType, policy: P) -> Self {
        Self {
            base: BaseEvent::for_push(editor, aggregate, event_type),
            policy,
        }
    }

    pub fn policy(&self) -> &P {
        &self.policy
    }
}

/// `<prefix>.policy.<kind>.changed`
#[derive(Debug, Clone)]
pub struct PolicyChangedEvent<P: Policy> {
    base: BaseEvent,
    changes: P::Changes,
}

impl<P: Policy> PolicyChangedEvent<P> {
    /// Fails if `changes` changes nothing.
    pub fn new(
        editor: &Editor,
        aggregate: &Aggregate,
        event_type: EventType,
        changes: P::Changes,
    ) -> DomainResult<Self> {
        if changes.is_empty() {
            return Err(DomainError::validation("Errors.NoChangesFound"));
        }
        Ok(Self {
            base: BaseEvent::for_push(editor, aggregate, event_type),
            changes,
        })
    }

    pub fn changes(&self) -> &P::Changes {
        &self.changes
    }
}

impl<P: Policy> EventMeta for PolicyAddedEvent<P> {
    fn base(&self) -> &BaseEvent {
        &self.base
    }
}

impl<P: Policy> Event for PolicyAddedEvent<P> {}

impl<P: Policy> Command for PolicyAddedEvent<P> {
    fn data(&self) -> EventData<'_> {
        EventData::structured(&self.policy)
    }
}

impl<P: Policy> EventMeta for PolicyChangedEvent<P> {
    fn base(&self) -> &BaseEvent {
        &self.base
    }
}

impl<P: Policy> Event for PolicyChangedEvent<P> {}

impl<P: Policy> Command for PolicyChangedEvent<P> {
    fn data(&self) -> EventData<'_> {
        EventData::structured(&self.changes)
    }
}

pub fn policy_added_mapper<P: Policy>(stored: &StoredEvent) -> Result<Arc<dyn Event>, EventError> {
    let policy = unmarshal::<P>(stored, P::CODES.added)?;
    Ok(Arc::new(PolicyAddedEvent {
        base: BaseEvent::from_stored(stored),
        policy,
    }))
}

pub fn policy_changed_mapper<P: Policy>(
    stored: &StoredEvent,
) -> Result<Arc<dyn Event>, EventError> {
    let changes = unmarshal::<P::Changes>(stored, P::CODES.changed)?;
    Ok(Arc::new(PolicyChangedEvent::<P> {
        base: BaseEvent::from_stored(stored),
        changes,
    }))
}

/// Current state of one policy of one aggregate. `None` until added.
#[derive(Debug, Clone, PartialEq)]
pub struct PolicyReadModel<P: Policy> {
    base: ReadModel,
    policy: Option<P>,
}

impl<P: Policy> PolicyReadModel<P> {
    pub fn new(aggregate_id: AggregateId, tenant_id: TenantId) -> Self {
        Self {
            base: ReadModel::new(aggregate_id, tenant_id),
            policy: None,
        }
    }

    pub fn policy(&self) -> Option<&P> {
        self.policy.as_ref()
    }

    pub fn processed_sequence(&self) -> u64 {
        self.base.processed_sequence()
    }

    fn apply(&mut self, event: &dyn Event) -> Result<(), EventError> {
        if let Some(added) = downcast::<PolicyAddedEvent<P>>(event) {
            self.policy = Some(added.policy().clone());
            return Ok(());
        }
        let Some(changed) = downcast::<PolicyChangedEvent<P>>(event) else {
            return Err(EventError::reduction(
                P::CODES.unexpected,
                format!(
                    "unexpected event {} (sequence {}) for policy",
                    event.event_type(),
                    event.sequence()
                ),
            ));
        };
        let Some(policy) = self.policy.as_mut() else {
            return Err(EventError::reduction(
                P::CODES.not_added,
                format!("policy changed at sequence {} before it was added", event.sequence()),
            ));
        };
        changed.changes().apply_to(policy);
        Ok(())
    }
}

impl<P: Policy> Reducer for PolicyReadModel<P> {
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

/// Assign every set field of `changes` to `policy`.
macro_rules! apply_changes {
    ($changes:expr, $policy:expr, $($field:ident),+ $(,)?) => {
        $(
            if let Some(value) = &$changes.$field {
                $policy.$field = value.clone();
            }
        )+
    };
}

pub(crate) use apply_changes;

#[cfg(test)]
mod tests {
    use warden_core::AggregateType;
    use warden_events::EventRegistry;

    use super::*;
    use crate::test_support::{stored, tenant};

    const ADDED: EventType = EventType::from_static("iam.policy.password.age.added");
    const CHANGED: EventType = EventType::from_static("iam.policy.password.age.changed");

    fn registry() -> EventRegistry {
        let mut registry = EventRegistry::new();
        registry
            .register(ADDED, policy_added_mapper::<PasswordAgePolicy>)
            .register(CHANGED, policy_changed_mapper::<PasswordAgePolicy>);
        registry
    }

    fn event(event_type: &str, sequence: u64, data: &str) -> Arc<dyn Event> {
        registry()
            .map(&stored("iam", "iam-1", event_type, sequence, Some(data)))
            .unwrap()
    }

    #[test]
    fn empty_change_is_rejected() {
        let editor = Editor::new("admin-api", "user-1").unwrap();
        let iam = Aggregate::new(
            AggregateType::from_static("iam"),
            AggregateId::new("iam-1"),
            tenant(),
        );
        let err = PolicyChangedEvent::<PasswordAgePolicy>::new(
            &editor,
            &iam,
            CHANGED,
            PasswordAgePolicyChanges::default(),
        )
        .unwrap_err();
        assert_eq!(err, DomainError::validation("Errors.NoChangesFound"));

        let changed = PolicyChangedEvent::<PasswordAgePolicy>::new(
            &editor,
            &iam,
            CHANGED,
            PasswordAgePolicyChanges {
                max_age_days: Some(90),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(
            changed.data().marshal().unwrap(),
            Some(br#"{"maxAgeDays":90}"#.to_vec())
        );
    }

    #[test]
    fn changes_apply_on_top_of_the_added_policy() {
        let mut model = PolicyReadModel::<PasswordAgePolicy>::new(AggregateId::new("iam-1"), tenant());
        model
            .append_and_reduce(&[
                event(
                    "iam.policy.password.age.added",
                    1,
                    r#"{"expireWarnDays":10,"maxAgeDays":30}"#,
                ),
                event("iam.policy.password.age.changed", 2, r#"{"maxAgeDays":90}"#),
            ])
            .unwrap();

        let policy = model.policy().unwrap();
        assert_eq!(policy.expire_warn_days, 10);
        assert_eq!(policy.max_age_days, 90);
    }

    #[test]
    fn change_before_add_fails_reduce() {
        let mut model = PolicyReadModel::<PasswordAgePolicy>::new(AggregateId::new("iam-1"), tenant());
        let err = model
            .append_and_reduce(&[event("iam.policy.password.age.changed", 1, r#"{"maxAgeDays":90}"#)])
            .unwrap_err();
        assert_eq!(err.code(), Some(PasswordAgePolicy::CODES.not_added));
        assert!(model.policy().is_none());
        assert_eq!(model.processed_sequence(), 0);
    }

    #[test]
    fn each_failure_site_reports_its_own_code() {
        let registry = registry();
        let added = registry
            .map(&stored("iam", "iam-1", "iam.policy.password.age.added", 1, Some("[")))
            .unwrap_err();
        let changed = registry
            .map(&stored("iam", "iam-1", "iam.policy.password.age.changed", 1, None))
            .unwrap_err();

        let mut model = PolicyReadModel::<PasswordAgePolicy>::new(AggregateId::new("iam-1"), tenant());
        let unmapped: Arc<dyn Event> = Arc::new(BaseEvent::from_stored(&stored(
            "iam",
            "iam-1",
            "iam.policy.password.age.added",
            1,
            Some(r#"{"expireWarnDays":10,"maxAgeDays":30}"#),
        )));
        let unexpected = model.append_and_reduce(&[unmapped]).unwrap_err();

        let codes = PasswordAgePolicy::CODES;
        assert_eq!(added.code(), Some(codes.added));
        assert_eq!(changed.code(), Some(codes.changed));
        assert_eq!(unexpected.code(), Some(codes.unexpected));
    }

    #[test]
    fn policy_codes_are_distinct_across_kinds_and_sites() {
        let all = [
            LoginPolicy::CODES,
            LabelPolicy::CODES,
            OrgIamPolicy::CODES,
            PasswordComplexityPolicy::CODES,
            PasswordAgePolicy::CODES,
            PasswordLockoutPolicy::CODES,
        ];
        let mut seen = std::collections::HashSet::new();
        for codes in all {
            for code in [codes.added, codes.changed, codes.unexpected, codes.not_added] {
                assert!(seen.insert(code), "duplicate code {code}");
            }
        }
        assert_eq!(seen.len(), 24);
    }
}
