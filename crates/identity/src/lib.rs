//! Identity domain event catalog (event-sourced).
//!
//! Events, uniqueness constraints, mappers and read models of the IAM
//! aggregates: organizations and their domains, the IAM instance with its
//! members and default policies. Pure domain logic (no IO, no storage).

pub mod iam;
pub mod member;
pub mod org;
pub mod policy;
pub mod project;
pub mod user;

pub use iam::IamReadModel;
pub use member::{MemberReadModel, MembersReadModel};
pub use org::{OrgDependents, OrgState, OrgWriteModel};
pub use policy::PolicyReadModel;
pub use user::UserIdpLink;

use warden_events::EventRegistry;

/// Register the mappers of every aggregate in this crate.
pub fn register_event_mappers(registry: &mut EventRegistry) {
    org::register_event_mappers(registry);
    iam::register_event_mappers(registry);
}

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::{TimeZone, Utc};
    use warden_core::{Aggregate, AggregateId, AggregateType, EventId, TenantId};
    use warden_events::{EventType, StoredEvent};

    /// Tenant of every record built by [`stored`].
    pub fn tenant() -> TenantId {
        TenantId::from_uuid(Default::default())
    }

    /// A stored record as a store would return it.
    pub fn stored(
        aggregate_type: &'static str,
        aggregate_id: &str,
        event_type: &str,
        sequence: u64,
        data: Option<&str>,
    ) -> StoredEvent {
        StoredEvent {
            id: EventId::new(),
            aggregate: Aggregate::new(
                AggregateType::from_static(aggregate_type),
                AggregateId::new(aggregate_id),
                tenant(),
            ),
            event_type: EventType::new(event_type),
            sequence,
            previous_aggregate_sequence: sequence.saturating_sub(1),
            previous_aggregate_type_sequence: sequence.saturating_sub(1),
            creation_date: Utc
                .timestamp_opt(1_700_000_000 + sequence as i64, 0)
                .single()
                .unwrap_or_default(),
            editor_service: "admin-api".to_string(),
            editor_user: "user-1".to_string(),
            data: data.map(|d| d.as_bytes().to_vec()),
        }
    }
}
