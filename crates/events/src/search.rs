//! Filter descriptor for reading events.

use warden_core::{AggregateId, AggregateType, TenantId};

use crate::{EventError, EventType, StoredEvent};

/// What a query returns.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum Columns {
    /// Full event records.
    #[default]
    Event,
    /// Only the highest matching sequence.
    MaxSequence,
}

/// Describes which events a reader is interested in.
///
/// Passive: building a query never touches the store. Empty id/type lists
/// mean "any".
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SearchQuery {
    columns: Columns,
    aggregate_types: Vec<AggregateType>,
    aggregate_ids: Vec<AggregateId>,
    event_types: Vec<EventType>,
    tenant: Option<TenantId>,
    resource_owner: Option<String>,
    sequence_greater: Option<u64>,
    sequence_less: Option<u64>,
    limit: Option<usize>,
    descending: bool,
}

impl SearchQuery {
    pub fn new(columns: Columns) -> Self {
        Self {
            columns,
            ..Self::default()
        }
    }

    pub fn aggregate_types(mut self, types: impl IntoIterator<Item = AggregateType>) -> Self {
        self.aggregate_types.extend(types);
        self
    }

    pub fn aggregate_ids(mut self, ids: impl IntoIterator<Item = AggregateId>) -> Self {
        self.aggregate_ids.extend(ids);
        self
    }

    pub fn event_types(mut self, types: impl IntoIterator<Item = EventType>) -> Self {
        self.event_types.extend(types);
        self
    }

    pub fn tenant(mut self, tenant: TenantId) -> Self {
        self.tenant = Some(tenant);
        self
    }

    pub fn resource_owner(mut self, resource_owner: impl Into<String>) -> Self {
        self.resource_owner = Some(resource_owner.into());
        self
    }

    /// Only events strictly after `sequence`.
    pub fn sequence_greater(mut self, sequence: u64) -> Self {
        self.sequence_greater = Some(sequence);
        self
    }

    /// Only events strictly before `sequence`.
    pub fn sequence_less(mut self, sequence: u64) -> Self {
        self.sequence_less = Some(sequence);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn order_desc(mut self) -> Self {
        self.descending = true;
        self
    }

    pub fn columns(&self) -> Columns {
        self.columns
    }

    pub fn get_limit(&self) -> Option<usize> {
        self.limit
    }

    pub fn is_descending(&self) -> bool {
        self.descending
    }

    /// A query must name at least one aggregate type.
    pub fn validate(&self) -> Result<(), EventError> {
        if self.aggregate_types.is_empty() {
            return Err(EventError::InvalidQuery(
                "at least one aggregate type is required".to_string(),
            ));
        }
        Ok(())
    }

    /// Whether `event` passes every filter (limit and order aside).
    pub fn matches(&self, event: &StoredEvent) -> bool {
        let aggregate = &event.aggregate;
        (self.aggregate_types.is_empty()
            || self.aggregate_types.contains(aggregate.aggregate_type()))
            && (self.aggregate_ids.is_empty() || self.aggregate_ids.contains(aggregate.id()))
            && (self.event_types.is_empty() || self.event_types.contains(&event.event_type))
            && self.tenant.is_none_or(|t| t == aggregate.tenant_id())
            && self
                .resource_owner
                .as_deref()
                .is_none_or(|o| o == aggregate.resource_owner())
            && self.sequence_greater.is_none_or(|s| event.sequence > s)
            && self.sequence_less.is_none_or(|s| event.sequence < s)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use warden_core::{Aggregate, EventId};

    use super::*;

    fn stored(id: &str, event_type: &'static str, sequence: u64, tenant: TenantId) -> StoredEvent {
        StoredEvent {
            id: EventId::new(),
            aggregate: Aggregate::new(AggregateType::from_static("org"), AggregateId::new(id), tenant),
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
    fn query_without_aggregate_type_is_invalid() {
        assert!(SearchQuery::new(Columns::Event).validate().is_err());
        assert!(
            SearchQuery::new(Columns::Event)
                .aggregate_types([AggregateType::from_static("org")])
                .validate()
                .is_ok()
        );
    }

    #[test]
    fn matches_applies_every_filter() {
        let tenant = TenantId::new();
        let query = SearchQuery::new(Columns::Event)
            .aggregate_types([AggregateType::from_static("org")])
            .aggregate_ids([AggregateId::new("o-1")])
            .event_types([EventType::from_static("org.added")])
            .tenant(tenant)
            .sequence_greater(2)
            .sequence_less(10);

        assert!(query.matches(&stored("o-1", "org.added", 3, tenant)));
        assert!(!query.matches(&stored("o-2", "org.added", 3, tenant)));
        assert!(!query.matches(&stored("o-1", "org.changed", 3, tenant)));
        assert!(!query.matches(&stored("o-1", "org.added", 2, tenant)));
        assert!(!query.matches(&stored("o-1", "org.added", 10, tenant)));
        assert!(!query.matches(&stored("o-1", "org.added", 3, TenantId::new())));
    }

    #[test]
    fn resource_owner_filter_uses_aggregate_owner() {
        let tenant = TenantId::new();
        let query = SearchQuery::new(Columns::Event)
            .aggregate_types([AggregateType::from_static("org")])
            .resource_owner("o-1");
        assert!(query.matches(&stored("o-1", "org.added", 1, tenant)));
        assert!(!query.matches(&stored("o-2", "org.added", 1, tenant)));
    }
}
