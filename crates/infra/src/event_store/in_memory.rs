use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use chrono::Utc;
use tracing::{debug, instrument};

use warden_core::{AggregateId, AggregateType, TenantId};
use warden_events::{Columns, SearchQuery, StoredEvent, UniqueConstraintAction};

use super::r#trait::{EventStore, EventStoreError, EventStream, PendingEvent};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct AggregateKey {
    tenant_id: TenantId,
    aggregate_type: AggregateType,
    aggregate_id: AggregateId,
}

impl AggregateKey {
    fn of(event: &PendingEvent) -> Self {
        Self {
            tenant_id: event.aggregate.tenant_id(),
            aggregate_type: event.aggregate.aggregate_type().clone(),
            aggregate_id: event.aggregate.id().clone(),
        }
    }
}

/// A claimed unique value. Claims are scoped to a tenant.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ConstraintKey {
    tenant_id: TenantId,
    unique_type: String,
    unique_field: String,
}

#[derive(Debug, Default)]
struct State {
    /// Global log; `log[i].sequence == i + 1`.
    log: Vec<StoredEvent>,
    aggregate_sequences: HashMap<AggregateKey, u64>,
    type_sequences: HashMap<(TenantId, AggregateType), u64>,
    constraints: HashSet<ConstraintKey>,
}

impl State {
    fn latest(&self, key: &AggregateKey) -> u64 {
        self.aggregate_sequences.get(key).copied().unwrap_or(0)
    }
}

/// In-memory append-only event store.
///
/// Intended for tests/dev. Every batch is validated against a staged view of
/// the constraint table first and only then written, so a failing batch
/// leaves no trace.
#[derive(Debug, Default)]
pub struct InMemoryEventStore {
    state: RwLock<State>,
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `unique_field` is currently claimed for `unique_type`.
    pub fn is_claimed(&self, tenant_id: TenantId, unique_type: &str, unique_field: &str) -> bool {
        self.state.read().is_ok_and(|state| {
            state.constraints.contains(&ConstraintKey {
                tenant_id,
                unique_type: unique_type.to_string(),
                unique_field: unique_field.to_string(),
            })
        })
    }

    /// Number of stored events across all tenants.
    pub fn len(&self) -> usize {
        self.state.read().map(|state| state.log.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn validate(events: &[PendingEvent]) -> Result<(), EventStoreError> {
        for (idx, e) in events.iter().enumerate() {
            if e.aggregate.aggregate_type().as_str().is_empty() {
                return Err(EventStoreError::InvalidAppend(format!(
                    "event {idx} has no aggregate type"
                )));
            }
            if e.aggregate.id().as_str().is_empty() {
                return Err(EventStoreError::InvalidAppend(format!(
                    "event {idx} has no aggregate id"
                )));
            }
            if e.event_type.as_str().is_empty() {
                return Err(EventStoreError::InvalidAppend(format!(
                    "event {idx} has no event type"
                )));
            }
        }
        Ok(())
    }

    fn check_sequences(state: &State, events: &[PendingEvent]) -> Result<(), EventStoreError> {
        for e in events {
            let actual = state.latest(&AggregateKey::of(e));
            if !e.expected_sequence.matches(actual) {
                return Err(EventStoreError::SequenceConflict {
                    aggregate_type: e.aggregate.aggregate_type().clone(),
                    aggregate_id: e.aggregate.id().clone(),
                    expected: e.expected_sequence,
                    actual,
                });
            }
        }
        Ok(())
    }

    /// Apply the batch's constraint changes, in order, to a staged overlay.
    ///
    /// Returns the overlay (`true` = claimed, `false` = released) to be merged
    /// on commit. Releasing an unclaimed value is a no-op.
    fn stage_constraints(
        state: &State,
        events: &[PendingEvent],
    ) -> Result<HashMap<ConstraintKey, bool>, EventStoreError> {
        let mut staged: HashMap<ConstraintKey, bool> = HashMap::new();

        for e in events {
            for constraint in &e.unique_constraints {
                let key = ConstraintKey {
                    tenant_id: e.aggregate.tenant_id(),
                    unique_type: constraint.unique_type().to_string(),
                    unique_field: constraint.unique_field().to_string(),
                };
                match constraint.action() {
                    UniqueConstraintAction::Add => {
                        let claimed = staged
                            .get(&key)
                            .copied()
                            .unwrap_or_else(|| state.constraints.contains(&key));
                        if claimed {
                            return Err(EventStoreError::UniqueConstraint {
                                unique_type: key.unique_type,
                                unique_field: key.unique_field,
                                error_message: constraint.error_message().unwrap_or_default().to_string(),
                            });
                        }
                        staged.insert(key, true);
                    }
                    UniqueConstraintAction::Remove => {
                        staged.insert(key, false);
                    }
                }
            }
        }

        Ok(staged)
    }
}

impl EventStore for InMemoryEventStore {
    #[instrument(skip_all, fields(event_count = events.len()), err)]
    fn append(&self, events: Vec<PendingEvent>) -> Result<Vec<StoredEvent>, EventStoreError> {
        if events.is_empty() {
            return Ok(vec![]);
        }
        Self::validate(&events)?;

        let mut state = self
            .state
            .write()
            .map_err(|_| EventStoreError::Storage("lock poisoned".to_string()))?;

        Self::check_sequences(&state, &events)?;
        let staged = Self::stage_constraints(&state, &events)?;

        // Nothing below can fail: commit.
        let creation_date = Utc::now();
        let mut committed = Vec::with_capacity(events.len());
        for e in events {
            let aggregate_key = AggregateKey::of(&e);
            let type_key = (e.aggregate.tenant_id(), e.aggregate.aggregate_type().clone());
            let sequence = state.log.len() as u64 + 1;

            let stored = StoredEvent {
                id: e.id,
                aggregate: e.aggregate,
                event_type: e.event_type,
                sequence,
                previous_aggregate_sequence: state.latest(&aggregate_key),
                previous_aggregate_type_sequence: state
                    .type_sequences
                    .get(&type_key)
                    .copied()
                    .unwrap_or(0),
                creation_date,
                editor_service: e.editor_service,
                editor_user: e.editor_user,
                data: e.data,
            };

            state.aggregate_sequences.insert(aggregate_key, sequence);
            state.type_sequences.insert(type_key, sequence);
            state.log.push(stored.clone());
            committed.push(stored);
        }

        for (key, claimed) in staged {
            if claimed {
                state.constraints.insert(key);
            } else {
                state.constraints.remove(&key);
            }
        }

        debug!(
            first_sequence = committed.first().map(|e| e.sequence),
            last_sequence = committed.last().map(|e| e.sequence),
            "batch committed"
        );
        Ok(committed)
    }

    fn filter(&self, query: &SearchQuery) -> Result<EventStream, EventStoreError> {
        query
            .validate()
            .map_err(|e| EventStoreError::InvalidQuery(e.to_string()))?;

        let state = self
            .state
            .read()
            .map_err(|_| EventStoreError::Storage("lock poisoned".to_string()))?;

        let matching = state.log.iter().filter(|e| query.matches(e));

        let mut events: Vec<StoredEvent> = match query.columns() {
            Columns::MaxSequence => matching.last().cloned().into_iter().collect(),
            Columns::Event if query.is_descending() => matching.rev().cloned().collect(),
            Columns::Event => matching.cloned().collect(),
        };
        if let Some(limit) = query.get_limit() {
            events.truncate(limit);
        }

        Ok(EventStream::new(events))
    }

    fn latest_sequence(&self, query: &SearchQuery) -> Result<u64, EventStoreError> {
        query
            .validate()
            .map_err(|e| EventStoreError::InvalidQuery(e.to_string()))?;

        let state = self
            .state
            .read()
            .map_err(|_| EventStoreError::Storage("lock poisoned".to_string()))?;

        Ok(state
            .log
            .iter()
            .rev()
            .find(|e| query.matches(e))
            .map(|e| e.sequence)
            .unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use warden_core::{Aggregate, EventId, ExpectedSequence};
    use warden_events::{EventType, UniqueConstraint};

    use super::*;

    const ORG: AggregateType = AggregateType::from_static("org");

    fn tenant() -> TenantId {
        TenantId::from_uuid(Default::default())
    }

    fn pending(id: &str, event_type: &'static str) -> PendingEvent {
        PendingEvent {
            id: EventId::new(),
            aggregate: Aggregate::new(ORG, AggregateId::new(id), tenant()).with_resource_owner(id),
            event_type: EventType::from_static(event_type),
            editor_service: "admin-api".to_string(),
            editor_user: "user-1".to_string(),
            data: None,
            unique_constraints: Vec::new(),
            expected_sequence: ExpectedSequence::Any,
        }
    }

    fn claiming(mut event: PendingEvent, field: &str) -> PendingEvent {
        event
            .unique_constraints
            .push(UniqueConstraint::add("org_name", field, "Errors.Org.AlreadyExists"));
        event
    }

    fn orgs() -> SearchQuery {
        SearchQuery::new(Columns::Event).aggregate_types([ORG])
    }

    #[test]
    fn append_assigns_sequences_and_predecessors() {
        let store = InMemoryEventStore::new();
        store.append(vec![pending("o1", "org.added")]).unwrap();
        let stored = store
            .append(vec![pending("o2", "org.added"), pending("o1", "org.changed")])
            .unwrap();

        assert_eq!(stored[0].sequence, 2);
        assert_eq!(stored[0].previous_aggregate_sequence, 0);
        assert_eq!(stored[0].previous_aggregate_type_sequence, 1);
        assert_eq!(stored[1].sequence, 3);
        assert_eq!(stored[1].previous_aggregate_sequence, 1);
        assert_eq!(stored[1].previous_aggregate_type_sequence, 2);
        assert_eq!(stored[0].creation_date, stored[1].creation_date);
    }

    #[test]
    fn expected_sequence_is_checked_against_pre_batch_state() {
        let store = InMemoryEventStore::new();
        store.append(vec![pending("o1", "org.added")]).unwrap();

        let mut stale = pending("o1", "org.changed");
        stale.expected_sequence = ExpectedSequence::Exact(0);
        let err = store.append(vec![stale]).unwrap_err();
        assert!(err.is_retryable());
        assert!(matches!(err, EventStoreError::SequenceConflict { actual: 1, .. }));

        let mut first = pending("o1", "org.changed");
        first.expected_sequence = ExpectedSequence::Exact(1);
        let mut second = pending("o1", "org.deactivated");
        second.expected_sequence = ExpectedSequence::Exact(1);
        assert_eq!(store.append(vec![first, second]).unwrap().len(), 2);
    }

    #[test]
    fn colliding_add_rejects_whole_batch() {
        let store = InMemoryEventStore::new();
        store.append(vec![claiming(pending("o1", "org.added"), "acme")]).unwrap();

        let err = store
            .append(vec![
                claiming(pending("o2", "org.added"), "other"),
                claiming(pending("o3", "org.added"), "acme"),
            ])
            .unwrap_err();

        match err {
            EventStoreError::UniqueConstraint {
                unique_field,
                error_message,
                ..
            } => {
                assert_eq!(unique_field, "acme");
                assert_eq!(error_message, "Errors.Org.AlreadyExists");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(store.len(), 1);
        assert!(!store.is_claimed(tenant(), "org_name", "other"));
    }

    #[test]
    fn constraints_apply_in_order_within_a_batch() {
        let store = InMemoryEventStore::new();
        store.append(vec![claiming(pending("o1", "org.added"), "acme")]).unwrap();

        let mut rename = pending("o1", "org.changed");
        rename.unique_constraints = vec![
            UniqueConstraint::remove("org_name", "acme"),
            UniqueConstraint::add("org_name", "acme2", "Errors.Org.AlreadyExists"),
        ];
        store
            .append(vec![rename, claiming(pending("o2", "org.added"), "acme")])
            .unwrap();

        assert!(store.is_claimed(tenant(), "org_name", "acme"));
        assert!(store.is_claimed(tenant(), "org_name", "acme2"));
    }

    #[test]
    fn removing_unclaimed_value_is_a_noop() {
        let store = InMemoryEventStore::new();
        let mut removal = pending("o1", "org.removed");
        removal.unique_constraints = vec![UniqueConstraint::remove("org_name", "ghost")];
        assert_eq!(store.append(vec![removal]).unwrap().len(), 1);
    }

    #[test]
    fn empty_event_type_is_invalid() {
        let store = InMemoryEventStore::new();
        let mut event = pending("o1", "org.added");
        event.event_type = EventType::new("");
        assert!(matches!(
            store.append(vec![event]),
            Err(EventStoreError::InvalidAppend(_))
        ));
    }

    #[test]
    fn filter_orders_limits_and_reports_max() {
        let store = InMemoryEventStore::new();
        for id in ["o1", "o2", "o3"] {
            store.append(vec![pending(id, "org.added")]).unwrap();
        }

        let asc: Vec<u64> = store.filter(&orgs()).unwrap().map(|e| e.sequence).collect();
        assert_eq!(asc, vec![1, 2, 3]);

        let desc: Vec<u64> = store
            .filter(&orgs().order_desc().limit(2))
            .unwrap()
            .map(|e| e.sequence)
            .collect();
        assert_eq!(desc, vec![3, 2]);

        let max: Vec<u64> = store
            .filter(&SearchQuery::new(Columns::MaxSequence).aggregate_types([ORG]))
            .unwrap()
            .map(|e| e.sequence)
            .collect();
        assert_eq!(max, vec![3]);

        let query = orgs().aggregate_ids([AggregateId::new("o2")]);
        assert_eq!(store.latest_sequence(&query).unwrap(), 2);
    }

    #[test]
    fn filter_requires_an_aggregate_type() {
        let store = InMemoryEventStore::new();
        assert!(matches!(
            store.filter(&SearchQuery::new(Columns::Event)),
            Err(EventStoreError::InvalidQuery(_))
        ));
    }

    mod proptest_tests {
        use std::collections::HashMap;

        use proptest::prelude::*;

        use super::*;

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 128,
                ..ProptestConfig::default()
            })]

            /// Property: sequences are gap-free log positions and every event
            /// points at the previous event of its aggregate and of its type.
            #[test]
            fn sequences_chain_per_aggregate(
                batches in prop::collection::vec(prop::collection::vec(0u8..4, 1..5), 1..20),
            ) {
                let store = InMemoryEventStore::new();
                let mut stored = Vec::new();
                for batch in &batches {
                    let events = batch
                        .iter()
                        .map(|n| pending(&format!("o{n}"), "org.changed"))
                        .collect();
                    stored.extend(store.append(events).unwrap());
                }

                let mut last_of_aggregate: HashMap<AggregateId, u64> = HashMap::new();
                let mut last_of_type = 0;
                for (i, event) in stored.iter().enumerate() {
                    prop_assert_eq!(event.sequence, i as u64 + 1);
                    let id = event.aggregate.id().clone();
                    prop_assert_eq!(
                        event.previous_aggregate_sequence,
                        last_of_aggregate.get(&id).copied().unwrap_or(0)
                    );
                    prop_assert_eq!(event.previous_aggregate_type_sequence, last_of_type);
                    last_of_aggregate.insert(id, event.sequence);
                    last_of_type = event.sequence;
                }

                let total: usize = batches.iter().map(Vec::len).sum();
                prop_assert_eq!(store.latest_sequence(&orgs()).unwrap(), total as u64);
            }
        }
    }
}
