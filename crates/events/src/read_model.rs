//! Read-model projection engine.
//!
//! A read model folds the ordered events of one aggregate into typed state in
//! two steps: events are first *appended* (buffered, validated and routed to
//! nested sub-models) and then *reduced* (applied, after which the buffer is
//! drained and the processed-sequence watermark advances).
//!
//! Reduction is incremental: a model remembers the highest sequence it has
//! reduced and ignores anything at or below it, so replaying an overlapping
//! event range is harmless.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::debug;

use warden_core::{AggregateId, TenantId};

use crate::{Event, EventError, EventType, SearchQuery};

/// Anything that can fold events.
pub trait Reducer {
    /// Buffer events for the next [`Reducer::reduce`]. All-or-nothing.
    fn append_events(&mut self, events: &[Arc<dyn Event>]) -> Result<(), EventError>;

    /// Apply the buffered events.
    fn reduce(&mut self) -> Result<(), EventError>;

    /// Append, then reduce. The first failure is returned and nothing after it
    /// runs.
    fn append_and_reduce(&mut self, events: &[Arc<dyn Event>]) -> Result<(), EventError> {
        self.append_events(events)?;
        self.reduce()
    }
}

/// A reducer that can describe the events it needs.
///
/// Describing is passive; fetching and feeding the events is up to the
/// caller (see the `Eventstore` facade in `warden-infra`).
pub trait Projection: Reducer {
    fn query(&self) -> SearchQuery;
}

/// Bookkeeping shared by all read models: target aggregate, pending events,
/// watermark and dates.
///
/// Aggregate ids are only unique within a tenant, so the target is the pair
/// of both.
#[derive(Debug, Clone)]
pub struct ReadModel {
    aggregate_id: AggregateId,
    tenant_id: TenantId,
    events: Vec<Arc<dyn Event>>,
    processed_sequence: u64,
    creation_date: Option<DateTime<Utc>>,
    change_date: Option<DateTime<Utc>>,
}

impl ReadModel {
    pub fn new(aggregate_id: AggregateId, tenant_id: TenantId) -> Self {
        Self {
            aggregate_id,
            tenant_id,
            events: Vec::new(),
            processed_sequence: 0,
            creation_date: None,
            change_date: None,
        }
    }

    pub fn aggregate_id(&self) -> &AggregateId {
        &self.aggregate_id
    }

    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    /// Appended but not yet reduced events, in arrival order.
    pub fn pending(&self) -> &[Arc<dyn Event>] {
        &self.events
    }

    /// Sequence of the last reduced event (`0` before the first reduce).
    pub fn processed_sequence(&self) -> u64 {
        self.processed_sequence
    }

    /// Creation date of the first reduced event.
    pub fn creation_date(&self) -> Option<DateTime<Utc>> {
        self.creation_date
    }

    /// Creation date of the last reduced event.
    pub fn change_date(&self) -> Option<DateTime<Utc>> {
        self.change_date
    }

    fn last_sequence(&self) -> u64 {
        self.events
            .last()
            .map_or(self.processed_sequence, |e| e.sequence())
    }
}

impl Reducer for ReadModel {
    fn append_events(&mut self, events: &[Arc<dyn Event>]) -> Result<(), EventError> {
        let mut last = self.last_sequence();
        let mut accepted = Vec::with_capacity(events.len());

        for event in events {
            let found = event.aggregate().id();
            if found != &self.aggregate_id {
                return Err(EventError::AggregateMismatch {
                    expected: self.aggregate_id.clone(),
                    found: found.clone(),
                });
            }
            let tenant = event.aggregate().tenant_id();
            if tenant != self.tenant_id {
                return Err(EventError::TenantMismatch {
                    aggregate_id: self.aggregate_id.clone(),
                    expected: self.tenant_id,
                    found: tenant,
                });
            }

            let sequence = event.sequence();
            if sequence <= self.processed_sequence {
                debug!(
                    aggregate_id = %self.aggregate_id,
                    event_type = %event.event_type(),
                    sequence,
                    processed_sequence = self.processed_sequence,
                    "skipping already reduced event"
                );
                continue;
            }
            if sequence <= last {
                return Err(EventError::NonMonotonicSequence {
                    last,
                    found: sequence,
                });
            }

            last = sequence;
            accepted.push(Arc::clone(event));
        }

        self.events.extend(accepted);
        Ok(())
    }

    fn reduce(&mut self) -> Result<(), EventError> {
        let (Some(first), Some(last)) = (self.events.first(), self.events.last()) else {
            return Ok(());
        };

        if self.creation_date.is_none() {
            self.creation_date = Some(first.creation_date());
        }
        self.change_date = Some(last.creation_date());
        self.processed_sequence = last.sequence();
        self.events.clear();
        Ok(())
    }
}

impl PartialEq for ReadModel {
    fn eq(&self, other: &Self) -> bool {
        let pending = |m: &Self| {
            m.events
                .iter()
                .map(|e| (e.event_type().clone(), e.sequence()))
                .collect::<Vec<_>>()
        };
        self.aggregate_id == other.aggregate_id
            && self.tenant_id == other.tenant_id
            && self.processed_sequence == other.processed_sequence
            && self.creation_date == other.creation_date
            && self.change_date == other.change_date
            && pending(self) == pending(other)
    }
}

/// Selects a nested sub-model of `M`.
pub type Route<M> = fn(&mut M) -> &mut dyn Reducer;

/// Applies one event to `M` directly.
pub type Handler<M> = fn(&mut M, &dyn Event) -> Result<(), EventError>;

/// Per read-model dispatch table: event type → sub-model routes and direct
/// handlers.
///
/// Built once per read-model type (typically in a `LazyLock` static). An event
/// type may be routed to several sub-models and handled directly as well.
pub struct Dispatch<M> {
    routes: HashMap<EventType, Vec<Route<M>>>,
    handlers: HashMap<EventType, Vec<Handler<M>>>,
}

impl<M> Default for Dispatch<M> {
    fn default() -> Self {
        Self {
            routes: HashMap::new(),
            handlers: HashMap::new(),
        }
    }
}

impl<M> core::fmt::Debug for Dispatch<M> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Dispatch")
            .field("routed", &self.routes.keys().collect::<Vec<_>>())
            .field("handled", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl<M> Dispatch<M> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forward events of `types` to the sub-model selected by `route`.
    pub fn route(mut self, types: &[EventType], route: Route<M>) -> Self {
        for t in types {
            self.routes.entry(t.clone()).or_default().push(route);
        }
        self
    }

    /// Apply events of `types` to the model itself with `handler`.
    pub fn on(mut self, types: &[EventType], handler: Handler<M>) -> Self {
        for t in types {
            self.handlers.entry(t.clone()).or_default().push(handler);
        }
        self
    }

    pub fn is_routed(&self, event_type: &EventType) -> bool {
        self.routes.contains_key(event_type)
    }

    pub fn is_handled(&self, event_type: &EventType) -> bool {
        self.handlers.contains_key(event_type)
    }

    /// Append each event to every sub-model its type is routed to, in order.
    pub fn route_events(&self, model: &mut M, events: &[Arc<dyn Event>]) -> Result<(), EventError> {
        for event in events {
            let Some(routes) = self.routes.get(event.event_type()) else {
                continue;
            };
            for route in routes {
                route(model).append_events(std::slice::from_ref(event))?;
            }
        }
        Ok(())
    }

    /// Run the direct handlers of each event, in order.
    pub fn reduce_events(&self, model: &mut M, events: &[Arc<dyn Event>]) -> Result<(), EventError> {
        for event in events {
            let Some(handlers) = self.handlers.get(event.event_type()) else {
                continue;
            };
            for handler in handlers {
                handler(model, event.as_ref())?;
            }
        }
        Ok(())
    }
}

/// Run `f` against a staged copy of `model` and commit it only if `f`
/// succeeds. On failure `model` is left exactly as it was.
pub fn transact<M, T, F>(model: &mut M, f: F) -> Result<T, EventError>
where
    M: Clone,
    F: FnOnce(&mut M) -> Result<T, EventError>,
{
    let mut staged = model.clone();
    let out = f(&mut staged)?;
    *model = staged;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use std::sync::LazyLock;

    use chrono::TimeZone;
    use warden_core::{Aggregate, AggregateType, EventId, TenantId};

    use super::*;
    use crate::{BaseEvent, StoredEvent};

    const ADDED: EventType = EventType::from_static("thing.added");
    const NOTED: EventType = EventType::from_static("thing.noted");
    const BROKEN: EventType = EventType::from_static("thing.broken");

    fn tenant() -> TenantId {
        TenantId::from_uuid(Default::default())
    }

    fn event(aggregate_id: &str, event_type: EventType, sequence: u64) -> Arc<dyn Event> {
        event_of(tenant(), aggregate_id, event_type, sequence)
    }

    fn event_of(
        tenant: TenantId,
        aggregate_id: &str,
        event_type: EventType,
        sequence: u64,
    ) -> Arc<dyn Event> {
        let stored = StoredEvent {
            id: EventId::new(),
            aggregate: Aggregate::new(
                AggregateType::from_static("thing"),
                AggregateId::new(aggregate_id),
                tenant,
            ),
            event_type,
            sequence,
            previous_aggregate_sequence: 0,
            previous_aggregate_type_sequence: 0,
            creation_date: Utc.timestamp_opt(1_700_000_000 + sequence as i64, 0).unwrap(),
            editor_service: "svc".to_string(),
            editor_user: "usr".to_string(),
            data: None,
        };
        Arc::new(BaseEvent::from_stored(&stored))
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Notes {
        base: ReadModel,
        count: usize,
    }

    impl Reducer for Notes {
        fn append_events(&mut self, events: &[Arc<dyn Event>]) -> Result<(), EventError> {
            self.base.append_events(events)
        }

        fn reduce(&mut self) -> Result<(), EventError> {
            self.count += self.base.pending().len();
            self.base.reduce()
        }
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Thing {
        base: ReadModel,
        added: bool,
        notes: Notes,
    }

    fn on_added(model: &mut Thing, _: &dyn Event) -> Result<(), EventError> {
        model.added = true;
        Ok(())
    }

    fn on_broken(_: &mut Thing, event: &dyn Event) -> Result<(), EventError> {
        Err(EventError::reduction(
            "TEST-r1",
            format!("cannot reduce {}", event.event_type()),
        ))
    }

    fn notes(model: &mut Thing) -> &mut dyn Reducer {
        &mut model.notes
    }

    static DISPATCH: LazyLock<Dispatch<Thing>> = LazyLock::new(|| {
        Dispatch::new()
            .on(&[ADDED], on_added)
            .on(&[BROKEN], on_broken)
            .route(&[NOTED], notes)
    });

    impl Thing {
        fn new(id: &str) -> Self {
            Self {
                base: ReadModel::new(AggregateId::new(id), tenant()),
                added: false,
                notes: Notes {
                    base: ReadModel::new(AggregateId::new(id), tenant()),
                    count: 0,
                },
            }
        }
    }

    impl Reducer for Thing {
        fn append_events(&mut self, events: &[Arc<dyn Event>]) -> Result<(), EventError> {
            transact(self, |m| {
                m.base.append_events(events)?;
                DISPATCH.route_events(m, events)
            })
        }

        fn reduce(&mut self) -> Result<(), EventError> {
            transact(self, |m| {
                let pending = m.base.pending().to_vec();
                DISPATCH.reduce_events(m, &pending)?;
                m.notes.reduce()?;
                m.base.reduce()
            })
        }
    }

    #[test]
    fn reduce_advances_watermark_and_sets_dates() {
        let mut model = ReadModel::new(AggregateId::new("t-1"), tenant());
        model
            .append_and_reduce(&[event("t-1", ADDED, 3), event("t-1", NOTED, 5)])
            .unwrap();

        assert_eq!(model.processed_sequence(), 5);
        assert!(model.pending().is_empty());
        assert_eq!(model.creation_date(), Utc.timestamp_opt(1_700_000_003, 0).single());
        assert_eq!(model.change_date(), Utc.timestamp_opt(1_700_000_005, 0).single());

        model.append_and_reduce(&[event("t-1", NOTED, 9)]).unwrap();
        assert_eq!(model.creation_date(), Utc.timestamp_opt(1_700_000_003, 0).single());
        assert_eq!(model.change_date(), Utc.timestamp_opt(1_700_000_009, 0).single());
    }

    #[test]
    fn already_reduced_events_are_ignored() {
        let mut model = ReadModel::new(AggregateId::new("t-1"), tenant());
        model.append_and_reduce(&[event("t-1", ADDED, 1)]).unwrap();

        model
            .append_events(&[event("t-1", ADDED, 1), event("t-1", NOTED, 2)])
            .unwrap();
        assert_eq!(model.pending().len(), 1);
        assert_eq!(model.pending()[0].sequence(), 2);
    }

    #[test]
    fn non_increasing_sequence_is_rejected_atomically() {
        let mut model = ReadModel::new(AggregateId::new("t-1"), tenant());
        let err = model
            .append_events(&[event("t-1", ADDED, 4), event("t-1", NOTED, 4)])
            .unwrap_err();
        assert_eq!(err, EventError::NonMonotonicSequence { last: 4, found: 4 });
        assert!(model.pending().is_empty());

        model.append_events(&[event("t-1", ADDED, 4)]).unwrap();
        assert!(model.append_events(&[event("t-1", NOTED, 2)]).is_err());
    }

    #[test]
    fn events_of_other_aggregates_are_rejected() {
        let mut model = ReadModel::new(AggregateId::new("t-1"), tenant());
        let err = model.append_events(&[event("t-2", ADDED, 1)]).unwrap_err();
        assert!(matches!(err, EventError::AggregateMismatch { .. }));
    }

    #[test]
    fn events_of_the_same_aggregate_id_in_another_tenant_are_rejected() {
        let mut model = Thing::new("t-1");
        let other = TenantId::new();
        let err = model
            .append_events(&[event("t-1", ADDED, 1), event_of(other, "t-1", NOTED, 2)])
            .unwrap_err();

        assert_eq!(
            err,
            EventError::TenantMismatch {
                aggregate_id: AggregateId::new("t-1"),
                expected: tenant(),
                found: other,
            }
        );
        assert!(model.base.pending().is_empty());
        assert!(model.notes.base.pending().is_empty());
    }

    #[test]
    fn append_and_reduce_stops_on_append_failure() {
        let mut model = Thing::new("t-1");
        let err = model
            .append_and_reduce(&[event("t-1", ADDED, 2), event("t-1", ADDED, 1)])
            .unwrap_err();
        assert!(matches!(err, EventError::NonMonotonicSequence { .. }));
        assert!(!model.added);
        assert_eq!(model.base.processed_sequence(), 0);
    }

    #[test]
    fn dispatch_handles_directly_and_delegates_to_sub_models() {
        let mut model = Thing::new("t-1");
        model
            .append_and_reduce(&[
                event("t-1", ADDED, 1),
                event("t-1", NOTED, 2),
                event("t-1", NOTED, 3),
            ])
            .unwrap();

        assert!(model.added);
        assert_eq!(model.notes.count, 2);
        assert_eq!(model.notes.base.processed_sequence(), 3);
        assert_eq!(model.base.processed_sequence(), 3);
    }

    #[test]
    fn failed_reduce_leaves_model_untouched() {
        let mut model = Thing::new("t-1");
        model
            .append_and_reduce(&[event("t-1", NOTED, 1)])
            .unwrap();
        let before = model.clone();

        model
            .append_events(&[event("t-1", ADDED, 2), event("t-1", NOTED, 3), event("t-1", BROKEN, 4)])
            .unwrap();
        let appended = model.clone();
        let err = model.reduce().unwrap_err();

        assert_eq!(err.code(), Some("TEST-r1"));
        assert_eq!(model, appended);
        assert!(!model.added);
        assert_eq!(model.notes.count, before.notes.count);
        assert_eq!(model.base.processed_sequence(), 1);
    }

    #[test]
    fn transact_commits_only_on_success() {
        let mut value = vec![1];
        transact(&mut value, |v| {
            v.push(2);
            Ok(())
        })
        .unwrap();
        assert_eq!(value, vec![1, 2]);

        let _ = transact(&mut value, |v| {
            v.push(3);
            Err::<(), _>(EventError::reduction("TEST-t1", "boom"))
        });
        assert_eq!(value, vec![1, 2]);
    }
}
