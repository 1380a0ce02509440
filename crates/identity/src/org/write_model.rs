//! Decision state of one organization.

use std::sync::{Arc, LazyLock};

use warden_core::Aggregate;
use warden_events::{
    Columns, Dispatch, Event, EventError, Projection, ReadModel, Reducer, SearchQuery,
    expect_event, transact,
};

use crate::org::domain::{
    DomainAddedEvent, DomainRemovedEvent, DomainVerifiedEvent, ORG_DOMAIN_ADDED,
    ORG_DOMAIN_REMOVED, ORG_DOMAIN_VERIFIED,
};
use crate::org::events::{
    AGGREGATE_TYPE, ORG_ADDED, ORG_CHANGED, ORG_DEACTIVATED, ORG_REACTIVATED, ORG_REMOVED,
    OrgAddedEvent, OrgChangedEvent,
};

/// Lifecycle state of an organization.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum OrgState {
    /// No event seen yet.
    #[default]
    Unspecified,
    Active,
    Inactive,
    Removed,
}

impl OrgState {
    /// Added and not removed.
    pub fn exists(self) -> bool {
        matches!(self, OrgState::Active | OrgState::Inactive)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrgDomain {
    pub domain: String,
    pub verified: bool,
}

/// Folds the events of one org into what its commands validate against.
#[derive(Debug, Clone, PartialEq)]
pub struct OrgWriteModel {
    base: ReadModel,
    aggregate: Aggregate,
    name: String,
    state: OrgState,
    domains: Vec<OrgDomain>,
}

static DISPATCH: LazyLock<Dispatch<OrgWriteModel>> = LazyLock::new(|| {
    Dispatch::new()
        .on(&[ORG_ADDED], on_added)
        .on(&[ORG_CHANGED], on_changed)
        .on(&[ORG_DEACTIVATED], on_deactivated)
        .on(&[ORG_REACTIVATED], on_reactivated)
        .on(&[ORG_REMOVED], on_removed)
        .on(&[ORG_DOMAIN_ADDED], on_domain_added)
        .on(&[ORG_DOMAIN_VERIFIED], on_domain_verified)
        .on(&[ORG_DOMAIN_REMOVED], on_domain_removed)
});

fn on_added(model: &mut OrgWriteModel, event: &dyn Event) -> Result<(), EventError> {
    let e = expect_event::<OrgAddedEvent>(event, "ORG-w8Xmt")?;
    model.name = e.name().to_string();
    model.state = OrgState::Active;
    Ok(())
}

fn on_changed(model: &mut OrgWriteModel, event: &dyn Event) -> Result<(), EventError> {
    let e = expect_event::<OrgChangedEvent>(event, "ORG-Hy2Lp")?;
    model.name = e.name().to_string();
    Ok(())
}

fn on_deactivated(model: &mut OrgWriteModel, _: &dyn Event) -> Result<(), EventError> {
    model.state = OrgState::Inactive;
    Ok(())
}

fn on_reactivated(model: &mut OrgWriteModel, _: &dyn Event) -> Result<(), EventError> {
    model.state = OrgState::Active;
    Ok(())
}

fn on_removed(model: &mut OrgWriteModel, _: &dyn Event) -> Result<(), EventError> {
    model.state = OrgState::Removed;
    Ok(())
}

fn on_domain_added(model: &mut OrgWriteModel, event: &dyn Event) -> Result<(), EventError> {
    let e = expect_event::<DomainAddedEvent>(event, "ORG-p3Rkz")?;
    if model.domain(e.domain()).is_none() {
        model.domains.push(OrgDomain {
            domain: e.domain().to_string(),
            verified: false,
        });
    }
    Ok(())
}

fn on_domain_verified(model: &mut OrgWriteModel, event: &dyn Event) -> Result<(), EventError> {
    let e = expect_event::<DomainVerifiedEvent>(event, "ORG-Zt7sa")?;
    if let Some(domain) = model.domains.iter_mut().find(|d| d.domain == e.domain()) {
        domain.verified = true;
    }
    Ok(())
}

fn on_domain_removed(model: &mut OrgWriteModel, event: &dyn Event) -> Result<(), EventError> {
    let e = expect_event::<DomainRemovedEvent>(event, "ORG-c6Vbq")?;
    model.domains.retain(|d| d.domain != e.domain());
    Ok(())
}

impl OrgWriteModel {
    pub fn new(aggregate: Aggregate) -> Self {
        Self {
            base: ReadModel::new(aggregate.id().clone(), aggregate.tenant_id()),
            aggregate,
            name: String::new(),
            state: OrgState::default(),
            domains: Vec::new(),
        }
    }

    /// The org all commands built from this model are about.
    pub fn aggregate(&self) -> &Aggregate {
        &self.aggregate
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> OrgState {
        self.state
    }

    pub fn domains(&self) -> &[OrgDomain] {
        &self.domains
    }

    pub fn domain(&self, domain: &str) -> Option<&OrgDomain> {
        self.domains.iter().find(|d| d.domain == domain)
    }

    pub fn verified_domains(&self) -> impl Iterator<Item = &str> {
        self.domains
            .iter()
            .filter(|d| d.verified)
            .map(|d| d.domain.as_str())
    }

    /// Sequence of the last reduced event; commands expect it unchanged.
    pub fn processed_sequence(&self) -> u64 {
        self.base.processed_sequence()
    }
}

impl Reducer for OrgWriteModel {
    fn append_events(&mut self, events: &[Arc<dyn Event>]) -> Result<(), EventError> {
        self.base.append_events(events)
    }

    fn reduce(&mut self) -> Result<(), EventError> {
        transact(self, |m| {
            let pending = m.base.pending().to_vec();
            DISPATCH.reduce_events(m, &pending)?;
            m.base.reduce()
        })
    }
}

impl Projection for OrgWriteModel {
    fn query(&self) -> SearchQuery {
        SearchQuery::new(Columns::Event)
            .aggregate_types([AGGREGATE_TYPE])
            .aggregate_ids([self.aggregate.id().clone()])
            .tenant(self.aggregate.tenant_id())
    }
}

#[cfg(test)]
mod tests {
    use warden_core::AggregateId;
    use warden_events::EventRegistry;

    use super::*;
    use crate::test_support::{stored, tenant};

    fn events(records: &[(&str, u64, Option<&str>)]) -> Vec<Arc<dyn Event>> {
        let mut registry = EventRegistry::new();
        crate::org::register_event_mappers(&mut registry);
        records
            .iter()
            .map(|(t, seq, data)| registry.map(&stored("org", "o-1", t, *seq, *data)).unwrap())
            .collect()
    }

    fn model() -> OrgWriteModel {
        OrgWriteModel::new(Aggregate::new(
            AGGREGATE_TYPE,
            AggregateId::new("o-1"),
            tenant(),
        ))
    }

    #[test]
    fn folds_lifecycle_and_domains() {
        let mut model = model();
        model
            .append_and_reduce(&events(&[
                ("org.added", 1, Some(r#"{"name":"Acme"}"#)),
                ("org.domain.added", 2, Some(r#"{"domain":"acme.ch"}"#)),
                ("org.domain.added", 3, Some(r#"{"domain":"acme.io"}"#)),
                ("org.domain.verified", 4, Some(r#"{"domain":"acme.ch"}"#)),
                ("org.changed", 5, Some(r#"{"name":"Acme2"}"#)),
                ("org.deactivated", 6, None),
            ]))
            .unwrap();

        assert_eq!(model.name(), "Acme2");
        assert_eq!(model.state(), OrgState::Inactive);
        assert_eq!(model.verified_domains().collect::<Vec<_>>(), ["acme.ch"]);
        assert_eq!(model.domains().len(), 2);
        assert_eq!(model.processed_sequence(), 6);

        model
            .append_and_reduce(&events(&[
                ("org.domain.removed", 7, Some(r#"{"domain":"acme.io"}"#)),
                ("org.reactivated", 8, None),
            ]))
            .unwrap();
        assert_eq!(model.state(), OrgState::Active);
        assert!(model.domain("acme.io").is_none());
    }

    #[test]
    fn query_targets_this_org() {
        let model = model();
        let query = model.query();
        assert!(query.matches(&stored("org", "o-1", "org.added", 1, None)));
        assert!(!query.matches(&stored("org", "o-2", "org.added", 1, None)));
        assert!(query.validate().is_ok());
    }
}
