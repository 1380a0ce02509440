//! Organization aggregate (`org`).

pub mod command;
pub mod domain;
pub mod events;
pub mod write_model;

pub use command::{
    OrgDependents, add_domain, add_org, change_org, deactivate_org, reactivate_org, remove_domain,
    remove_org, verify_domain,
};
pub use domain::{DomainAddedEvent, DomainRemoval, DomainRemovedEvent, DomainVerifiedEvent};
pub use events::{
    AGGREGATE_TYPE, OrgAddedEvent, OrgChangedEvent, OrgDeactivatedEvent, OrgReactivatedEvent,
    OrgRemoval, OrgRemovedEvent, OrgRename,
};
pub use write_model::{OrgDomain, OrgState, OrgWriteModel};

use warden_events::EventRegistry;

pub fn register_event_mappers(registry: &mut EventRegistry) {
    registry
        .register(events::ORG_ADDED, events::org_added_mapper)
        .register(events::ORG_CHANGED, events::org_changed_mapper)
        .register(events::ORG_DEACTIVATED, events::org_deactivated_mapper)
        .register(events::ORG_REACTIVATED, events::org_reactivated_mapper)
        .register(events::ORG_REMOVED, events::org_removed_mapper)
        .register(domain::ORG_DOMAIN_ADDED, domain::domain_added_mapper)
        .register(domain::ORG_DOMAIN_VERIFIED, domain::domain_verified_mapper)
        .register(domain::ORG_DOMAIN_REMOVED, domain::domain_removed_mapper);
}
