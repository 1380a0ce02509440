//! Organization domain events (`org.domain.*`).
//!
//! A domain is claimed globally only once it is verified; adding an
//! unverified domain claims nothing.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use warden_core::Aggregate;
use warden_events::{
    BaseEvent, Command, Editor, Event, EventData, EventError, EventType, StoredEvent,
    UniqueConstraint, UniqueConstraints, impl_event, unmarshal,
};

pub const ORG_DOMAIN_ADDED: EventType = EventType::from_static("org.domain.added");
pub const ORG_DOMAIN_VERIFIED: EventType = EventType::from_static("org.domain.verified");
pub const ORG_DOMAIN_REMOVED: EventType = EventType::from_static("org.domain.removed");

pub const UNIQUE_ORG_DOMAIN: &str = "org_domain";

pub fn add_org_domain_constraint(domain: &str) -> UniqueConstraint {
    UniqueConstraint::add(UNIQUE_ORG_DOMAIN, domain, "Errors.Org.Domain.AlreadyExists")
}

pub fn remove_org_domain_constraint(domain: &str) -> UniqueConstraint {
    UniqueConstraint::remove(UNIQUE_ORG_DOMAIN, domain)
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
struct DomainPayload {
    domain: String,
}

macro_rules! domain_event {
    ($(#[$meta:meta])* $name:ident, $event_type:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone)]
        pub struct $name {
            base: BaseEvent,
            payload: DomainPayload,
        }

        impl_event!($name);

        impl $name {
            pub fn new(editor: &Editor, aggregate: &Aggregate, domain: impl Into<String>) -> Self {
                Self {
                    base: BaseEvent::for_push(editor, aggregate, $event_type),
                    payload: DomainPayload {
                        domain: domain.into(),
                    },
                }
            }

            pub fn domain(&self) -> &str {
                &self.payload.domain
            }
        }

        impl Command for $name {
            fn data(&self) -> EventData<'_> {
                EventData::structured(&self.payload)
            }
        }
    };
}

domain_event!(
    /// `org.domain.added`: an unverified domain was attached to the org.
    DomainAddedEvent,
    ORG_DOMAIN_ADDED
);
domain_event!(
    /// `org.domain.verified`: ownership of the domain was proven.
    DomainVerifiedEvent,
    ORG_DOMAIN_VERIFIED
);
domain_event!(
    /// `org.domain.removed`
    DomainRemovedEvent,
    ORG_DOMAIN_REMOVED
);

impl UniqueConstraints for DomainVerifiedEvent {
    type Context = ();

    fn unique_constraints(&self, _: &()) -> Vec<UniqueConstraint> {
        vec![add_org_domain_constraint(self.domain())]
    }
}

/// Whether the domain being removed was verified, i.e. holds a claim.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct DomainRemoval {
    pub was_verified: bool,
}

impl UniqueConstraints for DomainRemovedEvent {
    type Context = DomainRemoval;

    fn unique_constraints(&self, removal: &DomainRemoval) -> Vec<UniqueConstraint> {
        if removal.was_verified {
            vec![remove_org_domain_constraint(self.domain())]
        } else {
            Vec::new()
        }
    }
}

pub fn domain_added_mapper(stored: &StoredEvent) -> Result<Arc<dyn Event>, EventError> {
    let payload = unmarshal(stored, "ORG-GBr52")?;
    Ok(Arc::new(DomainAddedEvent {
        base: BaseEvent::from_stored(stored),
        payload,
    }))
}

pub fn domain_verified_mapper(stored: &StoredEvent) -> Result<Arc<dyn Event>, EventError> {
    let payload = unmarshal(stored, "ORG-BFSwt")?;
    Ok(Arc::new(DomainVerifiedEvent {
        base: BaseEvent::from_stored(stored),
        payload,
    }))
}

pub fn domain_removed_mapper(stored: &StoredEvent) -> Result<Arc<dyn Event>, EventError> {
    let payload = unmarshal(stored, "ORG-MzC0n")?;
    Ok(Arc::new(DomainRemovedEvent {
        base: BaseEvent::from_stored(stored),
        payload,
    }))
}
