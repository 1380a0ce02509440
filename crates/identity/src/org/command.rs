//! Organization use cases.
//!
//! Each function validates against an up-to-date [`OrgWriteModel`] and
//! returns the commands to push. Every command expects the org to still be at
//! the sequence the model was reduced to, so a concurrent writer turns the push
//! into a sequence conflict instead of a lost update.

use warden_core::{DomainError, DomainResult, ExpectedSequence};
use warden_events::{Editor, PushCommand};

use crate::org::domain::{DomainAddedEvent, DomainRemovedEvent, DomainRemoval, DomainVerifiedEvent};
use crate::org::events::{
    OrgAddedEvent, OrgChangedEvent, OrgDeactivatedEvent, OrgReactivatedEvent, OrgRemoval,
    OrgRemovedEvent, OrgRename,
};
use crate::org::write_model::{OrgState, OrgWriteModel};
use crate::user::UserIdpLink;

/// Claims held outside the org aggregate that must be released with it.
///
/// Users and projects live in their own aggregates; the caller collects
/// these from their read models.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrgDependents {
    pub usernames: Vec<String>,
    pub login_must_be_domain: bool,
    pub idp_links: Vec<UserIdpLink>,
    pub saml_entity_ids: Vec<String>,
}

fn expected(model: &OrgWriteModel) -> ExpectedSequence {
    ExpectedSequence::Exact(model.processed_sequence())
}

fn ensure_exists(model: &OrgWriteModel) -> DomainResult<()> {
    if !model.state().exists() {
        return Err(DomainError::not_found("Errors.Org.NotFound"));
    }
    Ok(())
}

fn valid_name(name: &str) -> DomainResult<&str> {
    let name = name.trim();
    if name.is_empty() {
        return Err(DomainError::validation("Errors.Org.Invalid"));
    }
    Ok(name)
}

pub fn add_org(model: &OrgWriteModel, editor: &Editor, name: &str) -> DomainResult<Vec<PushCommand>> {
    if model.state() != OrgState::Unspecified {
        return Err(DomainError::conflict("Errors.Org.AlreadyExisting"));
    }
    let name = valid_name(name)?;

    let added = OrgAddedEvent::new(editor, model.aggregate(), name);
    Ok(vec![PushCommand::constrained(added, &()).expect_sequence(expected(model))])
}

pub fn change_org(
    model: &OrgWriteModel,
    editor: &Editor,
    new_name: &str,
) -> DomainResult<Vec<PushCommand>> {
    ensure_exists(model)?;
    let new_name = valid_name(new_name)?;
    if new_name == model.name() {
        return Err(DomainError::validation("Errors.Org.NotChanged"));
    }

    let changed = OrgChangedEvent::new(editor, model.aggregate(), new_name);
    let rename = OrgRename {
        old_name: model.name().to_string(),
    };
    Ok(vec![PushCommand::constrained(changed, &rename).expect_sequence(expected(model))])
}

pub fn deactivate_org(model: &OrgWriteModel, editor: &Editor) -> DomainResult<Vec<PushCommand>> {
    match model.state() {
        OrgState::Active => {}
        OrgState::Inactive => return Err(DomainError::conflict("Errors.Org.AlreadyDeactivated")),
        OrgState::Unspecified | OrgState::Removed => {
            return Err(DomainError::not_found("Errors.Org.NotFound"));
        }
    }

    let deactivated = OrgDeactivatedEvent::new(editor, model.aggregate());
    Ok(vec![PushCommand::new(deactivated).expect_sequence(expected(model))])
}

pub fn reactivate_org(model: &OrgWriteModel, editor: &Editor) -> DomainResult<Vec<PushCommand>> {
    match model.state() {
        OrgState::Inactive => {}
        OrgState::Active => return Err(DomainError::conflict("Errors.Org.AlreadyActive")),
        OrgState::Unspecified | OrgState::Removed => {
            return Err(DomainError::not_found("Errors.Org.NotFound"));
        }
    }

    let reactivated = OrgReactivatedEvent::new(editor, model.aggregate());
    Ok(vec![PushCommand::new(reactivated).expect_sequence(expected(model))])
}

/// Remove the org and release every claim it holds: its name, its verified
/// domains and the `dependents`' usernames, IdP links and SAML entity ids.
pub fn remove_org(
    model: &OrgWriteModel,
    editor: &Editor,
    dependents: OrgDependents,
) -> DomainResult<Vec<PushCommand>> {
    ensure_exists(model)?;

    let removal = OrgRemoval {
        name: model.name().to_string(),
        usernames: dependents.usernames,
        login_must_be_domain: dependents.login_must_be_domain,
        domains: model.verified_domains().map(str::to_string).collect(),
        idp_links: dependents.idp_links,
        saml_entity_ids: dependents.saml_entity_ids,
    };
    let removed = OrgRemovedEvent::new(editor, model.aggregate());
    Ok(vec![PushCommand::constrained(removed, &removal).expect_sequence(expected(model))])
}

fn valid_domain(domain: &str) -> DomainResult<&str> {
    let domain = domain.trim();
    if domain.is_empty() || domain.contains(char::is_whitespace) {
        return Err(DomainError::validation("Errors.Org.Domain.Invalid"));
    }
    Ok(domain)
}

pub fn add_domain(
    model: &OrgWriteModel,
    editor: &Editor,
    domain: &str,
) -> DomainResult<Vec<PushCommand>> {
    ensure_exists(model)?;
    let domain = valid_domain(domain)?;
    if model.domain(domain).is_some() {
        return Err(DomainError::conflict("Errors.Org.Domain.AlreadyExists"));
    }

    let added = DomainAddedEvent::new(editor, model.aggregate(), domain);
    Ok(vec![PushCommand::new(added).expect_sequence(expected(model))])
}

pub fn verify_domain(
    model: &OrgWriteModel,
    editor: &Editor,
    domain: &str,
) -> DomainResult<Vec<PushCommand>> {
    ensure_exists(model)?;
    let domain = valid_domain(domain)?;
    match model.domain(domain) {
        None => return Err(DomainError::not_found("Errors.Org.Domain.NotFound")),
        Some(d) if d.verified => {
            return Err(DomainError::conflict("Errors.Org.Domain.AlreadyVerified"));
        }
        Some(_) => {}
    }

    let verified = DomainVerifiedEvent::new(editor, model.aggregate(), domain);
    Ok(vec![PushCommand::constrained(verified, &()).expect_sequence(expected(model))])
}

pub fn remove_domain(
    model: &OrgWriteModel,
    editor: &Editor,
    domain: &str,
) -> DomainResult<Vec<PushCommand>> {
    ensure_exists(model)?;
    let domain = valid_domain(domain)?;
    let Some(existing) = model.domain(domain) else {
        return Err(DomainError::not_found("Errors.Org.Domain.NotFound"));
    };

    let removal = DomainRemoval {
        was_verified: existing.verified,
    };
    let removed = DomainRemovedEvent::new(editor, model.aggregate(), domain);
    Ok(vec![PushCommand::constrained(removed, &removal).expect_sequence(expected(model))])
}
