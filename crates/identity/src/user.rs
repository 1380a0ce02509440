//! User-side uniqueness namespaces that org removal releases.

use serde::{Deserialize, Serialize};

use warden_events::UniqueConstraint;

pub const UNIQUE_USERNAME: &str = "usernames";
pub const UNIQUE_IDP_LINK: &str = "external_idps";

/// Link between a user and an account at an external identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserIdpLink {
    pub idp_config_id: String,
    pub external_user_id: String,
}

impl UserIdpLink {
    pub fn new(idp_config_id: impl Into<String>, external_user_id: impl Into<String>) -> Self {
        Self {
            idp_config_id: idp_config_id.into(),
            external_user_id: external_user_id.into(),
        }
    }

    fn key(&self) -> String {
        format!("{}:{}", self.idp_config_id, self.external_user_id)
    }
}

/// Usernames are global unless the org requires logins to carry its domain,
/// in which case they are unique per resource owner.
fn username_key(username: &str, resource_owner: &str, login_must_be_domain: bool) -> String {
    if login_must_be_domain {
        format!("{username}:{resource_owner}")
    } else {
        username.to_string()
    }
}

pub fn add_username_constraint(
    username: &str,
    resource_owner: &str,
    login_must_be_domain: bool,
) -> UniqueConstraint {
    UniqueConstraint::add(
        UNIQUE_USERNAME,
        username_key(username, resource_owner, login_must_be_domain),
        "Errors.User.AlreadyExists",
    )
}

pub fn remove_username_constraint(
    username: &str,
    resource_owner: &str,
    login_must_be_domain: bool,
) -> UniqueConstraint {
    UniqueConstraint::remove(
        UNIQUE_USERNAME,
        username_key(username, resource_owner, login_must_be_domain),
    )
}

pub fn add_idp_link_constraint(link: &UserIdpLink) -> UniqueConstraint {
    UniqueConstraint::add(
        UNIQUE_IDP_LINK,
        link.key(),
        "Errors.User.ExternalIDP.AlreadyExists",
    )
}

pub fn remove_idp_link_constraint(link: &UserIdpLink) -> UniqueConstraint {
    UniqueConstraint::remove(UNIQUE_IDP_LINK, link.key())
}
