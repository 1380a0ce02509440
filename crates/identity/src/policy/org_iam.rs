use serde::{Deserialize, Serialize};

use super::{Policy, PolicyChanges, PolicyCodes, apply_changes};

/// Org-wide login naming rule.
///
/// When `user_login_must_be_domain` is set, usernames are only unique within
/// their org and logins carry the org's domain as suffix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrgIamPolicy {
    pub user_login_must_be_domain: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrgIamPolicyChanges {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_login_must_be_domain: Option<bool>,
}

impl Policy for OrgIamPolicy {
    type Changes = OrgIamPolicyChanges;
    const CODES: PolicyCodes = PolicyCodes {
        added: "POLICY-Ga2Pk",
        changed: "POLICY-Ga2Pm",
        unexpected: "POLICY-Ga2Pr",
        not_added: "POLICY-Ga2Pz",
    };
}

impl PolicyChanges<OrgIamPolicy> for OrgIamPolicyChanges {
    fn is_empty(&self) -> bool {
        self.user_login_must_be_domain.is_none()
    }

    fn apply_to(&self, policy: &mut OrgIamPolicy) {
        apply_changes!(self, policy, user_login_must_be_domain);
    }
}
