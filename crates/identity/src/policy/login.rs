use serde::{Deserialize, Serialize};

use super::{Policy, PolicyChanges, PolicyCodes, apply_changes};

/// Which login methods are offered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginPolicy {
    pub allow_username_password: bool,
    pub allow_register: bool,
    pub allow_external_idp: bool,
    pub force_mfa: bool,
    pub hide_password_reset: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginPolicyChanges {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_username_password: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_register: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_external_idp: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub force_mfa: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hide_password_reset: Option<bool>,
}

impl Policy for LoginPolicy {
    type Changes = LoginPolicyChanges;
    const CODES: PolicyCodes = PolicyCodes {
        added: "POLICY-nWndT",
        changed: "POLICY-nWndV",
        unexpected: "POLICY-nWndX",
        not_added: "POLICY-nWndZ",
    };
}

impl PolicyChanges<LoginPolicy> for LoginPolicyChanges {
    fn is_empty(&self) -> bool {
        self.allow_username_password.is_none()
            && self.allow_register.is_none()
            && self.allow_external_idp.is_none()
            && self.force_mfa.is_none()
            && self.hide_password_reset.is_none()
    }

    fn apply_to(&self, policy: &mut LoginPolicy) {
        apply_changes!(
            self,
            policy,
            allow_username_password,
            allow_register,
            allow_external_idp,
            force_mfa,
            hide_password_reset
        );
    }
}
