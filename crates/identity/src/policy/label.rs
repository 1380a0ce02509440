use serde::{Deserialize, Serialize};

use super::{Policy, PolicyChanges, PolicyCodes, apply_changes};

/// Branding of the login pages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelPolicy {
    pub primary_color: String,
    pub secondary_color: String,
    pub hide_login_name_suffix: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelPolicyChanges {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hide_login_name_suffix: Option<bool>,
}

impl Policy for LabelPolicy {
    type Changes = LabelPolicyChanges;
    const CODES: PolicyCodes = PolicyCodes {
        added: "POLICY-Rx9ad",
        changed: "POLICY-Rx9af",
        unexpected: "POLICY-Rx9aj",
        not_added: "POLICY-Rx9aq",
    };
}

impl PolicyChanges<LabelPolicy> for LabelPolicyChanges {
    fn is_empty(&self) -> bool {
        self.primary_color.is_none()
            && self.secondary_color.is_none()
            && self.hide_login_name_suffix.is_none()
    }

    fn apply_to(&self, policy: &mut LabelPolicy) {
        apply_changes!(self, policy, primary_color, secondary_color, hide_login_name_suffix);
    }
}
