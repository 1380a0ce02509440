//! Password policies: complexity, age and lockout.

use serde::{Deserialize, Serialize};

use super::{Policy, PolicyChanges, PolicyCodes, apply_changes};

/// Requirements a new password must meet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordComplexityPolicy {
    pub min_length: u64,
    pub has_lowercase: bool,
    pub has_uppercase: bool,
    pub has_number: bool,
    pub has_symbol: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordComplexityPolicyChanges {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_lowercase: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_uppercase: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_number: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_symbol: Option<bool>,
}

impl Policy for PasswordComplexityPolicy {
    type Changes = PasswordComplexityPolicyChanges;
    const CODES: PolicyCodes = PolicyCodes {
        added: "POLICY-7ENCs",
        changed: "POLICY-7ENCu",
        unexpected: "POLICY-7ENCw",
        not_added: "POLICY-7ENCy",
    };
}

impl PolicyChanges<PasswordComplexityPolicy> for PasswordComplexityPolicyChanges {
    fn is_empty(&self) -> bool {
        self.min_length.is_none()
            && self.has_lowercase.is_none()
            && self.has_uppercase.is_none()
            && self.has_number.is_none()
            && self.has_symbol.is_none()
    }

    fn apply_to(&self, policy: &mut PasswordComplexityPolicy) {
        apply_changes!(
            self,
            policy,
            min_length,
            has_lowercase,
            has_uppercase,
            has_number,
            has_symbol
        );
    }
}

/// Password expiry. `0` days disables the check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordAgePolicy {
    pub expire_warn_days: u64,
    pub max_age_days: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordAgePolicyChanges {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expire_warn_days: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_age_days: Option<u64>,
}

impl Policy for PasswordAgePolicy {
    type Changes = PasswordAgePolicyChanges;
    const CODES: PolicyCodes = PolicyCodes {
        added: "POLICY-uTh1k",
        changed: "POLICY-uTh1n",
        unexpected: "POLICY-uTh1p",
        not_added: "POLICY-uTh1t",
    };
}

impl PolicyChanges<PasswordAgePolicy> for PasswordAgePolicyChanges {
    fn is_empty(&self) -> bool {
        self.expire_warn_days.is_none() && self.max_age_days.is_none()
    }

    fn apply_to(&self, policy: &mut PasswordAgePolicy) {
        apply_changes!(self, policy, expire_warn_days, max_age_days);
    }
}

/// Account lockout after failed password checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordLockoutPolicy {
    pub max_attempts: u64,
    pub show_lockout_failures: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordLockoutPolicyChanges {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_attempts: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_lockout_failures: Option<bool>,
}

impl Policy for PasswordLockoutPolicy {
    type Changes = PasswordLockoutPolicyChanges;
    const CODES: PolicyCodes = PolicyCodes {
        added: "POLICY-5d8Ls",
        changed: "POLICY-5d8Lv",
        unexpected: "POLICY-5d8Lx",
        not_added: "POLICY-5d8Lz",
    };
}

impl PolicyChanges<PasswordLockoutPolicy> for PasswordLockoutPolicyChanges {
    fn is_empty(&self) -> bool {
        self.max_attempts.is_none() && self.show_lockout_failures.is_none()
    }

    fn apply_to(&self, policy: &mut PasswordLockoutPolicy) {
        apply_changes!(self, policy, max_attempts, show_lockout_failures);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn complexity_changes_keep_unset_fields() {
        let mut policy = PasswordComplexityPolicy {
            min_length: 8,
            has_lowercase: true,
            has_uppercase: false,
            has_number: true,
            has_symbol: false,
        };
        PasswordComplexityPolicyChanges {
            min_length: Some(12),
            has_symbol: Some(true),
            ..Default::default()
        }
        .apply_to(&mut policy);

        assert_eq!(policy.min_length, 12);
        assert!(policy.has_symbol);
        assert!(policy.has_lowercase);
        assert!(!policy.has_uppercase);
    }

    #[test]
    fn lockout_changes_report_emptiness() {
        assert!(PasswordLockoutPolicyChanges::default().is_empty());
        assert!(
            !PasswordLockoutPolicyChanges {
                max_attempts: Some(5),
                ..Default::default()
            }
            .is_empty()
        );
    }
}
