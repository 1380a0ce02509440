//! Aggregate references and optimistic concurrency expectations.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};
use crate::id::{AggregateId, TenantId};

/// Name of an aggregate type (e.g. `"org"`, `"iam"`).
///
/// Event types are namespaced below their aggregate type (`org.added`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AggregateType(Cow<'static, str>);

impl AggregateType {
    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    pub fn new(name: impl Into<String>) -> Self {
        Self(Cow::Owned(name.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for AggregateType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Full reference to one aggregate instance.
///
/// Every event carries one. `resource_owner` is the organization owning the
/// aggregate; for an org it is the org itself, which is the default.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Aggregate {
    aggregate_type: AggregateType,
    id: AggregateId,
    tenant_id: TenantId,
    resource_owner: String,
    version: u32,
}

impl Aggregate {
    pub fn new(aggregate_type: AggregateType, id: AggregateId, tenant_id: TenantId) -> Self {
        let resource_owner = id.as_str().to_string();
        Self {
            aggregate_type,
            id,
            tenant_id,
            resource_owner,
            version: 1,
        }
    }

    pub fn with_resource_owner(mut self, resource_owner: impl Into<String>) -> Self {
        self.resource_owner = resource_owner.into();
        self
    }

    /// Schema version of the aggregate's events.
    pub fn with_version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    pub fn aggregate_type(&self) -> &AggregateType {
        &self.aggregate_type
    }

    pub fn id(&self) -> &AggregateId {
        &self.id
    }

    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    pub fn resource_owner(&self) -> &str {
        &self.resource_owner
    }

    pub fn version(&self) -> u32 {
        self.version
    }
}

/// Optimistic concurrency expectation for an aggregate, expressed as the
/// latest sequence the caller based its decision on.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum ExpectedSequence {
    /// Skip the check.
    #[default]
    Any,
    /// Require the aggregate's latest sequence to be exactly this value
    /// (`0` means the aggregate must not exist yet).
    Exact(u64),
}

impl ExpectedSequence {
    pub fn matches(self, actual: u64) -> bool {
        match self {
            ExpectedSequence::Any => true,
            ExpectedSequence::Exact(s) => s == actual,
        }
    }

    pub fn check(self, actual: u64) -> DomainResult<()> {
        if self.matches(actual) {
            Ok(())
        } else {
            Err(DomainError::conflict(format!(
                "optimistic concurrency check failed (expected: {self:?}, actual: {actual})"
            )))
        }
    }
}
