//! Authorization request and decision types

use crate::types::{CategoryId, NamespaceId, RoleId, ScopeId, TenantId};
use serde::{Deserialize, Serialize};

/// Authorization request context
///
/// Every field is optional. Which of tenant, namespace and scope are present
/// decides how the request is evaluated; resource group and activity must
/// be given together.
///
/// # Examples
///
/// ```rust
/// use tenant_authz::Request;
///
/// let request = Request::new()
///     .tenant("TenantA")
///     .namespace("coding")
///     .resource_group("backend")
///     .activity("/coding/1/2/start-coding POST");
/// assert!(request.scope.is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant: Option<TenantId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<NamespaceId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<ScopeId>,

    /// Resource category the activity belongs to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_group: Option<CategoryId>,

    /// `"<resource> <action>"` string
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activity: Option<String>,
}

impl Request {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tenant(mut self, tenant: impl Into<TenantId>) -> Self {
        self.tenant = Some(tenant.into());
        self
    }

    pub fn namespace(mut self, namespace: impl Into<NamespaceId>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn scope(mut self, scope: impl Into<ScopeId>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    pub fn resource_group(mut self, group: impl Into<CategoryId>) -> Self {
        self.resource_group = Some(group.into());
        self
    }

    pub fn activity(mut self, activity: impl Into<String>) -> Self {
        self.activity = Some(activity.into());
        self
    }
}

/// Why a decision came out the way it did
///
/// Only ever written to logs; callers see a plain boolean.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum DecisionReason {
    /// Granted in the given tenant, through the role when an activity was
    /// checked
    Granted {
        tenant: TenantId,
        role: Option<RoleId>,
    },
    UnknownPrincipal,
    NoTenantAssociation,
    UnknownTenant,
    UnknownNamespace,
    UnknownScope,
    /// Namespace or scope named on its own, without the other or a tenant
    UnclassifiedContext,
    /// Only one of resource group and activity was supplied
    IncompleteActivity,
    NoMatchingGrant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Decision {
    pub(crate) allowed: bool,
    pub(crate) reason: DecisionReason,
}

impl Decision {
    pub(crate) fn allow(tenant: TenantId, role: Option<RoleId>) -> Self {
        Self {
            allowed: true,
            reason: DecisionReason::Granted { tenant, role },
        }
    }

    pub(crate) fn deny(reason: DecisionReason) -> Self {
        Self {
            allowed: false,
            reason,
        }
    }
}

/// Decision counters
#[derive(Debug, Clone, Default)]
pub struct DecisionStats {
    /// Total number of authorization requests
    pub total_requests: u64,

    /// Number of allowed decisions
    pub allowed_decisions: u64,

    /// Number of denied decisions
    pub denied_decisions: u64,
}

impl DecisionStats {
    /// Calculate allow rate
    pub fn allow_rate(&self) -> f64 {
        let total = self.allowed_decisions + self.denied_decisions;
        if total == 0 {
            0.0
        } else {
            self.allowed_decisions as f64 / total as f64
        }
    }
}
