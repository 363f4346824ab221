//! Association records and their key segments

use crate::types::{NamespaceId, PrincipalId, RoleId, ScopeId, TenantId};
use serde::{Deserialize, Serialize};

/// One association row
///
/// Every field is optional. An unset field means "not part of this
/// association", which the lookup joins interpret either as a wildcard or
/// as a mismatch depending on the question asked.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Record {
    pub tenant: Option<TenantId>,
    pub namespace: Option<NamespaceId>,
    pub scope: Option<ScopeId>,
    pub principal: Option<PrincipalId>,
    pub role: Option<RoleId>,
    pub manage_descendants: Option<bool>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tenant(mut self, tenant: impl Into<TenantId>) -> Self {
        self.tenant = Some(tenant.into());
        self
    }

    pub fn with_namespace(mut self, namespace: impl Into<NamespaceId>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn with_scope(mut self, scope: impl Into<ScopeId>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    pub fn with_principal(mut self, principal: impl Into<PrincipalId>) -> Self {
        self.principal = Some(principal.into());
        self
    }

    pub fn with_role(mut self, role: impl Into<RoleId>) -> Self {
        self.role = Some(role.into());
        self
    }

    pub fn with_manage_descendants(mut self, manage: bool) -> Self {
        self.manage_descendants = Some(manage);
        self
    }

    /// Whether the given field carries a value
    pub fn is_set(&self, field: Field) -> bool {
        match field {
            Field::Tenant => self.tenant.is_some(),
            Field::Namespace => self.namespace.is_some(),
            Field::Scope => self.scope.is_some(),
            Field::Principal => self.principal.is_some(),
            Field::Role => self.role.is_some(),
            Field::ManageDescendants => self.manage_descendants.is_some(),
        }
    }

    /// Whether both records carry the same set value in the given field
    pub fn same(&self, other: &Record, field: Field) -> bool {
        match field {
            Field::Tenant => self.tenant.is_some() && self.tenant == other.tenant,
            Field::Namespace => self.namespace.is_some() && self.namespace == other.namespace,
            Field::Scope => self.scope.is_some() && self.scope == other.scope,
            Field::Principal => self.principal.is_some() && self.principal == other.principal,
            Field::Role => self.role.is_some() && self.role == other.role,
            Field::ManageDescendants => {
                self.manage_descendants.is_some()
                    && self.manage_descendants == other.manage_descendants
            }
        }
    }

    /// Whether this record holds the value carried by a key segment
    pub(crate) fn holds(&self, segment: &Segment) -> bool {
        match segment {
            Segment::Tenant(id) => self.tenant.as_ref() == Some(id),
            Segment::Principal(id) => self.principal.as_ref() == Some(id),
            Segment::Role(id) => self.role.as_ref() == Some(id),
            Segment::Namespace(id) => self.namespace.as_ref() == Some(id),
            Segment::Scope(id) => self.scope.as_ref() == Some(id),
            Segment::ManageDescendants(flag) => self.manage_descendants == Some(*flag),
        }
    }

    /// Key path in fixed field order, skipping unset fields
    pub(crate) fn key_path(&self) -> Vec<Segment> {
        let mut path = Vec::with_capacity(Field::KEY_ORDER.len());
        if let Some(id) = &self.tenant {
            path.push(Segment::Tenant(id.clone()));
        }
        if let Some(id) = &self.principal {
            path.push(Segment::Principal(id.clone()));
        }
        if let Some(id) = &self.role {
            path.push(Segment::Role(id.clone()));
        }
        if let Some(id) = &self.namespace {
            path.push(Segment::Namespace(id.clone()));
        }
        if let Some(id) = &self.scope {
            path.push(Segment::Scope(id.clone()));
        }
        if let Some(flag) = self.manage_descendants {
            path.push(Segment::ManageDescendants(flag));
        }
        path
    }
}

/// Names one of the six record fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Tenant,
    Namespace,
    Scope,
    Principal,
    Role,
    ManageDescendants,
}

impl Field {
    /// Order in which set fields form a record's key path
    pub const KEY_ORDER: [Field; 6] = [
        Field::Tenant,
        Field::Principal,
        Field::Role,
        Field::Namespace,
        Field::Scope,
        Field::ManageDescendants,
    ];

    /// Position of the field in the key order
    pub fn rank(self) -> usize {
        match self {
            Field::Tenant => 0,
            Field::Principal => 1,
            Field::Role => 2,
            Field::Namespace => 3,
            Field::Scope => 4,
            Field::ManageDescendants => 5,
        }
    }
}

/// Tagged key segment
///
/// Tagging keeps a path that skips a field distinct from one that sets it,
/// so `(T, role R)` and `(T, namespace R)` never share a node.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum Segment {
    Tenant(TenantId),
    Principal(PrincipalId),
    Role(RoleId),
    Namespace(NamespaceId),
    Scope(ScopeId),
    ManageDescendants(bool),
}

impl Segment {
    pub(crate) fn field(&self) -> Field {
        match self {
            Segment::Tenant(_) => Field::Tenant,
            Segment::Principal(_) => Field::Principal,
            Segment::Role(_) => Field::Role,
            Segment::Namespace(_) => Field::Namespace,
            Segment::Scope(_) => Field::Scope,
            Segment::ManageDescendants(_) => Field::ManageDescendants,
        }
    }
}
