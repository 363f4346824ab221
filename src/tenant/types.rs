//! Tenants, their member entities and principal grants

use crate::engine::Catalog;
use crate::error::Result;
use crate::index::{Join, Record};
use crate::roles::Role;
use crate::types::{NamespaceId, PrincipalId, RoleId, ScopeId, TenantId};
use indexmap::IndexSet;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// An actor requesting access
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Principal {
    id: PrincipalId,
}

impl Principal {
    pub(crate) fn new(id: PrincipalId) -> Self {
        Self { id }
    }

    pub fn id(&self) -> &PrincipalId {
        &self.id
    }
}

/// A sub-partition of a tenant
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Namespace {
    id: NamespaceId,
}

impl Namespace {
    pub(crate) fn new(id: NamespaceId) -> Self {
        Self { id }
    }

    pub fn id(&self) -> &NamespaceId {
        &self.id
    }
}

/// A resource-instance boundary, such as an environment
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Scope {
    id: ScopeId,
}

impl Scope {
    pub(crate) fn new(id: ScopeId) -> Self {
        Self { id }
    }

    pub fn id(&self) -> &ScopeId {
        &self.id
    }
}

/// Association of a principal with a tenant, optionally narrowed to a
/// role, namespace and scope
///
/// # Examples
///
/// ```rust
/// use tenant_authz::Grant;
///
/// let grant = Grant::new("p1")
///     .role("coder")
///     .namespace("backend-team")
///     .manage_descendants(true);
/// assert_eq!(grant.principal_id().as_str(), "p1");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grant {
    principal: PrincipalId,
    role: Option<RoleId>,
    namespace: Option<NamespaceId>,
    scope: Option<ScopeId>,
    manage_descendants: bool,
}

impl Grant {
    pub fn new(principal: impl Into<PrincipalId>) -> Self {
        Self {
            principal: principal.into(),
            role: None,
            namespace: None,
            scope: None,
            manage_descendants: false,
        }
    }

    pub fn role(mut self, role: impl Into<RoleId>) -> Self {
        self.role = Some(role.into());
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

    /// Extends the granted role to every descendant tenant
    pub fn manage_descendants(mut self, manage: bool) -> Self {
        self.manage_descendants = manage;
        self
    }

    pub fn principal_id(&self) -> &PrincipalId {
        &self.principal
    }

    fn record(&self, tenant: &TenantId) -> Record {
        Record {
            tenant: Some(tenant.clone()),
            namespace: self.namespace.clone(),
            scope: self.scope.clone(),
            principal: Some(self.principal.clone()),
            role: self.role.clone(),
            manage_descendants: Some(self.manage_descendants),
        }
    }
}

/// Handle to a registered tenant
///
/// Obtained from [`Authorizer::add_tenant`](crate::Authorizer::add_tenant).
/// Structural links (namespaces, scopes, roles, descendants) and principal
/// grants made through the handle are recorded in the engine's index.
pub struct Tenant {
    id: TenantId,
    catalog: Arc<Catalog>,
}

impl Tenant {
    pub(crate) fn new(id: TenantId, catalog: Arc<Catalog>) -> Self {
        Self { id, catalog }
    }

    pub fn id(&self) -> &TenantId {
        &self.id
    }

    fn record(&self) -> Record {
        Record::new().with_tenant(self.id.clone())
    }

    pub fn add_namespace(&self, namespace: &Namespace) {
        self.catalog
            .index
            .insert(self.record().with_namespace(namespace.id().clone()));
    }

    pub fn add_namespaces(&self, namespaces: &[Arc<Namespace>]) {
        for namespace in namespaces {
            self.add_namespace(namespace);
        }
    }

    pub fn add_scope(&self, scope: &Scope) {
        self.catalog
            .index
            .insert(self.record().with_scope(scope.id().clone()));
    }

    pub fn add_scopes(&self, scopes: &[Arc<Scope>]) {
        for scope in scopes {
            self.add_scope(scope);
        }
    }

    /// Makes a role part of the tenant's roster
    pub fn add_role(&self, role: &Role) {
        self.catalog
            .index
            .insert(self.record().with_role(role.id().clone()));
    }

    pub fn add_roles(&self, roles: &[Arc<Role>]) {
        for role in roles {
            self.add_role(role);
        }
    }

    /// Attaches scopes to one of the tenant's namespaces
    ///
    /// # Errors
    ///
    /// Returns `NamespaceNotFound` or `ScopeNotFound` for unregistered ids
    pub fn add_scopes_to_namespace(&self, namespace: &str, scopes: &[&str]) -> Result<()> {
        let namespace = self.catalog.namespace(namespace)?;
        let scopes = scopes
            .iter()
            .map(|scope| self.catalog.scope(scope))
            .collect::<Result<Vec<_>>>()?;

        for scope in scopes {
            self.catalog.index.insert(
                self.record()
                    .with_namespace(namespace.id().clone())
                    .with_scope(scope.id().clone()),
            );
        }
        Ok(())
    }

    /// Restricts the roles visible inside a namespace
    ///
    /// Once a namespace has its own roles, requests naming it only inherit
    /// through those roles rather than the whole tenant roster.
    ///
    /// # Errors
    ///
    /// Returns `NamespaceNotFound` or `RoleNotFound` for unregistered ids
    pub fn add_roles_to_namespace(&self, namespace: &str, roles: &[&str]) -> Result<()> {
        let namespace = self.catalog.namespace(namespace)?;
        let roles = roles
            .iter()
            .map(|role| self.catalog.role(role))
            .collect::<Result<Vec<_>>>()?;

        for role in roles {
            self.catalog.index.insert(
                self.record()
                    .with_namespace(namespace.id().clone())
                    .with_role(role.id().clone()),
            );
        }
        Ok(())
    }

    pub fn add_descendant(&self, descendant: &Tenant) -> Result<()> {
        self.catalog
            .hierarchy
            .add_descendants(&self.id, std::slice::from_ref(&descendant.id))
    }

    /// # Errors
    ///
    /// Returns `CircularTenantHierarchy` if any descendant already reaches
    /// this tenant; no edge is added in that case
    pub fn add_descendants(&self, descendants: &[Arc<Tenant>]) -> Result<()> {
        let ids: Vec<TenantId> = descendants.iter().map(|t| t.id.clone()).collect();
        self.catalog.hierarchy.add_descendants(&self.id, &ids)
    }

    /// Every tenant reachable through descendant edges
    pub fn descendants(&self) -> IndexSet<TenantId> {
        self.catalog.hierarchy.descendants(self.id.as_str())
    }

    /// Associates a principal with the tenant, granting each role
    ///
    /// With no roles the principal becomes a plain member.
    pub fn add_principal(
        &self,
        principal: &str,
        manage_descendants: bool,
        roles: &[&str],
    ) -> Result<()> {
        self.grant_roles(Grant::new(principal).manage_descendants(manage_descendants), roles)
    }

    /// Associates a principal with one of the tenant's namespaces,
    /// granting each role within that namespace only
    pub fn add_principal_in_namespace(
        &self,
        principal: &str,
        namespace: &str,
        manage_descendants: bool,
        roles: &[&str],
    ) -> Result<()> {
        self.grant_roles(
            Grant::new(principal)
                .namespace(namespace)
                .manage_descendants(manage_descendants),
            roles,
        )
    }

    /// Associates a principal with scopes of the tenant
    pub fn assign_scopes_to_principal(&self, principal: &str, scopes: &[&str]) -> Result<()> {
        let base = Grant::new(principal);
        let grants: Vec<Grant> = scopes.iter().map(|scope| base.clone().scope(*scope)).collect();
        self.validate_all(&grants)?;
        for grant in &grants {
            self.insert_grant(grant);
        }
        Ok(())
    }

    /// Records a grant after checking every entity it names is registered
    ///
    /// # Errors
    ///
    /// Returns `PrincipalNotFound`, `RoleNotFound`, `NamespaceNotFound` or
    /// `ScopeNotFound`
    pub fn grant(&self, grant: &Grant) -> Result<()> {
        self.validate(grant)?;
        self.insert_grant(grant);
        Ok(())
    }

    fn grant_roles(&self, base: Grant, roles: &[&str]) -> Result<()> {
        let grants: Vec<Grant> = if roles.is_empty() {
            vec![base]
        } else {
            roles.iter().map(|role| base.clone().role(*role)).collect()
        };
        self.validate_all(&grants)?;
        for grant in &grants {
            self.insert_grant(grant);
        }
        Ok(())
    }

    fn validate_all(&self, grants: &[Grant]) -> Result<()> {
        grants.iter().try_for_each(|grant| self.validate(grant))
    }

    fn validate(&self, grant: &Grant) -> Result<()> {
        self.catalog.principal(grant.principal.as_str())?;
        if let Some(role) = &grant.role {
            self.catalog.role(role.as_str())?;
        }
        if let Some(namespace) = &grant.namespace {
            self.catalog.namespace(namespace.as_str())?;
        }
        if let Some(scope) = &grant.scope {
            self.catalog.scope(scope.as_str())?;
        }
        Ok(())
    }

    fn insert_grant(&self, grant: &Grant) {
        self.catalog.index.insert(grant.record(&self.id));
        debug!(
            tenant = %self.id,
            principal = %grant.principal,
            role = ?grant.role,
            namespace = ?grant.namespace,
            scope = ?grant.scope,
            manage_descendants = grant.manage_descendants,
            "Recorded grant"
        );
    }

    /// Roles in the tenant's roster
    pub fn roles(&self) -> Vec<RoleId> {
        self.catalog
            .index
            .select_distinct(&self.record(), &Join::roles_by_tenant(), |row| row.role.as_ref())
    }

    /// Namespaces associated with the tenant
    pub fn namespaces(&self) -> Vec<NamespaceId> {
        self.catalog.index.select_distinct(
            &self.record(),
            &Join::namespaces_by_tenant(),
            |row| row.namespace.as_ref(),
        )
    }

    /// Scopes associated with the tenant
    pub fn scopes(&self) -> Vec<ScopeId> {
        self.catalog
            .index
            .select_distinct(&self.record(), &Join::scopes_by_tenant(), |row| row.scope.as_ref())
    }
}

impl fmt::Debug for Tenant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tenant").field("id", &self.id).finish()
    }
}
