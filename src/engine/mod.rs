//! Authorization engine
//!
//! Owns every registry and answers authorization requests.
//!
//! # Architecture
//!
//! ```text
//! Request → Resolver → TenantHierarchy (implicit tenants)
//!              ↓
//!         AssociationIndex (membership, role rosters)
//!              ↓
//!          RoleGraph (inheritance) → Pattern matcher → bool
//!              ↓
//!         [Audit log]
//! ```

mod catalog;
mod decision;
mod queries;
mod resolver;

pub(crate) use catalog::Catalog;
pub use decision::{DecisionStats, Request};

use crate::config::AuthorizerConfig;
use crate::error::{AuthzError, Result};
use crate::index::AssociationIndex;
use crate::roles::{AttributeGroup, Role, RoleGraph};
use crate::tenant::{Namespace, Principal, Scope, Tenant};
use crate::types::{Attribute, CategoryId, NamespaceId, PrincipalId, RoleId, ScopeId, TenantId};
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Number of registered entities of each kind
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityCounts {
    pub tenants: usize,
    pub namespaces: usize,
    pub scopes: usize,
    pub principals: usize,
    pub roles: usize,
    pub attributes: usize,
    pub attribute_groups: usize,
    pub associations: usize,
}

/// Multi-tenant RBAC decision engine
///
/// Every registration is idempotent: registering an id twice returns the
/// entity registered first.
///
/// # Thread Safety
///
/// `Authorizer` is `Send + Sync`; share it behind an `Arc` and call
/// [`authorize`](Authorizer::authorize) from any number of threads. Setup
/// is expected to complete before concurrent authorization starts, since
/// there are no multi-record transactions.
///
/// # Examples
///
/// ```rust
/// use tenant_authz::{Attribute, Authorizer, Request};
///
/// # fn main() -> tenant_authz::Result<()> {
/// let authorizer = Authorizer::new();
/// let tenant = authorizer.add_tenant("TenantA");
/// let coder = authorizer.add_role("coder");
/// authorizer.add_principal("alice");
///
/// let open = Attribute::new("/coding/:wid/open", "GET");
/// authorizer.add_attribute_group("backend").add_attributes([open.clone()]);
/// authorizer.add_permissions_to_role("coder", "backend", &[open])?;
///
/// tenant.add_role(&coder);
/// tenant.add_principal("alice", false, &["coder"])?;
///
/// let request = Request::new()
///     .tenant("TenantA")
///     .resource_group("backend")
///     .activity("/coding/42/open GET");
/// assert!(authorizer.authorize("alice", &request));
/// # Ok(())
/// # }
/// ```
pub struct Authorizer {
    catalog: Arc<Catalog>,
    tenants: DashMap<TenantId, Arc<Tenant>>,
    total_requests: AtomicU64,
    allowed_decisions: AtomicU64,
    denied_decisions: AtomicU64,
}

impl Authorizer {
    pub fn new() -> Self {
        Self::with_config(AuthorizerConfig::default())
    }

    pub fn with_config(config: AuthorizerConfig) -> Self {
        info!(
            "Authorizer initialized with audit={}, memoization={}, infer_tenant={}",
            config.enable_audit, config.enable_memoization, config.infer_tenant
        );
        Self {
            catalog: Arc::new(Catalog::new(config)),
            tenants: DashMap::new(),
            total_requests: AtomicU64::new(0),
            allowed_decisions: AtomicU64::new(0),
            denied_decisions: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &AuthorizerConfig {
        &self.catalog.config
    }

    pub fn add_tenant(&self, id: impl Into<TenantId>) -> Arc<Tenant> {
        let id = id.into();
        let entry = self
            .tenants
            .entry(id.clone())
            .or_insert_with(|| Arc::new(Tenant::new(id, Arc::clone(&self.catalog))));
        Arc::clone(entry.value())
    }

    pub fn tenant(&self, id: &str) -> Option<Arc<Tenant>> {
        self.tenants.get(id).map(|entry| Arc::clone(entry.value()))
    }

    pub fn add_namespace(&self, id: impl Into<NamespaceId>) -> Arc<Namespace> {
        let id = id.into();
        let entry = self
            .catalog
            .namespaces
            .entry(id.clone())
            .or_insert_with(|| Arc::new(Namespace::new(id)));
        Arc::clone(entry.value())
    }

    pub fn namespace(&self, id: &str) -> Option<Arc<Namespace>> {
        self.catalog.namespace(id).ok()
    }

    pub fn add_scope(&self, id: impl Into<ScopeId>) -> Arc<Scope> {
        let id = id.into();
        let entry = self
            .catalog
            .scopes
            .entry(id.clone())
            .or_insert_with(|| Arc::new(Scope::new(id)));
        Arc::clone(entry.value())
    }

    pub fn scope(&self, id: &str) -> Option<Arc<Scope>> {
        self.catalog.scope(id).ok()
    }

    pub fn add_principal(&self, id: impl Into<PrincipalId>) -> Arc<Principal> {
        let id = id.into();
        let entry = self
            .catalog
            .principals
            .entry(id.clone())
            .or_insert_with(|| Arc::new(Principal::new(id)));
        Arc::clone(entry.value())
    }

    pub fn principal(&self, id: &str) -> Option<Arc<Principal>> {
        self.catalog.principal(id).ok()
    }

    pub fn add_role(&self, id: impl Into<RoleId>) -> Arc<Role> {
        self.catalog.roles.add_role(id)
    }

    pub fn role(&self, id: &str) -> Option<Arc<Role>> {
        self.catalog.roles.get(id)
    }

    /// Registers an attribute, keyed by `"<resource> <action>"`
    pub fn add_attribute(&self, resource: &str, action: &str) -> Attribute {
        let attribute = Attribute::new(resource, action);
        let entry = self
            .catalog
            .attributes
            .entry(attribute.key())
            .or_insert(attribute);
        entry.value().clone()
    }

    pub fn attribute(&self, key: &str) -> Option<Attribute> {
        self.catalog.attributes.get(key).map(|entry| entry.value().clone())
    }

    pub fn add_attribute_group(&self, id: impl Into<CategoryId>) -> Arc<AttributeGroup> {
        let id = id.into();
        let entry = self
            .catalog
            .groups
            .entry(id.clone())
            .or_insert_with(|| Arc::new(AttributeGroup::new(id)));
        Arc::clone(entry.value())
    }

    pub fn attribute_group(&self, id: &str) -> Option<Arc<AttributeGroup>> {
        self.catalog.group(id).ok()
    }

    /// Grants attributes to a role through an attribute group
    ///
    /// # Errors
    ///
    /// - `AuthzError::RoleNotFound` if the role is not registered
    /// - `AuthzError::AttributeGroupNotFound` if the group is not registered
    /// - `AuthzError::AttributeNotInGroup` if an attribute was not declared
    ///   on the group; nothing is granted in that case
    /// - `AuthzError::RoleLocked` if the role is locked
    pub fn add_permissions_to_role(
        &self,
        role: &str,
        group: &str,
        attributes: &[Attribute],
    ) -> Result<()> {
        let role = self.catalog.role(role)?;
        let group = self.catalog.group(group)?;

        if let Some(undeclared) = attributes.iter().find(|attr| !group.contains(attr)) {
            warn!(role = %role.id(), group = %group.id(), attribute = %undeclared, "Attribute not declared on group");
            return Err(AuthzError::AttributeNotInGroup {
                attribute: undeclared.to_string(),
                group: group.id().to_string(),
            });
        }

        role.add_permission(group.id().clone(), attributes.iter().cloned())
    }

    /// Makes `children` descendants of `parent`
    ///
    /// # Errors
    ///
    /// Returns `RoleNotFound`, `CircularDependency` or `RoleLocked`
    pub fn add_child_role(&self, parent: &str, children: &[&str]) -> Result<()> {
        self.catalog.roles.add_child_role(parent, children)?;
        debug!(parent, ?children, "Linked child roles");
        Ok(())
    }

    pub fn counts(&self) -> EntityCounts {
        EntityCounts {
            tenants: self.tenants.len(),
            namespaces: self.catalog.namespaces.len(),
            scopes: self.catalog.scopes.len(),
            principals: self.catalog.principals.len(),
            roles: self.catalog.roles.len(),
            attributes: self.catalog.attributes.len(),
            attribute_groups: self.catalog.groups.len(),
            associations: self.catalog.index.len(),
        }
    }

    pub fn stats(&self) -> DecisionStats {
        DecisionStats {
            total_requests: self.total_requests.load(Ordering::Relaxed),
            allowed_decisions: self.allowed_decisions.load(Ordering::Relaxed),
            denied_decisions: self.denied_decisions.load(Ordering::Relaxed),
        }
    }

    /// The association index backing every lookup
    pub fn index(&self) -> &AssociationIndex {
        &self.catalog.index
    }

    pub fn role_graph(&self) -> &RoleGraph {
        &self.catalog.roles
    }
}

impl Default for Authorizer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Authorizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authorizer")
            .field("config", &self.catalog.config)
            .field("counts", &self.counts())
            .finish()
    }
}
