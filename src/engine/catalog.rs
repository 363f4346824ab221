//! Shared registries behind the engine and its tenant handles

use crate::config::AuthorizerConfig;
use crate::error::{AuthzError, Result};
use crate::index::AssociationIndex;
use crate::roles::{AttributeGroup, Role, RoleGraph};
use crate::tenant::{Namespace, Principal, Scope, TenantHierarchy};
use crate::types::{Attribute, CategoryId, NamespaceId, PrincipalId, ScopeId};
use dashmap::DashMap;
use std::sync::Arc;

/// Everything a tenant handle needs to validate and record grants
///
/// Tenants themselves are registered on the engine, not here, so handles
/// holding an `Arc<Catalog>` never form a reference cycle.
#[derive(Debug)]
pub(crate) struct Catalog {
    pub(crate) config: AuthorizerConfig,
    pub(crate) index: AssociationIndex,
    pub(crate) roles: RoleGraph,
    pub(crate) hierarchy: TenantHierarchy,
    pub(crate) principals: DashMap<PrincipalId, Arc<Principal>>,
    pub(crate) namespaces: DashMap<NamespaceId, Arc<Namespace>>,
    pub(crate) scopes: DashMap<ScopeId, Arc<Scope>>,
    pub(crate) attributes: DashMap<String, Attribute>,
    pub(crate) groups: DashMap<CategoryId, Arc<AttributeGroup>>,
}

impl Catalog {
    pub(crate) fn new(config: AuthorizerConfig) -> Self {
        Self {
            roles: RoleGraph::new(config.enable_memoization),
            config,
            index: AssociationIndex::new(),
            hierarchy: TenantHierarchy::new(),
            principals: DashMap::new(),
            namespaces: DashMap::new(),
            scopes: DashMap::new(),
            attributes: DashMap::new(),
            groups: DashMap::new(),
        }
    }

    pub(crate) fn principal(&self, id: &str) -> Result<Arc<Principal>> {
        self.principals
            .get(id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| AuthzError::PrincipalNotFound {
                principal: id.to_string(),
            })
    }

    pub(crate) fn namespace(&self, id: &str) -> Result<Arc<Namespace>> {
        self.namespaces
            .get(id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| AuthzError::NamespaceNotFound {
                namespace: id.to_string(),
            })
    }

    pub(crate) fn scope(&self, id: &str) -> Result<Arc<Scope>> {
        self.scopes
            .get(id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| AuthzError::ScopeNotFound {
                scope: id.to_string(),
            })
    }

    pub(crate) fn role(&self, id: &str) -> Result<Arc<Role>> {
        self.roles.get(id).ok_or_else(|| AuthzError::RoleNotFound {
            role: id.to_string(),
        })
    }

    pub(crate) fn group(&self, id: &str) -> Result<Arc<AttributeGroup>> {
        self.groups
            .get(id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| AuthzError::AttributeGroupNotFound {
                group: id.to_string(),
            })
    }
}
