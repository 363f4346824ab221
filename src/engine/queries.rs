//! Principal- and tenant-centric lookups over the association index

use super::resolver::Context;
use super::Authorizer;
use crate::index::{Join, Record};
use crate::types::{NamespaceId, PrincipalId, RoleId, ScopeId, TenantId};
use indexmap::IndexSet;

impl Authorizer {
    /// Tenants the principal is directly associated with
    pub fn tenants_by_principal(&self, principal: &str) -> Vec<TenantId> {
        self.catalog.index.select_distinct(
            &Record::new().with_principal(principal),
            &Join::tenants_by_principal(),
            |row| row.tenant.as_ref(),
        )
    }

    /// Tenants the principal is associated with, expanded through the
    /// descendants of every tenant where it holds a manage-descendants grant
    pub fn implicit_tenants(&self, principal: &str) -> IndexSet<TenantId> {
        let rows = self.catalog.index.select(
            &Record::new().with_principal(principal),
            &Join::tenants_by_principal(),
        );

        let mut tenants = IndexSet::new();
        for row in rows {
            let Some(tenant) = &row.tenant else {
                continue;
            };
            tenants.insert(tenant.clone());
            if row.manage_descendants == Some(true) {
                tenants.extend(self.catalog.hierarchy.descendants(tenant.as_str()));
            }
        }
        tenants
    }

    /// Roles granted to anyone under the tenant
    pub fn roles_by_tenant(&self, tenant: &str) -> Vec<RoleId> {
        self.catalog.index.select_distinct(
            &Record::new().with_tenant(tenant),
            &Join::roles_by_tenant(),
            |row| row.role.as_ref(),
        )
    }

    pub fn namespaces_by_tenant(&self, tenant: &str) -> Vec<NamespaceId> {
        self.catalog.index.select_distinct(
            &Record::new().with_tenant(tenant),
            &Join::namespaces_by_tenant(),
            |row| row.namespace.as_ref(),
        )
    }

    pub fn scopes_by_tenant(&self, tenant: &str) -> Vec<ScopeId> {
        self.catalog.index.select_distinct(
            &Record::new().with_tenant(tenant),
            &Join::scopes_by_tenant(),
            |row| row.scope.as_ref(),
        )
    }

    /// Scopes assigned to the principal in any tenant
    pub fn scopes_by_principal(&self, principal: &str) -> Vec<ScopeId> {
        self.catalog.index.select_distinct(
            &Record::new().with_principal(principal),
            &Join::scopes_by_principal(),
            |row| row.scope.as_ref(),
        )
    }

    /// Namespaces of the tenant visible to the principal, including
    /// tenant-wide ones
    pub fn namespaces_for_principal(&self, principal: &str, tenant: &str) -> Vec<NamespaceId> {
        self.catalog.index.select_distinct(
            &Record::new().with_tenant(tenant).with_principal(principal),
            &Join::namespaces_for_principal(),
            |row| row.namespace.as_ref(),
        )
    }

    /// Scopes of the tenant visible to the principal, optionally narrowed to
    /// a namespace
    pub fn scopes_for_principal(
        &self,
        principal: &str,
        tenant: &str,
        namespace: Option<&str>,
    ) -> Vec<ScopeId> {
        let mut filter = Record::new().with_tenant(tenant).with_principal(principal);
        filter.namespace = namespace.map(NamespaceId::from);
        self.catalog.index.select_distinct(
            &filter,
            &Join::scopes_for_principal(namespace.is_some()),
            |row| row.scope.as_ref(),
        )
    }

    /// Roles the principal holds in a tenant context, including roles
    /// delegated from ancestor tenants
    pub fn roles_for_principal(
        &self,
        principal: &str,
        tenant: &str,
        namespace: Option<&str>,
        scope: Option<&str>,
    ) -> Vec<RoleId> {
        let tenant = TenantId::new(tenant);
        let namespace = namespace.map(NamespaceId::from);
        let scope = scope.map(ScopeId::from);
        let ctx = Context {
            tenant: Some(&tenant),
            namespace: namespace.as_ref(),
            scope: scope.as_ref(),
        };
        self.collect_roles(principal, &tenant, ctx)
            .held
            .into_iter()
            .collect()
    }

    /// Principals holding any grant under the tenant
    pub fn principals_by_tenant(&self, tenant: &str) -> Vec<PrincipalId> {
        self.catalog.index.select_distinct(
            &Record::new().with_tenant(tenant),
            &Join::principals_by_tenant(),
            |row| row.principal.as_ref(),
        )
    }
}
