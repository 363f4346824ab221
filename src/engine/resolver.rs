//! Authorization decision algorithm
//!
//! A request is answered in three phases:
//! 1. Gate: the principal must be registered and associated with at least
//!    one tenant, and every named tenant, namespace and scope must exist.
//! 2. Evaluate the request in the context it names. Which of tenant,
//!    namespace and scope are present selects one of six shapes; without
//!    an activity the question is plain membership.
//!    A namespace or scope named on its own fits none of the shapes and is
//!    denied.
//! 3. When nothing but the principal was named, retry once per implicit
//!    tenant of the principal, as the tenant shape.

use super::decision::{Decision, DecisionReason, Request};
use super::Authorizer;
use crate::index::{Join, Record};
use crate::types::{NamespaceId, PrincipalId, RoleId, ScopeId, TenantId};
use indexmap::IndexSet;
use tracing::{debug, info};

/// Request shape by which context fields were supplied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Shape {
    Unscoped,
    Tenant,
    TenantNamespace,
    TenantScope,
    NamespaceScope,
    TenantNamespaceScope,
    /// Namespace-only or scope-only; never granted
    Unclassified,
}

impl Shape {
    pub(crate) fn classify(tenant: bool, namespace: bool, scope: bool) -> Self {
        match (tenant, namespace, scope) {
            (false, false, false) => Shape::Unscoped,
            (true, false, false) => Shape::Tenant,
            (true, true, false) => Shape::TenantNamespace,
            (true, false, true) => Shape::TenantScope,
            (false, true, true) => Shape::NamespaceScope,
            (true, true, true) => Shape::TenantNamespaceScope,
            (false, true, false) | (false, false, true) => Shape::Unclassified,
        }
    }
}

/// What is being asked of the context
#[derive(Debug, Clone, Copy)]
enum Check<'a> {
    Membership,
    Activity { category: &'a str, activity: &'a str },
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct Context<'a> {
    pub(crate) tenant: Option<&'a TenantId>,
    pub(crate) namespace: Option<&'a NamespaceId>,
    pub(crate) scope: Option<&'a ScopeId>,
}

impl Context<'_> {
    fn shape(&self) -> Shape {
        Shape::classify(
            self.tenant.is_some(),
            self.namespace.is_some(),
            self.scope.is_some(),
        )
    }

    /// Index filter carrying the principal and this context
    fn filter(&self, tenant: &TenantId, principal: &PrincipalId) -> Record {
        Record {
            tenant: Some(tenant.clone()),
            namespace: self.namespace.cloned(),
            scope: self.scope.cloned(),
            principal: Some(principal.clone()),
            role: None,
            manage_descendants: None,
        }
    }
}

fn role_of(row: &Record) -> Option<&RoleId> {
    row.role.as_ref()
}

/// Roles a principal holds in one tenant context, and the roster
/// inheritance is restricted to there
#[derive(Debug, Default)]
pub(crate) struct RoleSets {
    pub(crate) held: IndexSet<RoleId>,
    pub(crate) allowed: IndexSet<RoleId>,
}

impl Authorizer {
    /// Decides whether a principal may act in the given context
    ///
    /// Never errors: unknown entities, missing grants and malformed
    /// requests all deny.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use tenant_authz::{Authorizer, Request};
    ///
    /// let authorizer = Authorizer::new();
    /// assert!(!authorizer.authorize("nobody", &Request::new().tenant("T")));
    /// ```
    pub fn authorize(&self, principal: &str, request: &Request) -> bool {
        let decision = self.decide(principal, request);
        self.record_decision(principal, request, &decision);
        decision.allowed
    }

    /// Whether the principal holds any of `roles` in the given context,
    /// directly or through role inheritance
    ///
    /// The context is resolved exactly as for [`authorize`](Self::authorize),
    /// including the retry over implicit tenants. Resource group and
    /// activity are ignored.
    pub fn can(&self, principal: &str, request: &Request, roles: &[&str]) -> bool {
        let graph = &self.catalog.roles;
        let decision = self.resolve(principal, request, |implicit, ctx| {
            self.candidate_tenants(implicit, ctx)
                .into_iter()
                .find_map(|tenant| {
                    let sets = self.collect_roles(principal, tenant, ctx);
                    sets.held
                        .iter()
                        .find(|held| {
                            let reachable = graph.resolve_roles(held.as_str());
                            roles.iter().any(|wanted| reachable.contains(*wanted))
                        })
                        .map(|held| Decision::allow(tenant.clone(), Some(held.clone())))
                })
        });

        debug!(principal, ?roles, allowed = decision.allowed, reason = ?decision.reason, "Role check");
        decision.allowed
    }

    pub(crate) fn decide(&self, principal: &str, request: &Request) -> Decision {
        let check = match (request.resource_group.as_ref(), request.activity.as_deref()) {
            (None, None) => Check::Membership,
            (Some(category), Some(activity)) => Check::Activity {
                category: category.as_str(),
                activity,
            },
            _ => return Decision::deny(DecisionReason::IncompleteActivity),
        };

        self.resolve(principal, request, |implicit, ctx| {
            self.candidate_tenants(implicit, ctx)
                .into_iter()
                .find_map(|tenant| self.evaluate_in(principal, implicit, tenant, ctx, check))
        })
    }

    /// Gates the request, then runs `evaluate` in the requested context and,
    /// when no context was named, in each implicit tenant
    fn resolve<F>(&self, principal: &str, request: &Request, evaluate: F) -> Decision
    where
        F: Fn(&IndexSet<TenantId>, Context<'_>) -> Option<Decision>,
    {
        if !self.catalog.principals.contains_key(principal) {
            return Decision::deny(DecisionReason::UnknownPrincipal);
        }

        let implicit = self.implicit_tenants(principal);
        if implicit.is_empty() {
            return Decision::deny(DecisionReason::NoTenantAssociation);
        }

        let tenant = request.tenant.clone().or_else(|| {
            self.catalog
                .config
                .default_tenant
                .as_deref()
                .map(TenantId::from)
        });

        if let Some(tenant) = &tenant {
            if !self.tenants.contains_key(tenant.as_str()) {
                return Decision::deny(DecisionReason::UnknownTenant);
            }
        }
        if let Some(namespace) = &request.namespace {
            if !self.catalog.namespaces.contains_key(namespace.as_str()) {
                return Decision::deny(DecisionReason::UnknownNamespace);
            }
        }
        if let Some(scope) = &request.scope {
            if !self.catalog.scopes.contains_key(scope.as_str()) {
                return Decision::deny(DecisionReason::UnknownScope);
            }
        }

        let ctx = Context {
            tenant: tenant.as_ref(),
            namespace: request.namespace.as_ref(),
            scope: request.scope.as_ref(),
        };
        let shape = ctx.shape();
        if shape == Shape::Unclassified {
            return Decision::deny(DecisionReason::UnclassifiedContext);
        }
        if let Some(decision) = evaluate(&implicit, ctx) {
            return decision;
        }

        if shape == Shape::Unscoped && self.catalog.config.infer_tenant {
            for candidate in &implicit {
                let inferred = Context {
                    tenant: Some(candidate),
                    ..ctx
                };
                if let Some(decision) = evaluate(&implicit, inferred) {
                    debug!(principal, tenant = %candidate, "Granted in inferred tenant");
                    return decision;
                }
            }
        }

        Decision::deny(DecisionReason::NoMatchingGrant)
    }

    /// Tenants a context is evaluated in: the named one, or every implicit
    /// tenant for the namespace+scope shape
    fn candidate_tenants<'a>(
        &self,
        implicit: &'a IndexSet<TenantId>,
        ctx: Context<'a>,
    ) -> Vec<&'a TenantId> {
        match ctx.shape() {
            Shape::Unscoped | Shape::Unclassified => Vec::new(),
            Shape::NamespaceScope => implicit.iter().collect(),
            Shape::Tenant
            | Shape::TenantNamespace
            | Shape::TenantScope
            | Shape::TenantNamespaceScope => ctx.tenant.into_iter().collect(),
        }
    }

    fn evaluate_in(
        &self,
        principal: &str,
        implicit: &IndexSet<TenantId>,
        tenant: &TenantId,
        ctx: Context<'_>,
        check: Check<'_>,
    ) -> Option<Decision> {
        match check {
            Check::Membership => self
                .is_member(principal, implicit, tenant, ctx)
                .then(|| Decision::allow(tenant.clone(), None)),
            Check::Activity { category, activity } => {
                let sets = self.collect_roles(principal, tenant, ctx);
                let graph = &self.catalog.roles;
                sets.held
                    .iter()
                    .find(|role| graph.has(role.as_str(), category, activity, &sets.allowed))
                    .map(|role| Decision::allow(tenant.clone(), Some(role.clone())))
            }
        }
    }

    /// Structural membership of the principal in `tenant` narrowed by the
    /// context's namespace and scope. Rows without a principal are
    /// tenant-wide and count for every member.
    fn is_member(
        &self,
        principal: &str,
        implicit: &IndexSet<TenantId>,
        tenant: &TenantId,
        ctx: Context<'_>,
    ) -> bool {
        if !implicit.contains(tenant) {
            return false;
        }

        let index = &self.catalog.index;
        let filter = ctx.filter(tenant, &PrincipalId::new(principal));
        match (ctx.namespace.is_some(), ctx.scope.is_some()) {
            (false, false) => true,
            (true, false) => index.contains(&filter, &Join::namespace_membership()),
            (false, true) => index.contains(&filter, &Join::scope_membership(false)),
            (true, true) => {
                index.contains(&filter, &Join::namespace_membership())
                    && index.contains(&filter, &Join::scope_membership(true))
            }
        }
    }

    /// Roles the principal holds in a tenant context plus the roster
    /// inheritance may pass through
    ///
    /// Held roles are the principal's grants in the tenant, where a grant
    /// without a namespace or scope applies to all of them, plus roles
    /// delegated from ancestor tenants. The roster is the namespace's own
    /// roles when it has any, otherwise the tenant's, plus each delegating
    /// ancestor's roster.
    pub(crate) fn collect_roles(
        &self,
        principal: &str,
        tenant: &TenantId,
        ctx: Context<'_>,
    ) -> RoleSets {
        let index = &self.catalog.index;
        let principal_id = PrincipalId::new(principal);
        let filter = ctx.filter(tenant, &principal_id);

        let mut held: IndexSet<RoleId> = index
            .select_distinct(
                &filter,
                &Join::roles_for_principal(ctx.namespace.is_some(), ctx.scope.is_some()),
                role_of,
            )
            .into_iter()
            .collect();

        let mut allowed: IndexSet<RoleId> = IndexSet::new();
        if ctx.namespace.is_some() {
            allowed.extend(index.select_distinct(&filter, &Join::namespace_roles(), role_of));
        }
        if allowed.is_empty() {
            allowed.extend(index.select_distinct(&filter, &Join::roles_by_tenant(), role_of));
        }

        for ancestor in self.delegating_ancestors(&principal_id, tenant) {
            let delegated = Record::new()
                .with_tenant(ancestor.clone())
                .with_principal(principal_id.clone())
                .with_manage_descendants(true);
            held.extend(index.select_distinct(&delegated, &Join::delegated_roles(), role_of));
            allowed.extend(index.select_distinct(
                &Record::new().with_tenant(ancestor),
                &Join::roles_by_tenant(),
                role_of,
            ));
        }

        RoleSets { held, allowed }
    }

    /// Ancestors of `tenant` on which the principal holds a grant with the
    /// manage-descendants flag set
    fn delegating_ancestors(&self, principal: &PrincipalId, tenant: &TenantId) -> Vec<TenantId> {
        let filter = Record::new()
            .with_principal(principal.clone())
            .with_manage_descendants(true);
        self.catalog
            .index
            .select_distinct(&filter, &Join::delegating_grants(), |row| row.tenant.as_ref())
            .into_iter()
            .filter(|ancestor| {
                ancestor != tenant
                    && self
                        .catalog
                        .hierarchy
                        .is_descendant(ancestor.as_str(), tenant.as_str())
            })
            .collect()
    }

    fn record_decision(&self, principal: &str, request: &Request, decision: &Decision) {
        use std::sync::atomic::Ordering;

        self.total_requests.fetch_add(1, Ordering::Relaxed);
        if decision.allowed {
            self.allowed_decisions.fetch_add(1, Ordering::Relaxed);
        } else {
            self.denied_decisions.fetch_add(1, Ordering::Relaxed);
        }

        if self.catalog.config.enable_audit {
            info!(
                target: "tenant_authz::audit",
                principal,
                tenant = ?request.tenant,
                namespace = ?request.namespace,
                scope = ?request.scope,
                resource_group = ?request.resource_group,
                activity = ?request.activity,
                allowed = decision.allowed,
                reason = ?decision.reason,
                "Authorization decision"
            );
        } else {
            debug!(principal, allowed = decision.allowed, reason = ?decision.reason, "Authorization decision");
        }
    }
}
