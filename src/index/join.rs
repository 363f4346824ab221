//! Declarative lookup predicates over association records
//!
//! A [`Join`] assigns one [`Rule`] to each record field. A single generic
//! matcher interprets it, and the index uses the same rules to skip whole
//! subtrees that can never satisfy the join.
//!
//! The named constructors below are every question the resolver and the
//! query API ask of the index.

use super::record::{Field, Record, Segment};

/// How a join constrains one field of a stored row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Rule {
    /// Field is not constrained
    #[default]
    Any,
    /// Row must carry the filter's value; an unset filter value never matches
    Equal,
    /// Unset in the row acts as a wildcard, otherwise as `Equal`
    EqualOrUnset,
    /// Row must carry some value
    Present,
    /// Row must not carry a value
    Unset,
}

impl Rule {
    /// Whether a row with this field unset can satisfy the rule
    fn admits_unset(self) -> bool {
        matches!(self, Rule::Any | Rule::EqualOrUnset | Rule::Unset)
    }
}

/// A declarative predicate: one rule per record field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Join {
    rules: [Rule; 6],
}

impl Join {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the rule for a field
    pub fn with(mut self, field: Field, rule: Rule) -> Self {
        self.rules[field.rank()] = rule;
        self
    }

    pub fn equal(self, field: Field) -> Self {
        self.with(field, Rule::Equal)
    }

    pub fn equal_or_unset(self, field: Field) -> Self {
        self.with(field, Rule::EqualOrUnset)
    }

    pub fn present(self, field: Field) -> Self {
        self.with(field, Rule::Present)
    }

    pub fn unset(self, field: Field) -> Self {
        self.with(field, Rule::Unset)
    }

    pub fn rule(&self, field: Field) -> Rule {
        self.rules[field.rank()]
    }

    /// Evaluates the join for one stored row against a filter
    ///
    /// # Examples
    ///
    /// ```rust
    /// use tenant_authz::index::{Field, Join, Record};
    ///
    /// let join = Join::new().equal(Field::Tenant).present(Field::Role);
    /// let filter = Record::new().with_tenant("T");
    ///
    /// assert!(join.matches(&filter, &Record::new().with_tenant("T").with_role("coder")));
    /// assert!(!join.matches(&filter, &Record::new().with_tenant("T")));
    /// assert!(!join.matches(&filter, &Record::new().with_tenant("U").with_role("coder")));
    /// ```
    pub fn matches(&self, filter: &Record, row: &Record) -> bool {
        Field::KEY_ORDER.iter().all(|&field| match self.rule(field) {
            Rule::Any => true,
            Rule::Equal => row.same(filter, field),
            Rule::EqualOrUnset => !row.is_set(field) || row.same(filter, field),
            Rule::Present => row.is_set(field),
            Rule::Unset => !row.is_set(field),
        })
    }

    /// Whether a row may skip every field ranked in `from..to` of the key
    /// order, i.e. leave them unset
    pub(crate) fn admits_skip(&self, from: usize, to: usize) -> bool {
        Field::KEY_ORDER[from..to]
            .iter()
            .all(|&field| self.rule(field).admits_unset())
    }

    /// Whether a row carrying this segment can satisfy the join
    pub(crate) fn admits(&self, filter: &Record, segment: &Segment) -> bool {
        match self.rule(segment.field()) {
            Rule::Any | Rule::Present => true,
            Rule::Unset => false,
            Rule::Equal | Rule::EqualOrUnset => filter.holds(segment),
        }
    }

    /// Tenants a principal is directly associated with
    pub fn tenants_by_principal() -> Self {
        Self::new().equal(Field::Principal).present(Field::Tenant)
    }

    /// Grants made to a principal with the manage-descendants flag set
    ///
    /// The filter must carry `manage_descendants = Some(true)`.
    pub fn delegating_grants() -> Self {
        Self::new()
            .equal(Field::Principal)
            .present(Field::Tenant)
            .equal(Field::ManageDescendants)
    }

    /// Principals holding any grant under a tenant
    pub fn principals_by_tenant() -> Self {
        Self::new().equal(Field::Tenant).present(Field::Principal)
    }

    /// Roles granted to anyone under a tenant
    pub fn roles_by_tenant() -> Self {
        Self::new().equal(Field::Tenant).present(Field::Role)
    }

    /// Roles attached to a namespace of a tenant without a principal
    pub fn namespace_roles() -> Self {
        Self::new()
            .equal(Field::Tenant)
            .equal(Field::Namespace)
            .present(Field::Role)
            .unset(Field::Principal)
    }

    /// Namespaces associated with a tenant
    pub fn namespaces_by_tenant() -> Self {
        Self::new().equal(Field::Tenant).present(Field::Namespace)
    }

    /// Scopes associated with a tenant
    pub fn scopes_by_tenant() -> Self {
        Self::new().equal(Field::Tenant).present(Field::Scope)
    }

    /// Scopes associated with a principal in any tenant
    pub fn scopes_by_principal() -> Self {
        Self::new()
            .equal(Field::Principal)
            .present(Field::Tenant)
            .present(Field::Scope)
    }

    /// Namespaces visible to a principal under a tenant; tenant-wide rows
    /// (no principal) count for every principal
    pub fn namespaces_for_principal() -> Self {
        Self::new()
            .equal(Field::Tenant)
            .present(Field::Namespace)
            .equal_or_unset(Field::Principal)
    }

    /// Scopes visible to a principal under a tenant, optionally narrowed to
    /// a namespace
    pub fn scopes_for_principal(namespace: bool) -> Self {
        let join = Self::new()
            .equal(Field::Tenant)
            .present(Field::Scope)
            .equal_or_unset(Field::Principal);
        if namespace {
            join.equal_or_unset(Field::Namespace)
        } else {
            join
        }
    }

    /// Membership of a principal in a tenant's namespace
    pub fn namespace_membership() -> Self {
        Self::new()
            .equal(Field::Tenant)
            .equal(Field::Namespace)
            .equal_or_unset(Field::Principal)
    }

    /// Membership of a principal in a tenant's scope, optionally narrowed
    /// to a namespace
    pub fn scope_membership(namespace: bool) -> Self {
        let join = Self::new()
            .equal(Field::Tenant)
            .equal(Field::Scope)
            .equal_or_unset(Field::Principal);
        if namespace {
            join.equal_or_unset(Field::Namespace)
        } else {
            join
        }
    }

    /// Roles granted to a principal under a tenant
    ///
    /// When a namespace or scope is requested, rows bound to a different
    /// one are excluded while unbound rows still apply. When it is not
    /// requested the field is unconstrained.
    pub fn roles_for_principal(namespace: bool, scope: bool) -> Self {
        let mut join = Self::new()
            .equal(Field::Tenant)
            .equal(Field::Principal)
            .present(Field::Role);
        if namespace {
            join = join.equal_or_unset(Field::Namespace);
        }
        if scope {
            join = join.equal_or_unset(Field::Scope);
        }
        join
    }

    /// Roles a principal holds on a tenant with the manage-descendants flag
    /// set, which flow down to every descendant tenant
    ///
    /// Namespace and scope are unconstrained: the grant is made in the
    /// ancestor's context, which the descendant does not share.
    pub fn delegated_roles() -> Self {
        Self::new()
            .equal(Field::Tenant)
            .equal(Field::Principal)
            .present(Field::Role)
            .equal(Field::ManageDescendants)
    }
}
