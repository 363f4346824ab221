//! Error types for the authorization engine
//!
//! Only setup operations fail. Authorization decisions never return an
//! error: every failure mode of a decision collapses to a denial.

use thiserror::Error;

/// Result type alias for authorization setup operations
pub type Result<T> = std::result::Result<T, AuthzError>;

/// Errors raised while building the tenant, role and association model
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthzError {
    /// Role not registered with the engine
    #[error("Role '{role}' not found")]
    RoleNotFound { role: String },

    /// Attribute group (resource category) not registered with the engine
    #[error("Attribute group '{group}' not found")]
    AttributeGroupNotFound { group: String },

    /// Attribute was never declared on the group it is granted through
    #[error("Attribute '{attribute}' not associated to the group '{group}'")]
    AttributeNotInGroup { attribute: String, group: String },

    /// Adding a child role would close a cycle in the role graph
    #[error("Circular role dependency detected: {}", cycle.join(" -> "))]
    CircularDependency { cycle: Vec<String> },

    /// Adding a descendant tenant would close a cycle in the tenant hierarchy
    #[error("Circular tenant hierarchy detected: {}", cycle.join(" -> "))]
    CircularTenantHierarchy { cycle: Vec<String> },

    /// Role is locked against changes
    #[error("Role '{role}' is locked: changes not allowed")]
    RoleLocked { role: String },

    /// Principal not registered with the engine
    #[error("Principal '{principal}' not found")]
    PrincipalNotFound { principal: String },

    /// Namespace not registered with the engine
    #[error("Namespace '{namespace}' not found")]
    NamespaceNotFound { namespace: String },

    /// Scope not registered with the engine
    #[error("Scope '{scope}' not found")]
    ScopeNotFound { scope: String },

    /// Tenant not registered with the engine
    #[error("Tenant '{tenant}' not found")]
    TenantNotFound { tenant: String },
}
