//! Tenant hierarchy and principal grants.
//!
//! This module provides:
//! - Tenant handles for structural links and grants
//! - Descendant edges with cycle rejection and de-duplicated traversal
//! - The `Grant` builder every grant operation reduces to

mod hierarchy;
mod types;

pub use hierarchy::TenantHierarchy;
pub use types::{Grant, Namespace, Principal, Scope, Tenant};

#[cfg(test)]
mod tests;
