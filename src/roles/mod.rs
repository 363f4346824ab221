//! Roles, attribute groups and the role inheritance graph.
//!
//! This module provides:
//! - Roles holding permissions grouped by category
//! - Descendant edges with cycle rejection
//! - Memoized transitive permission and role resolution
//! - Lock/unlock of individual roles

mod graph;
mod role;

pub use graph::{CacheStats, ResolvedPermissions, RoleGraph};
pub use role::{AttributeGroup, Role};
