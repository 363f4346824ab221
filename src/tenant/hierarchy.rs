//! Tenant descendant edges

use crate::error::{AuthzError, Result};
use crate::types::TenantId;
use indexmap::IndexSet;
use parking_lot::RwLock;
use std::collections::{HashMap, VecDeque};
use tracing::{debug, warn};

/// Descendant edges between tenants
///
/// A tenant may be the descendant of several ancestors, so the edges form a
/// DAG rather than a tree. Edges that would close a cycle are rejected, and
/// traversal keeps a visited set regardless.
#[derive(Debug, Default)]
pub struct TenantHierarchy {
    edges: RwLock<HashMap<TenantId, IndexSet<TenantId>>>,
}

impl TenantHierarchy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds direct descendants to a tenant
    ///
    /// Either every edge is added or none is.
    ///
    /// # Errors
    ///
    /// Returns `AuthzError::CircularTenantHierarchy` if a descendant is the
    /// tenant itself or already has it as a descendant
    pub fn add_descendants(&self, ancestor: &TenantId, descendants: &[TenantId]) -> Result<()> {
        let mut edges = self.edges.write();

        for descendant in descendants {
            if let Some(mut path) = path_between(&edges, descendant, ancestor) {
                path.insert(0, ancestor.to_string());
                warn!(ancestor = %ancestor, descendant = %descendant, "Rejected circular tenant hierarchy");
                return Err(AuthzError::CircularTenantHierarchy { cycle: path });
            }
        }

        let direct = edges.entry(ancestor.clone()).or_default();
        direct.extend(descendants.iter().cloned());

        debug!(ancestor = %ancestor, descendants = descendants.len(), "Added descendant tenants");
        Ok(())
    }

    /// Direct descendants of a tenant
    pub fn direct_descendants(&self, tenant: &str) -> Vec<TenantId> {
        self.edges
            .read()
            .get(tenant)
            .map(|direct| direct.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Every tenant reachable through descendant edges, breadth-first and
    /// de-duplicated, excluding the tenant itself
    pub fn descendants(&self, tenant: &str) -> IndexSet<TenantId> {
        let edges = self.edges.read();
        let mut found: IndexSet<TenantId> = IndexSet::new();
        let mut queue: VecDeque<&TenantId> = VecDeque::new();

        if let Some(direct) = edges.get(tenant) {
            queue.extend(direct.iter());
        }
        while let Some(next) = queue.pop_front() {
            if next.as_str() == tenant || !found.insert(next.clone()) {
                continue;
            }
            if let Some(direct) = edges.get(next) {
                queue.extend(direct.iter());
            }
        }
        found
    }

    /// Whether `tenant` is a transitive descendant of `ancestor`
    pub fn is_descendant(&self, ancestor: &str, tenant: &str) -> bool {
        self.descendants(ancestor).contains(tenant)
    }
}

/// Path of tenant ids from `from` down to `to`, both ends included
fn path_between(
    edges: &HashMap<TenantId, IndexSet<TenantId>>,
    from: &TenantId,
    to: &TenantId,
) -> Option<Vec<String>> {
    if from == to {
        return Some(vec![from.to_string()]);
    }

    let mut parents: HashMap<&TenantId, &TenantId> = HashMap::new();
    let mut queue: VecDeque<&TenantId> = VecDeque::from([from]);
    while let Some(current) = queue.pop_front() {
        let Some(direct) = edges.get(current) else {
            continue;
        };
        for next in direct {
            if next == from || parents.contains_key(next) {
                continue;
            }
            parents.insert(next, current);
            if next == to {
                let mut path = vec![next.to_string()];
                let mut cursor = next;
                while let Some(parent) = parents.get(cursor) {
                    path.push(parent.to_string());
                    cursor = *parent;
                }
                path.reverse();
                return Some(path);
            }
            queue.push_back(next);
        }
    }
    None
}
