//! Role registry with memoized transitive resolution
//!
//! Resolution walks descendant edges breadth-first with a visited set, so
//! diamonds are counted once and a malformed graph still terminates.
//! Results are memoized per role and stamped with the graph generation; any
//! role mutation moves the generation and makes every memo stale.

use super::role::{GraphSync, Role};
use crate::error::{AuthzError, Result};
use crate::types::{Attribute, CategoryId, RoleId};
use dashmap::DashMap;
use indexmap::{IndexMap, IndexSet};
use parking_lot::RwLock;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, trace};

/// Cache statistics for monitoring performance
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    pub size: usize,
    pub hit_count: u64,
    pub miss_count: u64,
    pub hit_rate: f64,
}

/// Union of the permissions of a role and all of its descendants
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedPermissions {
    categories: IndexMap<CategoryId, IndexMap<String, Attribute>>,
}

impl ResolvedPermissions {
    fn merge(&mut self, role: &Role) {
        for (category, attributes) in role.permissions() {
            let merged = self.categories.entry(category).or_default();
            for attribute in attributes {
                merged.entry(attribute.key()).or_insert(attribute);
            }
        }
    }

    /// Whether any resolved permission in the category covers the activity
    pub fn matches(&self, category: &str, activity: &str) -> bool {
        self.categories.get(category).is_some_and(|granted| {
            granted.contains_key(activity)
                || granted
                    .keys()
                    .any(|key| crate::pattern::match_resource(activity, key))
        })
    }

    pub fn contains(&self, category: &str, attribute: &Attribute) -> bool {
        self.categories
            .get(category)
            .is_some_and(|granted| granted.contains_key(&attribute.key()))
    }

    /// Resolved attributes in one category
    pub fn category(&self, category: &str) -> Vec<&Attribute> {
        self.categories
            .get(category)
            .map(|granted| granted.values().collect())
            .unwrap_or_default()
    }

    pub fn categories(&self) -> impl Iterator<Item = &CategoryId> {
        self.categories.keys()
    }

    /// Total number of distinct (category, attribute) pairs
    pub fn len(&self) -> usize {
        self.categories.values().map(IndexMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug)]
struct Memo<T> {
    generation: u64,
    value: Arc<T>,
}

type MemoTable<T> = RwLock<HashMap<RoleId, Memo<T>>>;

/// Registry of roles and their inheritance edges
///
/// # Thread Safety
///
/// Roles live in a `DashMap`; memo tables are read-locked on lookup and
/// write-locked only to store a freshly computed result.
///
/// # Examples
///
/// ```rust
/// use tenant_authz::roles::RoleGraph;
/// use tenant_authz::Attribute;
///
/// let graph = RoleGraph::new(true);
/// let admin = graph.add_role("admin");
/// let coder = graph.add_role("coder");
/// coder.add_permission("backend", [Attribute::new("/coding/:wid/open", "GET")]).unwrap();
///
/// graph.add_child_role("admin", &["coder"]).unwrap();
///
/// let resolved = graph.resolve_permissions("admin");
/// assert!(resolved.matches("backend", "/coding/7/open GET"));
/// assert!(admin.descendants().iter().any(|r| r.id().as_str() == "coder"));
/// ```
#[derive(Debug)]
pub struct RoleGraph {
    roles: DashMap<RoleId, Arc<Role>>,
    sync: Arc<GraphSync>,
    memoize: bool,
    permission_memo: MemoTable<ResolvedPermissions>,
    role_memo: MemoTable<IndexSet<RoleId>>,
    hit_count: AtomicU64,
    miss_count: AtomicU64,
}

impl RoleGraph {
    /// Creates an empty graph
    ///
    /// # Arguments
    ///
    /// * `memoize` - Whether to memoize transitive resolutions
    pub fn new(memoize: bool) -> Self {
        Self {
            roles: DashMap::new(),
            sync: Arc::new(GraphSync::default()),
            memoize,
            permission_memo: RwLock::new(HashMap::new()),
            role_memo: RwLock::new(HashMap::new()),
            hit_count: AtomicU64::new(0),
            miss_count: AtomicU64::new(0),
        }
    }

    /// Registers a role, returning the existing one if the id is taken
    pub fn add_role(&self, id: impl Into<RoleId>) -> Arc<Role> {
        let id = id.into();
        let entry = self
            .roles
            .entry(id.clone())
            .or_insert_with(|| Arc::new(Role::new(id, Arc::clone(&self.sync))));
        Arc::clone(entry.value())
    }

    pub fn get(&self, id: &str) -> Option<Arc<Role>> {
        self.roles.get(id).map(|entry| Arc::clone(entry.value()))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.roles.contains_key(id)
    }

    pub fn ids(&self) -> Vec<RoleId> {
        self.roles.iter().map(|entry| entry.key().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.roles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }

    /// Makes `children` descendants of `parent`
    ///
    /// # Errors
    ///
    /// - `AuthzError::RoleNotFound` if any role is not registered
    /// - `AuthzError::CircularDependency` if an edge would close a cycle;
    ///   no edge is added in that case
    pub fn add_child_role(&self, parent: &str, children: &[&str]) -> Result<()> {
        let parent_role = self.get(parent).ok_or_else(|| AuthzError::RoleNotFound {
            role: parent.to_string(),
        })?;

        let child_roles = children
            .iter()
            .map(|child| {
                self.get(child).ok_or_else(|| AuthzError::RoleNotFound {
                    role: child.to_string(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        parent_role.add_descendant(&child_roles)
    }

    /// Permissions of a role and all its descendants
    ///
    /// An unknown role resolves to an empty set.
    pub fn resolve_permissions(&self, role: &str) -> Arc<ResolvedPermissions> {
        if let Some(hit) = self.lookup(&self.permission_memo, role) {
            return hit;
        }

        let generation = self.sync.generation();
        let mut resolved = ResolvedPermissions::default();
        for member in self.walk(role) {
            resolved.merge(&member);
        }
        let resolved = Arc::new(resolved);

        self.store(&self.permission_memo, role, generation, &resolved);
        resolved
    }

    /// Ids of a role and every transitive descendant
    ///
    /// An unknown role resolves to an empty set.
    pub fn resolve_roles(&self, role: &str) -> Arc<IndexSet<RoleId>> {
        if let Some(hit) = self.lookup(&self.role_memo, role) {
            return hit;
        }

        let generation = self.sync.generation();
        let resolved: Arc<IndexSet<RoleId>> = Arc::new(
            self.walk(role)
                .into_iter()
                .map(|member| member.id().clone())
                .collect(),
        );

        self.store(&self.role_memo, role, generation, &resolved);
        resolved
    }

    /// Whether a role permits an activity
    ///
    /// The role's own permissions always count. Inherited permissions count
    /// only for descendants in `allowed`, unless `allowed` is empty.
    pub fn has(
        &self,
        role: &str,
        category: &str,
        activity: &str,
        allowed: &IndexSet<RoleId>,
    ) -> bool {
        let Some(root) = self.get(role) else {
            return false;
        };
        if root.permits(category, activity) {
            return true;
        }
        if allowed.is_empty() {
            return self.resolve_permissions(role).matches(category, activity);
        }

        self.resolve_roles(role)
            .iter()
            .filter(|id| id.as_str() != role && allowed.contains(*id))
            .filter_map(|id| self.get(id.as_str()))
            .any(|member| member.permits(category, activity))
    }

    /// Drops every memoized resolution
    pub fn clear_cache(&self) {
        self.permission_memo.write().clear();
        self.role_memo.write().clear();
    }

    pub fn cache_stats(&self) -> CacheStats {
        let hit_count = self.hit_count.load(Ordering::Relaxed);
        let miss_count = self.miss_count.load(Ordering::Relaxed);
        let total = hit_count + miss_count;

        CacheStats {
            size: self.permission_memo.read().len() + self.role_memo.read().len(),
            hit_count,
            miss_count,
            hit_rate: if total > 0 {
                hit_count as f64 / total as f64
            } else {
                0.0
            },
        }
    }

    /// Breadth-first walk from a role over descendant edges, root first
    fn walk(&self, role: &str) -> Vec<Arc<Role>> {
        let Some(root) = self.get(role) else {
            return Vec::new();
        };

        let mut seen: IndexSet<RoleId> = IndexSet::new();
        let mut order = Vec::new();
        let mut queue = VecDeque::from([root]);
        while let Some(member) = queue.pop_front() {
            if !seen.insert(member.id().clone()) {
                continue;
            }
            queue.extend(member.descendants());
            order.push(member);
        }

        trace!(role, members = order.len(), "Walked role graph");
        order
    }

    fn lookup<T>(&self, table: &MemoTable<T>, role: &str) -> Option<Arc<T>> {
        if !self.memoize {
            return None;
        }

        let current = self.sync.generation();
        let hit = table
            .read()
            .get(role)
            .filter(|memo| memo.generation == current)
            .map(|memo| Arc::clone(&memo.value));

        match hit {
            Some(_) => self.hit_count.fetch_add(1, Ordering::Relaxed),
            None => self.miss_count.fetch_add(1, Ordering::Relaxed),
        };
        hit
    }

    fn store<T>(&self, table: &MemoTable<T>, role: &str, generation: u64, value: &Arc<T>) {
        if !self.memoize {
            return;
        }
        debug!(role, generation, "Memoized role resolution");
        table.write().insert(
            RoleId::new(role),
            Memo {
                generation,
                value: Arc::clone(value),
            },
        );
    }
}

impl Default for RoleGraph {
    fn default() -> Self {
        Self::new(true)
    }
}
