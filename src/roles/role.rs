//! Roles and attribute groups

use crate::error::{AuthzError, Result};
use crate::pattern::match_resource;
use crate::types::{Attribute, CategoryId, RoleId};
use indexmap::{IndexMap, IndexSet};
use parking_lot::{Mutex, RwLock};
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// State shared by every role of one graph
///
/// The generation counter moves on every role mutation so memoized
/// resolutions can tell they are stale. The link lock serializes edge
/// insertion, which keeps cycle checks and inserts atomic.
#[derive(Debug, Default)]
pub(crate) struct GraphSync {
    generation: AtomicU64,
    link: Mutex<()>,
}

impl GraphSync {
    pub(crate) fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    fn bump(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
    }
}

/// A named category of attributes (e.g. `"backend"`, `"page"`)
///
/// Permissions are granted to roles through a group, and only attributes
/// declared on the group can be granted through it.
pub struct AttributeGroup {
    id: CategoryId,
    attributes: RwLock<IndexMap<String, Attribute>>,
}

impl AttributeGroup {
    pub(crate) fn new(id: CategoryId) -> Self {
        Self {
            id,
            attributes: RwLock::new(IndexMap::new()),
        }
    }

    pub fn id(&self) -> &CategoryId {
        &self.id
    }

    /// Declares attributes on the group. Re-declaring is a no-op.
    pub fn add_attributes(&self, attributes: impl IntoIterator<Item = Attribute>) {
        let mut declared = self.attributes.write();
        for attribute in attributes {
            declared.entry(attribute.key()).or_insert(attribute);
        }
    }

    pub fn contains(&self, attribute: &Attribute) -> bool {
        self.attributes.read().contains_key(&attribute.key())
    }

    pub fn attributes(&self) -> Vec<Attribute> {
        self.attributes.read().values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.attributes.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for AttributeGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttributeGroup")
            .field("id", &self.id)
            .field("attributes", &self.len())
            .finish()
    }
}

#[derive(Default)]
struct RoleState {
    /// category -> canonical attribute key -> attribute
    permissions: IndexMap<CategoryId, IndexMap<String, Attribute>>,
    descendants: IndexMap<RoleId, Arc<Role>>,
}

/// A named bundle of permissions that inherits from its descendant roles
///
/// A role holding a descendant has every permission of that descendant,
/// transitively. Edges that would form a cycle are rejected.
///
/// # Thread Safety
///
/// All methods take `&self`; roles are shared as `Arc<Role>`.
pub struct Role {
    id: RoleId,
    locked: AtomicBool,
    state: RwLock<RoleState>,
    sync: Arc<GraphSync>,
}

impl Role {
    pub(crate) fn new(id: RoleId, sync: Arc<GraphSync>) -> Self {
        Self {
            id,
            locked: AtomicBool::new(false),
            state: RwLock::new(RoleState::default()),
            sync,
        }
    }

    pub fn id(&self) -> &RoleId {
        &self.id
    }

    /// Rejects further permission and descendant changes
    pub fn lock(&self) {
        self.locked.store(true, Ordering::Release);
    }

    pub fn unlock(&self) {
        self.locked.store(false, Ordering::Release);
    }

    pub fn is_locked(&self) -> bool {
        self.locked.load(Ordering::Acquire)
    }

    fn ensure_unlocked(&self) -> Result<()> {
        if self.is_locked() {
            warn!(role = %self.id, "Rejected change to locked role");
            return Err(AuthzError::RoleLocked {
                role: self.id.to_string(),
            });
        }
        Ok(())
    }

    /// Grants attributes under a category
    ///
    /// # Errors
    ///
    /// Returns `AuthzError::RoleLocked` if the role is locked
    pub fn add_permission(
        &self,
        category: impl Into<CategoryId>,
        attributes: impl IntoIterator<Item = Attribute>,
    ) -> Result<()> {
        self.ensure_unlocked()?;

        let category = category.into();
        {
            let mut state = self.state.write();
            let granted = state.permissions.entry(category.clone()).or_default();
            for attribute in attributes {
                granted.entry(attribute.key()).or_insert(attribute);
            }
        }
        self.sync.bump();

        debug!(role = %self.id, category = %category, "Added permissions to role");
        Ok(())
    }

    /// Adds direct descendant roles
    ///
    /// Either every edge is added or none is.
    ///
    /// # Errors
    ///
    /// - `AuthzError::RoleLocked` if the role is locked
    /// - `AuthzError::CircularDependency` if a child is this role or
    ///   already reaches it
    pub fn add_descendant(&self, children: &[Arc<Role>]) -> Result<()> {
        self.ensure_unlocked()?;

        let _link = self.sync.link.lock();
        for child in children {
            if let Some(mut path) = child.path_to(&self.id) {
                path.insert(0, self.id.to_string());
                warn!(parent = %self.id, child = %child.id, "Rejected circular role dependency");
                return Err(AuthzError::CircularDependency { cycle: path });
            }
        }

        {
            let mut state = self.state.write();
            for child in children {
                state
                    .descendants
                    .entry(child.id.clone())
                    .or_insert_with(|| Arc::clone(child));
            }
        }
        self.sync.bump();

        debug!(parent = %self.id, children = children.len(), "Added descendant roles");
        Ok(())
    }

    /// Path of role ids from this role down to `target`, both ends
    /// included, if the target is reachable
    fn path_to(&self, target: &RoleId) -> Option<Vec<String>> {
        if &self.id == target {
            return Some(vec![self.id.to_string()]);
        }

        let mut parents: HashMap<RoleId, RoleId> = HashMap::new();
        let mut queue: VecDeque<(RoleId, Vec<Arc<Role>>)> = VecDeque::new();
        queue.push_back((self.id.clone(), self.descendants()));

        while let Some((from, children)) = queue.pop_front() {
            for child in children {
                if child.id == self.id || parents.contains_key(&child.id) {
                    continue;
                }
                parents.insert(child.id.clone(), from.clone());

                if &child.id == target {
                    let mut path = vec![child.id.to_string()];
                    let mut cursor = &child.id;
                    while let Some(parent) = parents.get(cursor) {
                        path.push(parent.to_string());
                        cursor = parent;
                    }
                    path.reverse();
                    return Some(path);
                }

                let next = child.descendants();
                queue.push_back((child.id.clone(), next));
            }
        }
        None
    }

    /// Direct descendant roles
    pub fn descendants(&self) -> Vec<Arc<Role>> {
        self.state.read().descendants.values().cloned().collect()
    }

    /// Every role reachable through descendant edges, excluding this one
    pub fn transitive_descendants(&self) -> Vec<Arc<Role>> {
        let mut seen: IndexSet<RoleId> = IndexSet::new();
        seen.insert(self.id.clone());

        let mut found = Vec::new();
        let mut queue: VecDeque<Arc<Role>> = self.descendants().into();
        while let Some(role) = queue.pop_front() {
            if !seen.insert(role.id.clone()) {
                continue;
            }
            queue.extend(role.descendants());
            found.push(role);
        }
        found
    }

    /// Own permissions, by category
    pub fn permissions(&self) -> IndexMap<CategoryId, Vec<Attribute>> {
        self.state
            .read()
            .permissions
            .iter()
            .map(|(category, attrs)| (category.clone(), attrs.values().cloned().collect()))
            .collect()
    }

    /// Whether this role's own permissions cover the activity
    ///
    /// Tries the exact `"<resource> <action>"` key first, then every
    /// granted pattern in the category.
    pub fn permits(&self, category: &str, activity: &str) -> bool {
        let state = self.state.read();
        let Some(granted) = state.permissions.get(category) else {
            return false;
        };
        granted.contains_key(activity) || granted.keys().any(|key| match_resource(activity, key))
    }

    /// Whether this role or a transitive descendant permits the activity
    ///
    /// When `allowed` is non-empty, only descendants named in it are
    /// consulted. The role's own permissions always count.
    pub fn has(&self, category: &str, activity: &str, allowed: &IndexSet<RoleId>) -> bool {
        if self.permits(category, activity) {
            return true;
        }
        self.transitive_descendants()
            .iter()
            .filter(|role| allowed.is_empty() || allowed.contains(&role.id))
            .any(|role| role.permits(category, activity))
    }
}

impl fmt::Debug for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.read();
        f.debug_struct("Role")
            .field("id", &self.id)
            .field("locked", &self.is_locked())
            .field("categories", &state.permissions.len())
            .field("descendants", &state.descendants.keys().collect::<Vec<_>>())
            .finish()
    }
}
