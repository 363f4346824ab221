//! Prefix tree over association records

use super::join::Join;
use super::record::{Record, Segment};
use indexmap::{IndexMap, IndexSet};
use parking_lot::RwLock;
use std::hash::Hash;
use std::ops::ControlFlow;
use std::sync::Arc;

#[derive(Debug, Default)]
struct Node {
    children: IndexMap<Segment, Node>,
    record: Option<Arc<Record>>,
}

#[derive(Debug, Default)]
struct Tree {
    root: Node,
    len: usize,
}

/// Index of every association the engine knows about
///
/// Records are keyed by their set fields in the fixed order
/// tenant, principal, role, namespace, scope, manage-descendants. Children
/// keep insertion order, so walks are deterministic.
///
/// # Thread Safety
///
/// The tree sits behind a single `RwLock`: lookups share the read lock,
/// inserts take the write lock.
///
/// # Examples
///
/// ```
/// use tenant_authz::index::{AssociationIndex, Join, Record};
///
/// let index = AssociationIndex::new();
/// index.insert(Record::new().with_tenant("T").with_principal("p1").with_role("coder"));
/// index.insert(Record::new().with_tenant("T").with_role("qa"));
///
/// let roles = index.select(&Record::new().with_tenant("T"), &Join::roles_by_tenant());
/// assert_eq!(roles.len(), 2);
/// ```
#[derive(Debug, Default)]
pub struct AssociationIndex {
    tree: RwLock<Tree>,
}

impl AssociationIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a record, returning `true` when no identical record existed
    ///
    /// Re-inserting an identical record replaces the stored copy.
    pub fn insert(&self, record: Record) -> bool {
        let path = record.key_path();
        let mut tree = self.tree.write();

        let mut node = &mut tree.root;
        for segment in path {
            node = node.children.entry(segment).or_default();
        }

        let added = node.record.replace(Arc::new(record)).is_none();
        if added {
            tree.len += 1;
        }
        added
    }

    /// Returns every record the predicate accepts for the given filter
    ///
    /// The predicate sees `(filter, row)` for every stored record; nothing
    /// is pruned.
    pub fn search<F>(&self, filter: &Record, predicate: F) -> Vec<Arc<Record>>
    where
        F: Fn(&Record, &Record) -> bool,
    {
        let tree = self.tree.read();
        let mut found = Vec::new();
        let _ = visit::<()>(&tree.root, &mut |row| {
            if predicate(filter, row) {
                found.push(Arc::clone(row));
            }
            ControlFlow::Continue(())
        });
        found
    }

    /// Returns one record the predicate accepts, stopping at the first hit
    pub fn first<F>(&self, filter: &Record, predicate: F) -> Option<Arc<Record>>
    where
        F: Fn(&Record, &Record) -> bool,
    {
        let tree = self.tree.read();
        match visit(&tree.root, &mut |row| {
            if predicate(filter, row) {
                ControlFlow::Break(Arc::clone(row))
            } else {
                ControlFlow::Continue(())
            }
        }) {
            ControlFlow::Break(row) => Some(row),
            ControlFlow::Continue(()) => None,
        }
    }

    /// Returns every record satisfying a join, skipping subtrees the join
    /// rules out
    pub fn select(&self, filter: &Record, join: &Join) -> Vec<Arc<Record>> {
        let tree = self.tree.read();
        let mut found = Vec::new();
        let _ = visit_pruned::<()>(&tree.root, 0, filter, join, &mut |row| {
            found.push(Arc::clone(row));
            ControlFlow::Continue(())
        });
        found
    }

    /// Returns one record satisfying a join
    pub fn select_first(&self, filter: &Record, join: &Join) -> Option<Arc<Record>> {
        let tree = self.tree.read();
        match visit_pruned(&tree.root, 0, filter, join, &mut |row| {
            ControlFlow::Break(Arc::clone(row))
        }) {
            ControlFlow::Break(row) => Some(row),
            ControlFlow::Continue(()) => None,
        }
    }

    /// Distinct values of one field across the records satisfying a join,
    /// in walk order
    pub fn select_distinct<T, F>(&self, filter: &Record, join: &Join, field: F) -> Vec<T>
    where
        T: Clone + Hash + Eq,
        F: Fn(&Record) -> Option<&T>,
    {
        self.select(filter, join)
            .iter()
            .filter_map(|row| field(row).cloned())
            .collect::<IndexSet<T>>()
            .into_iter()
            .collect()
    }

    /// Whether any record satisfies a join
    pub fn contains(&self, filter: &Record, join: &Join) -> bool {
        self.select_first(filter, join).is_some()
    }

    /// Returns all stored records
    pub fn records(&self) -> Vec<Arc<Record>> {
        self.search(&Record::new(), |_, _| true)
    }

    pub fn len(&self) -> usize {
        self.tree.read().len
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn visit<B>(
    node: &Node,
    f: &mut dyn FnMut(&Arc<Record>) -> ControlFlow<B>,
) -> ControlFlow<B> {
    if let Some(record) = &node.record {
        f(record)?;
    }
    for child in node.children.values() {
        visit(child, f)?;
    }
    ControlFlow::Continue(())
}

/// Walks only the branches a join can match. `next_rank` is the first key
/// position not yet consumed by the path to `node`.
fn visit_pruned<B>(
    node: &Node,
    next_rank: usize,
    filter: &Record,
    join: &Join,
    f: &mut dyn FnMut(&Arc<Record>) -> ControlFlow<B>,
) -> ControlFlow<B> {
    if let Some(record) = &node.record {
        if join.matches(filter, record) {
            f(record)?;
        }
    }
    for (segment, child) in &node.children {
        let rank = segment.field().rank();
        if !join.admits_skip(next_rank, rank) || !join.admits(filter, segment) {
            continue;
        }
        visit_pruned(child, rank + 1, filter, join, f)?;
    }
    ControlFlow::Continue(())
}
