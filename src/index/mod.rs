//! Association index: every (tenant, namespace, scope, principal, role,
//! manage-descendants) association the engine knows about.
//!
//! This module provides:
//! - A prefix tree keyed by the set fields of each record
//! - Declarative joins describing the lookups the resolver needs
//! - Pruned walks that skip subtrees a join can never match

mod join;
mod record;
mod trie;

pub use join::{Join, Rule};
pub use record::{Field, Record};
pub use trie::AssociationIndex;

#[cfg(test)]
mod tests;
