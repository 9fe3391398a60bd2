//! Recursive Tree Query Assembler
//!
//! The stores return a whole forest (or one subtree) as flat rows, one per
//! `(node, leaf)` pair, produced by a single recursive query. [`assemble`]
//! rebuilds the hierarchy from those rows in memory.
//!
//! Rows may arrive in any order. Records whose parent is not part of the row
//! set cannot be linked; they are left out of the result and reported through
//! [`Assembly::dangling`] and [`Assembly::unreachable`].

use crate::models::tree::{TreeNode, TreePayload};
use std::collections::HashMap;

/// Which part of a hierarchy a tree read covers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeScope {
    /// Every root and all descendants
    Forest,
    /// One node and its descendants
    Subtree(i64),
}

impl TreeScope {
    fn is_scope_root<P>(&self, node: &TreeNode<P>) -> bool {
        match self {
            TreeScope::Forest => node.parent_id.is_none(),
            TreeScope::Subtree(root) => node.id == *root,
        }
    }
}

/// One flat row of a tree read: a node and at most one leaf record
#[derive(Debug, Clone, PartialEq)]
pub struct TreeRow<P: TreePayload> {
    pub node: TreeNode<P>,
    pub leaf: Option<P::Leaf>,
}

/// A node with its children and leaves resolved
#[derive(Debug, Clone, PartialEq)]
pub struct AssembledNode<P: TreePayload> {
    pub node: TreeNode<P>,
    pub children: Vec<AssembledNode<P>>,
    pub leaves: Vec<P::Leaf>,
}

impl<P: TreePayload> AssembledNode<P> {
    /// Number of nodes in this subtree, including itself
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(AssembledNode::count).sum::<usize>()
    }

    /// Depth-first search by id
    pub fn find(&self, id: i64) -> Option<&AssembledNode<P>> {
        if self.node.id == id {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(id))
    }
}

/// Result of assembling flat rows
#[derive(Debug, Clone, PartialEq)]
pub struct Assembly<P: TreePayload> {
    pub roots: Vec<AssembledNode<P>>,
    /// Ids of records whose parent was absent from the rows
    pub dangling: Vec<i64>,
    /// Records left out of `roots`, dangling ones and their descendants included
    pub unreachable: usize,
}

impl<P: TreePayload> Assembly<P> {
    pub fn is_consistent(&self) -> bool {
        self.dangling.is_empty() && self.unreachable == 0
    }
}

struct Record<P: TreePayload> {
    node: TreeNode<P>,
    leaves: Vec<P::Leaf>,
}

/// Rebuild the hierarchy described by `rows`.
pub fn assemble<P, I>(rows: I, scope: TreeScope) -> Assembly<P>
where
    P: TreePayload,
    I: IntoIterator<Item = TreeRow<P>>,
{
    // id -> record, in first-seen order
    let mut index: HashMap<i64, usize> = HashMap::new();
    let mut records: Vec<Option<Record<P>>> = Vec::new();

    for row in rows {
        let slot = *index.entry(row.node.id).or_insert_with(|| {
            records.push(Some(Record {
                node: row.node.clone(),
                leaves: Vec::new(),
            }));
            records.len() - 1
        });
        if let (Some(leaf), Some(record)) = (row.leaf, records[slot].as_mut()) {
            record.leaves.push(leaf);
        }
    }

    let mut order: Vec<usize> = (0..records.len()).collect();
    order.sort_by_key(|slot| {
        records[*slot]
            .as_ref()
            .map(|r| (r.node.depth, r.node.sort_order, r.node.id))
    });

    let mut roots = Vec::new();
    let mut children: HashMap<i64, Vec<usize>> = HashMap::new();
    let mut dangling = Vec::new();

    for slot in order {
        let Some(record) = records[slot].as_ref() else {
            continue;
        };
        let node = &record.node;
        if scope.is_scope_root(node) {
            roots.push(slot);
            continue;
        }
        match node.parent_id {
            Some(parent) if index.contains_key(&parent) => {
                children.entry(parent).or_default().push(slot);
            }
            _ => dangling.push(node.id),
        }
    }

    let roots: Vec<AssembledNode<P>> = roots
        .into_iter()
        .filter_map(|slot| build(slot, &mut records, &children))
        .collect();

    let unreachable = records.iter().filter(|record| record.is_some()).count();

    Assembly {
        roots,
        dangling,
        unreachable,
    }
}

fn build<P: TreePayload>(
    slot: usize,
    records: &mut [Option<Record<P>>],
    children: &HashMap<i64, Vec<usize>>,
) -> Option<AssembledNode<P>> {
    // taking the record guards against parent cycles in corrupt data
    let record = records[slot].take()?;
    let child_nodes = children
        .get(&record.node.id)
        .map(|slots| {
            slots
                .iter()
                .filter_map(|child| build(*child, records, children))
                .collect()
        })
        .unwrap_or_default();

    Some(AssembledNode {
        node: record.node,
        children: child_nodes,
        leaves: record.leaves,
    })
}
