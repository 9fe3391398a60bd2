//! In-Memory Forest Arena
//!
//! `Forest<P>` holds every node of one hierarchy in an arena keyed by id, plus a
//! secondary index from parent id (or `None` for the root group) to the ordered
//! list of child ids. It enforces the tree invariants on every mutation and is
//! the backing structure of [`crate::db::MemoryTreeStore`].

use crate::models::assembly::{AssembledNode, TreeRow, TreeScope};
use crate::models::tree::{next_sort_order, validate_name, TreeNode, TreePayload, ValidationError};
use chrono::Utc;
use std::collections::{HashMap, VecDeque};

#[derive(Debug, Clone)]
pub struct Forest<P> {
    nodes: HashMap<i64, TreeNode<P>>,
    /// parent id -> child ids in sort order (`None` = roots)
    children: HashMap<Option<i64>, Vec<i64>>,
    next_id: i64,
}

impl<P> Default for Forest<P> {
    fn default() -> Self {
        Self {
            nodes: HashMap::new(),
            children: HashMap::new(),
            next_id: 1,
        }
    }
}

impl<P: TreePayload> Forest<P> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: i64) -> Option<&TreeNode<P>> {
        self.nodes.get(&id)
    }

    /// Root nodes in sort order
    pub fn roots(&self) -> Vec<&TreeNode<P>> {
        self.members_of(None)
    }

    /// Direct children of `parent_id` in sort order
    pub fn children(&self, parent_id: i64) -> Vec<&TreeNode<P>> {
        self.members_of(Some(parent_id))
    }

    /// Nodes under `parent` ordered by `(sort_order, id)`
    fn members_of(&self, parent: Option<i64>) -> Vec<&TreeNode<P>> {
        let mut members: Vec<&TreeNode<P>> = self
            .children
            .get(&parent)
            .map(|ids| ids.iter().filter_map(|id| self.nodes.get(id)).collect())
            .unwrap_or_default();
        members.sort_by_key(|node| (node.sort_order, node.id));
        members
    }

    fn ensure_unique_name(
        &self,
        parent: Option<i64>,
        name: &str,
        except: Option<i64>,
    ) -> Result<(), ValidationError> {
        let taken = self
            .members_of(parent)
            .into_iter()
            .any(|sibling| sibling.name == name && Some(sibling.id) != except);
        if taken {
            return Err(ValidationError::DuplicateSiblingName {
                name: name.to_string(),
            });
        }
        Ok(())
    }

    /// Create a root: depth 0, sort order 0.
    pub fn create_root(&mut self, name: &str, payload: P) -> Result<TreeNode<P>, ValidationError> {
        validate_name(name)?;
        self.ensure_unique_name(None, name, None)?;
        Ok(self.attach(None, name, payload, 0, 0))
    }

    /// Create a child whose sort order is its parent's current child count.
    pub fn create_child(
        &mut self,
        parent_id: i64,
        name: &str,
        payload: P,
    ) -> Result<TreeNode<P>, ValidationError> {
        validate_name(name)?;
        let parent = self
            .nodes
            .get(&parent_id)
            .ok_or(ValidationError::ParentNotFound(parent_id))?;
        if !parent.payload.permits_children() {
            return Err(ValidationError::ChildrenNotPermitted { id: parent_id });
        }
        let depth = parent.depth + 1;
        self.ensure_unique_name(Some(parent_id), name, None)?;

        let sort_order = next_sort_order(self.members_of(Some(parent_id)).len());
        Ok(self.attach(Some(parent_id), name, payload, sort_order, depth))
    }

    fn attach(
        &mut self,
        parent_id: Option<i64>,
        name: &str,
        payload: P,
        sort_order: i64,
        depth: i64,
    ) -> TreeNode<P> {
        let now = Utc::now();
        let node = TreeNode {
            id: self.next_id,
            name: name.to_string(),
            parent_id,
            sort_order,
            depth,
            payload,
            created_at: now,
            updated_at: now,
        };
        self.next_id += 1;
        self.children.entry(parent_id).or_default().push(node.id);
        self.nodes.insert(node.id, node.clone());
        node
    }

    /// Rename a node. Returns `Ok(false)` when the node does not exist.
    pub fn rename(&mut self, id: i64, name: &str) -> Result<bool, ValidationError> {
        validate_name(name)?;
        let Some(parent) = self.nodes.get(&id).map(|node| node.parent_id) else {
            return Ok(false);
        };
        self.ensure_unique_name(parent, name, Some(id))?;
        if let Some(node) = self.nodes.get_mut(&id) {
            node.name = name.to_string();
            node.updated_at = Utc::now();
        }
        Ok(true)
    }

    pub fn update_payload(&mut self, id: i64, payload: P) -> bool {
        match self.nodes.get_mut(&id) {
            Some(node) => {
                node.payload = payload;
                node.updated_at = Utc::now();
                true
            }
            None => false,
        }
    }

    /// Ids of `id` and all its descendants, breadth-first. Empty if `id` is unknown.
    pub fn subtree_ids(&self, id: i64) -> Vec<i64> {
        if !self.nodes.contains_key(&id) {
            return Vec::new();
        }
        let mut ids = Vec::new();
        let mut queue = VecDeque::from([id]);
        while let Some(current) = queue.pop_front() {
            ids.push(current);
            if let Some(children) = self.children.get(&Some(current)) {
                queue.extend(children.iter().copied());
            }
        }
        ids
    }

    /// Remove a node and its whole subtree, returning the removed ids.
    pub fn remove_subtree(&mut self, id: i64) -> Vec<i64> {
        let ids = self.subtree_ids(id);
        let Some(parent) = self.nodes.get(&id).map(|node| node.parent_id) else {
            return ids;
        };
        if let Some(siblings) = self.children.get_mut(&parent) {
            siblings.retain(|sibling| *sibling != id);
        }
        for removed in &ids {
            self.nodes.remove(removed);
            self.children.remove(&Some(*removed));
        }
        ids
    }

    /// Flat node list in `(depth, sort_order, id)` order, the same order the
    /// recursive tree query returns.
    pub fn flatten(&self, scope: TreeScope) -> Vec<TreeRow<P>> {
        let mut nodes: Vec<&TreeNode<P>> = match scope {
            TreeScope::Forest => self.nodes.values().collect(),
            TreeScope::Subtree(root) => self
                .subtree_ids(root)
                .iter()
                .filter_map(|id| self.nodes.get(id))
                .collect(),
        };
        nodes.sort_by_key(|node| (node.depth, node.sort_order, node.id));
        nodes
            .into_iter()
            .map(|node| TreeRow {
                node: node.clone(),
                leaf: None,
            })
            .collect()
    }

    /// Nested view of the whole forest built directly from the child index
    pub fn to_tree(&self) -> Vec<AssembledNode<P>> {
        self.roots()
            .into_iter()
            .map(|root| self.build_subtree(root))
            .collect()
    }

    fn build_subtree(&self, node: &TreeNode<P>) -> AssembledNode<P> {
        AssembledNode {
            node: node.clone(),
            children: self
                .children(node.id)
                .into_iter()
                .map(|child| self.build_subtree(child))
                .collect(),
            leaves: Vec::new(),
        }
    }
}
