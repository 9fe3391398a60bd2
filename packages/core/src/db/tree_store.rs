//! TreeStore Trait - Tree Repository Abstraction
//!
//! `TreeStore<P>` abstracts persistence of one ordered hierarchy. The services
//! depend on the trait only, so the libsql store and the in-memory arena store
//! are interchangeable.
//!
//! # Contract
//!
//! - Missing ids are `Ok(None)` / `Ok(false)` / `Ok(0)`, never errors.
//! - `insert_root` and `insert_child` validate the name, check sibling
//!   uniqueness, compute `sort_order` and insert as one serialized unit.
//!   Rule violations come back as [`StoreError::Rejected`].
//! - `delete_subtree` removes the node, every descendant and their
//!   dependent rows together.
//! - `fetch_tree_rows` returns flat rows in `(depth, sort_order, id)` order
//!   for [`crate::models::assemble`].

use crate::db::StoreError;
use crate::models::{TreeNode, TreePayload, TreeRow, TreeScope};
use async_trait::async_trait;

/// Abstraction layer for tree persistence operations
///
/// Implementations must be `Send + Sync` so services can share them behind an
/// `Arc` across tasks.
#[async_trait]
pub trait TreeStore<P: TreePayload>: Send + Sync {
    async fn find_by_id(&self, id: i64) -> Result<Option<TreeNode<P>>, StoreError>;

    /// Depth-0 nodes ordered by `(sort_order, id)`
    async fn find_roots(&self) -> Result<Vec<TreeNode<P>>, StoreError>;

    /// Direct children ordered by `(sort_order, id)`
    async fn find_children(&self, parent_id: i64) -> Result<Vec<TreeNode<P>>, StoreError>;

    async fn insert_root(&self, name: &str, payload: P) -> Result<TreeNode<P>, StoreError>;

    async fn insert_child(
        &self,
        parent_id: i64,
        name: &str,
        payload: P,
    ) -> Result<TreeNode<P>, StoreError>;

    /// Returns whether a node was renamed
    async fn rename(&self, id: i64, name: &str) -> Result<bool, StoreError>;

    /// Returns whether a node was updated
    async fn update_payload(&self, id: i64, payload: P) -> Result<bool, StoreError>;

    /// Returns the number of nodes removed (0 when `id` does not exist)
    async fn delete_subtree(&self, id: i64) -> Result<u64, StoreError>;

    async fn fetch_tree_rows(&self, scope: TreeScope) -> Result<Vec<TreeRow<P>>, StoreError>;
}
