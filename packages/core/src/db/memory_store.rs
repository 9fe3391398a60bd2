//! MemoryTreeStore - In-Memory TreeStore
//!
//! Wraps a [`Forest`] behind a tokio `RwLock`. Used by tests and by callers
//! that need a tree without a database file. Leaf records are not stored, so
//! tree rows always carry `leaf: None`.

use crate::db::{StoreError, TreeStore};
use crate::models::{Forest, TreeNode, TreePayload, TreeRow, TreeScope};
use async_trait::async_trait;
use tokio::sync::RwLock;

#[derive(Debug)]
pub struct MemoryTreeStore<P> {
    forest: RwLock<Forest<P>>,
}

impl<P> Default for MemoryTreeStore<P> {
    fn default() -> Self {
        Self {
            forest: RwLock::new(Forest::default()),
        }
    }
}

impl<P: TreePayload> MemoryTreeStore<P> {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl<P: TreePayload> TreeStore<P> for MemoryTreeStore<P> {
    async fn find_by_id(&self, id: i64) -> Result<Option<TreeNode<P>>, StoreError> {
        Ok(self.forest.read().await.get(id).cloned())
    }

    async fn find_roots(&self) -> Result<Vec<TreeNode<P>>, StoreError> {
        Ok(self.forest.read().await.roots().into_iter().cloned().collect())
    }

    async fn find_children(&self, parent_id: i64) -> Result<Vec<TreeNode<P>>, StoreError> {
        Ok(self
            .forest
            .read()
            .await
            .children(parent_id)
            .into_iter()
            .cloned()
            .collect())
    }

    async fn insert_root(&self, name: &str, payload: P) -> Result<TreeNode<P>, StoreError> {
        Ok(self.forest.write().await.create_root(name, payload)?)
    }

    async fn insert_child(
        &self,
        parent_id: i64,
        name: &str,
        payload: P,
    ) -> Result<TreeNode<P>, StoreError> {
        Ok(self
            .forest
            .write()
            .await
            .create_child(parent_id, name, payload)?)
    }

    async fn rename(&self, id: i64, name: &str) -> Result<bool, StoreError> {
        Ok(self.forest.write().await.rename(id, name)?)
    }

    async fn update_payload(&self, id: i64, payload: P) -> Result<bool, StoreError> {
        Ok(self.forest.write().await.update_payload(id, payload))
    }

    async fn delete_subtree(&self, id: i64) -> Result<u64, StoreError> {
        Ok(self.forest.write().await.remove_subtree(id).len() as u64)
    }

    async fn fetch_tree_rows(&self, scope: TreeScope) -> Result<Vec<TreeRow<P>>, StoreError> {
        Ok(self.forest.read().await.flatten(scope))
    }
}
