//! Tree Service - generic hierarchy orchestration
//!
//! `TreeService<P>` sits between the variant services and a [`TreeStore`]. It
//! turns missing ids into `NotFound`, checks rules that need the parent before
//! the store is touched, and assembles tree reads.
//!
//! # Reads
//!
//! Forest and subtree reads fetch flat rows with one recursive query and
//! rebuild the hierarchy with [`assemble`]. Rows whose parent is missing are
//! dropped from the result and logged at `warn` level.

use crate::db::TreeStore;
use crate::models::{
    assemble, validate_name, AssembledNode, Assembly, TreeNode, TreePayload, TreeScope,
    ValidationError,
};
use crate::services::error::ServiceError;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct TreeService<P: TreePayload> {
    store: Arc<dyn TreeStore<P>>,
}

impl<P: TreePayload> Clone for TreeService<P> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<P: TreePayload> TreeService<P> {
    pub fn new(store: Arc<dyn TreeStore<P>>) -> Self {
        Self { store }
    }

    /// Fetch a node, failing with `NotFound` when it does not exist
    pub async fn find(&self, id: i64) -> Result<TreeNode<P>, ServiceError> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found(P::KIND, id))
    }

    pub async fn find_optional(&self, id: i64) -> Result<Option<TreeNode<P>>, ServiceError> {
        Ok(self.store.find_by_id(id).await?)
    }

    pub async fn create_root(&self, name: &str, payload: P) -> Result<TreeNode<P>, ServiceError> {
        let node = self.store.insert_root(name, payload).await?;
        info!(kind = P::KIND, id = node.id, name = %node.name, "Created root");
        Ok(node)
    }

    /// Create a child appended after the parent's existing children.
    ///
    /// Fails with `NotFound` for a missing parent and with
    /// `ChildrenNotPermitted` when the parent's payload forbids children.
    pub async fn create_child(
        &self,
        parent_id: i64,
        name: &str,
        payload: P,
    ) -> Result<TreeNode<P>, ServiceError> {
        let parent = self.find(parent_id).await?;
        if !parent.payload.permits_children() {
            return Err(ValidationError::ChildrenNotPermitted { id: parent_id }.into());
        }

        let node = self
            .store
            .insert_child(parent_id, name, payload)
            .await
            .map_err(|err| match ServiceError::from(err) {
                // parent deleted between the lookup and the insert
                ServiceError::Validation(ValidationError::ParentNotFound(id)) => {
                    ServiceError::not_found(P::KIND, id)
                }
                other => other,
            })?;
        info!(
            kind = P::KIND,
            id = node.id,
            parent_id,
            sort_order = node.sort_order,
            "Created child"
        );
        Ok(node)
    }

    pub async fn rename(&self, id: i64, name: &str) -> Result<(), ServiceError> {
        validate_name(name)?;
        if !self.store.rename(id, name).await? {
            return Err(ServiceError::not_found(P::KIND, id));
        }
        info!(kind = P::KIND, id, name, "Renamed node");
        Ok(())
    }

    pub async fn update_payload(&self, id: i64, payload: P) -> Result<(), ServiceError> {
        if !self.store.update_payload(id, payload).await? {
            return Err(ServiceError::not_found(P::KIND, id));
        }
        debug!(kind = P::KIND, id, "Updated payload");
        Ok(())
    }

    /// Delete a node and its whole subtree, returning the number of nodes removed
    pub async fn delete(&self, id: i64) -> Result<u64, ServiceError> {
        let removed = self.store.delete_subtree(id).await?;
        if removed == 0 {
            return Err(ServiceError::not_found(P::KIND, id));
        }
        info!(kind = P::KIND, id, removed, "Deleted subtree");
        Ok(removed)
    }

    /// Assemble a scope, keeping the diagnostics
    pub async fn assemble(&self, scope: TreeScope) -> Result<Assembly<P>, ServiceError> {
        let rows = self.store.fetch_tree_rows(scope).await?;
        let row_count = rows.len();
        let assembly = assemble(rows, scope);

        if !assembly.is_consistent() {
            warn!(
                kind = P::KIND,
                ?scope,
                dangling = ?assembly.dangling,
                unreachable = assembly.unreachable,
                "Dropped tree records whose parent is missing"
            );
        }
        debug!(kind = P::KIND, ?scope, row_count, roots = assembly.roots.len(), "Assembled tree");
        Ok(assembly)
    }

    /// Every root with its descendants
    pub async fn find_forest(&self) -> Result<Vec<AssembledNode<P>>, ServiceError> {
        Ok(self.assemble(TreeScope::Forest).await?.roots)
    }

    /// One node with its descendants
    pub async fn find_subtree(&self, id: i64) -> Result<AssembledNode<P>, ServiceError> {
        self.assemble(TreeScope::Subtree(id))
            .await?
            .roots
            .into_iter()
            .next()
            .ok_or_else(|| ServiceError::not_found(P::KIND, id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryTreeStore;
    use crate::models::{DevSpecPayload, OrganizationPayload};

    fn org_service() -> TreeService<OrganizationPayload> {
        TreeService::new(Arc::new(MemoryTreeStore::new()))
    }

    #[tokio::test]
    async fn test_create_and_assemble_forest() {
        let service = org_service();
        let r1 = service.create_root("R1", OrganizationPayload).await.unwrap();
        service.create_root("R2", OrganizationPayload).await.unwrap();
        let c1 = service
            .create_child(r1.id, "C1", OrganizationPayload)
            .await
            .unwrap();

        let forest = service.find_forest().await.unwrap();
        assert_eq!(forest.len(), 2);
        assert_eq!(forest[0].node.name, "R1");
        assert_eq!(forest[0].children[0].node.id, c1.id);
        assert_eq!(forest[0].children[0].node.depth, 1);
        assert!(forest[1].children.is_empty());
    }

    #[tokio::test]
    async fn test_missing_parent_is_not_found() {
        let service = org_service();
        let err = service
            .create_child(404, "Ghost", OrganizationPayload)
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_page_under_page_rejected() {
        let service: TreeService<DevSpecPayload> = TreeService::new(Arc::new(MemoryTreeStore::new()));
        let project = service
            .create_root("Shop", DevSpecPayload::project())
            .await
            .unwrap();
        let page = service
            .create_child(project.id, "Cart", DevSpecPayload::page())
            .await
            .unwrap();

        let err = service
            .create_child(page.id, "Nested", DevSpecPayload::page())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Validation(ValidationError::ChildrenNotPermitted { .. })
        ));
    }

    #[tokio::test]
    async fn test_rename_and_delete_missing_are_not_found() {
        let service = org_service();
        assert!(service.rename(1, "Anything").await.unwrap_err().is_not_found());
        assert!(service.delete(1).await.unwrap_err().is_not_found());
        assert!(service.find_subtree(1).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_delete_cascades_and_reports_count() {
        let service = org_service();
        let root = service.create_root("HQ", OrganizationPayload).await.unwrap();
        let a = service.create_child(root.id, "A", OrganizationPayload).await.unwrap();
        service.create_child(root.id, "B", OrganizationPayload).await.unwrap();
        service.create_child(a.id, "A1", OrganizationPayload).await.unwrap();

        assert_eq!(service.delete(root.id).await.unwrap(), 4);
        assert!(service.find_forest().await.unwrap().is_empty());
    }
}
