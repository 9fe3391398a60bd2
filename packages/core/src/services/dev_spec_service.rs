//! Dev Spec Service
//!
//! Projects (roots) and pages (children of projects), their workflow status,
//! typed content documents and ordered note sections.

use crate::db::{ContentStore, DatabaseService, LibsqlTreeStore};
use crate::models::{
    ContentType, DevSpecContentResponse, DevSpecDetailResponse, DevSpecPayload,
    DevSpecTreeResponse, SpecStatus,
};
use crate::services::error::ServiceError;
use crate::services::tree_service::TreeService;
use std::sync::Arc;
use tracing::{info, instrument};

const NOTE_SECTION: &str = "note section";

#[derive(Clone)]
pub struct DevSpecService {
    tree: TreeService<DevSpecPayload>,
    contents: Arc<ContentStore>,
}

impl DevSpecService {
    pub fn new(db: Arc<DatabaseService>) -> Self {
        Self {
            tree: TreeService::new(Arc::new(LibsqlTreeStore::new(Arc::clone(&db)))),
            contents: Arc::new(ContentStore::new(db)),
        }
    }

    /// Underlying generic tree service
    pub fn tree(&self) -> &TreeService<DevSpecPayload> {
        &self.tree
    }

    #[instrument(skip(self))]
    pub async fn create_project(&self, name: &str) -> Result<DevSpecTreeResponse, ServiceError> {
        let project = self.tree.create_root(name, DevSpecPayload::project()).await?;
        Ok(project.into())
    }

    /// Pages may only be created under projects.
    #[instrument(skip(self))]
    pub async fn create_page(
        &self,
        project_id: i64,
        name: &str,
    ) -> Result<DevSpecTreeResponse, ServiceError> {
        let page = self
            .tree
            .create_child(project_id, name, DevSpecPayload::page())
            .await?;
        Ok(page.into())
    }

    pub async fn find_all_projects(&self) -> Result<Vec<DevSpecTreeResponse>, ServiceError> {
        let forest = self.tree.find_forest().await?;
        Ok(forest.into_iter().map(DevSpecTreeResponse::from).collect())
    }

    pub async fn find_project_tree(&self, id: i64) -> Result<DevSpecTreeResponse, ServiceError> {
        Ok(self.tree.find_subtree(id).await?.into())
    }

    /// Flat view of one node with its parent's name and all its documents
    pub async fn find_detail(&self, id: i64) -> Result<DevSpecDetailResponse, ServiceError> {
        let node = self.tree.find(id).await?;
        let parent = match node.parent_id {
            Some(parent_id) => self.tree.find_optional(parent_id).await?,
            None => None,
        };
        let contents = self.contents.find_all(id).await?;
        Ok(DevSpecDetailResponse::new(node, parent.as_ref(), contents))
    }

    #[instrument(skip(self))]
    pub async fn update_name(&self, id: i64, name: &str) -> Result<(), ServiceError> {
        self.tree.rename(id, name).await
    }

    /// Any status may follow any other; setting the current status again is a no-op.
    #[instrument(skip(self))]
    pub async fn update_status(&self, id: i64, status: SpecStatus) -> Result<(), ServiceError> {
        let node = self.tree.find(id).await?;
        if node.payload.status == status {
            return Ok(());
        }
        self.tree
            .update_payload(id, node.payload.with_status(status))
            .await?;
        info!(id, from = %node.payload.status, to = %status, "Updated dev spec status");
        Ok(())
    }

    /// Delete a node, its pages and all their documents
    #[instrument(skip(self))]
    pub async fn delete(&self, id: i64) -> Result<(), ServiceError> {
        self.tree.delete(id).await?;
        Ok(())
    }

    /// The document of `content_type`, or an empty placeholder when none was saved
    pub async fn find_content(
        &self,
        id: i64,
        content_type: ContentType,
    ) -> Result<DevSpecContentResponse, ServiceError> {
        reject_note(content_type)?;
        self.tree.find(id).await?;
        Ok(self
            .contents
            .find(id, content_type)
            .await?
            .map(DevSpecContentResponse::from)
            .unwrap_or_else(|| DevSpecContentResponse::empty(content_type)))
    }

    #[instrument(skip(self, content))]
    pub async fn save_content(
        &self,
        id: i64,
        content_type: ContentType,
        content: &str,
    ) -> Result<DevSpecContentResponse, ServiceError> {
        reject_note(content_type)?;
        self.tree.find(id).await?;
        let saved = self.contents.upsert(id, content_type, content).await?;
        info!(id, %content_type, content_id = saved.id, "Saved dev spec content");
        Ok(saved.into())
    }

    pub async fn find_note_sections(&self, id: i64) -> Result<Vec<DevSpecContentResponse>, ServiceError> {
        self.tree.find(id).await?;
        let notes = self.contents.find_notes(id).await?;
        Ok(notes.into_iter().map(DevSpecContentResponse::from).collect())
    }

    #[instrument(skip(self, content))]
    pub async fn create_note_section(
        &self,
        id: i64,
        title: Option<&str>,
        content: &str,
    ) -> Result<DevSpecContentResponse, ServiceError> {
        self.tree.find(id).await?;
        let note = self.contents.create_note(id, title, content).await?;
        info!(id, section_id = note.id, sort_order = note.sort_order, "Created note section");
        Ok(note.into())
    }

    #[instrument(skip(self, content))]
    pub async fn update_note_section(
        &self,
        section_id: i64,
        title: Option<&str>,
        content: Option<&str>,
    ) -> Result<DevSpecContentResponse, ServiceError> {
        self.contents
            .update_note(section_id, title, content)
            .await?
            .map(DevSpecContentResponse::from)
            .ok_or_else(|| ServiceError::not_found(NOTE_SECTION, section_id))
    }

    #[instrument(skip(self))]
    pub async fn delete_note_section(&self, section_id: i64) -> Result<(), ServiceError> {
        if !self.contents.delete_note(section_id).await? {
            return Err(ServiceError::not_found(NOTE_SECTION, section_id));
        }
        Ok(())
    }

    /// Named sections take positions `0..n` in request order; the others follow
    /// in their previous order. Unknown and repeated ids are ignored.
    #[instrument(skip(self))]
    pub async fn reorder_note_sections(
        &self,
        id: i64,
        ids: &[i64],
    ) -> Result<Vec<DevSpecContentResponse>, ServiceError> {
        self.tree.find(id).await?;
        let notes = self.contents.reorder_notes(id, ids).await?;
        Ok(notes.into_iter().map(DevSpecContentResponse::from).collect())
    }
}

fn reject_note(content_type: ContentType) -> Result<(), ServiceError> {
    if content_type.is_singleton() {
        return Ok(());
    }
    Err(ServiceError::invalid_operation(
        "NOTE content is managed through note sections",
    ))
}
