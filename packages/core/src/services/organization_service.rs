//! Organization Service
//!
//! Organizations nest without a depth limit. Members are user accounts
//! assigned to at most one organization; they appear as leaves when the tree
//! is read.

use crate::db::{DatabaseService, LibsqlTreeStore, MemberStore};
use crate::models::{
    Member, OrganizationPayload, OrganizationTreeResponse, Role, UserResponse,
};
use crate::services::error::ServiceError;
use crate::services::tree_service::TreeService;
use std::sync::Arc;
use tracing::{info, instrument};

const USER: &str = "user";

#[derive(Clone)]
pub struct OrganizationService {
    tree: TreeService<OrganizationPayload>,
    members: Arc<MemberStore>,
}

impl OrganizationService {
    pub fn new(db: Arc<DatabaseService>) -> Self {
        Self {
            tree: TreeService::new(Arc::new(LibsqlTreeStore::new(Arc::clone(&db)))),
            members: Arc::new(MemberStore::new(db)),
        }
    }

    /// Underlying generic tree service
    pub fn tree(&self) -> &TreeService<OrganizationPayload> {
        &self.tree
    }

    #[instrument(skip(self))]
    pub async fn create_root(&self, name: &str) -> Result<OrganizationTreeResponse, ServiceError> {
        let org = self.tree.create_root(name, OrganizationPayload).await?;
        Ok(org.into())
    }

    #[instrument(skip(self))]
    pub async fn create_child(
        &self,
        parent_id: i64,
        name: &str,
    ) -> Result<OrganizationTreeResponse, ServiceError> {
        let org = self
            .tree
            .create_child(parent_id, name, OrganizationPayload)
            .await?;
        Ok(org.into())
    }

    /// The whole organization forest with members, from one recursive query
    pub async fn find_all(&self) -> Result<Vec<OrganizationTreeResponse>, ServiceError> {
        let forest = self.tree.find_forest().await?;
        Ok(forest.into_iter().map(OrganizationTreeResponse::from).collect())
    }

    pub async fn find_tree(&self, id: i64) -> Result<OrganizationTreeResponse, ServiceError> {
        Ok(self.tree.find_subtree(id).await?.into())
    }

    #[instrument(skip(self))]
    pub async fn update_name(&self, id: i64, name: &str) -> Result<(), ServiceError> {
        self.tree.rename(id, name).await
    }

    /// Delete an organization and its descendants.
    ///
    /// Members of every removed organization are detached, not deleted.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: i64) -> Result<(), ServiceError> {
        self.tree.delete(id).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn create_member(
        &self,
        name: &str,
        email: &str,
        role: Option<Role>,
    ) -> Result<UserResponse, ServiceError> {
        let member = self
            .members
            .create(name, email, role.unwrap_or_default())
            .await?;
        info!(user_id = member.id, role = %member.role, "Created member");
        Ok(member.into())
    }

    async fn find_member(&self, user_id: i64) -> Result<Member, ServiceError> {
        self.members
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| ServiceError::not_found(USER, user_id))
    }

    /// Assign a user to an organization, replacing any previous assignment
    #[instrument(skip(self))]
    pub async fn assign_user(
        &self,
        organization_id: i64,
        user_id: i64,
    ) -> Result<UserResponse, ServiceError> {
        self.tree.find(organization_id).await?;
        let mut member = self.find_member(user_id).await?;

        self.members
            .set_organization(user_id, Some(organization_id))
            .await?;
        info!(user_id, organization_id, previous = ?member.organization_id, "Assigned user");

        member.organization_id = Some(organization_id);
        Ok(member.into())
    }

    #[instrument(skip(self))]
    pub async fn unassign_user(&self, user_id: i64) -> Result<(), ServiceError> {
        if !self.members.set_organization(user_id, None).await? {
            return Err(ServiceError::not_found(USER, user_id));
        }
        info!(user_id, "Unassigned user");
        Ok(())
    }

    pub async fn find_user(&self, user_id: i64) -> Result<UserResponse, ServiceError> {
        Ok(self.find_member(user_id).await?.into())
    }

    #[instrument(skip(self))]
    pub async fn update_user_role(&self, user_id: i64, role: Role) -> Result<UserResponse, ServiceError> {
        if !self.members.update_role(user_id, role).await? {
            return Err(ServiceError::not_found(USER, user_id));
        }
        self.find_user(user_id).await
    }

    pub async fn find_unassigned_users(&self) -> Result<Vec<UserResponse>, ServiceError> {
        let members = self.members.find_unassigned().await?;
        Ok(members.into_iter().map(UserResponse::from).collect())
    }

    /// Members assigned directly to one organization
    pub async fn find_members(&self, organization_id: i64) -> Result<Vec<UserResponse>, ServiceError> {
        self.tree.find(organization_id).await?;
        let members = self.members.find_by_organization(organization_id).await?;
        Ok(members.into_iter().map(UserResponse::from).collect())
    }
}
