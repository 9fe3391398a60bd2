//! MemberStore - user accounts attached to organizations
//!
//! Members are the leaf records of the organization tree. A member belongs to
//! at most one organization; deleting an organization detaches its members
//! (see the `users` dependent of the organization payload).

use crate::db::libsql_store::{decode_member, MEMBER_COLUMNS};
use crate::db::{DatabaseError, DatabaseService, StoreError};
use crate::models::{normalize_email, validate_member_name, Member, Role, ValidationError};
use libsql::params::Params;
use libsql::{Connection, TransactionBehavior, Value};
use std::sync::Arc;

pub struct MemberStore {
    db: Arc<DatabaseService>,
}

impl MemberStore {
    pub fn new(db: Arc<DatabaseService>) -> Self {
        Self { db }
    }

    async fn query_members(
        conn: &Connection,
        sql: &str,
        params: Params,
    ) -> Result<Vec<Member>, DatabaseError> {
        let mut rows = conn.query(sql, params).await?;
        let mut members = Vec::new();
        while let Some(row) = rows.next().await? {
            if let Some(member) = decode_member(&row, 0)? {
                members.push(member);
            }
        }
        Ok(members)
    }

    fn select(filter: &str) -> String {
        format!("SELECT {} FROM users {}", MEMBER_COLUMNS.join(", "), filter)
    }

    /// Register a member; the email is normalized and must be unused.
    pub async fn create(&self, name: &str, email: &str, role: Role) -> Result<Member, StoreError> {
        validate_member_name(name)?;
        let email = normalize_email(email)?;

        let conn = self.db.connect_with_timeout().await?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .await?;

        let mut existing = tx
            .query(
                "SELECT 1 FROM users WHERE email = ?1 LIMIT 1",
                Params::Positional(vec![Value::Text(email.clone())]),
            )
            .await?;
        let taken = existing.next().await?.is_some();
        drop(existing);
        if taken {
            tx.rollback().await?;
            return Err(ValidationError::DuplicateEmail(email).into());
        }

        tx.execute(
            "INSERT INTO users (name, email, role) VALUES (?1, ?2, ?3)",
            Params::Positional(vec![
                Value::Text(name.to_string()),
                Value::Text(email.clone()),
                Value::Text(role.as_str().to_string()),
            ]),
        )
        .await?;
        let id = tx.last_insert_rowid();
        tx.commit().await?;

        Ok(Member {
            id,
            name: name.to_string(),
            email,
            role,
            organization_id: None,
        })
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<Member>, StoreError> {
        let conn = self.db.connect_with_timeout().await?;
        let members = Self::query_members(
            &conn,
            &Self::select("WHERE id = ?1"),
            Params::Positional(vec![Value::Integer(id)]),
        )
        .await?;
        Ok(members.into_iter().next())
    }

    /// Members assigned directly to `organization_id`, ordered by name
    pub async fn find_by_organization(&self, organization_id: i64) -> Result<Vec<Member>, StoreError> {
        let conn = self.db.connect_with_timeout().await?;
        Ok(Self::query_members(
            &conn,
            &Self::select("WHERE organization_id = ?1 ORDER BY name, id"),
            Params::Positional(vec![Value::Integer(organization_id)]),
        )
        .await?)
    }

    pub async fn find_unassigned(&self) -> Result<Vec<Member>, StoreError> {
        let conn = self.db.connect_with_timeout().await?;
        Ok(Self::query_members(
            &conn,
            &Self::select("WHERE organization_id IS NULL ORDER BY name, id"),
            Params::None,
        )
        .await?)
    }

    /// Set (or clear) a member's organization. Returns whether the member exists.
    pub async fn set_organization(
        &self,
        id: i64,
        organization_id: Option<i64>,
    ) -> Result<bool, StoreError> {
        let conn = self.db.connect_with_timeout().await?;
        let changed = conn
            .execute(
                "UPDATE users SET organization_id = ?1, updated_at = CURRENT_TIMESTAMP WHERE id = ?2",
                Params::Positional(vec![
                    organization_id.map_or(Value::Null, Value::Integer),
                    Value::Integer(id),
                ]),
            )
            .await?;
        Ok(changed > 0)
    }

    /// Returns whether the member exists.
    pub async fn update_role(&self, id: i64, role: Role) -> Result<bool, StoreError> {
        let conn = self.db.connect_with_timeout().await?;
        let changed = conn
            .execute(
                "UPDATE users SET role = ?1, updated_at = CURRENT_TIMESTAMP WHERE id = ?2",
                Params::Positional(vec![
                    Value::Text(role.as_str().to_string()),
                    Value::Integer(id),
                ]),
            )
            .await?;
        Ok(changed > 0)
    }
}
