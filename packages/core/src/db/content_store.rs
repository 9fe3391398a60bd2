//! ContentStore - typed documents and note sections of dev specs

use crate::db::database::parse_timestamp;
use crate::db::{DatabaseError, DatabaseService, StoreError};
use crate::models::{reorder_by_ids, validate_title, ContentType, DevSpecContent, ValidationError};
use libsql::params::Params;
use libsql::{Connection, Row, TransactionBehavior, Value};
use std::sync::Arc;

const CONTENT_COLUMNS: &str =
    "id, dev_spec_id, content_type, title, content, sort_order, created_at, updated_at";

fn decode_content(row: &Row) -> Result<DevSpecContent, DatabaseError> {
    let content_type: String = row.get(2)?;
    let created_at: String = row.get(6)?;
    let updated_at: String = row.get(7)?;

    Ok(DevSpecContent {
        id: row.get(0)?,
        dev_spec_id: row.get(1)?,
        content_type: content_type
            .parse()
            .map_err(|e: ValidationError| DatabaseError::row_decode(e.to_string()))?,
        title: row.get(3)?,
        content: row.get(4)?,
        sort_order: row.get(5)?,
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
    })
}

fn text(value: &str) -> Value {
    Value::Text(value.to_string())
}

pub struct ContentStore {
    db: Arc<DatabaseService>,
}

impl ContentStore {
    pub fn new(db: Arc<DatabaseService>) -> Self {
        Self { db }
    }

    async fn query_contents(
        conn: &Connection,
        filter: &str,
        params: Params,
    ) -> Result<Vec<DevSpecContent>, DatabaseError> {
        let sql = format!("SELECT {CONTENT_COLUMNS} FROM dev_spec_contents {filter}");
        let mut rows = conn.query(&sql, params).await?;
        let mut contents = Vec::new();
        while let Some(row) = rows.next().await? {
            contents.push(decode_content(&row)?);
        }
        Ok(contents)
    }

    async fn fetch_one(conn: &Connection, id: i64) -> Result<Option<DevSpecContent>, DatabaseError> {
        let contents = Self::query_contents(
            conn,
            "WHERE id = ?1",
            Params::Positional(vec![Value::Integer(id)]),
        )
        .await?;
        Ok(contents.into_iter().next())
    }

    /// Every document of a dev spec: singletons by type, then notes in order
    pub async fn find_all(&self, dev_spec_id: i64) -> Result<Vec<DevSpecContent>, StoreError> {
        let conn = self.db.connect_with_timeout().await?;
        Ok(Self::query_contents(
            &conn,
            "WHERE dev_spec_id = ?1 ORDER BY content_type = 'NOTE', content_type, sort_order, id",
            Params::Positional(vec![Value::Integer(dev_spec_id)]),
        )
        .await?)
    }

    pub async fn find(
        &self,
        dev_spec_id: i64,
        content_type: ContentType,
    ) -> Result<Option<DevSpecContent>, StoreError> {
        let conn = self.db.connect_with_timeout().await?;
        let contents = Self::query_contents(
            &conn,
            "WHERE dev_spec_id = ?1 AND content_type = ?2 ORDER BY sort_order, id LIMIT 1",
            Params::Positional(vec![Value::Integer(dev_spec_id), text(content_type.as_str())]),
        )
        .await?;
        Ok(contents.into_iter().next())
    }

    /// Create or replace the single document of `content_type`.
    pub async fn upsert(
        &self,
        dev_spec_id: i64,
        content_type: ContentType,
        content: &str,
    ) -> Result<DevSpecContent, StoreError> {
        if !content_type.is_singleton() {
            return Err(ValidationError::InvalidOperation(format!(
                "{} documents are managed as note sections",
                content_type
            ))
            .into());
        }

        let conn = self.db.connect_with_timeout().await?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .await?;

        let changed = tx
            .execute(
                "UPDATE dev_spec_contents SET content = ?1, updated_at = CURRENT_TIMESTAMP
                 WHERE dev_spec_id = ?2 AND content_type = ?3",
                Params::Positional(vec![
                    text(content),
                    Value::Integer(dev_spec_id),
                    text(content_type.as_str()),
                ]),
            )
            .await?;
        if changed == 0 {
            tx.execute(
                "INSERT INTO dev_spec_contents (dev_spec_id, content_type, content) VALUES (?1, ?2, ?3)",
                Params::Positional(vec![
                    Value::Integer(dev_spec_id),
                    text(content_type.as_str()),
                    text(content),
                ]),
            )
            .await?;
        }

        let saved = Self::query_contents(
            &tx,
            "WHERE dev_spec_id = ?1 AND content_type = ?2",
            Params::Positional(vec![Value::Integer(dev_spec_id), text(content_type.as_str())]),
        )
        .await?;
        tx.commit().await?;

        saved.into_iter().next().ok_or_else(|| {
            StoreError::Database(DatabaseError::sql_execution(format!(
                "Saved {} content of dev spec {} could not be read back",
                content_type, dev_spec_id
            )))
        })
    }

    /// Note sections of a dev spec in display order
    pub async fn find_notes(&self, dev_spec_id: i64) -> Result<Vec<DevSpecContent>, StoreError> {
        let conn = self.db.connect_with_timeout().await?;
        Ok(Self::notes_of(&conn, dev_spec_id).await?)
    }

    async fn notes_of(conn: &Connection, dev_spec_id: i64) -> Result<Vec<DevSpecContent>, DatabaseError> {
        Self::query_contents(
            conn,
            "WHERE dev_spec_id = ?1 AND content_type = 'NOTE' ORDER BY sort_order, id",
            Params::Positional(vec![Value::Integer(dev_spec_id)]),
        )
        .await
    }

    pub async fn find_note(&self, id: i64) -> Result<Option<DevSpecContent>, StoreError> {
        let conn = self.db.connect_with_timeout().await?;
        let note = Self::fetch_one(&conn, id).await?;
        Ok(note.filter(|note| note.content_type == ContentType::Note))
    }

    /// Append a note section after the existing ones.
    pub async fn create_note(
        &self,
        dev_spec_id: i64,
        title: Option<&str>,
        content: &str,
    ) -> Result<DevSpecContent, StoreError> {
        validate_title(title)?;

        let conn = self.db.connect_with_timeout().await?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .await?;

        tx.execute(
            "INSERT INTO dev_spec_contents (dev_spec_id, content_type, title, content, sort_order)
             SELECT ?1, 'NOTE', ?2, ?3, COALESCE(MAX(sort_order) + 1, 0)
             FROM dev_spec_contents WHERE dev_spec_id = ?1 AND content_type = 'NOTE'",
            Params::Positional(vec![
                Value::Integer(dev_spec_id),
                title.map_or(Value::Null, text),
                text(content),
            ]),
        )
        .await?;
        let id = tx.last_insert_rowid();
        let note = Self::fetch_one(&tx, id).await?;
        tx.commit().await?;

        note.ok_or_else(|| {
            StoreError::Database(DatabaseError::sql_execution(format!(
                "Note section {} could not be read back",
                id
            )))
        })
    }

    /// Update title and/or content; `None` leaves a field unchanged.
    pub async fn update_note(
        &self,
        id: i64,
        title: Option<&str>,
        content: Option<&str>,
    ) -> Result<Option<DevSpecContent>, StoreError> {
        validate_title(title)?;

        let conn = self.db.connect_with_timeout().await?;
        let changed = conn
            .execute(
                "UPDATE dev_spec_contents
                 SET title = COALESCE(?1, title), content = COALESCE(?2, content),
                     updated_at = CURRENT_TIMESTAMP
                 WHERE id = ?3 AND content_type = 'NOTE'",
                Params::Positional(vec![
                    title.map_or(Value::Null, text),
                    content.map_or(Value::Null, text),
                    Value::Integer(id),
                ]),
            )
            .await?;
        if changed == 0 {
            return Ok(None);
        }
        Ok(Self::fetch_one(&conn, id).await?)
    }

    /// Returns whether a note section was deleted.
    pub async fn delete_note(&self, id: i64) -> Result<bool, StoreError> {
        let conn = self.db.connect_with_timeout().await?;
        let changed = conn
            .execute(
                "DELETE FROM dev_spec_contents WHERE id = ?1 AND content_type = 'NOTE'",
                Params::Positional(vec![Value::Integer(id)]),
            )
            .await?;
        Ok(changed > 0)
    }

    /// Renumber note sections: requested ids first, the rest in prior order.
    pub async fn reorder_notes(
        &self,
        dev_spec_id: i64,
        requested: &[i64],
    ) -> Result<Vec<DevSpecContent>, StoreError> {
        let conn = self.db.connect_with_timeout().await?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .await?;

        let current: Vec<i64> = Self::notes_of(&tx, dev_spec_id)
            .await?
            .iter()
            .map(|note| note.id)
            .collect();

        for (position, id) in reorder_by_ids(&current, requested).into_iter().enumerate() {
            tx.execute(
                "UPDATE dev_spec_contents SET sort_order = ?1, updated_at = CURRENT_TIMESTAMP WHERE id = ?2",
                Params::Positional(vec![Value::Integer(position as i64), Value::Integer(id)]),
            )
            .await?;
        }

        let notes = Self::notes_of(&tx, dev_spec_id).await?;
        tx.commit().await?;
        Ok(notes)
    }
}
