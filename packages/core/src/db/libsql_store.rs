//! LibsqlTreeStore - SQL Implementation of TreeStore
//!
//! One generic store serves every hierarchy. What differs per hierarchy (table
//! name, payload columns, the optional leaf join and the rows depending on a
//! node) is described by the [`SqlPayload`] trait.
//!
//! Every write runs inside a `BEGIN IMMEDIATE` transaction, so the sibling
//! check, the sort-order computation and the insert cannot interleave with
//! another writer. Tree reads use one recursive CTE.

use crate::db::database::parse_timestamp;
use crate::db::{DatabaseError, DatabaseService, StoreError, TreeStore};
use crate::models::{
    next_sort_order, validate_name, DevSpecPayload, Member, OrganizationPayload, Role,
    SpecStatus, SpecType, TreeNode, TreePayload, TreeRow, TreeScope, ValidationError,
};
use async_trait::async_trait;
use libsql::params::Params;
use libsql::{Connection, Row, Transaction, TransactionBehavior, Value};
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::debug;

/// Columns shared by every tree table, in decode order
const NODE_COLUMNS: &[&str] = &[
    "id",
    "name",
    "parent_id",
    "sort_order",
    "depth",
    "created_at",
    "updated_at",
];

/// Leaf table left-joined onto tree rows (many leaves to one node)
#[derive(Debug, Clone, Copy)]
pub struct LeafJoin {
    pub table: &'static str,
    pub foreign_key: &'static str,
    pub columns: &'static [&'static str],
    /// Leaf ordering within one node
    pub order_by: &'static str,
}

/// Rows in other tables that reference a tree node
#[derive(Debug, Clone, Copy)]
pub enum Dependent {
    /// Clear the reference, keeping the row
    Detach {
        table: &'static str,
        column: &'static str,
    },
    /// Delete the referencing row
    Delete {
        table: &'static str,
        column: &'static str,
    },
}

/// Mapping between a payload type and its table
pub trait SqlPayload: TreePayload {
    const TABLE: &'static str;

    /// Payload columns, stored after the shared tree columns
    const COLUMNS: &'static [&'static str];

    const LEAF: Option<LeafJoin> = None;

    /// Handled before the nodes themselves are deleted
    const DEPENDENTS: &'static [Dependent] = &[];

    /// Values for [`SqlPayload::COLUMNS`], in order
    fn values(&self) -> Vec<Value>;

    fn decode(row: &Row, offset: i32) -> Result<Self, DatabaseError>;

    /// Decode the joined leaf; `None` when the join matched nothing
    fn decode_leaf(_row: &Row, _offset: i32) -> Result<Option<Self::Leaf>, DatabaseError> {
        Ok(None)
    }
}

fn column_list<P: SqlPayload>(alias: Option<&str>) -> String {
    NODE_COLUMNS
        .iter()
        .chain(P::COLUMNS)
        .map(|column| match alias {
            Some(alias) => format!("{alias}.{column}"),
            None => column.to_string(),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn subtree_cte<P: SqlPayload>() -> String {
    format!(
        "WITH RECURSIVE subtree(id) AS (
            SELECT id FROM {table} WHERE id = ?1
            UNION
            SELECT c.id FROM {table} c JOIN subtree s ON c.parent_id = s.id
        )",
        table = P::TABLE
    )
}

fn decode_node<P: SqlPayload>(row: &Row) -> Result<TreeNode<P>, DatabaseError> {
    let created_at: String = row.get(5)?;
    let updated_at: String = row.get(6)?;

    Ok(TreeNode {
        id: row.get(0)?,
        name: row.get(1)?,
        parent_id: row.get(2)?,
        sort_order: row.get(3)?,
        depth: row.get(4)?,
        payload: P::decode(row, NODE_COLUMNS.len() as i32)?,
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
    })
}

/// Roll back and report a rule violation
async fn reject<T>(tx: Transaction, err: ValidationError) -> Result<T, StoreError> {
    tx.rollback().await?;
    Err(StoreError::Rejected(err))
}

/// TreeStore over a libsql database
pub struct LibsqlTreeStore<P> {
    db: Arc<DatabaseService>,
    _payload: PhantomData<fn() -> P>,
}

impl<P: SqlPayload> LibsqlTreeStore<P> {
    pub fn new(db: Arc<DatabaseService>) -> Self {
        Self {
            db,
            _payload: PhantomData,
        }
    }

    async fn query_nodes(
        &self,
        conn: &Connection,
        sql: &str,
        params: Params,
    ) -> Result<Vec<TreeNode<P>>, DatabaseError> {
        let mut rows = conn.query(sql, params).await?;
        let mut nodes = Vec::new();
        while let Some(row) = rows.next().await? {
            nodes.push(decode_node(&row)?);
        }
        Ok(nodes)
    }

    async fn fetch_node(&self, conn: &Connection, id: i64) -> Result<Option<TreeNode<P>>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM {} WHERE id = ?1",
            column_list::<P>(None),
            P::TABLE
        );
        let nodes = self
            .query_nodes(conn, &sql, Params::Positional(vec![Value::Integer(id)]))
            .await?;
        Ok(nodes.into_iter().next())
    }

    async fn sibling_name_taken(
        &self,
        conn: &Connection,
        parent_id: Option<i64>,
        name: &str,
        except: Option<i64>,
    ) -> Result<bool, DatabaseError> {
        let sql = format!(
            "SELECT 1 FROM {} WHERE parent_id IS ?1 AND name = ?2 AND id IS NOT ?3 LIMIT 1",
            P::TABLE
        );
        let mut rows = conn
            .query(
                &sql,
                Params::Positional(vec![
                    parent_id.map_or(Value::Null, Value::Integer),
                    Value::Text(name.to_string()),
                    except.map_or(Value::Null, Value::Integer),
                ]),
            )
            .await?;
        Ok(rows.next().await?.is_some())
    }

    async fn insert(
        &self,
        parent_id: Option<i64>,
        name: &str,
        payload: P,
    ) -> Result<TreeNode<P>, StoreError> {
        validate_name(name)?;

        let conn = self.db.connect_with_timeout().await?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .await?;

        let (depth, sort_order) = match parent_id {
            None => (0, 0),
            Some(pid) => {
                let Some(parent) = self.fetch_node(&tx, pid).await? else {
                    return reject(tx, ValidationError::ParentNotFound(pid)).await;
                };
                if !parent.payload.permits_children() {
                    return reject(tx, ValidationError::ChildrenNotPermitted { id: pid }).await;
                }
                let sql = format!("SELECT COUNT(*) FROM {} WHERE parent_id = ?1", P::TABLE);
                let mut rows = tx.query(&sql, Params::Positional(vec![Value::Integer(pid)])).await?;
                let siblings: i64 = match rows.next().await? {
                    Some(row) => row.get(0)?,
                    None => 0,
                };
                (parent.depth + 1, next_sort_order(siblings as usize))
            }
        };

        if self.sibling_name_taken(&tx, parent_id, name, None).await? {
            return reject(
                tx,
                ValidationError::DuplicateSiblingName {
                    name: name.to_string(),
                },
            )
            .await;
        }

        let mut columns: Vec<&str> = vec!["name", "parent_id", "sort_order", "depth"];
        columns.extend(P::COLUMNS);
        let placeholders = (1..=columns.len())
            .map(|i| format!("?{i}"))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            P::TABLE,
            columns.join(", "),
            placeholders
        );

        let mut values = vec![
            Value::Text(name.to_string()),
            parent_id.map_or(Value::Null, Value::Integer),
            Value::Integer(sort_order),
            Value::Integer(depth),
        ];
        values.extend(payload.values());
        tx.execute(&sql, Params::Positional(values)).await?;

        let id = tx.last_insert_rowid();
        let node = self.fetch_node(&tx, id).await?;
        tx.commit().await?;

        debug!(table = P::TABLE, id, ?parent_id, sort_order, depth, "Inserted tree node");
        node.ok_or_else(|| {
            StoreError::Database(DatabaseError::sql_execution(format!(
                "Inserted {} {} could not be read back",
                P::KIND,
                id
            )))
        })
    }

    async fn subtree_ids(&self, conn: &Connection, id: i64) -> Result<Vec<i64>, DatabaseError> {
        let sql = format!("{} SELECT id FROM subtree", subtree_cte::<P>());
        let mut rows = conn.query(&sql, Params::Positional(vec![Value::Integer(id)])).await?;
        let mut ids = Vec::new();
        while let Some(row) = rows.next().await? {
            ids.push(row.get::<i64>(0)?);
        }
        Ok(ids)
    }
}

#[async_trait]
impl<P: SqlPayload> TreeStore<P> for LibsqlTreeStore<P> {
    async fn find_by_id(&self, id: i64) -> Result<Option<TreeNode<P>>, StoreError> {
        let conn = self.db.connect_with_timeout().await?;
        Ok(self.fetch_node(&conn, id).await?)
    }

    async fn find_roots(&self) -> Result<Vec<TreeNode<P>>, StoreError> {
        let conn = self.db.connect_with_timeout().await?;
        let sql = format!(
            "SELECT {} FROM {} WHERE parent_id IS NULL ORDER BY sort_order, id",
            column_list::<P>(None),
            P::TABLE
        );
        Ok(self.query_nodes(&conn, &sql, Params::None).await?)
    }

    async fn find_children(&self, parent_id: i64) -> Result<Vec<TreeNode<P>>, StoreError> {
        let conn = self.db.connect_with_timeout().await?;
        let sql = format!(
            "SELECT {} FROM {} WHERE parent_id = ?1 ORDER BY sort_order, id",
            column_list::<P>(None),
            P::TABLE
        );
        Ok(self
            .query_nodes(&conn, &sql, Params::Positional(vec![Value::Integer(parent_id)]))
            .await?)
    }

    async fn insert_root(&self, name: &str, payload: P) -> Result<TreeNode<P>, StoreError> {
        self.insert(None, name, payload).await
    }

    async fn insert_child(
        &self,
        parent_id: i64,
        name: &str,
        payload: P,
    ) -> Result<TreeNode<P>, StoreError> {
        self.insert(Some(parent_id), name, payload).await
    }

    async fn rename(&self, id: i64, name: &str) -> Result<bool, StoreError> {
        validate_name(name)?;

        let conn = self.db.connect_with_timeout().await?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .await?;

        let Some(node) = self.fetch_node(&tx, id).await? else {
            tx.rollback().await?;
            return Ok(false);
        };
        if self
            .sibling_name_taken(&tx, node.parent_id, name, Some(id))
            .await?
        {
            return reject(
                tx,
                ValidationError::DuplicateSiblingName {
                    name: name.to_string(),
                },
            )
            .await;
        }

        let sql = format!(
            "UPDATE {} SET name = ?1, updated_at = CURRENT_TIMESTAMP WHERE id = ?2",
            P::TABLE
        );
        tx.execute(
            &sql,
            Params::Positional(vec![Value::Text(name.to_string()), Value::Integer(id)]),
        )
        .await?;
        tx.commit().await?;
        Ok(true)
    }

    async fn update_payload(&self, id: i64, payload: P) -> Result<bool, StoreError> {
        let conn = self.db.connect_with_timeout().await?;

        let mut assignments: Vec<String> = P::COLUMNS
            .iter()
            .enumerate()
            .map(|(i, column)| format!("{column} = ?{}", i + 1))
            .collect();
        assignments.push("updated_at = CURRENT_TIMESTAMP".to_string());
        let sql = format!(
            "UPDATE {} SET {} WHERE id = ?{}",
            P::TABLE,
            assignments.join(", "),
            P::COLUMNS.len() + 1
        );

        let mut values = payload.values();
        values.push(Value::Integer(id));
        let changed = conn.execute(&sql, Params::Positional(values)).await?;
        Ok(changed > 0)
    }

    async fn delete_subtree(&self, id: i64) -> Result<u64, StoreError> {
        let conn = self.db.connect_with_timeout().await?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .await?;

        let ids = self.subtree_ids(&tx, id).await?;
        if ids.is_empty() {
            tx.rollback().await?;
            return Ok(0);
        }

        let cte = subtree_cte::<P>();
        for dependent in P::DEPENDENTS {
            let sql = match dependent {
                Dependent::Detach { table, column } => format!(
                    "{cte} UPDATE {table} SET {column} = NULL WHERE {column} IN (SELECT id FROM subtree)"
                ),
                Dependent::Delete { table, column } => format!(
                    "{cte} DELETE FROM {table} WHERE {column} IN (SELECT id FROM subtree)"
                ),
            };
            let affected = tx.execute(&sql, Params::Positional(vec![Value::Integer(id)])).await?;
            debug!(table = P::TABLE, ?dependent, affected, "Handled dependents of subtree");
        }

        let sql = format!(
            "{cte} DELETE FROM {} WHERE id IN (SELECT id FROM subtree)",
            P::TABLE
        );
        tx.execute(&sql, Params::Positional(vec![Value::Integer(id)])).await?;
        tx.commit().await?;

        Ok(ids.len() as u64)
    }

    async fn fetch_tree_rows(&self, scope: TreeScope) -> Result<Vec<TreeRow<P>>, StoreError> {
        let conn = self.db.connect_with_timeout().await?;

        let (anchor, params) = match scope {
            TreeScope::Forest => ("parent_id IS NULL", Params::None),
            TreeScope::Subtree(id) => ("id = ?1", Params::Positional(vec![Value::Integer(id)])),
        };

        let (leaf_columns, leaf_join, leaf_order) = match P::LEAF {
            Some(leaf) => (
                leaf.columns
                    .iter()
                    .map(|column| format!(", l.{column}"))
                    .collect::<String>(),
                format!(
                    "LEFT JOIN {} l ON l.{} = tree.id",
                    leaf.table, leaf.foreign_key
                ),
                format!(", l.{}, l.id", leaf.order_by),
            ),
            None => (String::new(), String::new(), String::new()),
        };

        // UNION (not UNION ALL) terminates even if corrupt rows form a cycle
        let sql = format!(
            "WITH RECURSIVE tree({columns}) AS (
                SELECT {columns} FROM {table} WHERE {anchor}
                UNION
                SELECT {child_columns} FROM {table} c JOIN tree p ON c.parent_id = p.id
            )
            SELECT {tree_columns}{leaf_columns}
            FROM tree {leaf_join}
            ORDER BY tree.depth, tree.sort_order, tree.id{leaf_order}",
            columns = column_list::<P>(None),
            child_columns = column_list::<P>(Some("c")),
            tree_columns = column_list::<P>(Some("tree")),
            table = P::TABLE,
        );

        let leaf_offset = (NODE_COLUMNS.len() + P::COLUMNS.len()) as i32;
        let mut rows = conn.query(&sql, params).await.map_err(DatabaseError::from)?;
        let mut tree_rows = Vec::new();
        while let Some(row) = rows.next().await? {
            tree_rows.push(TreeRow {
                node: decode_node(&row)?,
                leaf: P::decode_leaf(&row, leaf_offset)?,
            });
        }

        debug!(table = P::TABLE, ?scope, rows = tree_rows.len(), "Fetched tree rows");
        Ok(tree_rows)
    }
}

fn parse_column<T>(row: &Row, idx: i32) -> Result<T, DatabaseError>
where
    T: std::str::FromStr<Err = ValidationError>,
{
    let raw: String = row.get(idx)?;
    raw.parse()
        .map_err(|e: ValidationError| DatabaseError::row_decode(e.to_string()))
}

impl SqlPayload for DevSpecPayload {
    const TABLE: &'static str = "project_dev_specs";
    const COLUMNS: &'static [&'static str] = &["type", "status"];
    const DEPENDENTS: &'static [Dependent] = &[Dependent::Delete {
        table: "dev_spec_contents",
        column: "dev_spec_id",
    }];

    fn values(&self) -> Vec<Value> {
        vec![
            Value::Text(self.spec_type.as_str().to_string()),
            Value::Text(self.status.as_str().to_string()),
        ]
    }

    fn decode(row: &Row, offset: i32) -> Result<Self, DatabaseError> {
        Ok(Self {
            spec_type: parse_column::<SpecType>(row, offset)?,
            status: parse_column::<SpecStatus>(row, offset + 1)?,
        })
    }
}

/// Columns selected from `users` for a member
pub(crate) const MEMBER_COLUMNS: &[&str] = &["id", "name", "email", "role", "organization_id"];

/// Decode a member starting at `offset`; `None` if the id column is NULL.
pub(crate) fn decode_member(row: &Row, offset: i32) -> Result<Option<Member>, DatabaseError> {
    let Some(id) = row.get::<Option<i64>>(offset)? else {
        return Ok(None);
    };
    Ok(Some(Member {
        id,
        name: row.get(offset + 1)?,
        email: row.get(offset + 2)?,
        role: parse_column::<Role>(row, offset + 3)?,
        organization_id: row.get(offset + 4)?,
    }))
}

impl SqlPayload for OrganizationPayload {
    const TABLE: &'static str = "organizations";
    const COLUMNS: &'static [&'static str] = &[];
    const LEAF: Option<LeafJoin> = Some(LeafJoin {
        table: "users",
        foreign_key: "organization_id",
        columns: MEMBER_COLUMNS,
        order_by: "name",
    });
    const DEPENDENTS: &'static [Dependent] = &[Dependent::Detach {
        table: "users",
        column: "organization_id",
    }];

    fn values(&self) -> Vec<Value> {
        Vec::new()
    }

    fn decode(_row: &Row, _offset: i32) -> Result<Self, DatabaseError> {
        Ok(OrganizationPayload)
    }

    fn decode_leaf(row: &Row, offset: i32) -> Result<Option<Member>, DatabaseError> {
        decode_member(row, offset)
    }
}
