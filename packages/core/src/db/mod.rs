//! Database Layer
//!
//! This module handles all persistence using libsql (embedded SQLite):
//!
//! - Database initialization and connection management
//! - The `TreeStore` abstraction over one ordered hierarchy
//! - `LibsqlTreeStore` (recursive CTE reads, immediate-transaction writes)
//!   and the in-memory `MemoryTreeStore`
//! - Member accounts and dev-spec contents

mod content_store;
mod database;
mod error;
mod libsql_store;
mod member_store;
mod memory_store;
mod tree_store;

pub use content_store::ContentStore;
pub use database::DatabaseService;
pub use error::{DatabaseError, StoreError};
pub use libsql_store::{Dependent, LeafJoin, LibsqlTreeStore, SqlPayload};
pub use member_store::MemberStore;
pub use memory_store::MemoryTreeStore;
pub use tree_store::TreeStore;
