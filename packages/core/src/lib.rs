//! SpecTree Core Business Logic Layer
//!
//! This crate stores ordered hierarchies (dev-spec projects with their pages,
//! and organization trees with their members) in libsql and reads whole trees
//! back with a single recursive query.
//!
//! # Architecture
//!
//! - **Generic tree**: `TreeNode<P>` plus a payload type per hierarchy
//! - **Arena model**: `Forest<P>` addresses nodes by id, never by reference
//! - **libsql**: embedded SQLite with recursive CTEs and immediate transactions
//!
//! # Modules
//!
//! - [`models`] - Tree nodes, payloads, assembler and response shapes
//! - [`db`] - Database layer with libsql integration
//! - [`services`] - Business services (TreeService, DevSpecService, OrganizationService)

pub mod db;
pub mod models;
pub mod services;

// Re-export commonly used types
pub use models::*;
pub use services::*;
