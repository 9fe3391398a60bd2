//! Generic Ordered Tree Node
//!
//! Every hierarchy in SpecTree (dev-spec projects and organizations) shares the
//! same shape: an integer id, a name unique among its siblings, an optional
//! parent id, an append-order `sort_order` and a `depth` fixed at creation.
//! What differs between hierarchies lives in the payload type `P`.
//!
//! # Invariants
//!
//! - `depth == 0` for roots, `parent.depth + 1` otherwise
//! - sibling names are unique, and all roots form one sibling group
//! - `sort_order` is assigned at append time and never renumbered on delete

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Maximum length of a node name (matches the `name` column width)
pub const MAX_NAME_LEN: usize = 100;

/// Validation errors for tree and leaf operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Field '{field}' exceeds {max} characters")]
    TooLong { field: String, max: usize },

    #[error("Name '{name}' already exists under the same parent")]
    DuplicateSiblingName { name: String },

    #[error("Parent node does not exist: {0}")]
    ParentNotFound(i64),

    #[error("Node {id} does not accept children")]
    ChildrenNotPermitted { id: i64 },

    #[error("Invalid email address: {0}")]
    InvalidEmail(String),

    #[error("Email already registered: {0}")]
    DuplicateEmail(String),

    #[error("Invalid value '{value}' for {field}")]
    InvalidValue { field: &'static str, value: String },

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
}

/// Variant-specific data carried by a tree node.
///
/// `Leaf` is the record type attached to nodes by a many-to-one back
/// reference (organization members). Hierarchies without leaves use
/// [`std::convert::Infallible`].
pub trait TreePayload: Clone + std::fmt::Debug + PartialEq + Send + Sync + 'static {
    type Leaf: Clone + std::fmt::Debug + PartialEq + Send + Sync + 'static;

    /// Human-readable kind used in error messages and logs
    const KIND: &'static str;

    /// Whether children may be attached under a node carrying this payload
    fn permits_children(&self) -> bool {
        true
    }
}

/// A node of an ordered hierarchy.
///
/// Nodes never reference each other directly: the parent is an id and the
/// children are resolved through an index (see [`crate::models::Forest`]) or a
/// query.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeNode<P> {
    pub id: i64,
    pub name: String,
    pub parent_id: Option<i64>,
    pub sort_order: i64,
    pub depth: i64,
    pub payload: P,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl<P> TreeNode<P> {
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// Check a node name: non-blank and at most [`MAX_NAME_LEN`] characters.
pub fn validate_name(name: &str) -> Result<(), ValidationError> {
    validate_text("name", name, MAX_NAME_LEN)
}

/// Check a required text field against blankness and a length limit.
pub fn validate_text(field: &str, value: &str, max: usize) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::MissingField(field.to_string()));
    }
    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }
    Ok(())
}

/// Sort order for a new child: the number of siblings it already has.
///
/// Existing siblings are never renumbered, so after a deletion the new value
/// may repeat one already in use; ties are ordered by id.
pub fn next_sort_order(sibling_count: usize) -> i64 {
    sibling_count as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_name_rejected() {
        assert_eq!(
            validate_name("   "),
            Err(ValidationError::MissingField("name".to_string()))
        );
        assert!(validate_name("").is_err());
        assert!(validate_name("Alpha").is_ok());
    }

    #[test]
    fn test_long_name_rejected() {
        let name = "x".repeat(MAX_NAME_LEN + 1);
        assert!(matches!(
            validate_name(&name),
            Err(ValidationError::TooLong { max: MAX_NAME_LEN, .. })
        ));
        assert!(validate_name(&"x".repeat(MAX_NAME_LEN)).is_ok());
    }

    #[test]
    fn test_next_sort_order() {
        assert_eq!(next_sort_order(0), 0);
        assert_eq!(next_sort_order(3), 3);
    }
}
