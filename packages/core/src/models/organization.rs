//! Organization Tree Payload and Members
//!
//! Organizations nest without limit and carry no columns beyond the tree
//! itself. Members (user accounts) point at one organization at most and are
//! the leaf records attached during tree assembly.

use crate::models::tree::{validate_text, TreePayload, ValidationError, MAX_NAME_LEN};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

pub const MAX_EMAIL_LEN: usize = 255;

const EMAIL_PATTERN: &str = r"^[^\s@]+@[^\s@]+\.[^\s@]+$";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationPayload;

impl TreePayload for OrganizationPayload {
    type Leaf = Member;

    const KIND: &'static str = "organization";
}

pub type OrganizationNode = crate::models::TreeNode<OrganizationPayload>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "USER",
            Role::Admin => "ADMIN",
        }
    }
}

impl FromStr for Role {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "USER" => Ok(Role::User),
            "ADMIN" => Ok(Role::Admin),
            other => Err(ValidationError::InvalidValue {
                field: "role",
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user account as seen by the organization tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: Role,
    #[serde(skip)]
    pub organization_id: Option<i64>,
}

static EMAIL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(EMAIL_PATTERN).expect("EMAIL_PATTERN is a valid regex"));

/// Validate an email address and return its stored (trimmed, lower-cased) form.
pub fn normalize_email(email: &str) -> Result<String, ValidationError> {
    let email = email.trim().to_lowercase();
    validate_text("email", &email, MAX_EMAIL_LEN)?;
    if !EMAIL_REGEX.is_match(&email) {
        return Err(ValidationError::InvalidEmail(email));
    }
    Ok(email)
}

/// Validate a member display name.
pub fn validate_member_name(name: &str) -> Result<(), ValidationError> {
    validate_text("name", name, MAX_NAME_LEN)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_normalized() {
        assert_eq!(
            normalize_email("  Jane.Doe@Example.COM ").unwrap(),
            "jane.doe@example.com"
        );
    }

    #[test]
    fn test_invalid_email_rejected() {
        assert!(matches!(
            normalize_email("not-an-email"),
            Err(ValidationError::InvalidEmail(_))
        ));
        assert!(matches!(
            normalize_email("a b@c.d"),
            Err(ValidationError::InvalidEmail(_))
        ));
        assert!(matches!(
            normalize_email(""),
            Err(ValidationError::MissingField(_))
        ));
    }

    #[test]
    fn test_role_defaults_to_user() {
        assert_eq!(Role::default(), Role::User);
        assert_eq!("ADMIN".parse::<Role>(), Ok(Role::Admin));
        assert!("OWNER".parse::<Role>().is_err());
    }

    #[test]
    fn test_member_serializes_without_organization() {
        let member = Member {
            id: 7,
            name: "Kim".to_string(),
            email: "kim@example.com".to_string(),
            role: Role::Admin,
            organization_id: Some(3),
        };
        let json = serde_json::to_value(&member).unwrap();
        assert_eq!(json["role"], "ADMIN");
        assert!(json.get("organizationId").is_none());
    }
}
