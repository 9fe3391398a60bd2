//! Dev-Spec Tree Payload
//!
//! Projects are roots, pages hang below projects. Both carry a workflow
//! status (`TODO` → `IN_PROGRESS` → `DONE`) with every transition allowed.

use crate::models::tree::{TreePayload, ValidationError};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SpecType {
    Project,
    Page,
}

impl SpecType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpecType::Project => "PROJECT",
            SpecType::Page => "PAGE",
        }
    }
}

impl FromStr for SpecType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PROJECT" => Ok(SpecType::Project),
            "PAGE" => Ok(SpecType::Page),
            other => Err(ValidationError::InvalidValue {
                field: "type",
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for SpecType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Workflow status of a dev-spec node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SpecStatus {
    #[default]
    Todo,
    InProgress,
    Done,
}

impl SpecStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpecStatus::Todo => "TODO",
            SpecStatus::InProgress => "IN_PROGRESS",
            SpecStatus::Done => "DONE",
        }
    }
}

impl FromStr for SpecStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "TODO" => Ok(SpecStatus::Todo),
            "IN_PROGRESS" => Ok(SpecStatus::InProgress),
            "DONE" => Ok(SpecStatus::Done),
            other => Err(ValidationError::InvalidValue {
                field: "status",
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for SpecStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DevSpecPayload {
    #[serde(rename = "type")]
    pub spec_type: SpecType,
    pub status: SpecStatus,
}

impl DevSpecPayload {
    pub fn project() -> Self {
        Self {
            spec_type: SpecType::Project,
            status: SpecStatus::Todo,
        }
    }

    pub fn page() -> Self {
        Self {
            spec_type: SpecType::Page,
            status: SpecStatus::Todo,
        }
    }

    pub fn with_status(self, status: SpecStatus) -> Self {
        Self { status, ..self }
    }
}

impl TreePayload for DevSpecPayload {
    type Leaf = Infallible;

    const KIND: &'static str = "dev spec";

    /// Only projects hold pages; pages are leaves of the hierarchy.
    fn permits_children(&self) -> bool {
        self.spec_type == SpecType::Project
    }
}

pub type DevSpecNode = crate::models::TreeNode<DevSpecPayload>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parse() {
        assert_eq!("IN_PROGRESS".parse::<SpecStatus>(), Ok(SpecStatus::InProgress));
        assert_eq!("DONE".parse::<SpecStatus>().unwrap().to_string(), "DONE");
        assert!("done".parse::<SpecStatus>().is_err());
        assert!("ARCHIVED".parse::<SpecStatus>().is_err());
    }

    #[test]
    fn test_status_wire_format() {
        let json = serde_json::to_string(&SpecStatus::InProgress).unwrap();
        assert_eq!(json, "\"IN_PROGRESS\"");
        let status: SpecStatus = serde_json::from_str("\"TODO\"").unwrap();
        assert_eq!(status, SpecStatus::Todo);
    }

    #[test]
    fn test_only_projects_have_children() {
        assert!(DevSpecPayload::project().permits_children());
        assert!(!DevSpecPayload::page().permits_children());
        assert_eq!(DevSpecPayload::page().status, SpecStatus::Todo);
    }
}
