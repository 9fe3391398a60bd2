//! Dev-Spec Content Documents
//!
//! Each dev-spec node owns typed documents. `FIGMA`, `CHECKLIST` and `MMD`
//! hold at most one document per node; `NOTE` rows are an ordered list of
//! titled note sections.

use crate::models::tree::ValidationError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// Maximum length of a note section title
pub const MAX_TITLE_LEN: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContentType {
    Figma,
    Checklist,
    Mmd,
    Note,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Figma => "FIGMA",
            ContentType::Checklist => "CHECKLIST",
            ContentType::Mmd => "MMD",
            ContentType::Note => "NOTE",
        }
    }

    /// Whether a node holds at most one document of this type
    pub fn is_singleton(&self) -> bool {
        !matches!(self, ContentType::Note)
    }
}

impl FromStr for ContentType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "FIGMA" => Ok(ContentType::Figma),
            "CHECKLIST" => Ok(ContentType::Checklist),
            "MMD" => Ok(ContentType::Mmd),
            "NOTE" => Ok(ContentType::Note),
            other => Err(ValidationError::InvalidValue {
                field: "contentType",
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DevSpecContent {
    pub id: i64,
    pub dev_spec_id: i64,
    pub content_type: ContentType,
    pub title: Option<String>,
    pub content: String,
    pub sort_order: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Check an optional note section title against [`MAX_TITLE_LEN`].
pub fn validate_title(title: Option<&str>) -> Result<(), ValidationError> {
    match title {
        Some(title) if title.chars().count() > MAX_TITLE_LEN => Err(ValidationError::TooLong {
            field: "title".to_string(),
            max: MAX_TITLE_LEN,
        }),
        _ => Ok(()),
    }
}

/// Compute the new order of note sections.
///
/// `current` is the existing id order. Requested ids come first, in request
/// order; ids that are unknown or repeated are ignored. Every id the request
/// leaves out follows in its prior relative order.
pub fn reorder_by_ids(current: &[i64], requested: &[i64]) -> Vec<i64> {
    let known: HashSet<i64> = current.iter().copied().collect();
    let mut placed = HashSet::with_capacity(current.len());
    let mut order = Vec::with_capacity(current.len());

    for id in requested {
        if known.contains(id) && placed.insert(*id) {
            order.push(*id);
        }
    }
    order.extend(current.iter().copied().filter(|id| !placed.contains(id)));
    order
}
