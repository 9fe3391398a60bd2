//! JSON projections returned by the services
//!
//! Field names are camelCase on the wire; enum values are SCREAMING_SNAKE_CASE.

use crate::models::assembly::AssembledNode;
use crate::models::content::{ContentType, DevSpecContent};
use crate::models::dev_spec::{DevSpecPayload, SpecStatus, SpecType};
use crate::models::organization::{Member, OrganizationPayload, Role};
use crate::models::tree::TreeNode;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DevSpecTreeResponse {
    pub id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub spec_type: SpecType,
    pub status: SpecStatus,
    pub sort_order: i64,
    pub depth: i64,
    pub children: Vec<DevSpecTreeResponse>,
}

impl From<AssembledNode<DevSpecPayload>> for DevSpecTreeResponse {
    fn from(assembled: AssembledNode<DevSpecPayload>) -> Self {
        let node = assembled.node;
        Self {
            id: node.id,
            name: node.name,
            spec_type: node.payload.spec_type,
            status: node.payload.status,
            sort_order: node.sort_order,
            depth: node.depth,
            children: assembled.children.into_iter().map(Self::from).collect(),
        }
    }
}

impl From<TreeNode<DevSpecPayload>> for DevSpecTreeResponse {
    /// A freshly created node has no children yet
    fn from(node: TreeNode<DevSpecPayload>) -> Self {
        Self::from(AssembledNode {
            node,
            children: Vec::new(),
            leaves: Vec::new(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberResponse {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl From<Member> for MemberResponse {
    fn from(member: Member) -> Self {
        Self {
            id: member.id,
            name: member.name,
            email: member.email,
            role: member.role,
        }
    }
}

/// Member account including its current assignment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub organization_id: Option<i64>,
}

impl From<Member> for UserResponse {
    fn from(member: Member) -> Self {
        Self {
            id: member.id,
            name: member.name,
            email: member.email,
            role: member.role,
            organization_id: member.organization_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationTreeResponse {
    pub id: i64,
    pub name: String,
    pub sort_order: i64,
    pub depth: i64,
    pub children: Vec<OrganizationTreeResponse>,
    pub members: Vec<MemberResponse>,
}

impl From<AssembledNode<OrganizationPayload>> for OrganizationTreeResponse {
    fn from(assembled: AssembledNode<OrganizationPayload>) -> Self {
        let node = assembled.node;
        Self {
            id: node.id,
            name: node.name,
            sort_order: node.sort_order,
            depth: node.depth,
            children: assembled.children.into_iter().map(Self::from).collect(),
            members: assembled.leaves.into_iter().map(MemberResponse::from).collect(),
        }
    }
}

impl From<TreeNode<OrganizationPayload>> for OrganizationTreeResponse {
    fn from(node: TreeNode<OrganizationPayload>) -> Self {
        Self::from(AssembledNode {
            node,
            children: Vec::new(),
            leaves: Vec::new(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DevSpecContentResponse {
    /// `None` for the placeholder returned when no document exists yet
    pub id: Option<i64>,
    pub content_type: ContentType,
    pub title: Option<String>,
    pub content: String,
    pub sort_order: i64,
}

impl DevSpecContentResponse {
    pub fn empty(content_type: ContentType) -> Self {
        Self {
            id: None,
            content_type,
            title: None,
            content: String::new(),
            sort_order: 0,
        }
    }
}

impl From<DevSpecContent> for DevSpecContentResponse {
    fn from(content: DevSpecContent) -> Self {
        Self {
            id: Some(content.id),
            content_type: content.content_type,
            title: content.title,
            content: content.content,
            sort_order: content.sort_order,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DevSpecDetailResponse {
    pub id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub spec_type: SpecType,
    pub status: SpecStatus,
    pub sort_order: i64,
    pub depth: i64,
    pub parent_id: Option<i64>,
    pub parent_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub contents: Vec<DevSpecContentResponse>,
}

impl DevSpecDetailResponse {
    pub fn new(
        node: TreeNode<DevSpecPayload>,
        parent: Option<&TreeNode<DevSpecPayload>>,
        contents: Vec<DevSpecContent>,
    ) -> Self {
        Self {
            id: node.id,
            name: node.name,
            spec_type: node.payload.spec_type,
            status: node.payload.status,
            sort_order: node.sort_order,
            depth: node.depth,
            parent_id: node.parent_id,
            parent_name: parent.map(|p| p.name.clone()),
            created_at: node.created_at,
            updated_at: node.updated_at,
            contents: contents.into_iter().map(DevSpecContentResponse::from).collect(),
        }
    }
}
