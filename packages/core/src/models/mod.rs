//! Data Models
//!
//! This module contains the data structures shared by every layer:
//!
//! - `TreeNode<P>` - generic ordered tree node with a variant payload
//! - `Forest<P>` - in-memory arena enforcing the tree invariants
//! - Payloads for dev-spec trees and organization trees
//! - The tree assembler that rebuilds hierarchies from flat query rows
//! - JSON response projections

mod assembly;
mod content;
mod dev_spec;
mod forest;
mod organization;
mod response;
mod tree;

pub use assembly::{assemble, AssembledNode, Assembly, TreeRow, TreeScope};
pub use content::{reorder_by_ids, validate_title, ContentType, DevSpecContent, MAX_TITLE_LEN};
pub use dev_spec::{DevSpecNode, DevSpecPayload, SpecStatus, SpecType};
pub use forest::Forest;
pub use organization::{
    normalize_email, validate_member_name, Member, OrganizationNode, OrganizationPayload, Role,
    MAX_EMAIL_LEN,
};
pub use response::{
    DevSpecContentResponse, DevSpecDetailResponse, DevSpecTreeResponse, MemberResponse,
    OrganizationTreeResponse, UserResponse,
};
pub use tree::{
    next_sort_order, validate_name, validate_text, TreeNode, TreePayload, ValidationError,
    MAX_NAME_LEN,
};
