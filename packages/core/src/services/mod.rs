//! Business Services
//!
//! This module contains the business logic services:
//!
//! - `TreeService` - generic create/rename/update/delete and tree reads
//! - `DevSpecService` - projects, pages, status, contents and note sections
//! - `OrganizationService` - organization tree and member assignment
//!
//! Services coordinate between the database layer and the HTTP layer,
//! enforcing business rules before the stores are touched.

pub mod dev_spec_service;
pub mod error;
pub mod organization_service;
pub mod tree_service;

pub use dev_spec_service::DevSpecService;
pub use error::ServiceError;
pub use organization_service::OrganizationService;
pub use tree_service::TreeService;
