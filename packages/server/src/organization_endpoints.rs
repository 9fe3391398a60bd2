//! Organization endpoints
//!
//! # Endpoints
//!
//! - `POST /api/organizations` - Create a root organization
//! - `GET /api/organizations` - The whole forest with members
//! - `POST /api/organizations/:id/children` - Create a child organization
//! - `PUT /api/organizations/:id/name` - Rename
//! - `DELETE /api/organizations/:id` - Delete with descendants, detaching members
//! - `GET /api/organizations/:id/tree` - One organization subtree with members
//! - `GET /api/organizations/:id/members` - Members assigned directly to an organization
//! - `POST /api/organizations/:id/members` - Assign an existing user
//! - `POST /api/organizations/members` - Create a user account
//! - `GET|DELETE /api/organizations/members/:user_id` - Read or unassign a user
//! - `PUT /api/organizations/members/:user_id/role` - Change a user's role
//! - `GET /api/organizations/unassigned-users` - Users without an organization

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::Json,
    routing::{delete, get, post, put},
    Router,
};
use serde::Deserialize;
use spectree_core::{OrganizationTreeResponse, Role, UserResponse};

use crate::{AppState, HttpError};

type JsonBody<T> = Result<Json<T>, JsonRejection>;

#[derive(Debug, Deserialize)]
pub struct NameRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignUserRequest {
    pub user_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct CreateMemberRequest {
    pub name: String,
    pub email: String,
    pub role: Option<Role>,
}

#[derive(Debug, Deserialize)]
pub struct RoleRequest {
    pub role: Role,
}

async fn create_root(
    State(state): State<AppState>,
    body: JsonBody<NameRequest>,
) -> Result<(StatusCode, Json<OrganizationTreeResponse>), HttpError> {
    let Json(req) = body?;
    let org = state.organizations.create_root(&req.name).await?;
    Ok((StatusCode::CREATED, Json(org)))
}

async fn list_all(
    State(state): State<AppState>,
) -> Result<Json<Vec<OrganizationTreeResponse>>, HttpError> {
    Ok(Json(state.organizations.find_all().await?))
}

async fn create_child(
    State(state): State<AppState>,
    Path(parent_id): Path<i64>,
    body: JsonBody<NameRequest>,
) -> Result<(StatusCode, Json<OrganizationTreeResponse>), HttpError> {
    let Json(req) = body?;
    let org = state.organizations.create_child(parent_id, &req.name).await?;
    Ok((StatusCode::CREATED, Json(org)))
}

async fn subtree(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<OrganizationTreeResponse>, HttpError> {
    Ok(Json(state.organizations.find_tree(id).await?))
}

async fn list_members(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<UserResponse>>, HttpError> {
    Ok(Json(state.organizations.find_members(id).await?))
}

async fn update_name(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    body: JsonBody<NameRequest>,
) -> Result<StatusCode, HttpError> {
    let Json(req) = body?;
    state.organizations.update_name(id, &req.name).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn delete_organization(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, HttpError> {
    state.organizations.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn assign_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    body: JsonBody<AssignUserRequest>,
) -> Result<StatusCode, HttpError> {
    let Json(req) = body?;
    state.organizations.assign_user(id, req.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn create_member(
    State(state): State<AppState>,
    body: JsonBody<CreateMemberRequest>,
) -> Result<(StatusCode, Json<UserResponse>), HttpError> {
    let Json(req) = body?;
    let user = state
        .organizations
        .create_member(&req.name, &req.email, req.role)
        .await?;
    Ok((StatusCode::CREATED, Json(user)))
}

async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<Json<UserResponse>, HttpError> {
    Ok(Json(state.organizations.find_user(user_id).await?))
}

async fn unassign_user(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<StatusCode, HttpError> {
    state.organizations.unassign_user(user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn update_role(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    body: JsonBody<RoleRequest>,
) -> Result<Json<UserResponse>, HttpError> {
    let Json(req) = body?;
    Ok(Json(state.organizations.update_user_role(user_id, req.role).await?))
}

async fn unassigned_users(
    State(state): State<AppState>,
) -> Result<Json<Vec<UserResponse>>, HttpError> {
    Ok(Json(state.organizations.find_unassigned_users().await?))
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/api/organizations", post(create_root).get(list_all))
        .route("/api/organizations/:id", delete(delete_organization))
        .route("/api/organizations/:id/children", post(create_child))
        .route("/api/organizations/:id/name", put(update_name))
        .route("/api/organizations/:id/tree", get(subtree))
        .route(
            "/api/organizations/:id/members",
            get(list_members).post(assign_user),
        )
        .route("/api/organizations/members", post(create_member))
        .route(
            "/api/organizations/members/:user_id",
            get(get_user).delete(unassign_user),
        )
        .route("/api/organizations/members/:user_id/role", put(update_role))
        .route("/api/organizations/unassigned-users", get(unassigned_users))
        .with_state(state)
}
