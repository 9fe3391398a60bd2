//! Dev-spec endpoints
//!
//! # Endpoints
//!
//! - `POST /api/devspec/projects` - Create a project
//! - `GET /api/devspec/projects` - All projects with their pages
//! - `GET /api/devspec/projects/:id/tree` - One project tree
//! - `POST /api/devspec/projects/:id/pages` - Create a page under a project
//! - `GET /api/devspec/:id` - Detail view with parent name and documents
//! - `PUT /api/devspec/:id/name` - Rename
//! - `PUT /api/devspec/:id/status` - Change workflow status
//! - `DELETE /api/devspec/:id` - Delete with pages and documents
//! - `GET|PUT /api/devspec/:id/content/:content_type` - Singleton documents
//! - `GET|POST /api/devspec/:id/note-sections` - Note sections
//! - `PUT /api/devspec/:id/note-sections/reorder` - Reorder note sections
//! - `PUT|DELETE /api/devspec/note-sections/:section_id` - Edit or remove a section

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post, put},
    Router,
};
use serde::Deserialize;
use spectree_core::{
    ContentType, DevSpecContentResponse, DevSpecDetailResponse, DevSpecTreeResponse, SpecStatus,
};

use crate::{AppState, HttpError};

type JsonBody<T> = Result<Json<T>, JsonRejection>;

#[derive(Debug, Deserialize)]
pub struct NameRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: SpecStatus,
}

#[derive(Debug, Deserialize)]
pub struct ContentRequest {
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateNoteSectionRequest {
    pub title: Option<String>,
    #[serde(default)]
    pub content: String,
}

/// Absent fields keep their stored value
#[derive(Debug, Deserialize)]
pub struct UpdateNoteSectionRequest {
    pub title: Option<String>,
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ReorderRequest {
    pub ids: Vec<i64>,
}

async fn create_project(
    State(state): State<AppState>,
    body: JsonBody<NameRequest>,
) -> Result<(StatusCode, Json<DevSpecTreeResponse>), HttpError> {
    let Json(req) = body?;
    let project = state.dev_specs.create_project(&req.name).await?;
    Ok((StatusCode::CREATED, Json(project)))
}

async fn list_projects(
    State(state): State<AppState>,
) -> Result<Json<Vec<DevSpecTreeResponse>>, HttpError> {
    Ok(Json(state.dev_specs.find_all_projects().await?))
}

async fn project_tree(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<DevSpecTreeResponse>, HttpError> {
    Ok(Json(state.dev_specs.find_project_tree(id).await?))
}

async fn create_page(
    State(state): State<AppState>,
    Path(project_id): Path<i64>,
    body: JsonBody<NameRequest>,
) -> Result<(StatusCode, Json<DevSpecTreeResponse>), HttpError> {
    let Json(req) = body?;
    let page = state.dev_specs.create_page(project_id, &req.name).await?;
    Ok((StatusCode::CREATED, Json(page)))
}

async fn detail(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<DevSpecDetailResponse>, HttpError> {
    Ok(Json(state.dev_specs.find_detail(id).await?))
}

async fn update_name(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    body: JsonBody<NameRequest>,
) -> Result<StatusCode, HttpError> {
    let Json(req) = body?;
    state.dev_specs.update_name(id, &req.name).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    body: JsonBody<StatusRequest>,
) -> Result<StatusCode, HttpError> {
    let Json(req) = body?;
    state.dev_specs.update_status(id, req.status).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn delete_dev_spec(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, HttpError> {
    state.dev_specs.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn get_content(
    State(state): State<AppState>,
    Path((id, content_type)): Path<(i64, String)>,
) -> Result<Json<DevSpecContentResponse>, HttpError> {
    let content_type: ContentType = content_type.parse()?;
    Ok(Json(state.dev_specs.find_content(id, content_type).await?))
}

async fn save_content(
    State(state): State<AppState>,
    Path((id, content_type)): Path<(i64, String)>,
    body: JsonBody<ContentRequest>,
) -> Result<Json<DevSpecContentResponse>, HttpError> {
    let content_type: ContentType = content_type.parse()?;
    let Json(req) = body?;
    let saved = state
        .dev_specs
        .save_content(id, content_type, &req.content)
        .await?;
    Ok(Json(saved))
}

async fn list_note_sections(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<DevSpecContentResponse>>, HttpError> {
    Ok(Json(state.dev_specs.find_note_sections(id).await?))
}

async fn create_note_section(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    body: JsonBody<CreateNoteSectionRequest>,
) -> Result<(StatusCode, Json<DevSpecContentResponse>), HttpError> {
    let Json(req) = body?;
    let section = state
        .dev_specs
        .create_note_section(id, req.title.as_deref(), &req.content)
        .await?;
    Ok((StatusCode::CREATED, Json(section)))
}

async fn reorder_note_sections(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    body: JsonBody<ReorderRequest>,
) -> Result<Json<Vec<DevSpecContentResponse>>, HttpError> {
    let Json(req) = body?;
    Ok(Json(state.dev_specs.reorder_note_sections(id, &req.ids).await?))
}

async fn update_note_section(
    State(state): State<AppState>,
    Path(section_id): Path<i64>,
    body: JsonBody<UpdateNoteSectionRequest>,
) -> Result<Json<DevSpecContentResponse>, HttpError> {
    let Json(req) = body?;
    let section = state
        .dev_specs
        .update_note_section(section_id, req.title.as_deref(), req.content.as_deref())
        .await?;
    Ok(Json(section))
}

async fn delete_note_section(
    State(state): State<AppState>,
    Path(section_id): Path<i64>,
) -> Result<StatusCode, HttpError> {
    state.dev_specs.delete_note_section(section_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/devspec/projects",
            post(create_project).get(list_projects),
        )
        .route("/api/devspec/projects/:id/tree", get(project_tree))
        .route("/api/devspec/projects/:id/pages", post(create_page))
        .route("/api/devspec/:id", get(detail).delete(delete_dev_spec))
        .route("/api/devspec/:id/name", put(update_name))
        .route("/api/devspec/:id/status", put(update_status))
        .route(
            "/api/devspec/:id/content/:content_type",
            get(get_content).put(save_content),
        )
        .route(
            "/api/devspec/:id/note-sections",
            get(list_note_sections).post(create_note_section),
        )
        .route(
            "/api/devspec/:id/note-sections/reorder",
            put(reorder_note_sections),
        )
        .route(
            "/api/devspec/note-sections/:section_id",
            put(update_note_section).delete(delete_note_section),
        )
        .with_state(state)
}
