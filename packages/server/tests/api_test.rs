//! Router tests for the REST surface
//!
//! Requests go through the full axum router (CORS and tracing layers
//! included) against a temporary database.

use anyhow::Result;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use spectree_core::db::DatabaseService;
use spectree_server::{config::DEFAULT_ORIGINS, create_router, AppState};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

async fn create_test_app() -> Result<(Router, TempDir)> {
    let temp_dir = TempDir::new()?;
    let db = Arc::new(DatabaseService::new(temp_dir.path().join("api.db")).await?);
    let origins: Vec<String> = DEFAULT_ORIGINS.iter().map(|o| o.to_string()).collect();
    Ok((create_router(AppState::new(db), &origins), temp_dir))
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> Result<(StatusCode, Value)> {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&body)?))?,
        None => builder.body(Body::empty())?,
    };

    let response = app.clone().oneshot(request).await?;
    let status = response.status();
    let bytes = response.into_body().collect().await?.to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)?
    };
    Ok((status, value))
}

#[tokio::test]
async fn test_health() -> Result<()> {
    let (app, _temp_dir) = create_test_app().await?;
    let (status, body) = send(&app, "GET", "/api/health", None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    Ok(())
}

#[tokio::test]
async fn test_devspec_project_flow() -> Result<()> {
    let (app, _temp_dir) = create_test_app().await?;

    let (status, project) =
        send(&app, "POST", "/api/devspec/projects", Some(json!({"name": "Shop"}))).await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(project["type"], "PROJECT");
    assert_eq!(project["status"], "TODO");
    assert_eq!(project["sortOrder"], 0);
    let project_id = project["id"].as_i64().expect("id");

    let (status, page) = send(
        &app,
        "POST",
        &format!("/api/devspec/projects/{project_id}/pages"),
        Some(json!({"name": "Cart"})),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(page["depth"], 1);
    let page_id = page["id"].as_i64().expect("id");

    let (status, _) = send(
        &app,
        "PUT",
        &format!("/api/devspec/{page_id}/status"),
        Some(json!({"status": "IN_PROGRESS"})),
    )
    .await?;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, tree) =
        send(&app, "GET", &format!("/api/devspec/projects/{project_id}/tree"), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(tree["children"][0]["name"], "Cart");
    assert_eq!(tree["children"][0]["status"], "IN_PROGRESS");

    let (status, detail) = send(&app, "GET", &format!("/api/devspec/{page_id}"), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["parentName"], "Shop");

    let (status, projects) = send(&app, "GET", "/api/devspec/projects", None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(projects.as_array().map(Vec::len), Some(1));

    let (status, _) = send(&app, "DELETE", &format!("/api/devspec/{project_id}"), None).await?;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, error) = send(&app, "GET", &format!("/api/devspec/{page_id}"), None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error["code"], "NOT_FOUND");
    Ok(())
}

#[tokio::test]
async fn test_devspec_validation_errors() -> Result<()> {
    let (app, _temp_dir) = create_test_app().await?;

    let (status, project) =
        send(&app, "POST", "/api/devspec/projects", Some(json!({"name": "Shop"}))).await?;
    assert_eq!(status, StatusCode::CREATED);
    let project_id = project["id"].as_i64().expect("id");

    let (status, error) =
        send(&app, "POST", "/api/devspec/projects", Some(json!({"name": "Shop"}))).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["code"], "VALIDATION_ERROR");

    let (status, _) =
        send(&app, "POST", "/api/devspec/projects", Some(json!({"name": "  "}))).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        "GET",
        &format!("/api/devspec/{project_id}/content/PDF"),
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, error) = send(
        &app,
        "PUT",
        &format!("/api/devspec/{project_id}/status"),
        Some(json!({"status": "ARCHIVED"})),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["code"], "INVALID_INPUT");

    let (status, _) = send(
        &app,
        "POST",
        "/api/devspec/projects/999/pages",
        Some(json!({"name": "Lost"})),
    )
    .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn test_content_and_note_sections() -> Result<()> {
    let (app, _temp_dir) = create_test_app().await?;
    let (_, project) =
        send(&app, "POST", "/api/devspec/projects", Some(json!({"name": "Shop"}))).await?;
    let id = project["id"].as_i64().expect("id");

    let (status, empty) = send(&app, "GET", &format!("/api/devspec/{id}/content/MMD"), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert!(empty["id"].is_null());
    assert_eq!(empty["contentType"], "MMD");

    let (status, saved) = send(
        &app,
        "PUT",
        &format!("/api/devspec/{id}/content/MMD"),
        Some(json!({"content": "graph TD; A-->B"})),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(saved["content"], "graph TD; A-->B");

    let mut ids = Vec::new();
    for title in ["one", "two", "three"] {
        let (status, section) = send(
            &app,
            "POST",
            &format!("/api/devspec/{id}/note-sections"),
            Some(json!({"title": title})),
        )
        .await?;
        assert_eq!(status, StatusCode::CREATED);
        ids.push(section["id"].as_i64().expect("id"));
    }

    let (status, reordered) = send(
        &app,
        "PUT",
        &format!("/api/devspec/{id}/note-sections/reorder"),
        Some(json!({"ids": [ids[2]]})),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    let titles: Vec<_> = reordered
        .as_array()
        .expect("array")
        .iter()
        .map(|s| s["title"].as_str().unwrap_or_default().to_string())
        .collect();
    assert_eq!(titles, vec!["three", "one", "two"]);

    let (status, updated) = send(
        &app,
        "PUT",
        &format!("/api/devspec/note-sections/{}", ids[0]),
        Some(json!({"content": "body"})),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["title"], "one");
    assert_eq!(updated["content"], "body");

    let (status, _) = send(&app, "DELETE", &format!("/api/devspec/note-sections/{}", ids[1]), None).await?;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, sections) = send(&app, "GET", &format!("/api/devspec/{id}/note-sections"), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(sections.as_array().map(Vec::len), Some(2));
    Ok(())
}

#[tokio::test]
async fn test_organization_flow() -> Result<()> {
    let (app, _temp_dir) = create_test_app().await?;

    let (status, root) = send(&app, "POST", "/api/organizations", Some(json!({"name": "HQ"}))).await?;
    assert_eq!(status, StatusCode::CREATED);
    let root_id = root["id"].as_i64().expect("id");

    let (status, team) = send(
        &app,
        "POST",
        &format!("/api/organizations/{root_id}/children"),
        Some(json!({"name": "Team"})),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED);
    let team_id = team["id"].as_i64().expect("id");

    let (status, user) = send(
        &app,
        "POST",
        "/api/organizations/members",
        Some(json!({"name": "Kim", "email": "kim@example.com"})),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(user["role"], "USER");
    let user_id = user["id"].as_i64().expect("id");

    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/organizations/{team_id}/members"),
        Some(json!({"userId": user_id})),
    )
    .await?;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_null());

    let (status, assigned) =
        send(&app, "GET", &format!("/api/organizations/members/{user_id}"), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(assigned["organizationId"], team_id);

    let (status, members) =
        send(&app, "GET", &format!("/api/organizations/{team_id}/members"), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(members[0]["id"], user_id);

    let (status, subtree) =
        send(&app, "GET", &format!("/api/organizations/{root_id}/tree"), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(subtree["id"], root_id);
    assert_eq!(subtree["children"][0]["members"][0]["id"], user_id);

    let (status, forest) = send(&app, "GET", "/api/organizations", None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(forest[0]["children"][0]["members"][0]["email"], "kim@example.com");

    let (status, promoted) = send(
        &app,
        "PUT",
        &format!("/api/organizations/members/{user_id}/role"),
        Some(json!({"role": "ADMIN"})),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(promoted["role"], "ADMIN");

    let (status, _) = send(&app, "DELETE", &format!("/api/organizations/{root_id}"), None).await?;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, unassigned) = send(&app, "GET", "/api/organizations/unassigned-users", None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(unassigned[0]["id"], user_id);

    let (status, _) = send(&app, "DELETE", "/api/organizations/members/999", None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) =
        send(&app, "GET", &format!("/api/organizations/{root_id}/tree"), None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) =
        send(&app, "GET", &format!("/api/organizations/{team_id}/members"), None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, error) = send(
        &app,
        "POST",
        "/api/organizations/members",
        Some(json!({"name": "Bad", "email": "not-an-email"})),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["code"], "VALIDATION_ERROR");
    Ok(())
}
