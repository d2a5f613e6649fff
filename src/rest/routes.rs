//! Document/version route handlers.
//!
//! Response shapes are part of the client contract: the parent-document field
//! is serialized as `patent_parent`, and creation timestamps on the wire use
//! minute precision (`YYYY-MM-DD HH:MM`).

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::storage::StoreError;
use crate::AppContext;

type RouteError = (StatusCode, Json<Value>);

/// Map store errors onto HTTP responses. Not-found is the only store error a
/// client is meant to act on; everything else is an opaque 500.
fn store_error(e: StoreError) -> RouteError {
    match e {
        StoreError::DocumentNotFound(_) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "detail": "Document not found" })),
        ),
        StoreError::VersionNotFound(_) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "detail": "Version not found" })),
        ),
        other => {
            tracing::error!(err = %other, "store error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "detail": "Internal error" })),
            )
        }
    }
}

#[derive(Deserialize)]
pub struct ContentBody {
    pub content: String,
}

pub async fn get_document(
    State(ctx): State<Arc<AppContext>>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, RouteError> {
    let document = ctx.storage.get_document(id).await.map_err(store_error)?;
    Ok(Json(json!({
        "id": document.id,
        "content": document.content,
    })))
}

pub async fn save_document(
    State(ctx): State<Arc<AppContext>>,
    Path(id): Path<i64>,
    Json(body): Json<ContentBody>,
) -> Result<Json<Value>, RouteError> {
    ctx.storage
        .save_document_content(id, &body.content)
        .await
        .map_err(store_error)?;
    Ok(Json(json!({
        "document_id": id,
        "content": body.content,
    })))
}

pub async fn create_version(
    State(ctx): State<Arc<AppContext>>,
    Path(id): Path<i64>,
    Json(body): Json<ContentBody>,
) -> Result<Json<Value>, RouteError> {
    let version = ctx
        .storage
        .create_version(id, &body.content)
        .await
        .map_err(store_error)?;
    Ok(Json(json!({
        "message": "New version created",
        "version_id": version.id,
        "created_at": version.created_at_display(),
    })))
}

pub async fn save_version(
    State(ctx): State<Arc<AppContext>>,
    Path((_id, vid)): Path<(i64, i64)>,
    Json(body): Json<ContentBody>,
) -> Result<Json<Value>, RouteError> {
    let version = ctx
        .storage
        .update_version_content(vid, &body.content)
        .await
        .map_err(store_error)?;
    Ok(Json(json!({
        "version_id": version.id,
        "content": version.content,
    })))
}

pub async fn list_versions(
    State(ctx): State<Arc<AppContext>>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, RouteError> {
    let versions = ctx
        .storage
        .list_versions_for_document(id)
        .await
        .map_err(store_error)?;
    let list: Vec<Value> = versions
        .iter()
        .map(|v| {
            json!({
                "id": v.id,
                "created_at": v.created_at,
                "patent_parent": v.parent_document_id,
            })
        })
        .collect();
    Ok(Json(json!({
        "document_id": id,
        "versions": list,
    })))
}

pub async fn all_versions(
    State(ctx): State<Arc<AppContext>>,
) -> Result<Json<Value>, RouteError> {
    let grouped = ctx
        .storage
        .list_all_versions_grouped()
        .await
        .map_err(store_error)?;
    let mut out = serde_json::Map::new();
    for (document_id, versions) in grouped {
        let list: Vec<Value> = versions
            .iter()
            .map(|v| {
                json!({
                    "id": v.id,
                    "created_at": v.created_at_display(),
                    "patent_parent": v.parent_document_id,
                })
            })
            .collect();
        out.insert(document_id.to_string(), Value::Array(list));
    }
    Ok(Json(Value::Object(out)))
}

pub async fn get_version(
    State(ctx): State<Arc<AppContext>>,
    Path((id, vid)): Path<(i64, i64)>,
) -> Result<Json<Value>, RouteError> {
    let version = ctx.storage.get_version(vid).await.map_err(store_error)?;
    Ok(Json(json!({
        "document_id": id,
        "version_id": version.id,
        "content": version.content,
        "created_at": version.created_at_display(),
        "patent_parent": version.parent_document_id,
        "id": version.id,
    })))
}

pub async fn delete_version(
    State(ctx): State<Arc<AppContext>>,
    Path((_id, vid)): Path<(i64, i64)>,
) -> Result<Json<Value>, RouteError> {
    ctx.storage.delete_version(vid).await.map_err(store_error)?;
    Ok(Json(json!({
        "message": format!("Version {vid} deleted successfully"),
    })))
}
