//! Guestbook entry endpoints
//!
//! - `GET    /api/guestbook`      list, newest first
//! - `GET    /api/guestbook/{id}` single entry
//! - `POST   /api/guestbook`      create
//! - `DELETE /api/guestbook/{id}` delete

use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    Json,
};
use chrono::{DateTime, NaiveDateTime, Utc};
use guestbook_store::{Entry, NewEntry};
use serde::{Deserialize, Deserializer};

use crate::error::ApiError;
use crate::AppState;

/// Body of `POST /api/guestbook`
///
/// Missing fields deserialize to `None` so they fail validation the same way
/// blank ones do. Any client-supplied `id` is ignored.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEntryRequest {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub content: Option<String>,

    /// RFC 3339, or a zone-less `2024-05-01T12:00:00` read as UTC
    #[serde(default, deserialize_with = "deserialize_created_at")]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Timestamp {
    Zoned(DateTime<Utc>),
    Local(NaiveDateTime),
}

fn deserialize_created_at<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Timestamp>::deserialize(deserializer)?.map(|timestamp| match timestamp {
        Timestamp::Zoned(at) => at,
        Timestamp::Local(at) => at.and_utc(),
    }))
}

impl CreateEntryRequest {
    /// Check required fields in order, stopping at the first blank one.
    ///
    /// Values are stored as submitted; trimming is only used for the check.
    pub fn validate(self) -> Result<NewEntry, ApiError> {
        let name = non_blank(self.name).ok_or_else(|| ApiError::BadRequest("blank name".into()))?;
        let content =
            non_blank(self.content).ok_or_else(|| ApiError::BadRequest("blank content".into()))?;

        Ok(NewEntry {
            name,
            content,
            created_at: self.created_at,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Handler for `GET /api/guestbook`
pub async fn list(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Entry>>, ApiError> {
    let entries = state.repository.find_all_order_by_created_at_desc().await?;
    tracing::debug!("Listing {} guestbook entries", entries.len());
    Ok(Json(entries))
}

/// Handler for `GET /api/guestbook/{id}`
pub async fn get_entry(
    State(state): State<Arc<AppState>>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<Entry>, ApiError> {
    let Path(id) = id?;
    state
        .repository
        .find_by_id(id)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound(id))
}

/// Handler for `POST /api/guestbook`
pub async fn create(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateEntryRequest>, JsonRejection>,
) -> Result<Json<Entry>, ApiError> {
    let Json(request) = payload?;
    let entry = request.validate()?;

    let saved = state.repository.save(entry).await?;
    tracing::info!("Created guestbook entry {} by {:?}", saved.id, saved.name);
    Ok(Json(saved))
}

/// Handler for `DELETE /api/guestbook/{id}`
///
/// Existence is checked first because the store ignores unknown ids.
pub async fn delete(
    State(state): State<Arc<AppState>>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let Path(id) = id?;
    if !state.repository.exists_by_id(id).await? {
        return Err(ApiError::NotFound(id));
    }

    state.repository.delete_by_id(id).await?;
    tracing::info!("Deleted guestbook entry {}", id);
    Ok(StatusCode::OK)
}
