//! Document CRUD endpoints. All owner-scoped: a document you don't own is
//! first a 404 if it doesn't exist, then a 403 if it isn't yours.

use axum::{
    extract::{Path, State},
    http::HeaderMap,
    response::Json,
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use tracing::{info, warn};
use uuid::Uuid;

use crate::api::error::{ApiError, ApiResult};
use crate::api::{bearer_token, ApiState};
use crate::db::{self, DocumentRecord, DocumentRepository};
use crate::global;

use super::session::SessionCommand;

const LIST_LIMIT: usize = 100;

#[derive(Debug, Default, serde::Deserialize)]
pub struct CreateDocumentRequest {
    /// Take the completed capture from the recording session: archive its
    /// audio and seed the draft with it.
    #[serde(default)]
    pub from_session: bool,
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/documents", post(create_document).get(list_documents))
        .route("/documents/:id", get(get_document))
        .with_state(state)
}

fn document_json(doc: &DocumentRecord) -> Value {
    let content: Option<Value> = doc
        .content
        .as_deref()
        .and_then(|c| serde_json::from_str(c).ok());

    json!({
        "id": doc.id,
        "owner_id": doc.owner_id,
        "title": doc.title,
        "status": doc.status,
        "content": content,
        "tags": doc.tags_vec(),
        "audio_path": doc.audio_path,
        "created_at": doc.created_at,
        "updated_at": doc.updated_at,
    })
}

async fn create_document(
    State(state): State<ApiState>,
    headers: HeaderMap,
    body: Option<Json<CreateDocumentRequest>>,
) -> ApiResult<Json<Value>> {
    let actor = state
        .identity
        .authenticate(bearer_token(&headers))
        .ok_or_else(ApiError::unauthorized)?;

    let request = body.map(|Json(r)| r).unwrap_or_default();

    let (audio_path, transcript) = if request.from_session {
        let capture = state.session.dispatch(SessionCommand::Finish).await?;
        let dir = global::recordings_dir()?;
        let path = archive_audio(&dir, &capture.audio.bytes, capture.audio.mime_type).await?;
        (Some(path), Some(capture.transcript))
    } else {
        (None, None)
    };

    let conn = db::init_db()?;
    let id = insert_draft_or_discard(&conn, &actor.id, audio_path.as_deref()).await?;

    info!("Created draft document {} for {}", id, actor.id);

    Ok(Json(json!({
        "success": true,
        "id": id,
        "transcript": transcript,
        "audio_path": audio_path,
    })))
}

/// Write the sealed recording under the given directory, uuid filename.
async fn archive_audio(dir: &std::path::Path, bytes: &[u8], mime_type: &str) -> ApiResult<String> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to create recordings dir: {e}")))?;

    let ext = match mime_type {
        "audio/wav" => "wav",
        "audio/webm" => "webm",
        _ => "bin",
    };
    let path = dir.join(format!("{}.{}", Uuid::new_v4(), ext));

    tokio::fs::write(&path, bytes)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to archive recording: {e}")))?;

    Ok(path.to_string_lossy().to_string())
}

/// Insert the draft; if the insert fails, remove the already-archived
/// recording so no unreferenced file is left behind.
// Written as a plain fn returning a future so the `&Connection` (not `Sync`)
// is released before the await, keeping the handler future `Send`.
fn insert_draft_or_discard<'a>(
    conn: &rusqlite::Connection,
    owner_id: &str,
    audio_path: Option<&'a str>,
) -> impl std::future::Future<Output = ApiResult<i64>> + Send + 'a {
    let result = DocumentRepository::insert_draft(conn, owner_id, audio_path);
    async move {
        match result {
            Ok(id) => Ok(id),
            Err(e) => {
                if let Some(path) = audio_path {
                    if let Err(rm) = tokio::fs::remove_file(path).await {
                        warn!("Failed to remove orphaned recording {}: {}", path, rm);
                    }
                }
                Err(e.into())
            }
        }
    }
}

async fn list_documents(
    State(state): State<ApiState>,
    headers: HeaderMap,
) -> ApiResult<Json<Value>> {
    let actor = state
        .identity
        .authenticate(bearer_token(&headers))
        .ok_or_else(ApiError::unauthorized)?;

    let conn = db::init_db()?;
    let documents = DocumentRepository::list_for_owner(&conn, &actor.id, LIST_LIMIT)?;

    Ok(Json(json!({
        "documents": documents.iter().map(document_json).collect::<Vec<_>>(),
    })))
}

async fn get_document(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> ApiResult<Json<Value>> {
    let actor = state
        .identity
        .authenticate(bearer_token(&headers))
        .ok_or_else(ApiError::unauthorized)?;

    let conn = db::init_db()?;
    let doc = DocumentRepository::get(&conn, id)?
        .ok_or_else(|| ApiError::not_found("Document not found"))?;

    if doc.owner_id != actor.id {
        return Err(ApiError::forbidden("You do not own this document"));
    }

    Ok(Json(document_json(&doc)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrate;
    use rusqlite::Connection;

    #[tokio::test]
    async fn test_archived_audio_survives_successful_insert() {
        let dir = tempfile::tempdir().unwrap();
        let path = archive_audio(dir.path(), b"RIFF", "audio/wav").await.unwrap();
        assert!(path.ends_with(".wav"));

        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();

        let id = insert_draft_or_discard(&conn, "alice", Some(&path))
            .await
            .unwrap();
        assert!(std::path::Path::new(&path).exists());

        let doc = DocumentRepository::get(&conn, id).unwrap().unwrap();
        assert_eq!(doc.audio_path.as_deref(), Some(path.as_str()));
    }

    #[tokio::test]
    async fn test_failed_insert_removes_archived_audio() {
        let dir = tempfile::tempdir().unwrap();
        let path = archive_audio(dir.path(), b"RIFF", "audio/wav").await.unwrap();
        assert!(std::path::Path::new(&path).exists());

        // No schema: the insert fails after the recording hit disk.
        let conn = Connection::open_in_memory().unwrap();
        let err = insert_draft_or_discard(&conn, "alice", Some(&path)).await;
        assert!(err.is_err());
        assert!(!std::path::Path::new(&path).exists());
    }

    #[tokio::test]
    async fn test_unknown_mime_falls_back_to_bin() {
        let dir = tempfile::tempdir().unwrap();
        let path = archive_audio(dir.path(), b"data", "audio/ogg").await.unwrap();
        assert!(path.ends_with(".bin"));
    }
}
