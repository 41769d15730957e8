//! The generation endpoint: transcript in, structured SOP out.

use axum::{extract::State, http::HeaderMap, response::Json, routing::post, Router};
use serde_json::{json, Value};
use tracing::info;

use crate::api::error::ApiResult;
use crate::api::{bearer_token, ApiState};
use crate::db;

#[derive(Debug, Default, serde::Deserialize)]
pub struct GenerateRequest {
    pub document_id: Option<i64>,
    pub transcript: Option<String>,
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/generate", post(generate))
        .with_state(state)
}

async fn generate(
    State(state): State<ApiState>,
    headers: HeaderMap,
    body: Option<Json<GenerateRequest>>,
) -> ApiResult<Json<Value>> {
    let actor = state.identity.authenticate(bearer_token(&headers));
    let request = body.map(|Json(r)| r).unwrap_or_default();

    info!(
        "Generate requested for document {:?} by {:?}",
        request.document_id,
        actor.as_ref().map(|a| a.id.as_str())
    );

    // Exclusive borrow: rusqlite's Connection is Send but not Sync, and a
    // shared borrow held across the model await would make this future
    // unspawnable.
    let mut conn = db::init_db()?;
    let content = state
        .generator
        .generate_and_store(
            &mut conn,
            actor.as_ref(),
            request.document_id,
            request.transcript.as_deref(),
        )
        .await?;

    Ok(Json(json!({
        "success": true,
        "document_id": request.document_id,
        "sop": content,
    })))
}
