//! Advisory quota endpoint.
//!
//! Lets a client warn the user (or show the upgrade screen) before a
//! recording even starts. The generation pipeline re-checks independently;
//! this endpoint is a convenience, never the enforcement point.

use axum::{extract::State, http::HeaderMap, response::Json, routing::get, Router};
use serde_json::{json, Value};

use crate::api::error::{ApiError, ApiResult};
use crate::api::{bearer_token, ApiState};
use crate::{db, quota};

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/quota", get(quota_status))
        .with_state(state)
}

async fn quota_status(State(state): State<ApiState>, headers: HeaderMap) -> ApiResult<Json<Value>> {
    let actor = state
        .identity
        .authenticate(bearer_token(&headers))
        .ok_or_else(ApiError::unauthorized)?;

    let conn = db::init_db()?;
    let status = quota::evaluate(&conn, &actor, state.free_monthly_limit)?;

    Ok(Json(json!({
        "tier": status.tier,
        "used": status.used,
        "limit": status.limit,
        "remaining": status.remaining,
        "exceeded": status.exceeded(),
    })))
}
