//! REST API server for VoiceSOP.
//!
//! Provides HTTP endpoints for:
//! - Recording session control (start, stop, reset, pause, status)
//! - Draft document creation and owner-scoped reads
//! - SOP generation from a transcript
//! - Advisory quota checks

pub mod error;
pub mod routes;

use crate::config::Config;
use crate::identity::IdentityProvider;
use crate::pipeline::SopGenerator;
use anyhow::Result;
use axum::http::{header, HeaderMap};
use axum::{response::Json, routing::get, Router};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceBuilder;
use tracing::info;

pub use error::{ApiError, ApiResult};
pub use routes::session::{SessionApiState, SessionCommand};

/// Shared state for the authenticated document/generation routes.
#[derive(Clone)]
pub struct ApiState {
    pub identity: Arc<dyn IdentityProvider>,
    pub generator: Arc<SopGenerator>,
    pub session: SessionApiState,
    pub free_monthly_limit: i64,
}

/// Extract the bearer token from an Authorization header, if any.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

pub struct ApiServer {
    bind: String,
    port: u16,
    state: ApiState,
}

impl ApiServer {
    pub fn new(state: ApiState, config: &Config) -> Self {
        Self {
            bind: config.server.bind.clone(),
            port: config.server.port,
            state,
        }
    }

    pub async fn start(self) -> Result<()> {
        let session_state = self.state.session.clone();

        let app = Router::new()
            .route("/", get(status))
            .route("/version", get(version))
            .merge(routes::session::router(session_state))
            .merge(routes::documents::router(self.state.clone()))
            .merge(routes::generate::router(self.state.clone()))
            .merge(routes::quota::router(self.state))
            .layer(ServiceBuilder::new());

        let listener =
            tokio::net::TcpListener::bind(&format!("{}:{}", self.bind, self.port)).await?;

        info!("API server listening on http://{}:{}", self.bind, self.port);
        info!("Endpoints:");
        info!("  GET  /                   - Service info");
        info!("  POST /session/start      - Start recording");
        info!("  POST /session/stop       - Stop recording, freeze transcript");
        info!("  POST /session/reset      - Discard capture, back to idle");
        info!("  POST /session/pause      - Pause the elapsed counter");
        info!("  POST /session/resume     - Resume the elapsed counter");
        info!("  POST /session/transcript - Edit the frozen transcript");
        info!("  GET  /session/status     - Session snapshot");
        info!("  POST /documents          - Create a draft (optionally from the session)");
        info!("  GET  /documents          - List your documents");
        info!("  GET  /documents/:id      - Get one document");
        info!("  POST /generate           - Generate SOP content for a draft");
        info!("  GET  /quota              - Advisory monthly quota status");

        axum::serve(listener, app).await?;

        Ok(())
    }
}

async fn status() -> Json<Value> {
    Json(json!({
        "service": "voicesop",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running"
    }))
}

async fn version() -> Json<Value> {
    Json(json!({
        "version": env!("CARGO_PKG_VERSION"),
        "name": "voicesop"
    }))
}
