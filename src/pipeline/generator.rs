//! Generate-and-store: transcript in, validated persisted document out.
//!
//! Preconditions are hard gates checked in order; the first failure wins and
//! nothing downstream runs, so the model is never invoked and storage is
//! never touched after a failed gate. Once the draft is claimed,
//! every failure path releases the claim so the document returns to the
//! recoverable draft-without-content state.

use rusqlite::Connection;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::db::DocumentRepository;
use crate::identity::Actor;
use crate::model::SopModel;
use crate::quota;
use crate::sop::SopContent;

use super::error::GenerateError;
use super::{parse, prompt};

/// Transcripts of this many characters or fewer are rejected before any
/// processing. Counted in characters, not bytes.
pub const MIN_TRANSCRIPT_LEN: usize = 10;

pub struct SopGenerator {
    model: Arc<dyn SopModel>,
    free_monthly_limit: i64,
}

impl SopGenerator {
    pub fn new(model: Arc<dyn SopModel>, free_monthly_limit: i64) -> Self {
        Self {
            model,
            free_monthly_limit,
        }
    }

    /// Run the full pipeline for one request.
    ///
    /// Exactly one document write happens on success (title, content and
    /// tags together); failures after the claim revert the status and leave
    /// content absent.
    pub async fn generate_and_store(
        &self,
        conn: &mut Connection,
        actor: Option<&Actor>,
        document_id: Option<i64>,
        transcript: Option<&str>,
    ) -> Result<SopContent, GenerateError> {
        let document_id = document_id.ok_or(GenerateError::MissingParameter("document_id"))?;
        let actor = actor.ok_or(GenerateError::Unauthorized)?;

        let document = DocumentRepository::get(conn, document_id)
            .map_err(|e| GenerateError::Persistence(e.to_string()))?
            .ok_or(GenerateError::NotFound)?;

        if document.owner_id != actor.id {
            return Err(GenerateError::Forbidden);
        }

        let quota_status = quota::evaluate(conn, actor, self.free_monthly_limit)
            .map_err(|e| GenerateError::Persistence(e.to_string()))?;
        if quota_status.exceeded() {
            info!(
                "Quota refusal for {}: {} used this month",
                actor.id, quota_status.used
            );
            return Err(GenerateError::QuotaExceeded);
        }

        let transcript = transcript
            .map(str::trim)
            .filter(|t| t.chars().count() > MIN_TRANSCRIPT_LEN)
            .ok_or(GenerateError::InvalidInput(
                "transcript is missing or too short",
            ))?;

        // Claim the draft so concurrent requests for the same document
        // cannot both reach the model and race on the final write.
        let claimed = DocumentRepository::begin_generation(conn, document_id)
            .map_err(|e| GenerateError::Persistence(e.to_string()))?;
        if !claimed {
            return Err(GenerateError::Conflict);
        }

        let result = self.run_claimed(conn, document_id, transcript).await;

        if result.is_err() {
            if let Err(e) = DocumentRepository::revert_to_draft(conn, document_id) {
                error!(
                    "Failed to release generation claim on document {}: {}",
                    document_id, e
                );
            }
        }

        result
    }

    /// Model call, parse, persist. Runs only while the claim is held.
    ///
    /// Takes the connection exclusively: a shared `&Connection` held across
    /// the model await would make the future `!Send`.
    async fn run_claimed(
        &self,
        conn: &mut Connection,
        document_id: i64,
        transcript: &str,
    ) -> Result<SopContent, GenerateError> {
        let prompt = prompt::build_prompt(transcript);

        info!(
            "Generating SOP for document {} via {} ({} transcript chars)",
            document_id,
            self.model.name(),
            transcript.len()
        );

        let raw = self.model.generate(&prompt).await.map_err(|e| {
            warn!("Model invocation failed: {}", e);
            GenerateError::ModelUnavailable(e.to_string())
        })?;

        let content = parse::parse_response(&raw)?;

        DocumentRepository::complete_generation(conn, document_id, &content).map_err(|e| {
            // The model's work is wasted here; log distinctly from parse failures.
            error!(
                "Persistence failed after successful generation for document {}: {}",
                document_id, e
            );
            GenerateError::Persistence(e.to_string())
        })?;

        info!(
            "Document {} generated: \"{}\", {} steps",
            document_id,
            content.title,
            content.steps.len()
        );

        Ok(content)
    }
}
