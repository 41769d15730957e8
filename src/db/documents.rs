//! SOP document persistence.
//!
//! CRUD operations for the `documents` table. Raw SQL with rusqlite, no ORM.
//! The draft → generating → complete status transition is guarded by
//! conditional updates so concurrent generation requests for the same
//! document cannot both win.

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};

use crate::sop::{DocumentStatus, SopContent, DRAFT_TAGS, DRAFT_TITLE, GENERATED_TAGS};

/// A document record from the database.
#[derive(Debug, Clone)]
pub struct DocumentRecord {
    pub id: i64,
    pub owner_id: String,
    pub title: String,
    pub status: String,
    pub content: Option<String>,
    pub tags: String,
    pub audio_path: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl DocumentRecord {
    /// Deserialize the stored content column, if present.
    pub fn content_value(&self) -> Result<Option<SopContent>> {
        match &self.content {
            Some(json) => {
                let content =
                    serde_json::from_str(json).context("Stored document content is not valid")?;
                Ok(Some(content))
            }
            None => Ok(None),
        }
    }

    pub fn tags_vec(&self) -> Vec<String> {
        serde_json::from_str(&self.tags).unwrap_or_default()
    }
}

const COLUMNS: &str =
    "id, owner_id, title, status, content, tags, audio_path, created_at, updated_at";

fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<DocumentRecord> {
    Ok(DocumentRecord {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        title: row.get(2)?,
        status: row.get(3)?,
        content: row.get(4)?,
        tags: row.get(5)?,
        audio_path: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

/// Repository for SOP document records.
pub struct DocumentRepository;

impl DocumentRepository {
    /// Insert a new draft document (placeholder title, no content).
    /// Returns the new document ID.
    pub fn insert_draft(
        conn: &Connection,
        owner_id: &str,
        audio_path: Option<&str>,
    ) -> Result<i64> {
        let tags = serde_json::to_string(DRAFT_TAGS)?;
        conn.execute(
            "INSERT INTO documents (owner_id, title, status, tags, audio_path)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                owner_id,
                DRAFT_TITLE,
                DocumentStatus::Draft.as_str(),
                tags,
                audio_path
            ],
        )
        .context("Failed to insert draft document")?;

        Ok(conn.last_insert_rowid())
    }

    /// Get a document by ID.
    pub fn get(conn: &Connection, id: i64) -> Result<Option<DocumentRecord>> {
        let record = conn
            .query_row(
                &format!("SELECT {COLUMNS} FROM documents WHERE id = ?1"),
                params![id],
                row_to_record,
            )
            .optional()
            .context("Failed to query document")?;

        Ok(record)
    }

    /// List an owner's documents, newest first.
    pub fn list_for_owner(
        conn: &Connection,
        owner_id: &str,
        limit: usize,
    ) -> Result<Vec<DocumentRecord>> {
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {COLUMNS} FROM documents
                 WHERE owner_id = ?1 ORDER BY created_at DESC, id DESC LIMIT ?2"
            ))
            .context("Failed to prepare documents list query")?;

        let rows = stmt
            .query_map(params![owner_id, limit as i64], row_to_record)
            .context("Failed to list documents")?;

        let mut documents = Vec::new();
        for row in rows {
            documents.push(row?);
        }

        Ok(documents)
    }

    /// Count documents an owner has created at or after `since`
    /// (UTC, `YYYY-MM-DD HH:MM:SS`, matching SQLite CURRENT_TIMESTAMP).
    pub fn count_created_since(conn: &Connection, owner_id: &str, since: &str) -> Result<i64> {
        let count = conn
            .query_row(
                "SELECT COUNT(*) FROM documents WHERE owner_id = ?1 AND created_at >= ?2",
                params![owner_id, since],
                |row| row.get(0),
            )
            .context("Failed to count documents")?;

        Ok(count)
    }

    /// Claim a draft for generation: draft → generating.
    ///
    /// Returns false when the document is not in draft state, meaning a
    /// concurrent request already claimed it or generation already completed.
    pub fn begin_generation(conn: &Connection, id: i64) -> Result<bool> {
        let affected = conn
            .execute(
                "UPDATE documents SET status = ?1, updated_at = CURRENT_TIMESTAMP
                 WHERE id = ?2 AND status = ?3",
                params![
                    DocumentStatus::Generating.as_str(),
                    id,
                    DocumentStatus::Draft.as_str()
                ],
            )
            .context("Failed to claim document for generation")?;

        Ok(affected == 1)
    }

    /// Write the generated content: title, content, tags and status change
    /// in a single statement.
    pub fn complete_generation(conn: &Connection, id: i64, content: &SopContent) -> Result<()> {
        let content_json = serde_json::to_string(content)?;
        let tags = serde_json::to_string(GENERATED_TAGS)?;

        conn.execute(
            "UPDATE documents SET title = ?1, content = ?2, tags = ?3, status = ?4,
             updated_at = CURRENT_TIMESTAMP WHERE id = ?5",
            params![
                content.title,
                content_json,
                tags,
                DocumentStatus::Complete.as_str(),
                id
            ],
        )
        .context("Failed to write generated content")?;

        Ok(())
    }

    /// Release a generation claim: generating → draft, content untouched.
    /// The draft-with-no-content state is the caller's retry signal.
    pub fn revert_to_draft(conn: &Connection, id: i64) -> Result<()> {
        conn.execute(
            "UPDATE documents SET status = ?1, updated_at = CURRENT_TIMESTAMP
             WHERE id = ?2 AND status = ?3",
            params![
                DocumentStatus::Draft.as_str(),
                id,
                DocumentStatus::Generating.as_str()
            ],
        )
        .context("Failed to revert document to draft")?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrate;
    use crate::sop::SopStep;

    fn setup_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();
        conn
    }

    fn sample_content() -> SopContent {
        SopContent {
            title: "SOP-001: Machine Startup".to_string(),
            purpose: "Start the machine safely".to_string(),
            scope: None,
            prerequisites: None,
            roles: None,
            steps: vec![SopStep {
                title: "Power on".to_string(),
                description: "Turn the main switch".to_string(),
                warning: None,
                checklist: None,
            }],
            glossary: None,
        }
    }

    #[test]
    fn test_insert_draft() {
        let conn = setup_db();
        let id = DocumentRepository::insert_draft(&conn, "alice", None).unwrap();
        assert!(id > 0);

        let doc = DocumentRepository::get(&conn, id).unwrap().unwrap();
        assert_eq!(doc.owner_id, "alice");
        assert_eq!(doc.title, DRAFT_TITLE);
        assert_eq!(doc.status, "draft");
        assert!(doc.content.is_none());
        assert_eq!(doc.tags_vec(), vec!["Draft"]);
    }

    #[test]
    fn test_get_nonexistent_document() {
        let conn = setup_db();
        assert!(DocumentRepository::get(&conn, 9999).unwrap().is_none());
    }

    #[test]
    fn test_begin_generation_claims_draft_once() {
        let conn = setup_db();
        let id = DocumentRepository::insert_draft(&conn, "alice", None).unwrap();

        assert!(DocumentRepository::begin_generation(&conn, id).unwrap());
        // Second claim loses: the document is no longer a draft.
        assert!(!DocumentRepository::begin_generation(&conn, id).unwrap());

        let doc = DocumentRepository::get(&conn, id).unwrap().unwrap();
        assert_eq!(doc.status, "generating");
    }

    #[test]
    fn test_complete_generation_writes_everything_together() {
        let conn = setup_db();
        let id = DocumentRepository::insert_draft(&conn, "alice", None).unwrap();
        DocumentRepository::begin_generation(&conn, id).unwrap();

        let content = sample_content();
        DocumentRepository::complete_generation(&conn, id, &content).unwrap();

        let doc = DocumentRepository::get(&conn, id).unwrap().unwrap();
        assert_eq!(doc.status, "complete");
        assert_eq!(doc.title, "SOP-001: Machine Startup");
        assert_eq!(doc.tags_vec(), vec!["Generated", "AI"]);
        assert_eq!(doc.content_value().unwrap().unwrap(), content);
    }

    #[test]
    fn test_revert_to_draft_keeps_content_absent() {
        let conn = setup_db();
        let id = DocumentRepository::insert_draft(&conn, "alice", None).unwrap();
        DocumentRepository::begin_generation(&conn, id).unwrap();
        DocumentRepository::revert_to_draft(&conn, id).unwrap();

        let doc = DocumentRepository::get(&conn, id).unwrap().unwrap();
        assert_eq!(doc.status, "draft");
        assert!(doc.content.is_none());

        // A reverted draft can be claimed again.
        assert!(DocumentRepository::begin_generation(&conn, id).unwrap());
    }

    #[test]
    fn test_revert_does_not_touch_completed_documents() {
        let conn = setup_db();
        let id = DocumentRepository::insert_draft(&conn, "alice", None).unwrap();
        DocumentRepository::begin_generation(&conn, id).unwrap();
        DocumentRepository::complete_generation(&conn, id, &sample_content()).unwrap();

        DocumentRepository::revert_to_draft(&conn, id).unwrap();
        let doc = DocumentRepository::get(&conn, id).unwrap().unwrap();
        assert_eq!(doc.status, "complete");
    }

    #[test]
    fn test_count_created_since_filters_by_owner() {
        let conn = setup_db();
        DocumentRepository::insert_draft(&conn, "alice", None).unwrap();
        DocumentRepository::insert_draft(&conn, "alice", None).unwrap();
        DocumentRepository::insert_draft(&conn, "bob", None).unwrap();

        let count =
            DocumentRepository::count_created_since(&conn, "alice", "2000-01-01 00:00:00").unwrap();
        assert_eq!(count, 2);

        let future =
            DocumentRepository::count_created_since(&conn, "alice", "2999-01-01 00:00:00").unwrap();
        assert_eq!(future, 0);
    }

    #[test]
    fn test_list_for_owner() {
        let conn = setup_db();
        DocumentRepository::insert_draft(&conn, "alice", None).unwrap();
        DocumentRepository::insert_draft(&conn, "alice", Some("/tmp/a.wav")).unwrap();
        DocumentRepository::insert_draft(&conn, "bob", None).unwrap();

        let docs = DocumentRepository::list_for_owner(&conn, "alice", 10).unwrap();
        assert_eq!(docs.len(), 2);
        // Newest first
        assert_eq!(docs[0].audio_path.as_deref(), Some("/tmp/a.wav"));
    }
}
