use anyhow::{Context, Result};
use rusqlite::Connection;

pub mod documents;

pub use documents::{DocumentRecord, DocumentRepository};

pub fn init_db() -> Result<Connection> {
    let db_path = crate::global::db_file()?;

    // Ensure parent directory exists
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent).context("Failed to create database directory")?;
    }

    let conn = Connection::open(&db_path).context("Failed to open database connection")?;

    migrate(&conn)?;

    Ok(conn)
}

pub fn migrate(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS documents (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            owner_id TEXT NOT NULL,
            title TEXT NOT NULL,
            status TEXT NOT NULL,
            content TEXT,
            tags TEXT NOT NULL,
            audio_path TEXT,
            created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )
    .context("Failed to create documents table")?;

    // Quota counting filters by owner and creation month
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_documents_owner_created
         ON documents(owner_id, created_at)",
        [],
    )
    .context("Failed to create index on owner_id, created_at")?;

    Ok(())
}
