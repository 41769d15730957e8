use crate::db::{self, DocumentRepository};
use crate::quota;
use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "voicesop")]
#[command(about = "Voice recordings to structured SOP documents", long_about = None)]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<CliCommand>,
}

#[derive(Subcommand, Debug)]
pub enum CliCommand {
    /// Print version information
    Version,
    /// List documents for an account
    Documents {
        /// Account id to list for
        #[arg(long)]
        owner: String,
    },
    /// Show this month's document count for an account
    Quota {
        /// Account id to check
        #[arg(long)]
        owner: String,
    },
}

pub fn handle_documents_command(owner: &str) -> Result<()> {
    let conn = db::init_db()?;
    let documents = DocumentRepository::list_for_owner(&conn, owner, 100)?;

    if documents.is_empty() {
        println!("No documents for {owner}");
        return Ok(());
    }

    for doc in documents {
        println!(
            "{:>5}  {:<10}  {}  {}",
            doc.id, doc.status, doc.created_at, doc.title
        );
    }

    Ok(())
}

pub fn handle_quota_command(owner: &str) -> Result<()> {
    let conn = db::init_db()?;
    let since = quota::month_start_utc()
        .format("%Y-%m-%d %H:%M:%S")
        .to_string();
    let used = DocumentRepository::count_created_since(&conn, owner, &since)?;

    println!("{owner}: {used} document(s) created since {since} UTC");

    Ok(())
}
