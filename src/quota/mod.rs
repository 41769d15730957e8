//! Monthly creation quota.
//!
//! Free-tier accounts get a fixed number of documents per calendar month;
//! unlimited-tier accounts always pass. The window opens at local midnight on
//! the first of the month. Clients may pre-check via the API, but the
//! generation pipeline re-evaluates independently; that check is the source
//! of truth.

use anyhow::Result;
use chrono::{DateTime, Datelike, Local, NaiveTime, TimeZone, Utc};
use rusqlite::Connection;
use serde::Serialize;

use crate::db::DocumentRepository;
use crate::identity::{Actor, Tier};

/// Snapshot of an actor's quota standing this month.
#[derive(Debug, Clone, Serialize)]
pub struct QuotaStatus {
    pub tier: &'static str,
    pub used: i64,
    /// None for unlimited tier.
    pub limit: Option<i64>,
    pub remaining: Option<i64>,
}

impl QuotaStatus {
    /// Whether a generation request should be refused.
    ///
    /// The count includes the subject draft itself, so the ceiling is
    /// strict-greater: with a limit of 3, three prior documents plus the
    /// draft under generation is the first refused request.
    pub fn exceeded(&self) -> bool {
        match self.limit {
            Some(limit) => self.used > limit,
            None => false,
        }
    }
}

/// First instant of the current calendar month (local clock), converted to
/// UTC to compare against SQLite CURRENT_TIMESTAMP columns.
pub fn month_start_utc() -> DateTime<Utc> {
    let today = Local::now().date_naive();
    let first = today
        .with_day(1)
        .unwrap_or(today)
        .and_time(NaiveTime::MIN);

    Local
        .from_local_datetime(&first)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| Utc.from_utc_datetime(&first))
}

/// Evaluate the actor's quota standing against the store.
pub fn evaluate(conn: &Connection, actor: &Actor, free_monthly_limit: i64) -> Result<QuotaStatus> {
    let since = month_start_utc().format("%Y-%m-%d %H:%M:%S").to_string();
    let used = DocumentRepository::count_created_since(conn, &actor.id, &since)?;

    let status = match actor.tier {
        Tier::Unlimited => QuotaStatus {
            tier: actor.tier.as_str(),
            used,
            limit: None,
            remaining: None,
        },
        Tier::Free => QuotaStatus {
            tier: actor.tier.as_str(),
            used,
            limit: Some(free_monthly_limit),
            remaining: Some((free_monthly_limit - used).max(0)),
        },
    };

    Ok(status)
}
