//! History persistence
//!
//! Inference never writes history itself; callers hand each result to a
//! [`HistoryRecorder`]. [`SqliteHistory`] is the SQLite-backed recorder used
//! by the HTTP server.

use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use super::types::{HistoryEntry, HistoryPage, NewHistoryEntry};
use crate::error::{Result, SpamError};
use crate::model::types::Label;

/// Sink for classification results
#[async_trait::async_trait]
pub trait HistoryRecorder: Send + Sync {
    async fn record(&self, entry: NewHistoryEntry) -> Result<HistoryEntry>;
}

type EntryRow = (String, Option<String>, String, String, f64, String);

pub struct SqliteHistory {
    db: SqlitePool,
}

impl SqliteHistory {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Initialize database tables
    pub async fn init_db(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS email_checks (
                id TEXT PRIMARY KEY,
                owner TEXT,
                email_content TEXT NOT NULL,
                result TEXT NOT NULL,
                probability REAL NOT NULL,
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.db)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_email_checks_owner ON email_checks(owner, created_at)",
        )
        .execute(&self.db)
        .await?;

        Ok(())
    }

    pub async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.db).await?;
        Ok(())
    }

    /// Entries for `owner` (None = anonymous checks), newest first
    pub async fn list(&self, owner: Option<&str>, limit: i64, offset: i64) -> Result<Vec<HistoryEntry>> {
        let rows = sqlx::query_as::<_, EntryRow>(
            r#"
            SELECT id, owner, email_content, result, probability, created_at
            FROM email_checks
            WHERE owner IS ?
            ORDER BY created_at DESC, rowid DESC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(owner)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(entry_from_row).collect()
    }

    pub async fn count(&self, owner: Option<&str>) -> Result<i64> {
        let (count,) = sqlx::query_as::<_, (i64,)>("SELECT COUNT(*) FROM email_checks WHERE owner IS ?")
            .bind(owner)
            .fetch_one(&self.db)
            .await?;
        Ok(count)
    }

    pub async fn page(&self, owner: Option<&str>, limit: i64, offset: i64) -> Result<HistoryPage> {
        Ok(HistoryPage {
            entries: self.list(owner, limit, offset).await?,
            total: self.count(owner).await?,
            limit,
            offset,
        })
    }

    pub async fn get(&self, id: &str) -> Result<Option<HistoryEntry>> {
        let row = sqlx::query_as::<_, EntryRow>(
            "SELECT id, owner, email_content, result, probability, created_at FROM email_checks WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        row.map(entry_from_row).transpose()
    }

    /// Delete an entry belonging to `owner`
    pub async fn delete(&self, id: &str, owner: Option<&str>) -> Result<()> {
        let result = sqlx::query("DELETE FROM email_checks WHERE id = ? AND owner IS ?")
            .bind(id)
            .bind(owner)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(SpamError::NotFound(format!("history entry {}", id)));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl HistoryRecorder for SqliteHistory {
    async fn record(&self, entry: NewHistoryEntry) -> Result<HistoryEntry> {
        let id = Uuid::new_v4().to_string();
        let created_at = Utc::now();

        sqlx::query(
            "INSERT INTO email_checks (id, owner, email_content, result, probability, created_at) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(&entry.owner)
        .bind(&entry.email_content)
        .bind(entry.result.as_str())
        .bind(entry.probability)
        .bind(format_timestamp(&created_at))
        .execute(&self.db)
        .await?;

        debug!("Recorded history entry {} ({})", id, entry.result);

        Ok(HistoryEntry {
            id,
            owner: entry.owner,
            email_content: entry.email_content,
            result: entry.result,
            probability: entry.probability,
            created_at,
        })
    }
}

/// Fixed-width RFC 3339 so text ordering matches time ordering
fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn entry_from_row(row: EntryRow) -> Result<HistoryEntry> {
    let (id, owner, email_content, result, probability, created_at) = row;
    let result: Label = result.parse()?;
    let created_at = DateTime::parse_from_rfc3339(&created_at)
        .map_err(|e| SpamError::Serialization(format!("bad created_at {:?}: {}", created_at, e)))?
        .with_timezone(&Utc);

    Ok(HistoryEntry {
        id,
        owner,
        email_content,
        result,
        probability,
        created_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn setup_test_db() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        let history = SqliteHistory::new(pool.clone());
        history.init_db().await.unwrap();
        pool
    }

    fn entry(owner: Option<&str>, text: &str, result: Label) -> NewHistoryEntry {
        NewHistoryEntry {
            owner: owner.map(String::from),
            email_content: text.to_string(),
            result,
            probability: 87.5,
        }
    }

    #[tokio::test]
    async fn test_record_and_get() {
        let history = SqliteHistory::new(setup_test_db().await);

        let stored = history
            .record(entry(Some("alice"), "Claim your prize", Label::Spam))
            .await
            .unwrap();

        let fetched = history.get(&stored.id).await.unwrap().unwrap();
        assert_eq!(fetched.owner.as_deref(), Some("alice"));
        assert_eq!(fetched.result, Label::Spam);
        assert_eq!(fetched.probability, 87.5);
        assert_eq!(fetched.email_content, "Claim your prize");
        assert!(history.get("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_is_per_owner_and_newest_first() {
        let history = SqliteHistory::new(setup_test_db().await);

        for i in 0..3 {
            history
                .record(entry(Some("alice"), &format!("message {}", i), Label::Ham))
                .await
                .unwrap();
        }
        history.record(entry(Some("bob"), "other", Label::Spam)).await.unwrap();
        history.record(entry(None, "anonymous", Label::Ham)).await.unwrap();

        let alice = history.list(Some("alice"), 10, 0).await.unwrap();
        assert_eq!(alice.len(), 3);
        assert_eq!(alice[0].email_content, "message 2");
        assert_eq!(alice[2].email_content, "message 0");

        let page = history.list(Some("alice"), 2, 2).await.unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].email_content, "message 0");

        assert_eq!(history.count(Some("alice")).await.unwrap(), 3);
        assert_eq!(history.count(Some("bob")).await.unwrap(), 1);
        assert_eq!(history.count(None).await.unwrap(), 1);

        let anonymous = history.page(None, 10, 0).await.unwrap();
        assert_eq!(anonymous.total, 1);
        assert_eq!(anonymous.entries[0].email_content, "anonymous");
    }

    #[tokio::test]
    async fn test_delete_checks_owner() {
        let history = SqliteHistory::new(setup_test_db().await);
        let stored = history.record(entry(Some("alice"), "hi", Label::Ham)).await.unwrap();

        assert!(matches!(
            history.delete(&stored.id, Some("bob")).await,
            Err(SpamError::NotFound(_))
        ));
        history.delete(&stored.id, Some("alice")).await.unwrap();
        assert!(history.get(&stored.id).await.unwrap().is_none());
    }
}
