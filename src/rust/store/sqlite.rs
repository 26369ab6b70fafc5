use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, Row, ToSql};

use super::{CommentId, CommentStore, FlaggedComment, NewFlaggedComment, StoreError, StoreResult};
use crate::scorer::{Category, SeverityScores};

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS flagged_comments (
        seq INTEGER PRIMARY KEY AUTOINCREMENT,
        id TEXT NOT NULL UNIQUE,
        comment_text TEXT NOT NULL,
        severity_scores TEXT NOT NULL,
        predicted_category TEXT NOT NULL,
        timestamp TEXT NOT NULL,
        alert_triggered INTEGER NOT NULL DEFAULT 0
    );
    CREATE INDEX IF NOT EXISTS idx_flagged_comments_timestamp
        ON flagged_comments (timestamp);
    CREATE INDEX IF NOT EXISTS idx_flagged_comments_category
        ON flagged_comments (predicted_category);
";

const SELECT_COLUMNS: &str =
    "id, comment_text, severity_scores, predicted_category, timestamp, alert_triggered";

/// SQLite-backed store.
///
/// Severity scores are kept as a JSON document per row. Timestamps are
/// fixed-width RFC 3339 UTC strings so that text order matches time order.
/// Every statement runs on the blocking thread pool.
#[derive(Debug)]
pub struct SqliteCommentStore {
    conn: Arc<Mutex<Connection>>,
}

fn backend_err(context: &str, e: impl std::fmt::Display) -> StoreError {
    StoreError::Backend(format!("{context}: {e}"))
}

fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn lock_conn(conn: &Mutex<Connection>) -> StoreResult<MutexGuard<'_, Connection>> {
    conn.lock()
        .map_err(|_| StoreError::Backend("connection mutex poisoned".into()))
}

/// Raw column values, decoded outside the rusqlite row callback so decode
/// failures surface as [`StoreError::Serialization`].
struct RawRow {
    id: String,
    comment_text: String,
    severity_scores: String,
    predicted_category: String,
    timestamp: String,
    alert_triggered: bool,
}

impl RawRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            comment_text: row.get(1)?,
            severity_scores: row.get(2)?,
            predicted_category: row.get(3)?,
            timestamp: row.get(4)?,
            alert_triggered: row.get::<_, i64>(5)? != 0,
        })
    }

    fn decode(self) -> StoreResult<FlaggedComment> {
        let id = self.id.parse::<CommentId>()
            .map_err(|e| StoreError::Serialization(format!("id {}: {}", self.id, e)))?;
        let severity_scores: SeverityScores = serde_json::from_str(&self.severity_scores)
            .map_err(|e| StoreError::Serialization(format!("severity_scores: {e}")))?;
        let predicted_category = self.predicted_category.parse::<Category>()
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        let timestamp = DateTime::parse_from_rfc3339(&self.timestamp)
            .map_err(|e| StoreError::Serialization(format!("timestamp {}: {}", self.timestamp, e)))?
            .with_timezone(&Utc);
        Ok(FlaggedComment {
            id,
            comment_text: self.comment_text,
            severity_scores,
            predicted_category,
            timestamp,
            alert_triggered: self.alert_triggered,
        })
    }
}

fn query(conn: &Connection, sql: &str, args: &[&dyn ToSql]) -> StoreResult<Vec<FlaggedComment>> {
    let mut stmt = conn.prepare(sql).map_err(|e| backend_err("prepare", e))?;
    let rows = stmt
        .query_map(args, RawRow::from_row)
        .map_err(|e| backend_err("query", e))?
        .collect::<rusqlite::Result<Vec<RawRow>>>()
        .map_err(|e| backend_err("read row", e))?;
    rows.into_iter().map(RawRow::decode).collect()
}

impl SqliteCommentStore {
    /// Opens (creating if needed) a database file
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let conn = Connection::open(path.as_ref())
            .map_err(|e| backend_err("open", e))?;
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA busy_timeout = 5000;
            ",
        )
        .map_err(|e| backend_err("pragmas", e))?;
        Self::with_connection(conn)
    }

    /// Opens a private in-memory database
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| backend_err("open_in_memory", e))?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> StoreResult<Self> {
        conn.execute_batch(SCHEMA)
            .map_err(|e| backend_err("schema", e))?;
        Ok(Self { conn: Arc::new(Mutex::new(conn)) })
    }

    /// Runs `f` against the connection on the blocking thread pool.
    async fn run<T, F>(&self, f: F) -> StoreResult<T>
    where
        F: FnOnce(&Connection) -> StoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let guard = lock_conn(&conn)?;
            f(&*guard)
        })
        .await
        .map_err(|e| StoreError::Backend(format!("spawn_blocking failed: {}", e)))?
    }
}

#[async_trait]
impl CommentStore for SqliteCommentStore {
    async fn insert(&self, comment: NewFlaggedComment) -> StoreResult<CommentId> {
        let id = CommentId::generate();
        let scores_json = serde_json::to_string(&comment.severity_scores)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        self.run(move |conn| {
            conn.execute(
                "INSERT INTO flagged_comments (
                    id, comment_text, severity_scores, predicted_category, timestamp, alert_triggered
                ) VALUES (?1, ?2, ?3, ?4, ?5, 0)",
                params![
                    id.to_string(),
                    comment.comment_text,
                    scores_json,
                    comment.predicted_category.as_str(),
                    format_timestamp(&comment.timestamp),
                ],
            )
            .map_err(|e| backend_err("insert", e))?;
            Ok(id)
        })
        .await
    }

    async fn mark_alert_triggered(&self, id: &CommentId) -> StoreResult<()> {
        let id = *id;
        self.run(move |conn| {
            let changed = conn
                .execute(
                    "UPDATE flagged_comments SET alert_triggered = 1 WHERE id = ?1",
                    params![id.to_string()],
                )
                .map_err(|e| backend_err("update", e))?;
            if changed == 0 {
                return Err(StoreError::NotFound(id));
            }
            Ok(())
        })
        .await
    }

    async fn get(&self, id: &CommentId) -> StoreResult<Option<FlaggedComment>> {
        let sql = format!("SELECT {SELECT_COLUMNS} FROM flagged_comments WHERE id = ?1");
        let id_str = id.to_string();
        self.run(move |conn| Ok(query(conn, &sql, &[&id_str])?.into_iter().next()))
            .await
    }

    async fn recent(&self, limit: usize) -> StoreResult<Vec<FlaggedComment>> {
        let sql = format!(
            "SELECT {SELECT_COLUMNS} FROM flagged_comments ORDER BY timestamp DESC, seq DESC LIMIT ?1"
        );
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        self.run(move |conn| query(conn, &sql, &[&limit])).await
    }

    async fn by_category(&self, category: Category) -> StoreResult<Vec<FlaggedComment>> {
        let sql = format!(
            "SELECT {SELECT_COLUMNS} FROM flagged_comments WHERE predicted_category = ?1 ORDER BY seq"
        );
        self.run(move |conn| query(conn, &sql, &[&category.as_str()])).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_round_trip_preserves_fields() {
        let store = SqliteCommentStore::open_in_memory().unwrap();
        let scores = SeverityScores::from_array([0.11, 0.72, 0.05, 0.93, 0.4, 0.01]);
        let new = NewFlaggedComment::from_scores("I will kill you", scores);
        let timestamp = new.timestamp;

        let id = store.insert(new).await.unwrap();
        let record = store.get(&id).await.unwrap().unwrap();

        assert_eq!(record.id, id);
        assert_eq!(record.severity_scores, scores);
        assert_eq!(record.predicted_category, Category::Threat);
        assert_eq!(format_timestamp(&record.timestamp), format_timestamp(&timestamp));
        assert!(!record.alert_triggered);
    }

    #[tokio::test]
    async fn test_corrupt_row_is_serialization_error() {
        let store = SqliteCommentStore::open_in_memory().unwrap();
        let id = CommentId::generate();
        {
            let conn = lock_conn(&store.conn).unwrap();
            conn.execute(
                "INSERT INTO flagged_comments (id, comment_text, severity_scores, predicted_category, timestamp)
                 VALUES (?1, 'x', 'not json', 'toxic', '2024-01-01T00:00:00.000000Z')",
                params![id.to_string()],
            )
            .unwrap();
        }
        assert!(matches!(store.get(&id).await, Err(StoreError::Serialization(_))));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_file_store_serves_concurrent_tasks() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(SqliteCommentStore::open(dir.path().join("comments.db")).unwrap());
        let scores = SeverityScores::from_array([0.9, 0.1, 0.1, 0.1, 0.1, 0.1]);

        let tasks: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                tokio::spawn(async move {
                    let id = store
                        .insert(NewFlaggedComment::from_scores(format!("comment {}", i), scores))
                        .await?;
                    store.mark_alert_triggered(&id).await?;
                    store.get(&id).await
                })
            })
            .collect();

        for task in tasks {
            let record = task.await.unwrap().unwrap().unwrap();
            assert!(record.alert_triggered);
        }
        assert_eq!(store.recent(100).await.unwrap().len(), 8);
    }
}
