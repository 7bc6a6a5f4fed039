use anyhow::Result;
use sqlx::{migrate::MigrateDatabase, Row, Sqlite, SqlitePool};
use std::sync::Arc;

// The database URL for the production offline queue
const DATABASE_URL: &str = "sqlite:payment_calendar.db";

/// One payment action captured while the client was offline, waiting for
/// replay. The payload holds the sensitive fields, already encrypted by the
/// cipher collaborator before it reaches storage.
#[derive(Debug, Clone, PartialEq)]
pub struct QueuedAction {
    pub id: String,
    pub payment_id: String,
    /// Action discriminator, e.g. "mark_paid"
    pub kind: String,
    /// Encrypted payment fields
    pub payload: String,
    /// RFC 3339 timestamp of when the action was captured
    pub queued_at: String,
    pub replayed: bool,
}

impl QueuedAction {
    pub fn new(payment_id: &str, kind: &str, payload: String, queued_at: String) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            payment_id: payment_id.to_string(),
            kind: kind.to_string(),
            payload,
            queued_at,
            replayed: false,
        }
    }
}

/// DbConnection manages the sqlite-backed offline action queue
#[derive(Clone)]
pub struct DbConnection {
    pool: Arc<SqlitePool>,
}

impl DbConnection {
    /// Create a new database connection
    pub async fn new(url: &str) -> Result<Self> {
        // Create database if it doesn't exist
        if !Sqlite::database_exists(url).await.unwrap_or(false) {
            Sqlite::create_database(url).await?
        }

        let pool = SqlitePool::connect(url).await?;

        Self::setup_schema(&pool).await?;

        Ok(Self {
            pool: Arc::new(pool),
        })
    }

    /// Initialize the standard database
    pub async fn init() -> Result<Self> {
        Self::new(DATABASE_URL).await
    }

    /// Initialize a test database with a unique name
    #[cfg(test)]
    pub async fn init_test() -> Result<Self> {
        let test_id = uuid::Uuid::new_v4().to_string();
        let db_url = format!("file:memdb_{}?mode=memory&cache=shared", test_id);

        Self::new(&db_url).await
    }

    /// Set up the required database schema
    async fn setup_schema(pool: &SqlitePool) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS offline_actions (
                id TEXT PRIMARY KEY,
                payment_id TEXT NOT NULL,
                kind TEXT NOT NULL,
                payload TEXT NOT NULL,
                queued_at TEXT NOT NULL,
                replayed INTEGER NOT NULL DEFAULT 0
            );
            "#,
        )
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Append an offline action to the queue
    pub async fn enqueue_action(&self, action: &QueuedAction) -> Result<()> {
        sqlx::query(
            "INSERT INTO offline_actions (id, payment_id, kind, payload, queued_at, replayed) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&action.id)
        .bind(&action.payment_id)
        .bind(&action.kind)
        .bind(&action.payload)
        .bind(&action.queued_at)
        .bind(action.replayed as i64)
        .execute(&*self.pool)
        .await?;
        Ok(())
    }

    /// All actions still waiting for replay, oldest first
    pub async fn pending_actions(&self) -> Result<Vec<QueuedAction>> {
        let rows = sqlx::query(
            "SELECT id, payment_id, kind, payload, queued_at, replayed \
             FROM offline_actions WHERE replayed = 0 ORDER BY queued_at",
        )
        .fetch_all(&*self.pool)
        .await?;

        let actions = rows
            .iter()
            .map(|row| QueuedAction {
                id: row.get("id"),
                payment_id: row.get("payment_id"),
                kind: row.get("kind"),
                payload: row.get("payload"),
                queued_at: row.get("queued_at"),
                replayed: row.get::<i64, _>("replayed") != 0,
            })
            .collect();
        Ok(actions)
    }

    /// Mark a queued action as successfully replayed
    pub async fn mark_replayed(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("UPDATE offline_actions SET replayed = 1 WHERE id = ?")
            .bind(id)
            .execute(&*self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
