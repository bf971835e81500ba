//! Inbound source backed by the macOS Messages database (`chat.db`).
//!
//! The database is opened read-only; Messages keeps writing to it while we
//! poll. Only incoming messages with text are returned.

use async_trait::async_trait;
use seriesai_core::channel::{InboundMessage, InboundSource};
use seriesai_core::error::ChannelError;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::path::Path;
use tracing::{debug, info};

const GREETINGS_QUERY: &str = r#"
    SELECT m.ROWID, h.id, m.text
      FROM message AS m
      JOIN handle  AS h ON m.handle_id = h.ROWID
     WHERE m.is_from_me = 0
       AND m.ROWID > ?
       AND m.text IS NOT NULL
       AND substr(m.text, 1, length(?)) = ?
     ORDER BY m.ROWID ASC
"#;

const SENDER_QUERY: &str = r#"
    SELECT m.ROWID, h.id, m.text
      FROM message AS m
      JOIN handle  AS h ON m.handle_id = h.ROWID
     WHERE m.is_from_me = 0
       AND m.ROWID > ?
       AND m.text IS NOT NULL
       AND h.id = ?
     ORDER BY m.ROWID ASC
"#;

const ALL_QUERY: &str = r#"
    SELECT m.ROWID, h.id, m.text
      FROM message AS m
      JOIN handle  AS h ON m.handle_id = h.ROWID
     WHERE m.is_from_me = 0
       AND m.ROWID > ?
       AND m.text IS NOT NULL
     ORDER BY m.ROWID ASC
"#;

/// `(ROWID, handle id, text)`
type MessageRow = (i64, String, String);

pub struct MessagesDb {
    pool: SqlitePool,
}

impl MessagesDb {
    /// Open the Messages database at `path` read-only.
    pub async fn open(path: &Path) -> Result<Self, ChannelError> {
        if !path.exists() {
            return Err(ChannelError::SourceUnavailable(format!(
                "Messages database not found at {}",
                path.display()
            )));
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .read_only(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(2)
            .connect_with(options)
            .await
            .map_err(|e| {
                ChannelError::SourceUnavailable(format!(
                    "Failed to open {} (Full Disk Access may be required): {e}",
                    path.display()
                ))
            })?;

        info!("Messages database opened at {}", path.display());
        Ok(Self { pool })
    }

    /// Wrap an existing pool (useful for testing).
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open `path` and confirm the `message` table is queryable.
    pub async fn open_checked(path: &Path) -> seriesai_core::Result<Self> {
        let db = Self::open(path).await?;
        db.probe().await?;
        Ok(db)
    }

    /// Can the database be queried right now?
    pub async fn probe(&self) -> Result<(), ChannelError> {
        sqlx::query("SELECT 1 FROM message LIMIT 1")
            .fetch_optional(&self.pool)
            .await
            .map(|_| ())
            .map_err(query_error)
    }
}

fn query_error(e: sqlx::Error) -> ChannelError {
    ChannelError::SourceUnavailable(format!("Messages query failed: {e}"))
}

fn into_messages(rows: Vec<MessageRow>) -> Vec<InboundMessage> {
    rows.into_iter()
        .map(|(sequence_id, sender_id, text)| InboundMessage {
            sequence_id,
            sender_id,
            text,
        })
        .collect()
}

#[async_trait]
impl InboundSource for MessagesDb {
    fn name(&self) -> &str {
        "messages_db"
    }

    async fn fetch_greetings(
        &self,
        after: i64,
        prefix: &str,
    ) -> Result<Vec<InboundMessage>, ChannelError> {
        let rows = sqlx::query_as::<_, MessageRow>(GREETINGS_QUERY)
            .bind(after)
            .bind(prefix)
            .bind(prefix)
            .fetch_all(&self.pool)
            .await
            .map_err(query_error)?;

        debug!(after, found = rows.len(), "Polled for greetings");
        Ok(into_messages(rows))
    }

    async fn fetch_messages(
        &self,
        after: i64,
        sender: Option<&str>,
    ) -> Result<Vec<InboundMessage>, ChannelError> {
        let rows: Vec<MessageRow> = match sender {
            Some(sender) => {
                sqlx::query_as::<_, MessageRow>(SENDER_QUERY)
                    .bind(after)
                    .bind(sender)
                    .fetch_all(&self.pool)
                    .await
            }
            None => {
                sqlx::query_as::<_, MessageRow>(ALL_QUERY)
                    .bind(after)
                    .fetch_all(&self.pool)
                    .await
            }
        }
        .map_err(query_error)?;

        Ok(into_messages(rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PREFIX: &str = "Welcome to Series! Text your color to get started:";

    async fn seeded() -> MessagesDb {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();

        sqlx::query("CREATE TABLE handle (ROWID INTEGER PRIMARY KEY, id TEXT NOT NULL)")
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query(
            "CREATE TABLE message (ROWID INTEGER PRIMARY KEY, handle_id INTEGER, text TEXT, is_from_me INTEGER NOT NULL)",
        )
        .execute(&pool)
        .await
        .unwrap();

        sqlx::query("INSERT INTO handle (ROWID, id) VALUES (1, '+15550001111'), (2, 'friend@example.com')")
            .execute(&pool)
            .await
            .unwrap();

        let rows: [(i64, i64, Option<&str>, i64); 7] = [
            (1, 1, Some("Welcome to Series! Text your color to get started: green"), 0),
            (2, 1, Some("Hey it's Olivia!"), 1),
            (3, 1, Some("Jane Doe"), 0),
            (4, 2, Some("random chatter"), 0),
            (5, 2, Some("Welcome to Series! Text your color to get started: red"), 0),
            (6, 1, None, 0),
            (7, 2, Some("Welcome to Series%% Text your color to get started: x"), 0),
        ];
        for (rowid, handle, text, from_me) in rows {
            sqlx::query("INSERT INTO message (ROWID, handle_id, text, is_from_me) VALUES (?, ?, ?, ?)")
                .bind(rowid)
                .bind(handle)
                .bind(text)
                .bind(from_me)
                .execute(&pool)
                .await
                .unwrap();
        }

        MessagesDb::from_pool(pool)
    }

    #[tokio::test]
    async fn greetings_match_exact_prefix_only() {
        let db = seeded().await;
        let greetings = db.fetch_greetings(0, PREFIX).await.unwrap();

        let ids: Vec<i64> = greetings.iter().map(|m| m.sequence_id).collect();
        assert_eq!(ids, vec![1, 5]);
        assert_eq!(greetings[0].sender_id, "+15550001111");
        assert_eq!(greetings[1].sender_id, "friend@example.com");
    }

    #[tokio::test]
    async fn greetings_respect_cursor() {
        let db = seeded().await;
        let greetings = db.fetch_greetings(1, PREFIX).await.unwrap();
        assert_eq!(greetings.len(), 1);
        assert_eq!(greetings[0].sequence_id, 5);
    }

    #[tokio::test]
    async fn sender_messages_skip_own_and_empty() {
        let db = seeded().await;
        let messages = db.fetch_messages(1, Some("+15550001111")).await.unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].sequence_id, 3);
        assert_eq!(messages[0].text, "Jane Doe");
    }

    #[tokio::test]
    async fn all_messages_ascending() {
        let db = seeded().await;
        let messages = db.fetch_messages(2, None).await.unwrap();
        let ids: Vec<i64> = messages.iter().map(|m| m.sequence_id).collect();
        assert_eq!(ids, vec![3, 4, 5, 7]);
    }

    #[tokio::test]
    async fn probe_succeeds_on_valid_schema() {
        let db = seeded().await;
        assert!(db.probe().await.is_ok());
    }

    #[tokio::test]
    async fn missing_database_is_unavailable() {
        let result = MessagesDb::open(Path::new("/nonexistent/chat.db")).await;
        assert!(matches!(result, Err(ChannelError::SourceUnavailable(_))));
    }

    #[tokio::test]
    async fn open_checked_rejects_missing_and_empty_databases() {
        let missing = MessagesDb::open_checked(Path::new("/nonexistent/chat.db")).await;
        assert!(matches!(
            missing,
            Err(seriesai_core::Error::Channel(ChannelError::SourceUnavailable(_)))
        ));

        // A file without the Messages schema opens but cannot be queried
        let file = tempfile::NamedTempFile::new().unwrap();
        let empty = MessagesDb::open_checked(file.path()).await;
        assert!(matches!(
            empty,
            Err(seriesai_core::Error::Channel(ChannelError::SourceUnavailable(_)))
        ));
    }
}
