/// Outbox of `BoardDeleted` events awaiting publication
///
/// A row is written in the same transaction that deletes the board, so the
/// event survives a crash or a transport outage between commit and publish.
/// The API publishes inline and marks the row; the worker relay picks up
/// anything left behind.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE board_deleted_outbox (
///     id BIGSERIAL PRIMARY KEY,
///     board_id UUID NOT NULL,
///     attempts INTEGER NOT NULL DEFAULT 0,
///     last_error TEXT,
///     locked_until TIMESTAMPTZ,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     published_at TIMESTAMPTZ
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

/// A pending (or already published) cascade event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct OutboxEntry {
    pub id: i64,
    pub board_id: Uuid,
    pub attempts: i32,
    pub last_error: Option<String>,
    pub locked_until: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub published_at: Option<DateTime<Utc>>,
}

impl OutboxEntry {
    pub fn is_published(&self) -> bool {
        self.published_at.is_some()
    }

    /// Records a board deletion awaiting publication
    pub async fn enqueue<'e, E>(executor: E, board_id: Uuid) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, OutboxEntry>(
            r#"
            INSERT INTO board_deleted_outbox (board_id)
            VALUES ($1)
            RETURNING id, board_id, attempts, last_error, locked_until, created_at, published_at
            "#,
        )
        .bind(board_id)
        .fetch_one(executor)
        .await
    }

    /// Leases up to `limit` unpublished entries for `lease_secs`
    ///
    /// `SKIP LOCKED` plus the lease keeps concurrent relays from claiming the
    /// same entry. A relay that dies mid-publish releases its claim when the
    /// lease expires.
    pub async fn claim_due(pool: &PgPool, limit: i64, lease_secs: i64) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, OutboxEntry>(
            r#"
            WITH due AS (
                SELECT id
                FROM board_deleted_outbox
                WHERE published_at IS NULL
                  AND (locked_until IS NULL OR locked_until < NOW())
                ORDER BY id ASC
                LIMIT $1
                FOR UPDATE SKIP LOCKED
            )
            UPDATE board_deleted_outbox
            SET attempts = board_deleted_outbox.attempts + 1,
                locked_until = NOW() + make_interval(secs => $2)
            FROM due
            WHERE board_deleted_outbox.id = due.id
            RETURNING board_deleted_outbox.id, board_deleted_outbox.board_id,
                      board_deleted_outbox.attempts, board_deleted_outbox.last_error,
                      board_deleted_outbox.locked_until, board_deleted_outbox.created_at,
                      board_deleted_outbox.published_at
            "#,
        )
        .bind(limit)
        .bind(lease_secs as f64)
        .fetch_all(pool)
        .await
    }

    /// Marks an entry as delivered to the transport
    pub async fn mark_published(pool: &PgPool, id: i64) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE board_deleted_outbox
            SET published_at = NOW(), locked_until = NULL, last_error = NULL
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Releases an entry after a failed publish so it is retried
    pub async fn record_failure(pool: &PgPool, id: i64, error: &str) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE board_deleted_outbox
            SET last_error = $2, locked_until = NULL
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(error)
        .execute(pool)
        .await?;

        Ok(())
    }
}
