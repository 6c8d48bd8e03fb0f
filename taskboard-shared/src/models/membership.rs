/// Board membership model and database operations
///
/// Each row assigns one user one role on one board. The composite primary
/// key makes `(board_id, user_id)` unique, which is what lets concurrent
/// invitation acceptances converge on a single row.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE board_role AS ENUM ('Admin', 'Member', 'Viewer');
///
/// CREATE TABLE board_members (
///     board_id UUID NOT NULL REFERENCES boards(id) ON DELETE CASCADE,
///     user_id UUID NOT NULL,
///     role board_role NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     PRIMARY KEY (board_id, user_id)
/// );
/// ```
///
/// # Roles
///
/// - **Admin**: manages the roster, invites, deletes the board, edits any task
/// - **Member**: creates tasks and edits their own
/// - **Viewer**: read-only
///
/// # Example
///
/// ```no_run
/// use taskboard_shared::models::membership::{BoardRole, Membership};
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, board_id: Uuid, user_id: Uuid) -> Result<(), sqlx::Error> {
/// Membership::add(&pool, board_id, user_id, BoardRole::Member).await?;
/// let role = Membership::role_of(&pool, board_id, user_id).await?;
/// assert_eq!(role, Some(BoardRole::Member));
/// # Ok(())
/// # }
/// ```

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;
use uuid::Uuid;

/// Role a user holds on a board
///
/// Variant order matches the Postgres enum, so `ORDER BY role` lists Admins
/// first.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "board_role")]
pub enum BoardRole {
    Admin,
    Member,
    Viewer,
}

impl BoardRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            BoardRole::Admin => "Admin",
            BoardRole::Member => "Member",
            BoardRole::Viewer => "Viewer",
        }
    }

    /// Roles that may be offered through an invitation
    pub fn is_invitable(&self) -> bool {
        !matches!(self, BoardRole::Admin)
    }
}

impl fmt::Display for BoardRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BoardRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Admin" => Ok(BoardRole::Admin),
            "Member" => Ok(BoardRole::Member),
            "Viewer" => Ok(BoardRole::Viewer),
            other => Err(format!("unknown role '{}'", other)),
        }
    }
}

/// A roster entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Membership {
    pub board_id: Uuid,
    pub user_id: Uuid,
    pub role: BoardRole,
    pub created_at: DateTime<Utc>,
}

impl Membership {
    /// Inserts a roster entry unless the pair already exists
    ///
    /// Returns true if a row was inserted, false if the user was already on
    /// the board (the existing role is left untouched).
    pub async fn add<'e, E>(
        executor: E,
        board_id: Uuid,
        user_id: Uuid,
        role: BoardRole,
    ) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query(
            r#"
            INSERT INTO board_members (board_id, user_id, role)
            VALUES ($1, $2, $3)
            ON CONFLICT (board_id, user_id) DO NOTHING
            "#,
        )
        .bind(board_id)
        .bind(user_id)
        .bind(role)
        .execute(executor)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Gets a user's role on a board, `None` if not a member
    pub async fn role_of<'e, E>(
        executor: E,
        board_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<BoardRole>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let role: Option<(BoardRole,)> = sqlx::query_as(
            "SELECT role FROM board_members WHERE board_id = $1 AND user_id = $2",
        )
        .bind(board_id)
        .bind(user_id)
        .fetch_optional(executor)
        .await?;

        Ok(role.map(|(r,)| r))
    }

    /// Lists a board's roster ordered by role, then user id
    pub async fn list_for_board<'e, E>(executor: E, board_id: Uuid) -> Result<Vec<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Membership>(
            r#"
            SELECT board_id, user_id, role, created_at
            FROM board_members
            WHERE board_id = $1
            ORDER BY role, user_id
            "#,
        )
        .bind(board_id)
        .fetch_all(executor)
        .await
    }

    /// Counts the Admins on a board
    pub async fn count_admins<'e, E>(executor: E, board_id: Uuid) -> Result<i64, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM board_members WHERE board_id = $1 AND role = 'Admin'",
        )
        .bind(board_id)
        .fetch_one(executor)
        .await?;

        Ok(count)
    }

    /// Deletes a roster entry, returning true if one existed
    pub async fn delete<'e, E>(executor: E, board_id: Uuid, user_id: Uuid) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query("DELETE FROM board_members WHERE board_id = $1 AND user_id = $2")
            .bind(board_id)
            .bind(user_id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parsing() {
        assert_eq!("Admin".parse::<BoardRole>(), Ok(BoardRole::Admin));
        assert_eq!("Viewer".parse::<BoardRole>(), Ok(BoardRole::Viewer));
        assert!("admin".parse::<BoardRole>().is_err());
        assert!("Owner".parse::<BoardRole>().is_err());
    }

    #[test]
    fn test_only_member_and_viewer_are_invitable() {
        assert!(!BoardRole::Admin.is_invitable());
        assert!(BoardRole::Member.is_invitable());
        assert!(BoardRole::Viewer.is_invitable());
    }

    #[test]
    fn test_role_serializes_capitalized() {
        assert_eq!(serde_json::to_string(&BoardRole::Member).unwrap(), "\"Member\"");
    }

    #[test]
    fn test_role_ordering_puts_admin_first() {
        let mut roles = vec![BoardRole::Viewer, BoardRole::Admin, BoardRole::Member];
        roles.sort();
        assert_eq!(roles, vec![BoardRole::Admin, BoardRole::Member, BoardRole::Viewer]);
    }
}
