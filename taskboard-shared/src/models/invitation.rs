/// Invitation model and database operations
///
/// Invitations gate entry into a board's roster:
///
/// ```text
/// Pending ──accept──> Accepted
///    └────reject────> Rejected
/// ```
///
/// Both outcomes are terminal. Only `Member` and `Viewer` may be offered.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE invitation_status AS ENUM ('Pending', 'Accepted', 'Rejected');
///
/// CREATE TABLE invitations (
///     id UUID PRIMARY KEY,
///     board_id UUID NOT NULL REFERENCES boards(id) ON DELETE CASCADE,
///     inviter_id UUID NOT NULL,
///     invitee_id UUID NOT NULL,
///     role board_role NOT NULL CHECK (role <> 'Admin'),
///     status invitation_status NOT NULL DEFAULT 'Pending',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;
use uuid::Uuid;

use super::membership::BoardRole;

/// Lifecycle state of an invitation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "invitation_status")]
pub enum InvitationStatus {
    Pending,
    Accepted,
    Rejected,
}

impl InvitationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvitationStatus::Pending => "Pending",
            InvitationStatus::Accepted => "Accepted",
            InvitationStatus::Rejected => "Rejected",
        }
    }

    /// True once the invitation has been accepted or rejected
    pub fn is_terminal(&self) -> bool {
        !matches!(self, InvitationStatus::Pending)
    }
}

impl fmt::Display for InvitationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InvitationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(InvitationStatus::Pending),
            "Accepted" => Ok(InvitationStatus::Accepted),
            "Rejected" => Ok(InvitationStatus::Rejected),
            other => Err(format!("unknown invitation status '{}'", other)),
        }
    }
}

/// The invitee's answer to a pending invitation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    Accepted,
    Rejected,
}

impl Decision {
    /// Status the invitation moves to
    pub fn status(&self) -> InvitationStatus {
        match self {
            Decision::Accepted => InvitationStatus::Accepted,
            Decision::Rejected => InvitationStatus::Rejected,
        }
    }
}

impl FromStr for Decision {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Accepted" => Ok(Decision::Accepted),
            "Rejected" => Ok(Decision::Rejected),
            other => Err(format!("unknown action '{}'", other)),
        }
    }
}

/// A stored invitation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Invitation {
    pub id: Uuid,
    pub board_id: Uuid,
    pub inviter_id: Uuid,
    pub invitee_id: Uuid,
    pub role: BoardRole,
    pub status: InvitationStatus,
    pub created_at: DateTime<Utc>,
}

/// Input for creating an invitation
#[derive(Debug, Clone)]
pub struct CreateInvitation {
    pub board_id: Uuid,
    pub inviter_id: Uuid,
    pub invitee_id: Uuid,
    pub role: BoardRole,
}

/// One row of an invitee's inbox, joined with the board name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct InvitationSummary {
    pub invitation_id: Uuid,
    pub board_id: Uuid,
    pub board_name: String,
    pub inviter_id: Uuid,
    pub role: BoardRole,
    pub created_at: DateTime<Utc>,
}

impl Invitation {
    /// Builds a pending invitation with a fresh id, without persisting it
    pub fn new(data: CreateInvitation) -> Self {
        Self {
            id: Uuid::new_v4(),
            board_id: data.board_id,
            inviter_id: data.inviter_id,
            invitee_id: data.invitee_id,
            role: data.role,
            status: InvitationStatus::Pending,
            created_at: Utc::now(),
        }
    }

    /// Inserts a pending invitation
    pub async fn create<'e, E>(executor: E, data: &CreateInvitation) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Invitation>(
            r#"
            INSERT INTO invitations (id, board_id, inviter_id, invitee_id, role)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, board_id, inviter_id, invitee_id, role, status, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(data.board_id)
        .bind(data.inviter_id)
        .bind(data.invitee_id)
        .bind(data.role)
        .fetch_one(executor)
        .await
    }

    /// Loads an invitation addressed to `invitee_id` and locks it
    ///
    /// Must run inside a transaction; concurrent resolvers of the same id
    /// queue behind the lock and then observe the terminal status.
    pub async fn find_for_invitee_locked<'e, E>(
        executor: E,
        id: Uuid,
        invitee_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Invitation>(
            r#"
            SELECT id, board_id, inviter_id, invitee_id, role, status, created_at
            FROM invitations
            WHERE id = $1 AND invitee_id = $2
            FOR UPDATE
            "#,
        )
        .bind(id)
        .bind(invitee_id)
        .fetch_optional(executor)
        .await
    }

    /// Moves a pending invitation to `status`
    ///
    /// The `status = 'Pending'` guard makes the write conditional; returns
    /// the updated row, or `None` if it was no longer pending.
    pub async fn set_status<'e, E>(
        executor: E,
        id: Uuid,
        status: InvitationStatus,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Invitation>(
            r#"
            UPDATE invitations
            SET status = $2
            WHERE id = $1 AND status = 'Pending'
            RETURNING id, board_id, inviter_id, invitee_id, role, status, created_at
            "#,
        )
        .bind(id)
        .bind(status)
        .fetch_optional(executor)
        .await
    }

    /// Lists invitations addressed to a user with the given status, newest first
    pub async fn list_for_invitee<'e, E>(
        executor: E,
        invitee_id: Uuid,
        status: InvitationStatus,
    ) -> Result<Vec<InvitationSummary>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, InvitationSummary>(
            r#"
            SELECT i.id AS invitation_id, i.board_id, b.name AS board_name,
                   i.inviter_id, i.role, i.created_at
            FROM invitations i
            JOIN boards b ON b.id = i.board_id
            WHERE i.invitee_id = $1 AND i.status = $2
            ORDER BY i.created_at DESC
            "#,
        )
        .bind(invitee_id)
        .bind(status)
        .fetch_all(executor)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_terminality() {
        assert!(!InvitationStatus::Pending.is_terminal());
        assert!(InvitationStatus::Accepted.is_terminal());
        assert!(InvitationStatus::Rejected.is_terminal());
    }

    #[test]
    fn test_decision_parsing_is_exact() {
        assert_eq!("Accepted".parse::<Decision>(), Ok(Decision::Accepted));
        assert_eq!("Rejected".parse::<Decision>(), Ok(Decision::Rejected));
        assert!("Pending".parse::<Decision>().is_err());
        assert!("accepted".parse::<Decision>().is_err());
    }

    #[test]
    fn test_new_invitation_is_pending() {
        let inv = Invitation::new(CreateInvitation {
            board_id: Uuid::new_v4(),
            inviter_id: Uuid::new_v4(),
            invitee_id: Uuid::new_v4(),
            role: BoardRole::Viewer,
        });
        assert_eq!(inv.status, InvitationStatus::Pending);
        assert_eq!(Decision::Accepted.status(), InvitationStatus::Accepted);
    }
}
