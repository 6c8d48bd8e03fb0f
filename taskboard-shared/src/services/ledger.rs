//! Per-board roster of user roles
//!
//! Every read of a role goes to the store; nothing here caches. The
//! last-Admin invariant is enforced by [`BoardStore::remove_member`] under a
//! board lock, so two concurrent removals cannot both pass the count check.

use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use crate::auth::authorization::{require, BoardAction};
use crate::error::{ServiceError, ServiceResult};
use crate::models::{BoardRole, Membership};
use crate::store::{BoardStore, RemovalOutcome};

/// Answer to "is this user on the board, and as what"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MembershipStatus {
    pub is_member: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<BoardRole>,
}

impl From<Option<BoardRole>> for MembershipStatus {
    fn from(role: Option<BoardRole>) -> Self {
        Self {
            is_member: role.is_some(),
            role,
        }
    }
}

#[derive(Clone)]
pub struct MembershipLedger {
    boards: Arc<dyn BoardStore>,
}

impl MembershipLedger {
    pub fn new(boards: Arc<dyn BoardStore>) -> Self {
        Self { boards }
    }

    /// Inserts a roster entry; an existing (board, user) pair is left alone
    pub async fn add_member(&self, board_id: Uuid, user_id: Uuid, role: BoardRole) -> ServiceResult<()> {
        let inserted = self.boards.add_member(board_id, user_id, role).await?;
        if inserted {
            tracing::info!(board_id = %board_id, user_id = %user_id, role = %role, "Member added");
        }
        Ok(())
    }

    pub async fn role_of(&self, board_id: Uuid, user_id: Uuid) -> ServiceResult<Option<BoardRole>> {
        Ok(self.boards.role_of(board_id, user_id).await?)
    }

    pub async fn check_membership(&self, board_id: Uuid, user_id: Uuid) -> ServiceResult<MembershipStatus> {
        Ok(self.role_of(board_id, user_id).await?.into())
    }

    pub async fn count_admins(&self, board_id: Uuid) -> ServiceResult<i64> {
        Ok(self.boards.count_admins(board_id).await?)
    }

    /// Lists the roster, ordered by role then user id. Members only.
    pub async fn list_members(&self, board_id: Uuid, acting_user: Uuid) -> ServiceResult<Vec<Membership>> {
        let role = self.role_of(board_id, acting_user).await?;
        require(BoardAction::ViewBoard, role)?;
        Ok(self.boards.list_members(board_id).await?)
    }

    /// Removes `target` from the board
    ///
    /// # Errors
    ///
    /// - `PermissionDenied` unless the caller is an Admin or is `target`
    /// - `NotFound` if `target` is not a member
    /// - `FailedPrecondition` if `target` is the last Admin
    pub async fn remove_member(&self, board_id: Uuid, target: Uuid, acting_user: Uuid) -> ServiceResult<()> {
        let role = self.role_of(board_id, acting_user).await?;
        require(
            BoardAction::RemoveMember {
                is_self: target == acting_user,
            },
            role,
        )?;

        match self.boards.remove_member(board_id, target).await? {
            RemovalOutcome::Removed => {
                tracing::info!(board_id = %board_id, user_id = %target, "Member removed");
                Ok(())
            }
            RemovalOutcome::NotMember => {
                Err(ServiceError::not_found("user not a member of this board"))
            }
            RemovalOutcome::LastAdmin => {
                Err(ServiceError::failed_precondition("cannot remove the last Admin"))
            }
        }
    }
}
