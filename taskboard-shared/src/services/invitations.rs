//! Invitation state machine: `Pending -> {Accepted, Rejected}`
//!
//! Both outcomes are terminal. Resolution runs in one store transaction that
//! inserts the membership (on accept) and flips the status with a
//! `WHERE status = 'Pending'` guard, so each invitation resolves once.

use std::sync::Arc;

use serde::Deserialize;
use uuid::Uuid;

use crate::auth::authorization::{require, BoardAction};
use crate::error::{ServiceError, ServiceResult};
use crate::models::{BoardRole, CreateInvitation, Decision, Invitation, InvitationStatus, InvitationSummary};
use crate::store::{BoardStore, ResolveOutcome};

/// Body of an invite request
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewInvitation {
    pub board_id: Option<Uuid>,
    pub invitee_id: Option<Uuid>,
    #[serde(default)]
    pub role: String,
}

/// Body of an accept/reject request
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InvitationReply {
    pub invitation_id: Option<Uuid>,
    #[serde(default)]
    pub action: String,
}

#[derive(Clone)]
pub struct InvitationWorkflow {
    boards: Arc<dyn BoardStore>,
}

impl InvitationWorkflow {
    pub fn new(boards: Arc<dyn BoardStore>) -> Self {
        Self { boards }
    }

    /// Creates a pending invitation
    ///
    /// Checks run in order: required fields, inviter is Admin, role is
    /// Member or Viewer. The invitee is not looked up; the users database is
    /// not visible from here.
    pub async fn create(&self, inviter: Uuid, req: NewInvitation) -> ServiceResult<Invitation> {
        let (Some(board_id), Some(invitee_id), false) = (req.board_id, req.invitee_id, req.role.is_empty())
        else {
            return Err(ServiceError::invalid_argument(
                "board_id, invitee_id, and role are required",
            ));
        };

        let role = self.boards.role_of(board_id, inviter).await?;
        require(BoardAction::Invite, role)?;

        let role = req
            .role
            .parse::<BoardRole>()
            .ok()
            .filter(BoardRole::is_invitable)
            .ok_or_else(|| ServiceError::invalid_argument("role must be 'Member' or 'Viewer'"))?;

        let invitation = self
            .boards
            .insert_invitation(CreateInvitation {
                board_id,
                inviter_id: inviter,
                invitee_id,
                role,
            })
            .await?;

        tracing::info!(
            invitation_id = %invitation.id,
            board_id = %board_id,
            invitee_id = %invitee_id,
            role = %role,
            "Invitation created"
        );
        Ok(invitation)
    }

    /// Applies the invitee's decision
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` for a missing id or an action other than
    ///   `Accepted`/`Rejected`
    /// - `NotFound` if no such invitation is addressed to `acting_user`
    /// - `FailedPrecondition` if it was already resolved
    pub async fn resolve(&self, acting_user: Uuid, req: InvitationReply) -> ServiceResult<Invitation> {
        let Some(invitation_id) = req.invitation_id.filter(|_| !req.action.is_empty()) else {
            return Err(ServiceError::invalid_argument("invitation_id and action are required"));
        };
        let decision: Decision = req
            .action
            .parse()
            .map_err(|_| ServiceError::invalid_argument("action must be 'Accepted' or 'Rejected'"))?;

        match self
            .boards
            .resolve_invitation(invitation_id, acting_user, decision)
            .await?
        {
            ResolveOutcome::Resolved(invitation) => {
                tracing::info!(
                    invitation_id = %invitation.id,
                    board_id = %invitation.board_id,
                    status = %invitation.status,
                    "Invitation resolved"
                );
                Ok(invitation)
            }
            ResolveOutcome::NotFound => Err(ServiceError::not_found(
                "invitation not found or not for this user",
            )),
            ResolveOutcome::AlreadyProcessed(status) => {
                tracing::debug!(invitation_id = %invitation_id, %status, "Invitation already processed");
                Err(ServiceError::failed_precondition("invitation already processed"))
            }
        }
    }

    /// The caller's invitations in `status`, newest first
    pub async fn list(&self, acting_user: Uuid, status: &str) -> ServiceResult<Vec<InvitationSummary>> {
        let status: InvitationStatus = status.parse().map_err(|_| {
            ServiceError::invalid_argument("status must be 'Pending', 'Accepted', or 'Rejected'")
        })?;
        Ok(self.boards.list_invitations(acting_user, status).await?)
    }
}
