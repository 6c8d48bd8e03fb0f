/// Invitation endpoints
///
/// # Endpoints
///
/// - `POST /board/invite` - Invite a user to a board (Admin only)
/// - `PATCH /board/invitation` - Accept or reject an invitation addressed to the caller
/// - `GET /invitations/:status` - The caller's invitations with a given status

use crate::{
    app::AppState,
    error::ApiResult,
    extract::{AppJson, AppPath},
};
use axum::{extract::State, Extension, Json};
use serde::{Deserialize, Serialize};
use taskboard_shared::{
    auth::middleware::AuthContext,
    models::InvitationSummary,
    services::{InvitationReply, NewInvitation},
};
use uuid::Uuid;

/// Invite response
#[derive(Debug, Serialize, Deserialize)]
pub struct InviteResponse {
    pub invitation_id: Uuid,
}

/// Accept/reject response
#[derive(Debug, Serialize, Deserialize)]
pub struct HandleInvitationResponse {
    pub board_id: Uuid,
}

/// Invitation inbox response
#[derive(Debug, Serialize)]
pub struct InvitationsResponse {
    pub invitations: Vec<InvitationSummary>,
}

/// Invite a user
///
/// # Endpoint
///
/// ```text
/// POST /board/invite
/// Authorization: Bearer <token>
///
/// { "board_id": "uuid", "invitee_id": "uuid", "role": "Member" }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: a field is missing, or role is not Member/Viewer
/// - `403 Forbidden`: caller is not the board's Admin
pub async fn invite_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppJson(req): AppJson<NewInvitation>,
) -> ApiResult<Json<InviteResponse>> {
    let invitation = state.invitations.create(auth.user_id, req).await?;

    Ok(Json(InviteResponse {
        invitation_id: invitation.id,
    }))
}

/// Accept or reject an invitation
///
/// # Endpoint
///
/// ```text
/// PATCH /board/invitation
///
/// { "invitation_id": "uuid", "action": "Accepted" }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: missing field, unknown action, or already processed
/// - `404 Not Found`: no such invitation for the caller
pub async fn handle_invitation(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppJson(req): AppJson<InvitationReply>,
) -> ApiResult<Json<HandleInvitationResponse>> {
    let invitation = state.invitations.resolve(auth.user_id, req).await?;

    Ok(Json(HandleInvitationResponse {
        board_id: invitation.board_id,
    }))
}

/// List the caller's invitations, newest first
///
/// # Errors
///
/// - `400 Bad Request`: status is not Pending, Accepted or Rejected
pub async fn list_invitations(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppPath(status): AppPath<String>,
) -> ApiResult<Json<InvitationsResponse>> {
    let invitations = state.invitations.list(auth.user_id, &status).await?;
    Ok(Json(InvitationsResponse { invitations }))
}
