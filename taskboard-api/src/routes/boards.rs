/// Board endpoints
///
/// Every handler runs behind the JWT layer and acts as the authenticated
/// caller. Role checks happen in the services, against the current roster.
///
/// # Endpoints
///
/// - `POST /board` - Create a board; the creator becomes its Admin
/// - `GET /board/:id` - Fetch a board (members only)
/// - `DELETE /board/:id` - Delete a board and cascade its tasks (Admin only)
/// - `GET /board/:id/users` - List members (members only)
/// - `GET /board/:id/membership` - The caller's own membership
/// - `DELETE /board/:id/user/:uid` - Remove a member (Admin, or the member themselves)

use crate::{
    app::AppState,
    error::ApiResult,
    extract::{AppJson, AppPath},
    routes::MessageResponse,
};
use axum::{extract::State, Extension, Json};
use serde::{Deserialize, Serialize};
use taskboard_shared::{
    auth::middleware::AuthContext,
    models::{Board, BoardRole},
    services::{MembershipStatus, NewBoard},
};
use uuid::Uuid;
use validator::Validate;

/// Create board request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateBoardRequest {
    #[serde(default)]
    #[validate(length(max = 100, message = "Name must be at most 100 characters"))]
    pub name: String,

    #[serde(default)]
    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    pub description: String,
}

/// One row of a member listing
#[derive(Debug, Serialize, Deserialize)]
pub struct MemberView {
    pub user_id: Uuid,
    pub role: BoardRole,
}

/// Member listing response
#[derive(Debug, Serialize, Deserialize)]
pub struct MembersResponse {
    pub members: Vec<MemberView>,
}

/// Create a board
///
/// # Endpoint
///
/// ```text
/// POST /board
/// Authorization: Bearer <token>
///
/// { "name": "Roadmap", "description": "Q3 planning" }
/// ```
///
/// # Response
///
/// ```json
/// {
///   "id": "uuid",
///   "name": "Roadmap",
///   "description": "Q3 planning",
///   "created_by": "uuid",
///   "created_at": "2025-01-01T00:00:00Z"
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: name missing
pub async fn create_board(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppJson(req): AppJson<CreateBoardRequest>,
) -> ApiResult<Json<Board>> {
    req.validate()?;

    let board = state
        .boards
        .create(
            auth.user_id,
            NewBoard {
                name: req.name,
                description: req.description,
            },
        )
        .await?;

    Ok(Json(board))
}

/// Fetch a board
///
/// # Errors
///
/// - `403 Forbidden`: caller is not a member
/// - `404 Not Found`: board does not exist
pub async fn get_board(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppPath(board_id): AppPath<Uuid>,
) -> ApiResult<Json<Board>> {
    let board = state.boards.get(board_id, auth.user_id).await?;
    Ok(Json(board))
}

/// Delete a board
///
/// Members and invitations go with it. Tasks are removed by the cascade
/// subscriber once the `BoardDeleted` event is delivered.
///
/// # Errors
///
/// - `403 Forbidden`: caller is not the board's Admin
/// - `404 Not Found`: board already gone
/// - `500 Internal Server Error`: board deleted but the event could not be
///   published yet; the relay retries it
pub async fn delete_board(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppPath(board_id): AppPath<Uuid>,
) -> ApiResult<Json<MessageResponse>> {
    state.boards.delete(board_id, auth.user_id).await?;
    Ok(Json(MessageResponse::new("Board deleted successfully")))
}

/// List a board's members
///
/// # Response
///
/// ```json
/// { "members": [{ "user_id": "uuid", "role": "Admin" }] }
/// ```
pub async fn list_members(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppPath(board_id): AppPath<Uuid>,
) -> ApiResult<Json<MembersResponse>> {
    let members = state
        .ledger
        .list_members(board_id, auth.user_id)
        .await?
        .into_iter()
        .map(|m| MemberView {
            user_id: m.user_id,
            role: m.role,
        })
        .collect();

    Ok(Json(MembersResponse { members }))
}

/// The caller's membership on a board
///
/// Never fails for non-members; this is the endpoint a remote task service
/// calls with a forwarded token.
///
/// # Response
///
/// ```json
/// { "is_member": true, "role": "Member" }
/// ```
pub async fn check_membership(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppPath(board_id): AppPath<Uuid>,
) -> ApiResult<Json<MembershipStatus>> {
    let status = state.ledger.check_membership(board_id, auth.user_id).await?;
    Ok(Json(status))
}

/// Remove a member from a board
///
/// # Errors
///
/// - `400 Bad Request`: the target is the board's last Admin
/// - `403 Forbidden`: caller is neither Admin nor the target
/// - `404 Not Found`: target is not a member
pub async fn remove_member(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppPath((board_id, user_id)): AppPath<(Uuid, Uuid)>,
) -> ApiResult<Json<MessageResponse>> {
    state
        .ledger
        .remove_member(board_id, user_id, auth.user_id)
        .await?;
    Ok(Json(MessageResponse::new("User removed successfully")))
}
