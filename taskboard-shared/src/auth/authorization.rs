/// Role-based access policy for board operations
///
/// The whole policy is the table in [`BoardAction::permits`]. Services look
/// up the caller's current role for every call (roles are never cached) and
/// ask the table whether the action is allowed.
///
/// | Action | Admin | Member | Viewer | Non-member |
/// |---|---|---|---|---|
/// | Create task | ✓ | ✓ | ✗ | ✗ |
/// | Update/delete task | any | own | ✗ | ✗ |
/// | List tasks | ✓ | ✓ | ✓ | ✗ |
/// | Invite user | ✓ | ✗ | ✗ | ✗ |
/// | Remove member | any | self | self | ✗ |
/// | Delete board | ✓ | ✗ | ✗ | ✗ |
/// | View board / members | ✓ | ✓ | ✓ | ✗ |
///
/// # Example
///
/// ```
/// use taskboard_shared::auth::authorization::BoardAction;
/// use taskboard_shared::models::BoardRole;
///
/// assert!(BoardAction::CreateTask.permits(Some(BoardRole::Member)));
/// assert!(!BoardAction::CreateTask.permits(Some(BoardRole::Viewer)));
/// assert!(!BoardAction::ViewBoard.permits(None));
/// ```

use crate::error::ServiceError;
use crate::models::BoardRole;

/// An operation on a board, with the facts the policy depends on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardAction {
    CreateTask,
    /// `own` when the caller created the task
    UpdateTask { own: bool },
    /// `own` when the caller created the task
    DeleteTask { own: bool },
    ListTasks,
    Invite,
    /// `is_self` when the caller is the member being removed
    RemoveMember { is_self: bool },
    DeleteBoard,
    ViewBoard,
}

impl BoardAction {
    /// Whether a caller holding `role` (`None` for non-members) may act
    pub fn permits(&self, role: Option<BoardRole>) -> bool {
        use BoardRole::*;

        let Some(role) = role else {
            return false;
        };

        match self {
            BoardAction::CreateTask => matches!(role, Admin | Member),
            BoardAction::UpdateTask { own } | BoardAction::DeleteTask { own } => match role {
                Admin => true,
                Member => *own,
                Viewer => false,
            },
            BoardAction::ListTasks | BoardAction::ViewBoard => true,
            BoardAction::Invite | BoardAction::DeleteBoard => role == Admin,
            BoardAction::RemoveMember { is_self } => role == Admin || *is_self,
        }
    }

    /// Message returned to a caller the policy refuses
    pub fn denial(&self, role: Option<BoardRole>) -> &'static str {
        let member = role.is_some();
        match self {
            BoardAction::CreateTask if member => {
                "access denied: only Admins and Members can create tasks"
            }
            BoardAction::CreateTask => "access denied: must be a board member",
            BoardAction::UpdateTask { .. } if member => {
                "access denied: only Admin or creator can update task"
            }
            BoardAction::UpdateTask { .. } => "access denied: must be a board member to update task",
            BoardAction::DeleteTask { .. } if member => {
                "access denied: only Admin or creator can delete task"
            }
            BoardAction::DeleteTask { .. } => "access denied: must be a board member to delete task",
            BoardAction::ListTasks => "access denied: must be a board member to list tasks",
            BoardAction::Invite => "only Admin can invite users",
            BoardAction::RemoveMember { .. } if member => {
                "only Admin or the user themselves can remove a user"
            }
            BoardAction::RemoveMember { .. } => {
                "access denied: not a member or insufficient permissions"
            }
            BoardAction::DeleteBoard => "only Admin can delete a board",
            BoardAction::ViewBoard => "access denied: not a member of this board",
        }
    }
}

/// Checks the policy, returning the caller's role on success
///
/// # Errors
///
/// `ServiceError::PermissionDenied` with the action's denial message
pub fn require(action: BoardAction, role: Option<BoardRole>) -> Result<BoardRole, ServiceError> {
    match role {
        Some(r) if action.permits(role) => Ok(r),
        _ => {
            tracing::debug!(?action, ?role, "Permission denied");
            Err(ServiceError::permission_denied(action.denial(role)))
        }
    }
}
