/// API route handlers
///
/// Handlers are organized by resource:
///
/// - `health`: Health check endpoint
/// - `auth`: Signup and login
/// - `boards`: Boards and their member rosters
/// - `invitations`: Invite, accept/reject, inbox
/// - `tasks`: Task CRUD

pub mod auth;
pub mod boards;
pub mod health;
pub mod invitations;
pub mod tasks;

use serde::Serialize;

/// Body of responses that only confirm an action
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
