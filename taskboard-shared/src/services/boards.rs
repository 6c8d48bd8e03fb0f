//! Board metadata: create, fetch, delete

use std::sync::Arc;

use serde::Deserialize;
use uuid::Uuid;

use super::cascade::CascadeNotifier;
use crate::auth::authorization::{require, BoardAction};
use crate::error::{ServiceError, ServiceResult};
use crate::models::{Board, CreateBoard};
use crate::store::BoardStore;

/// Message returned when the board is gone but its cascade event could not
/// be published yet
pub const CASCADE_QUEUED: &str = "board deleted; cascade event queued for retry";

/// Body of a create-board request
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewBoard {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Clone)]
pub struct BoardRegistry {
    boards: Arc<dyn BoardStore>,
    notifier: CascadeNotifier,
}

impl BoardRegistry {
    pub fn new(boards: Arc<dyn BoardStore>, notifier: CascadeNotifier) -> Self {
        Self { boards, notifier }
    }

    /// Creates a board with `creator` as its only Admin, atomically
    pub async fn create(&self, creator: Uuid, req: NewBoard) -> ServiceResult<Board> {
        if req.name.is_empty() {
            return Err(ServiceError::invalid_argument("name is required"));
        }

        let board = self
            .boards
            .create_board_with_admin(CreateBoard {
                name: req.name,
                description: req.description,
                created_by: creator,
            })
            .await?;

        tracing::info!(board_id = %board.id, created_by = %creator, "Board created");
        Ok(board)
    }

    /// Fetches a board the caller is a member of
    ///
    /// Membership is checked first, so a non-member cannot tell a missing
    /// board from one they cannot see.
    pub async fn get(&self, board_id: Uuid, acting_user: Uuid) -> ServiceResult<Board> {
        let role = self.boards.role_of(board_id, acting_user).await?;
        require(BoardAction::ViewBoard, role)?;

        self.boards
            .find_board(board_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("board not found"))
    }

    /// Deletes a board and emits `BoardDeleted`
    ///
    /// The delete and the outbox row commit together. If the publish that
    /// follows fails, the board is already gone: the caller gets `Internal`
    /// with [`CASCADE_QUEUED`] and the relay delivers the event later.
    pub async fn delete(&self, board_id: Uuid, acting_user: Uuid) -> ServiceResult<()> {
        let role = self.boards.role_of(board_id, acting_user).await?;
        require(BoardAction::DeleteBoard, role)?;

        let entry = self
            .boards
            .delete_board(board_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("board not found"))?;
        tracing::info!(board_id = %board_id, deleted_by = %acting_user, "Board deleted");

        self.notifier
            .deliver(&entry)
            .await
            .map_err(|_| ServiceError::internal(CASCADE_QUEUED))
    }

    pub async fn ping(&self) -> ServiceResult<()> {
        Ok(self.boards.ping().await?)
    }
}
