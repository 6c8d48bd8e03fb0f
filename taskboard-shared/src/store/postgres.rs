//! Postgres adapters for the storage ports
//!
//! Multi-statement operations run in a `sqlx::Transaction`. A transaction
//! that is dropped before `commit` (error, panic, or the request future
//! being cancelled) rolls back, so none of them can be left half-applied.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::{
    BoardStore, OutboxStore, RemovalOutcome, ResolveOutcome, StoreResult, TaskStore, UserStore,
};
use crate::db::pool::health_check;
use crate::models::{
    Board, BoardRole, CreateBoard, CreateInvitation, CreateTask, CreateUser, Decision, Invitation,
    InvitationStatus, InvitationSummary, Membership, OutboxEntry, Task, TaskChanges, User,
};

/// Users database adapter
#[derive(Debug, Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn insert_user(&self, data: CreateUser) -> StoreResult<User> {
        Ok(User::create(&self.pool, data).await?)
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(User::find_by_email(&self.pool, email).await?)
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(health_check(&self.pool).await?)
    }
}

/// Boards database adapter; also serves the outbox
#[derive(Debug, Clone)]
pub struct PgBoardStore {
    pool: PgPool,
}

impl PgBoardStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BoardStore for PgBoardStore {
    async fn create_board_with_admin(&self, data: CreateBoard) -> StoreResult<Board> {
        let mut tx = self.pool.begin().await?;

        let board = Board::insert(&mut *tx, &data).await?;
        Membership::add(&mut *tx, board.id, data.created_by, BoardRole::Admin).await?;

        tx.commit().await?;
        Ok(board)
    }

    async fn find_board(&self, board_id: Uuid) -> StoreResult<Option<Board>> {
        Ok(Board::find_by_id(&self.pool, board_id).await?)
    }

    async fn delete_board(&self, board_id: Uuid) -> StoreResult<Option<OutboxEntry>> {
        let mut tx = self.pool.begin().await?;

        if !Board::delete(&mut *tx, board_id).await? {
            return Ok(None);
        }
        let entry = OutboxEntry::enqueue(&mut *tx, board_id).await?;

        tx.commit().await?;
        Ok(Some(entry))
    }

    async fn add_member(&self, board_id: Uuid, user_id: Uuid, role: BoardRole) -> StoreResult<bool> {
        Ok(Membership::add(&self.pool, board_id, user_id, role).await?)
    }

    async fn role_of(&self, board_id: Uuid, user_id: Uuid) -> StoreResult<Option<BoardRole>> {
        Ok(Membership::role_of(&self.pool, board_id, user_id).await?)
    }

    async fn list_members(&self, board_id: Uuid) -> StoreResult<Vec<Membership>> {
        Ok(Membership::list_for_board(&self.pool, board_id).await?)
    }

    async fn count_admins(&self, board_id: Uuid) -> StoreResult<i64> {
        Ok(Membership::count_admins(&self.pool, board_id).await?)
    }

    async fn remove_member(&self, board_id: Uuid, user_id: Uuid) -> StoreResult<RemovalOutcome> {
        let mut tx = self.pool.begin().await?;

        // Removals on one board are serialized so the Admin count below holds
        // until commit.
        if !Board::lock(&mut *tx, board_id).await? {
            return Ok(RemovalOutcome::NotMember);
        }

        let Some(role) = Membership::role_of(&mut *tx, board_id, user_id).await? else {
            return Ok(RemovalOutcome::NotMember);
        };

        if role == BoardRole::Admin && Membership::count_admins(&mut *tx, board_id).await? <= 1 {
            return Ok(RemovalOutcome::LastAdmin);
        }

        Membership::delete(&mut *tx, board_id, user_id).await?;
        tx.commit().await?;

        Ok(RemovalOutcome::Removed)
    }

    async fn insert_invitation(&self, data: CreateInvitation) -> StoreResult<Invitation> {
        Ok(Invitation::create(&self.pool, &data).await?)
    }

    async fn resolve_invitation(
        &self,
        invitation_id: Uuid,
        invitee_id: Uuid,
        decision: Decision,
    ) -> StoreResult<ResolveOutcome> {
        let mut tx = self.pool.begin().await?;

        let Some(invitation) =
            Invitation::find_for_invitee_locked(&mut *tx, invitation_id, invitee_id).await?
        else {
            return Ok(ResolveOutcome::NotFound);
        };

        if invitation.status.is_terminal() {
            return Ok(ResolveOutcome::AlreadyProcessed(invitation.status));
        }

        if decision == Decision::Accepted {
            Membership::add(&mut *tx, invitation.board_id, invitee_id, invitation.role).await?;
        }

        let Some(resolved) = Invitation::set_status(&mut *tx, invitation.id, decision.status()).await?
        else {
            return Ok(ResolveOutcome::AlreadyProcessed(invitation.status));
        };

        tx.commit().await?;
        Ok(ResolveOutcome::Resolved(resolved))
    }

    async fn list_invitations(
        &self,
        invitee_id: Uuid,
        status: InvitationStatus,
    ) -> StoreResult<Vec<InvitationSummary>> {
        Ok(Invitation::list_for_invitee(&self.pool, invitee_id, status).await?)
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(health_check(&self.pool).await?)
    }
}

#[async_trait]
impl OutboxStore for PgBoardStore {
    async fn claim_unpublished(&self, limit: i64, lease_secs: i64) -> StoreResult<Vec<OutboxEntry>> {
        Ok(OutboxEntry::claim_due(&self.pool, limit, lease_secs).await?)
    }

    async fn mark_published(&self, entry_id: i64) -> StoreResult<()> {
        Ok(OutboxEntry::mark_published(&self.pool, entry_id).await?)
    }

    async fn record_failure(&self, entry_id: i64, error: &str) -> StoreResult<()> {
        Ok(OutboxEntry::record_failure(&self.pool, entry_id, error).await?)
    }
}

/// Tasks database adapter
#[derive(Debug, Clone)]
pub struct PgTaskStore {
    pool: PgPool,
}

impl PgTaskStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TaskStore for PgTaskStore {
    async fn insert_task(&self, data: CreateTask) -> StoreResult<Task> {
        Ok(Task::create(&self.pool, data).await?)
    }

    async fn find_task(&self, task_id: Uuid) -> StoreResult<Option<Task>> {
        Ok(Task::find_by_id(&self.pool, task_id).await?)
    }

    async fn update_task(&self, task_id: Uuid, changes: TaskChanges) -> StoreResult<Option<Task>> {
        Ok(Task::update(&self.pool, task_id, &changes).await?)
    }

    async fn delete_task(&self, task_id: Uuid) -> StoreResult<bool> {
        Ok(Task::delete(&self.pool, task_id).await?)
    }

    async fn list_tasks(&self, board_id: Uuid) -> StoreResult<Vec<Task>> {
        Ok(Task::list_by_board(&self.pool, board_id).await?)
    }

    async fn delete_board_tasks(&self, board_id: Uuid) -> StoreResult<u64> {
        Ok(Task::delete_by_board(&self.pool, board_id).await?)
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(health_check(&self.pool).await?)
    }
}
