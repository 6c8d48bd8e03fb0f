//! Storage ports for the three service databases
//!
//! Services talk to storage only through these traits. Each has a Postgres
//! adapter ([`postgres`]) used in production and an in-memory adapter
//! ([`memory`]) used by tests and local runs.
//!
//! Cross-entity invariants are enforced here, not in the services:
//!
//! - board creation and the creator's Admin entry commit together
//! - member removal re-checks the Admin count under a board lock
//! - invitation resolution inserts the membership and flips the status in
//!   one transaction, with the status guarded so it flips once
//! - board deletion and its outbox entry commit together

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{
    Board, BoardRole, CreateBoard, CreateInvitation, CreateTask, CreateUser, Decision, Invitation,
    InvitationStatus, InvitationSummary, Membership, OutboxEntry, Task, TaskChanges, User,
};

pub mod memory;
pub mod postgres;

pub use memory::{InMemoryBoardStore, InMemoryTaskStore, InMemoryUserStore};
pub use postgres::{PgBoardStore, PgTaskStore, PgUserStore};

/// Storage failure
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write
    #[error("{0}")]
    Duplicate(String),

    /// Connection, query or lock failure
    #[error("storage failure: {0}")]
    Backend(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                return StoreError::Duplicate(
                    db_err.constraint().unwrap_or("unique constraint").to_string(),
                );
            }
        }
        StoreError::Backend(err.to_string())
    }
}

/// Outcome of a guarded member removal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalOutcome {
    Removed,
    NotMember,
    LastAdmin,
}

/// Outcome of resolving an invitation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveOutcome {
    /// The invitation moved to its terminal status
    Resolved(Invitation),

    /// No invitation with that id is addressed to the acting user
    NotFound,

    /// The invitation had already been accepted or rejected
    AlreadyProcessed(InvitationStatus),
}

/// Users database
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Inserts a user; `StoreError::Duplicate` when the email is taken
    async fn insert_user(&self, data: CreateUser) -> StoreResult<User>;

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    async fn ping(&self) -> StoreResult<()>;
}

/// Boards database: boards, rosters and invitations
#[async_trait]
pub trait BoardStore: Send + Sync {
    /// Inserts the board and its creator's Admin entry atomically
    async fn create_board_with_admin(&self, data: CreateBoard) -> StoreResult<Board>;

    async fn find_board(&self, board_id: Uuid) -> StoreResult<Option<Board>>;

    /// Deletes the board and enqueues its `BoardDeleted` outbox entry
    /// atomically. Returns `None` if no board was deleted.
    async fn delete_board(&self, board_id: Uuid) -> StoreResult<Option<OutboxEntry>>;

    /// Inserts a roster entry; existing pairs are left as they are.
    /// Returns true if a row was inserted.
    async fn add_member(&self, board_id: Uuid, user_id: Uuid, role: BoardRole) -> StoreResult<bool>;

    async fn role_of(&self, board_id: Uuid, user_id: Uuid) -> StoreResult<Option<BoardRole>>;

    async fn list_members(&self, board_id: Uuid) -> StoreResult<Vec<Membership>>;

    async fn count_admins(&self, board_id: Uuid) -> StoreResult<i64>;

    /// Removes a roster entry unless it is the board's last Admin
    async fn remove_member(&self, board_id: Uuid, user_id: Uuid) -> StoreResult<RemovalOutcome>;

    async fn insert_invitation(&self, data: CreateInvitation) -> StoreResult<Invitation>;

    /// Applies the invitee's decision exactly once
    async fn resolve_invitation(
        &self,
        invitation_id: Uuid,
        invitee_id: Uuid,
        decision: Decision,
    ) -> StoreResult<ResolveOutcome>;

    async fn list_invitations(
        &self,
        invitee_id: Uuid,
        status: InvitationStatus,
    ) -> StoreResult<Vec<InvitationSummary>>;

    async fn ping(&self) -> StoreResult<()>;
}

/// Durable queue of `BoardDeleted` events, kept in the boards database
#[async_trait]
pub trait OutboxStore: Send + Sync {
    /// Leases unpublished entries for `lease_secs`
    async fn claim_unpublished(&self, limit: i64, lease_secs: i64) -> StoreResult<Vec<OutboxEntry>>;

    async fn mark_published(&self, entry_id: i64) -> StoreResult<()>;

    /// Releases the lease and records why the publish failed
    async fn record_failure(&self, entry_id: i64, error: &str) -> StoreResult<()>;
}

/// Tasks database
#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn insert_task(&self, data: CreateTask) -> StoreResult<Task>;

    async fn find_task(&self, task_id: Uuid) -> StoreResult<Option<Task>>;

    /// Applies a partial update; `None` if the task no longer exists
    async fn update_task(&self, task_id: Uuid, changes: TaskChanges) -> StoreResult<Option<Task>>;

    /// Returns true if the task existed
    async fn delete_task(&self, task_id: Uuid) -> StoreResult<bool>;

    async fn list_tasks(&self, board_id: Uuid) -> StoreResult<Vec<Task>>;

    /// Deletes every task on a board; an empty board yields 0
    async fn delete_board_tasks(&self, board_id: Uuid) -> StoreResult<u64>;

    async fn ping(&self) -> StoreResult<()>;
}
