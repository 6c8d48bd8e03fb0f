/// Database models for Taskboard
///
/// Each model owns the SQL for its table. Queries that must run inside a
/// transaction accept any `sqlx::PgExecutor`.
///
/// # Models
///
/// - `user`: accounts in the users database
/// - `board`: board metadata in the boards database
/// - `membership`: per-board roster with roles
/// - `invitation`: pending/accepted/rejected invitations
/// - `outbox`: `BoardDeleted` events awaiting publication
/// - `task`: tasks in the tasks database

pub mod board;
pub mod invitation;
pub mod membership;
pub mod outbox;
pub mod task;
pub mod user;

pub use board::{Board, CreateBoard};
pub use invitation::{CreateInvitation, Decision, Invitation, InvitationStatus, InvitationSummary};
pub use membership::{BoardRole, Membership};
pub use outbox::OutboxEntry;
pub use task::{CreateTask, Task, TaskChanges, TaskStage};
pub use user::{CreateUser, User};
