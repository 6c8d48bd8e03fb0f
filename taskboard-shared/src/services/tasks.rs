//! Task registry
//!
//! Authorization comes from a [`MembershipChecker`], asked afresh on every
//! call. The registry never reads membership rows itself: in a split
//! deployment the checker is an HTTP client of the board service, and the
//! caller's bearer token is forwarded with the question.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use uuid::Uuid;

use super::ledger::MembershipLedger;
use crate::auth::authorization::{require, BoardAction};
use crate::auth::middleware::AuthContext;
use crate::error::{ServiceError, ServiceResult};
use crate::models::{BoardRole, CreateTask, Task, TaskChanges, TaskStage};
use crate::store::TaskStore;

const INVALID_STAGE: &str = "stage must be 'To Do', 'In Progress', or 'Done'";

/// Failure to obtain a membership answer
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MembershipCheckError {
    /// The board service refused the forwarded credentials
    #[error("membership check unauthorized: {0}")]
    Unauthorized(String),

    #[error("membership check unavailable: {0}")]
    Unavailable(String),

    #[error("unexpected membership response: {0}")]
    InvalidResponse(String),
}

impl From<MembershipCheckError> for ServiceError {
    fn from(err: MembershipCheckError) -> Self {
        match err {
            MembershipCheckError::Unauthorized(msg) => ServiceError::unauthenticated(msg),
            other => {
                tracing::error!(error = %other, "Membership check failed");
                ServiceError::internal("failed to check membership")
            }
        }
    }
}

/// "Is this user on board X, and with what role"
#[async_trait]
pub trait MembershipChecker: Send + Sync {
    async fn role_of(
        &self,
        board_id: Uuid,
        caller: &AuthContext,
    ) -> Result<Option<BoardRole>, MembershipCheckError>;
}

/// Checker that asks an in-process [`MembershipLedger`]
#[derive(Clone)]
pub struct LedgerMembershipChecker {
    ledger: MembershipLedger,
}

impl LedgerMembershipChecker {
    pub fn new(ledger: MembershipLedger) -> Self {
        Self { ledger }
    }
}

#[async_trait]
impl MembershipChecker for LedgerMembershipChecker {
    async fn role_of(
        &self,
        board_id: Uuid,
        caller: &AuthContext,
    ) -> Result<Option<BoardRole>, MembershipCheckError> {
        self.ledger
            .role_of(board_id, caller.user_id)
            .await
            .map_err(|e| MembershipCheckError::Unavailable(e.to_string()))
    }
}

/// Body of a create-task request
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewTask {
    pub board_id: Option<Uuid>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub assignee_id: Option<Uuid>,
    #[serde(default)]
    pub stage: String,
}

/// Body of an update-task request; empty or absent fields are left unchanged
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskUpdate {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub assignee_id: Option<Uuid>,
    #[serde(default)]
    pub stage: String,
}

impl TaskUpdate {
    fn into_changes(self) -> ServiceResult<TaskChanges> {
        let non_empty = |s: String| Some(s).filter(|s| !s.is_empty());

        let stage = match non_empty(self.stage) {
            Some(s) => Some(parse_stage(&s)?),
            None => None,
        };

        Ok(TaskChanges {
            title: non_empty(self.title),
            description: non_empty(self.description),
            assignee_id: self.assignee_id,
            stage,
        })
    }
}

fn parse_stage(s: &str) -> ServiceResult<TaskStage> {
    s.parse()
        .map_err(|_| ServiceError::invalid_argument(INVALID_STAGE))
}

#[derive(Clone)]
pub struct TaskRegistry {
    tasks: Arc<dyn TaskStore>,
    membership: Arc<dyn MembershipChecker>,
}

impl TaskRegistry {
    pub fn new(tasks: Arc<dyn TaskStore>, membership: Arc<dyn MembershipChecker>) -> Self {
        Self { tasks, membership }
    }

    async fn role(&self, board_id: Uuid, caller: &AuthContext) -> ServiceResult<Option<BoardRole>> {
        Ok(self.membership.role_of(board_id, caller).await?)
    }

    async fn existing(&self, task_id: Uuid) -> ServiceResult<Task> {
        self.tasks
            .find_task(task_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("task not found"))
    }

    /// Creates a task; Admins and Members only
    ///
    /// The stage defaults to `To Do`.
    pub async fn create(&self, caller: &AuthContext, req: NewTask) -> ServiceResult<Task> {
        let Some(board_id) = req.board_id.filter(|_| !req.title.is_empty()) else {
            return Err(ServiceError::invalid_argument("board_id and title are required"));
        };

        let role = self.role(board_id, caller).await?;
        require(BoardAction::CreateTask, role)?;

        let stage = if req.stage.is_empty() {
            TaskStage::default()
        } else {
            parse_stage(&req.stage)?
        };

        let task = self
            .tasks
            .insert_task(CreateTask {
                board_id,
                title: req.title,
                description: req.description,
                created_by: caller.user_id,
                assignee_id: req.assignee_id,
                stage,
            })
            .await?;

        tracing::info!(task_id = %task.id, board_id = %board_id, "Task created");
        Ok(task)
    }

    /// Merges non-empty fields into the task; Admins or the creator only
    pub async fn update(&self, caller: &AuthContext, task_id: Uuid, req: TaskUpdate) -> ServiceResult<Task> {
        let task = self.existing(task_id).await?;

        let role = self.role(task.board_id, caller).await?;
        require(
            BoardAction::UpdateTask {
                own: task.created_by == caller.user_id,
            },
            role,
        )?;

        let changes = req.into_changes()?;
        if changes.is_empty() {
            return Ok(task);
        }

        let updated = self
            .tasks
            .update_task(task_id, changes)
            .await?
            .ok_or_else(|| ServiceError::not_found("task not found"))?;

        tracing::info!(task_id = %task_id, board_id = %updated.board_id, "Task updated");
        Ok(updated)
    }

    /// Every task on the board in creation order; any member may list
    pub async fn list(&self, caller: &AuthContext, board_id: Uuid) -> ServiceResult<Vec<Task>> {
        let role = self.role(board_id, caller).await?;
        require(BoardAction::ListTasks, role)?;
        Ok(self.tasks.list_tasks(board_id).await?)
    }

    /// Deletes one task; Admins or the creator only
    pub async fn delete(&self, caller: &AuthContext, task_id: Uuid) -> ServiceResult<()> {
        let task = self.existing(task_id).await?;

        let role = self.role(task.board_id, caller).await?;
        require(
            BoardAction::DeleteTask {
                own: task.created_by == caller.user_id,
            },
            role,
        )?;

        if !self.tasks.delete_task(task_id).await? {
            return Err(ServiceError::not_found("task not found"));
        }

        tracing::info!(task_id = %task_id, board_id = %task.board_id, "Task deleted");
        Ok(())
    }

    pub async fn ping(&self) -> ServiceResult<()> {
        Ok(self.tasks.ping().await?)
    }
}
