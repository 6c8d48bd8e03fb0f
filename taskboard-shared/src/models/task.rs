/// Task model and database operations
///
/// Tasks live in the task service's own database and reference their board
/// by id only. There is no foreign key to `boards`; removal when a board
/// goes away happens through [`Task::delete_by_board`], driven by the
/// `BoardDeleted` event.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE task_stage AS ENUM ('To Do', 'In Progress', 'Done');
///
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY,
///     board_id UUID NOT NULL,
///     title TEXT NOT NULL,
///     description TEXT NOT NULL DEFAULT '',
///     created_by UUID NOT NULL,
///     assignee_id UUID,
///     stage task_stage NOT NULL DEFAULT 'To Do',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// CREATE INDEX idx_tasks_board_created ON tasks (board_id, created_at);
/// ```
///
/// # Example
///
/// ```no_run
/// use taskboard_shared::models::task::{Task, CreateTask, TaskChanges, TaskStage};
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, board_id: Uuid, user_id: Uuid) -> Result<(), sqlx::Error> {
/// let task = Task::create(&pool, CreateTask {
///     board_id,
///     title: "Write release notes".to_string(),
///     description: String::new(),
///     created_by: user_id,
///     assignee_id: None,
///     stage: TaskStage::ToDo,
/// }).await?;
///
/// let changes = TaskChanges { stage: Some(TaskStage::Done), ..Default::default() };
/// Task::update(&pool, task.id, &changes).await?;
/// # Ok(())
/// # }
/// ```

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Workflow stage of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_stage")]
pub enum TaskStage {
    #[sqlx(rename = "To Do")]
    #[serde(rename = "To Do")]
    ToDo,

    #[sqlx(rename = "In Progress")]
    #[serde(rename = "In Progress")]
    InProgress,

    #[sqlx(rename = "Done")]
    #[serde(rename = "Done")]
    Done,
}

impl TaskStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStage::ToDo => "To Do",
            TaskStage::InProgress => "In Progress",
            TaskStage::Done => "Done",
        }
    }
}

impl Default for TaskStage {
    fn default() -> Self {
        TaskStage::ToDo
    }
}

impl fmt::Display for TaskStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "To Do" => Ok(TaskStage::ToDo),
            "In Progress" => Ok(TaskStage::InProgress),
            "Done" => Ok(TaskStage::Done),
            other => Err(format!("invalid stage '{}'", other)),
        }
    }
}

/// A task on a board
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    pub id: Uuid,
    pub board_id: Uuid,
    pub title: String,
    pub description: String,
    pub created_by: Uuid,
    pub assignee_id: Option<Uuid>,
    pub stage: TaskStage,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a task
#[derive(Debug, Clone)]
pub struct CreateTask {
    pub board_id: Uuid,
    pub title: String,
    pub description: String,
    pub created_by: Uuid,
    pub assignee_id: Option<Uuid>,
    pub stage: TaskStage,
}

/// Partial update; `None` leaves the stored value unchanged
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub assignee_id: Option<Uuid>,
    pub stage: Option<TaskStage>,
}

impl TaskChanges {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.assignee_id.is_none()
            && self.stage.is_none()
    }
}

impl Task {
    /// Builds a task record with a fresh id, without persisting it
    pub fn new(data: CreateTask) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            board_id: data.board_id,
            title: data.title,
            description: data.description,
            created_by: data.created_by,
            assignee_id: data.assignee_id,
            stage: data.stage,
            created_at: now,
            updated_at: now,
        }
    }

    /// Merges `changes` into this record and bumps `updated_at`
    pub fn apply(&mut self, changes: &TaskChanges) {
        if let Some(title) = &changes.title {
            self.title = title.clone();
        }
        if let Some(description) = &changes.description {
            self.description = description.clone();
        }
        if let Some(assignee_id) = changes.assignee_id {
            self.assignee_id = Some(assignee_id);
        }
        if let Some(stage) = changes.stage {
            self.stage = stage;
        }
        self.updated_at = Utc::now();
    }

    /// Inserts a new task
    pub async fn create(pool: &PgPool, data: CreateTask) -> Result<Self, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            INSERT INTO tasks (id, board_id, title, description, created_by, assignee_id, stage)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, board_id, title, description, created_by, assignee_id, stage,
                      created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(data.board_id)
        .bind(data.title)
        .bind(data.description)
        .bind(data.created_by)
        .bind(data.assignee_id)
        .bind(data.stage)
        .fetch_one(pool)
        .await?;

        Ok(task)
    }

    /// Finds a task by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, board_id, title, description, created_by, assignee_id, stage,
                   created_at, updated_at
            FROM tasks
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Applies a partial update in a single statement
    ///
    /// Returns `None` if the task no longer exists.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        changes: &TaskChanges,
    ) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            UPDATE tasks
            SET title = COALESCE($2, title),
                description = COALESCE($3, description),
                assignee_id = COALESCE($4, assignee_id),
                stage = COALESCE($5, stage),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, board_id, title, description, created_by, assignee_id, stage,
                      created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(changes.title.as_deref())
        .bind(changes.description.as_deref())
        .bind(changes.assignee_id)
        .bind(changes.stage)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Lists a board's tasks, oldest first
    pub async fn list_by_board(pool: &PgPool, board_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let tasks = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, board_id, title, description, created_by, assignee_id, stage,
                   created_at, updated_at
            FROM tasks
            WHERE board_id = $1
            ORDER BY created_at, id
            "#,
        )
        .bind(board_id)
        .fetch_all(pool)
        .await?;

        Ok(tasks)
    }

    /// Deletes a single task, returning true if it existed
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Deletes every task on a board
    ///
    /// Deleting from an already-empty board is not an error; the count is 0.
    pub async fn delete_by_board(pool: &PgPool, board_id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE board_id = $1")
            .bind(board_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected())
    }
}
