/// Task endpoints
///
/// Authorization is asked of the configured membership checker on every
/// request, with the caller's token forwarded.
///
/// # Endpoints
///
/// - `POST /task` - Create a task (Admin or Member)
/// - `PUT /task/:id` - Partially update a task (Admin, or its non-Viewer creator)
/// - `GET /board/:id/tasks` - List a board's tasks (any member)
/// - `DELETE /task/:id` - Delete a task (Admin, or its non-Viewer creator)

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
    models::Task,
    services::{NewTask, TaskUpdate},
};
use uuid::Uuid;
use validator::Validate;

/// Create task request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTaskRequest {
    pub board_id: Option<Uuid>,

    #[serde(default)]
    #[validate(length(max = 200, message = "Title must be at most 200 characters"))]
    pub title: String,

    #[serde(default)]
    #[validate(length(max = 5000, message = "Description must be at most 5000 characters"))]
    pub description: String,

    pub assignee_id: Option<Uuid>,

    #[serde(default)]
    pub stage: String,
}

impl From<CreateTaskRequest> for NewTask {
    fn from(req: CreateTaskRequest) -> Self {
        NewTask {
            board_id: req.board_id,
            title: req.title,
            description: req.description,
            assignee_id: req.assignee_id,
            stage: req.stage,
        }
    }
}

/// Update task request; empty or absent fields stay unchanged
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateTaskRequest {
    #[serde(default)]
    #[validate(length(max = 200, message = "Title must be at most 200 characters"))]
    pub title: String,

    #[serde(default)]
    #[validate(length(max = 5000, message = "Description must be at most 5000 characters"))]
    pub description: String,

    pub assignee_id: Option<Uuid>,

    #[serde(default)]
    pub stage: String,
}

impl From<UpdateTaskRequest> for TaskUpdate {
    fn from(req: UpdateTaskRequest) -> Self {
        TaskUpdate {
            title: req.title,
            description: req.description,
            assignee_id: req.assignee_id,
            stage: req.stage,
        }
    }
}

/// Task listing response
#[derive(Debug, Serialize)]
pub struct TasksResponse {
    pub tasks: Vec<Task>,
}

/// Create a task
///
/// # Endpoint
///
/// ```text
/// POST /task
/// Authorization: Bearer <token>
///
/// { "board_id": "uuid", "title": "Write release notes", "stage": "In Progress" }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: board_id or title missing, or unknown stage
/// - `403 Forbidden`: caller is a Viewer or not a member
pub async fn create_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppJson(req): AppJson<CreateTaskRequest>,
) -> ApiResult<Json<Task>> {
    req.validate()?;
    let task = state.tasks.create(&auth, req.into()).await?;
    Ok(Json(task))
}

/// Update a task
///
/// # Errors
///
/// - `400 Bad Request`: unknown stage
/// - `403 Forbidden`: caller may not edit this task
/// - `404 Not Found`: no such task
pub async fn update_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppPath(task_id): AppPath<Uuid>,
    AppJson(req): AppJson<UpdateTaskRequest>,
) -> ApiResult<Json<Task>> {
    req.validate()?;
    let task = state.tasks.update(&auth, task_id, req.into()).await?;
    Ok(Json(task))
}

/// List a board's tasks, oldest first
pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppPath(board_id): AppPath<Uuid>,
) -> ApiResult<Json<TasksResponse>> {
    let tasks = state.tasks.list(&auth, board_id).await?;
    Ok(Json(TasksResponse { tasks }))
}

/// Delete a task
pub async fn delete_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppPath(task_id): AppPath<Uuid>,
) -> ApiResult<Json<MessageResponse>> {
    state.tasks.delete(&auth, task_id).await?;
    Ok(Json(MessageResponse::new("Task deleted successfully")))
}
