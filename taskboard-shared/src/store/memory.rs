//! In-memory adapters for the storage ports
//!
//! Each store keeps its state behind a single `Mutex`, so every trait call
//! is atomic with respect to the others. That gives the same guarantees the
//! Postgres adapters get from transactions and row locks.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use super::{
    BoardStore, OutboxStore, RemovalOutcome, ResolveOutcome, StoreError, StoreResult, TaskStore,
    UserStore,
};
use crate::models::{
    Board, BoardRole, CreateBoard, CreateInvitation, CreateTask, CreateUser, Decision, Invitation,
    InvitationStatus, InvitationSummary, Membership, OutboxEntry, Task, TaskChanges, User,
};

fn lock<T>(mutex: &Mutex<T>) -> StoreResult<MutexGuard<'_, T>> {
    mutex
        .lock()
        .map_err(|err| StoreError::Backend(format!("state lock poisoned: {}", err)))
}

/// Users held in memory, keyed by email
#[derive(Debug, Clone, Default)]
pub struct InMemoryUserStore {
    users: Arc<Mutex<HashMap<String, User>>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn insert_user(&self, data: CreateUser) -> StoreResult<User> {
        let mut users = lock(&self.users)?;
        if users.contains_key(&data.email) {
            return Err(StoreError::Duplicate("users_email_key".to_string()));
        }

        let user = User::new(data);
        users.insert(user.email.clone(), user.clone());
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(lock(&self.users)?.get(email).cloned())
    }

    async fn ping(&self) -> StoreResult<()> {
        lock(&self.users).map(|_| ())
    }
}

#[derive(Debug, Default)]
struct BoardState {
    boards: HashMap<Uuid, Board>,
    members: BTreeMap<(Uuid, Uuid), Membership>,
    invitations: HashMap<Uuid, Invitation>,
    outbox: Vec<OutboxEntry>,
    next_outbox_id: i64,
}

impl BoardState {
    fn admin_count(&self, board_id: Uuid) -> i64 {
        self.members
            .values()
            .filter(|m| m.board_id == board_id && m.role == BoardRole::Admin)
            .count() as i64
    }

    fn insert_member(&mut self, board_id: Uuid, user_id: Uuid, role: BoardRole) -> bool {
        if self.members.contains_key(&(board_id, user_id)) {
            return false;
        }
        self.members.insert(
            (board_id, user_id),
            Membership {
                board_id,
                user_id,
                role,
                created_at: Utc::now(),
            },
        );
        true
    }
}

/// Boards, rosters, invitations and the outbox held in memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryBoardStore {
    state: Arc<Mutex<BoardState>>,
}

impl InMemoryBoardStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every outbox entry, published or not
    pub fn outbox_entries(&self) -> Vec<OutboxEntry> {
        self.state
            .lock()
            .map(|state| state.outbox.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl BoardStore for InMemoryBoardStore {
    async fn create_board_with_admin(&self, data: CreateBoard) -> StoreResult<Board> {
        let mut state = lock(&self.state)?;

        let creator = data.created_by;
        let board = Board::new(data);
        state.boards.insert(board.id, board.clone());
        state.insert_member(board.id, creator, BoardRole::Admin);

        Ok(board)
    }

    async fn find_board(&self, board_id: Uuid) -> StoreResult<Option<Board>> {
        Ok(lock(&self.state)?.boards.get(&board_id).cloned())
    }

    async fn delete_board(&self, board_id: Uuid) -> StoreResult<Option<OutboxEntry>> {
        let mut state = lock(&self.state)?;

        if state.boards.remove(&board_id).is_none() {
            return Ok(None);
        }
        state.members.retain(|(b, _), _| *b != board_id);
        state.invitations.retain(|_, inv| inv.board_id != board_id);

        state.next_outbox_id += 1;
        let entry = OutboxEntry {
            id: state.next_outbox_id,
            board_id,
            attempts: 0,
            last_error: None,
            locked_until: None,
            created_at: Utc::now(),
            published_at: None,
        };
        state.outbox.push(entry.clone());

        Ok(Some(entry))
    }

    async fn add_member(&self, board_id: Uuid, user_id: Uuid, role: BoardRole) -> StoreResult<bool> {
        Ok(lock(&self.state)?.insert_member(board_id, user_id, role))
    }

    async fn role_of(&self, board_id: Uuid, user_id: Uuid) -> StoreResult<Option<BoardRole>> {
        Ok(lock(&self.state)?
            .members
            .get(&(board_id, user_id))
            .map(|m| m.role))
    }

    async fn list_members(&self, board_id: Uuid) -> StoreResult<Vec<Membership>> {
        let state = lock(&self.state)?;
        let mut members: Vec<Membership> = state
            .members
            .values()
            .filter(|m| m.board_id == board_id)
            .cloned()
            .collect();
        members.sort_by(|a, b| a.role.cmp(&b.role).then(a.user_id.cmp(&b.user_id)));
        Ok(members)
    }

    async fn count_admins(&self, board_id: Uuid) -> StoreResult<i64> {
        Ok(lock(&self.state)?.admin_count(board_id))
    }

    async fn remove_member(&self, board_id: Uuid, user_id: Uuid) -> StoreResult<RemovalOutcome> {
        let mut state = lock(&self.state)?;

        let Some(role) = state.members.get(&(board_id, user_id)).map(|m| m.role) else {
            return Ok(RemovalOutcome::NotMember);
        };
        if role == BoardRole::Admin && state.admin_count(board_id) <= 1 {
            return Ok(RemovalOutcome::LastAdmin);
        }

        state.members.remove(&(board_id, user_id));
        Ok(RemovalOutcome::Removed)
    }

    async fn insert_invitation(&self, data: CreateInvitation) -> StoreResult<Invitation> {
        let mut state = lock(&self.state)?;
        let invitation = Invitation::new(data);
        state.invitations.insert(invitation.id, invitation.clone());
        Ok(invitation)
    }

    async fn resolve_invitation(
        &self,
        invitation_id: Uuid,
        invitee_id: Uuid,
        decision: Decision,
    ) -> StoreResult<ResolveOutcome> {
        let mut state = lock(&self.state)?;

        let Some(invitation) = state
            .invitations
            .get(&invitation_id)
            .filter(|inv| inv.invitee_id == invitee_id)
            .cloned()
        else {
            return Ok(ResolveOutcome::NotFound);
        };

        if invitation.status.is_terminal() {
            return Ok(ResolveOutcome::AlreadyProcessed(invitation.status));
        }

        if decision == Decision::Accepted {
            state.insert_member(invitation.board_id, invitee_id, invitation.role);
        }

        let resolved = Invitation {
            status: decision.status(),
            ..invitation
        };
        state.invitations.insert(resolved.id, resolved.clone());

        Ok(ResolveOutcome::Resolved(resolved))
    }

    async fn list_invitations(
        &self,
        invitee_id: Uuid,
        status: InvitationStatus,
    ) -> StoreResult<Vec<InvitationSummary>> {
        let state = lock(&self.state)?;

        let mut rows: Vec<InvitationSummary> = state
            .invitations
            .values()
            .filter(|inv| inv.invitee_id == invitee_id && inv.status == status)
            .filter_map(|inv| {
                let board = state.boards.get(&inv.board_id)?;
                Some(InvitationSummary {
                    invitation_id: inv.id,
                    board_id: inv.board_id,
                    board_name: board.name.clone(),
                    inviter_id: inv.inviter_id,
                    role: inv.role,
                    created_at: inv.created_at,
                })
            })
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(rows)
    }

    async fn ping(&self) -> StoreResult<()> {
        lock(&self.state).map(|_| ())
    }
}

#[async_trait]
impl OutboxStore for InMemoryBoardStore {
    async fn claim_unpublished(&self, limit: i64, lease_secs: i64) -> StoreResult<Vec<OutboxEntry>> {
        let mut state = lock(&self.state)?;
        let now = Utc::now();
        let lease_until = now + chrono::Duration::seconds(lease_secs);

        let mut claimed = Vec::new();
        for entry in state.outbox.iter_mut() {
            if claimed.len() as i64 >= limit {
                break;
            }
            let leased = entry.locked_until.is_some_and(|until| until >= now);
            if entry.published_at.is_none() && !leased {
                entry.attempts += 1;
                entry.locked_until = Some(lease_until);
                claimed.push(entry.clone());
            }
        }

        Ok(claimed)
    }

    async fn mark_published(&self, entry_id: i64) -> StoreResult<()> {
        let mut state = lock(&self.state)?;
        if let Some(entry) = state.outbox.iter_mut().find(|e| e.id == entry_id) {
            entry.published_at = Some(Utc::now());
            entry.locked_until = None;
            entry.last_error = None;
        }
        Ok(())
    }

    async fn record_failure(&self, entry_id: i64, error: &str) -> StoreResult<()> {
        let mut state = lock(&self.state)?;
        if let Some(entry) = state.outbox.iter_mut().find(|e| e.id == entry_id) {
            entry.last_error = Some(error.to_string());
            entry.locked_until = None;
        }
        Ok(())
    }
}

/// Tasks held in memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryTaskStore {
    tasks: Arc<Mutex<HashMap<Uuid, Task>>>,
}

impl InMemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored tasks for a board
    pub fn count_for_board(&self, board_id: Uuid) -> usize {
        self.tasks
            .lock()
            .map(|tasks| tasks.values().filter(|t| t.board_id == board_id).count())
            .unwrap_or_default()
    }
}

#[async_trait]
impl TaskStore for InMemoryTaskStore {
    async fn insert_task(&self, data: CreateTask) -> StoreResult<Task> {
        let task = Task::new(data);
        lock(&self.tasks)?.insert(task.id, task.clone());
        Ok(task)
    }

    async fn find_task(&self, task_id: Uuid) -> StoreResult<Option<Task>> {
        Ok(lock(&self.tasks)?.get(&task_id).cloned())
    }

    async fn update_task(&self, task_id: Uuid, changes: TaskChanges) -> StoreResult<Option<Task>> {
        let mut tasks = lock(&self.tasks)?;
        Ok(tasks.get_mut(&task_id).map(|task| {
            task.apply(&changes);
            task.clone()
        }))
    }

    async fn delete_task(&self, task_id: Uuid) -> StoreResult<bool> {
        Ok(lock(&self.tasks)?.remove(&task_id).is_some())
    }

    async fn list_tasks(&self, board_id: Uuid) -> StoreResult<Vec<Task>> {
        let tasks = lock(&self.tasks)?;
        let mut list: Vec<Task> = tasks
            .values()
            .filter(|t| t.board_id == board_id)
            .cloned()
            .collect();
        list.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(list)
    }

    async fn delete_board_tasks(&self, board_id: Uuid) -> StoreResult<u64> {
        let mut tasks = lock(&self.tasks)?;
        let before = tasks.len();
        tasks.retain(|_, t| t.board_id != board_id);
        Ok((before - tasks.len()) as u64)
    }

    async fn ping(&self) -> StoreResult<()> {
        lock(&self.tasks).map(|_| ())
    }
}
