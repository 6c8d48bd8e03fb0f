/// Component services
///
/// Each service owns its store handles behind `Arc<dyn ...>` and returns
/// [`ServiceResult`](crate::error::ServiceResult). Authorization is re-derived
/// from the current roster on every call.
///
/// - [`Authenticator`]: signup, login, token validation
/// - [`MembershipLedger`]: roster reads and guarded removals
/// - [`InvitationWorkflow`]: invite, accept/reject, inbox
/// - [`BoardRegistry`]: board create/get/delete
/// - [`TaskRegistry`]: task CRUD through a [`MembershipChecker`]
/// - [`CascadeNotifier`] / [`BoardDeletedHandler`]: the deletion cascade
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use taskboard_shared::events::memory::InMemoryBus;
/// use taskboard_shared::services::{BoardRegistry, CascadeNotifier, NewBoard};
/// use taskboard_shared::store::InMemoryBoardStore;
/// use uuid::Uuid;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let boards = InMemoryBoardStore::new();
/// let notifier = CascadeNotifier::new(Arc::new(InMemoryBus::new()), Arc::new(boards.clone()));
/// let registry = BoardRegistry::new(Arc::new(boards), notifier);
///
/// let board = registry
///     .create(Uuid::new_v4(), NewBoard { name: "Roadmap".into(), description: String::new() })
///     .await?;
/// # Ok(())
/// # }
/// ```

pub mod authenticator;
pub mod boards;
pub mod cascade;
pub mod invitations;
pub mod ledger;
pub mod tasks;

pub use authenticator::Authenticator;
pub use boards::{BoardRegistry, NewBoard, CASCADE_QUEUED};
pub use cascade::{BoardDeletedHandler, CascadeNotifier, RelayPass};
pub use invitations::{InvitationReply, InvitationWorkflow, NewInvitation};
pub use ledger::{MembershipLedger, MembershipStatus};
pub use tasks::{
    LedgerMembershipChecker, MembershipCheckError, MembershipChecker, NewTask, TaskRegistry,
    TaskUpdate,
};

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use uuid::Uuid;

    use super::*;
    use crate::auth::middleware::AuthContext;
    use crate::events::memory::InMemoryBus;
    use crate::events::EventSubscription;
    use crate::models::{BoardRole, InvitationStatus};
    use crate::store::{InMemoryBoardStore, InMemoryTaskStore, InMemoryUserStore, TaskStore};

    const SECRET: &str = "scenario-secret-that-is-32-bytes-long";

    struct World {
        auth: Authenticator,
        boards: BoardRegistry,
        ledger: MembershipLedger,
        invitations: InvitationWorkflow,
        tasks: TaskRegistry,
        task_store: InMemoryTaskStore,
        bus: InMemoryBus,
        cascade: BoardDeletedHandler,
    }

    fn world() -> World {
        let board_store = InMemoryBoardStore::new();
        let task_store = InMemoryTaskStore::new();
        let bus = InMemoryBus::new();

        let ledger = MembershipLedger::new(Arc::new(board_store.clone()));
        let notifier = CascadeNotifier::new(Arc::new(bus.clone()), Arc::new(board_store.clone()));

        World {
            auth: Authenticator::new(Arc::new(InMemoryUserStore::new()), SECRET),
            boards: BoardRegistry::new(Arc::new(board_store.clone()), notifier),
            invitations: InvitationWorkflow::new(Arc::new(board_store)),
            tasks: TaskRegistry::new(
                Arc::new(task_store.clone()),
                Arc::new(LedgerMembershipChecker::new(ledger.clone())),
            ),
            ledger,
            cascade: BoardDeletedHandler::new(Arc::new(task_store.clone())),
            task_store,
            bus,
        }
    }

    async fn sign_in(w: &World, email: &str) -> AuthContext {
        let user = w.auth.signup(email, "correct horse").await.unwrap();
        let token = w.auth.login(email, "correct horse").await.unwrap();
        assert_eq!(w.auth.validate(&token).unwrap(), user.id);
        AuthContext {
            user_id: user.id,
            email: email.to_string(),
            token,
        }
    }

    async fn drain(w: &World) {
        for delivery in w.bus.fetch(16).await.unwrap() {
            w.cascade.handle(&delivery.event).await.unwrap();
            w.bus.ack(&delivery.id).await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_invite_accept_create_delete_cascade() {
        let w = world();
        let a = sign_in(&w, "a@example.com").await;
        let c = sign_in(&w, "c@example.com").await;

        let board = w
            .boards
            .create(a.user_id, NewBoard { name: "B".into(), description: String::new() })
            .await
            .unwrap();
        let roster = w.ledger.list_members(board.id, a.user_id).await.unwrap();
        assert_eq!(roster.len(), 1);
        assert_eq!(roster[0].role, BoardRole::Admin);

        let invitation = w
            .invitations
            .create(
                a.user_id,
                NewInvitation {
                    board_id: Some(board.id),
                    invitee_id: Some(c.user_id),
                    role: "Member".into(),
                },
            )
            .await
            .unwrap();
        assert_eq!(invitation.status, InvitationStatus::Pending);

        let accepted = w
            .invitations
            .resolve(
                c.user_id,
                InvitationReply {
                    invitation_id: Some(invitation.id),
                    action: "Accepted".into(),
                },
            )
            .await
            .unwrap();
        assert_eq!(accepted.status, InvitationStatus::Accepted);
        assert_eq!(
            w.ledger.role_of(board.id, c.user_id).await.unwrap(),
            Some(BoardRole::Member)
        );

        w.tasks
            .create(
                &c,
                NewTask {
                    board_id: Some(board.id),
                    title: "ship it".into(),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(w.task_store.count_for_board(board.id), 1);

        w.boards.delete(board.id, a.user_id).await.unwrap();
        drain(&w).await;

        assert_eq!(w.task_store.count_for_board(board.id), 0);
        assert!(w.task_store.list_tasks(board.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_redelivered_cascade_converges() {
        let w = world();
        let a = sign_in(&w, "owner@example.com").await;
        let board = w
            .boards
            .create(a.user_id, NewBoard { name: "B".into(), description: String::new() })
            .await
            .unwrap();
        for title in ["one", "two"] {
            w.tasks
                .create(
                    &a,
                    NewTask {
                        board_id: Some(board.id),
                        title: title.into(),
                        ..Default::default()
                    },
                )
                .await
                .unwrap();
        }

        w.boards.delete(board.id, a.user_id).await.unwrap();

        // handle without acking, then let the bus hand the event out again
        for delivery in w.bus.fetch(16).await.unwrap() {
            w.cascade.handle(&delivery.event).await.unwrap();
        }
        w.bus.redeliver_unacked();
        drain(&w).await;

        assert_eq!(w.task_store.count_for_board(board.id), 0);
        assert_eq!(w.bus.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_only_admin_cannot_leave() {
        let w = world();
        let a = sign_in(&w, "solo@example.com").await;
        let board = w
            .boards
            .create(a.user_id, NewBoard { name: "B".into(), description: String::new() })
            .await
            .unwrap();

        let err = w.ledger.remove_member(board.id, a.user_id, a.user_id).await.unwrap_err();
        assert!(matches!(err, crate::error::ServiceError::FailedPrecondition(_)));
        assert_eq!(w.ledger.count_admins(board.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_unrelated_user_sees_nothing() {
        let w = world();
        let a = sign_in(&w, "a2@example.com").await;
        let stranger = Uuid::new_v4();
        let board = w
            .boards
            .create(a.user_id, NewBoard { name: "B".into(), description: String::new() })
            .await
            .unwrap();

        assert!(w.boards.get(board.id, stranger).await.is_err());
        assert!(w.ledger.list_members(board.id, stranger).await.is_err());
        assert!(w.boards.get(board.id, a.user_id).await.is_ok());
    }
}
