//! Shared helpers for API tests
//!
//! Builds the full router over in-memory stores and an in-memory event bus,
//! so the tests need no Postgres or Redis.

#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use taskboard_api::{
    app::{build_router, AppState},
    config::ApiConfig,
};
use taskboard_shared::{
    events::{memory::InMemoryBus, EventSubscription},
    services::{
        Authenticator, BoardDeletedHandler, BoardRegistry, CascadeNotifier, InvitationWorkflow,
        LedgerMembershipChecker, MembershipChecker, MembershipLedger, TaskRegistry,
    },
    store::{InMemoryBoardStore, InMemoryTaskStore, InMemoryUserStore},
};
use tower::ServiceExt;
use uuid::Uuid;

pub const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

/// Router plus handles on the in-memory backends
pub struct TestApp {
    pub app: Router,
    pub bus: InMemoryBus,
    pub board_store: InMemoryBoardStore,
    pub task_store: InMemoryTaskStore,
    pub ledger: MembershipLedger,
}

/// A signed-up, logged-in user
pub struct TestUser {
    pub id: Uuid,
    pub email: String,
    pub token: String,
}

impl TestApp {
    pub fn new() -> Self {
        Self::build(None)
    }

    /// Same backends, but task routes ask `checker` for membership
    pub fn with_checker(checker: Arc<dyn MembershipChecker>) -> Self {
        Self::build(Some(checker))
    }

    fn build(checker: Option<Arc<dyn MembershipChecker>>) -> Self {
        let board_store = InMemoryBoardStore::new();
        let task_store = InMemoryTaskStore::new();
        let bus = InMemoryBus::new();

        let ledger = MembershipLedger::new(Arc::new(board_store.clone()));
        let notifier = CascadeNotifier::new(Arc::new(bus.clone()), Arc::new(board_store.clone()));
        let checker =
            checker.unwrap_or_else(|| Arc::new(LedgerMembershipChecker::new(ledger.clone())));

        let state = AppState::new(
            Authenticator::new(Arc::new(InMemoryUserStore::new()), SECRET),
            BoardRegistry::new(Arc::new(board_store.clone()), notifier),
            ledger.clone(),
            InvitationWorkflow::new(Arc::new(board_store.clone())),
            TaskRegistry::new(Arc::new(task_store.clone()), checker),
            ApiConfig::default(),
        );

        Self {
            app: build_router(state),
            bus,
            board_store,
            task_store,
            ledger,
        }
    }

    /// Sends one request and returns the status and parsed JSON body
    ///
    /// An empty body parses as `Value::Null`.
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };

        (status, json)
    }

    pub async fn signup_and_login(&self, email: &str) -> TestUser {
        let credentials = serde_json::json!({ "email": email, "password": "correct horse" });

        let (status, body) = self
            .send(Method::POST, "/signup", None, Some(credentials.clone()))
            .await;
        assert_eq!(status, StatusCode::OK, "signup failed: {}", body);
        let id = body["id"].as_str().unwrap().parse().unwrap();

        let (status, body) = self.send(Method::POST, "/login", None, Some(credentials)).await;
        assert_eq!(status, StatusCode::OK, "login failed: {}", body);

        TestUser {
            id,
            email: email.to_string(),
            token: body["token"].as_str().unwrap().to_string(),
        }
    }

    /// Creates a board owned by `owner` and returns its id
    pub async fn create_board(&self, owner: &TestUser, name: &str) -> Uuid {
        let (status, body) = self
            .send(
                Method::POST,
                "/board",
                Some(&owner.token),
                Some(serde_json::json!({ "name": name })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "create board failed: {}", body);
        body["id"].as_str().unwrap().parse().unwrap()
    }

    /// Invites `invitee` with `role` and has them accept
    pub async fn add_member(&self, admin: &TestUser, board_id: Uuid, invitee: &TestUser, role: &str) {
        let (status, body) = self
            .send(
                Method::POST,
                "/board/invite",
                Some(&admin.token),
                Some(serde_json::json!({
                    "board_id": board_id,
                    "invitee_id": invitee.id,
                    "role": role,
                })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "invite failed: {}", body);
        let invitation_id = body["invitation_id"].as_str().unwrap().to_string();

        let (status, body) = self
            .send(
                Method::PATCH,
                "/board/invitation",
                Some(&invitee.token),
                Some(serde_json::json!({ "invitation_id": invitation_id, "action": "Accepted" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "accept failed: {}", body);
    }

    /// Runs the cascade subscriber over everything currently on the bus
    pub async fn drain_cascade(&self) -> u64 {
        let handler = BoardDeletedHandler::new(Arc::new(self.task_store.clone()));
        let mut removed = 0;
        for delivery in self.bus.fetch(100).await.unwrap() {
            removed += handler.handle(&delivery.event).await.unwrap();
            self.bus.ack(&delivery.id).await.unwrap();
        }
        removed
    }
}
