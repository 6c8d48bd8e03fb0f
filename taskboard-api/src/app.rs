/// Application state and router builder
///
/// This module defines the shared application state and builds the Axum
/// router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use taskboard_api::app::{build_router, AppState};
/// use taskboard_api::config::ApiConfig;
/// use taskboard_shared::events::memory::InMemoryBus;
/// use taskboard_shared::services::*;
/// use taskboard_shared::store::{InMemoryBoardStore, InMemoryTaskStore, InMemoryUserStore};
///
/// let boards = InMemoryBoardStore::new();
/// let ledger = MembershipLedger::new(Arc::new(boards.clone()));
/// let notifier = CascadeNotifier::new(Arc::new(InMemoryBus::new()), Arc::new(boards.clone()));
///
/// let state = AppState::new(
///     Authenticator::new(Arc::new(InMemoryUserStore::new()), "secret-at-least-32-bytes-long!!!"),
///     BoardRegistry::new(Arc::new(boards.clone()), notifier),
///     ledger.clone(),
///     InvitationWorkflow::new(Arc::new(boards)),
///     TaskRegistry::new(
///         Arc::new(InMemoryTaskStore::new()),
///         Arc::new(LedgerMembershipChecker::new(ledger)),
///     ),
///     ApiConfig::default(),
/// );
/// let app = build_router(state);
/// ```

use crate::{config::ApiConfig, error::ApiError};
use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
    routing::{delete, get, patch, post, put},
    Router,
};
use std::{sync::Arc, time::Duration};
use taskboard_shared::auth::middleware::authenticate_header;
use taskboard_shared::services::{
    Authenticator, BoardRegistry, InvitationWorkflow, MembershipLedger, TaskRegistry,
};
use tower_http::{
    cors::CorsLayer,
    timeout::TimeoutLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned for each request via Axum's `State` extractor. Every service holds
/// its stores behind `Arc`, so cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    pub auth: Authenticator,
    pub boards: BoardRegistry,
    pub ledger: MembershipLedger,
    pub invitations: InvitationWorkflow,
    pub tasks: TaskRegistry,

    /// HTTP server configuration
    pub api: Arc<ApiConfig>,
}

impl AppState {
    /// Creates new application state
    pub fn new(
        auth: Authenticator,
        boards: BoardRegistry,
        ledger: MembershipLedger,
        invitations: InvitationWorkflow,
        tasks: TaskRegistry,
        api: ApiConfig,
    ) -> Self {
        Self {
            auth,
            boards,
            ledger,
            invitations,
            tasks,
            api: Arc::new(api),
        }
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── GET    /health                   # per-store connectivity (public)
/// ├── POST   /signup                   # (public)
/// ├── POST   /login                    # (public)
/// ├── POST   /board                    # bearer token from here on
/// ├── GET    /board/:id
/// ├── DELETE /board/:id
/// ├── POST   /board/invite
/// ├── PATCH  /board/invitation
/// ├── GET    /invitations/:status
/// ├── GET    /board/:id/users
/// ├── GET    /board/:id/membership
/// ├── DELETE /board/:id/user/:uid
/// ├── GET    /board/:id/tasks
/// ├── POST   /task
/// ├── PUT    /task/:id
/// └── DELETE /task/:id
/// ```
///
/// # Middleware Stack
///
/// Applied in order (bottom to top):
/// 1. Request timeout (tower-http TimeoutLayer)
/// 2. CORS (tower-http CorsLayer)
/// 3. Logging (tower-http TraceLayer)
/// 4. Authentication (protected routes only)
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let public_routes = Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/signup", post(routes::auth::signup))
        .route("/login", post(routes::auth::login));

    let protected_routes = Router::new()
        .route("/board", post(routes::boards::create_board))
        .route("/board/invite", post(routes::invitations::invite_user))
        .route("/board/invitation", patch(routes::invitations::handle_invitation))
        .route(
            "/board/:id",
            get(routes::boards::get_board).delete(routes::boards::delete_board),
        )
        .route("/board/:id/users", get(routes::boards::list_members))
        .route("/board/:id/membership", get(routes::boards::check_membership))
        .route("/board/:id/user/:uid", delete(routes::boards::remove_member))
        .route("/board/:id/tasks", get(routes::tasks::list_tasks))
        .route("/invitations/:status", get(routes::invitations::list_invitations))
        .route("/task", post(routes::tasks::create_task))
        .route(
            "/task/:id",
            put(routes::tasks::update_task).delete(routes::tasks::delete_task),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    let cors = if state.api.cors_origins.iter().any(|o| o == "*") {
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .max_age(Duration::from_secs(3600))
    };

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(TimeoutLayer::new(Duration::from_secs(
            state.api.request_timeout_secs,
        )))
        .with_state(state)
}

/// JWT authentication middleware layer
///
/// Validates the bearer token and injects an `AuthContext` into request
/// extensions.
async fn jwt_auth_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let header_value = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    let auth_context = authenticate_header(header_value, state.auth.secret())?;
    tracing::debug!(user_id = %auth_context.user_id, "Authenticated request");

    req.extensions_mut().insert(auth_context);
    Ok(next.run(req).await)
}
