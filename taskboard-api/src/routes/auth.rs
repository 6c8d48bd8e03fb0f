/// Authentication endpoints
///
/// # Endpoints
///
/// - `POST /signup` - Register new user
/// - `POST /login` - Exchange credentials for a bearer token

use crate::{app::AppState, error::ApiResult, extract::AppJson};
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Credentials body shared by signup and login
///
/// Empty fields are not rejected here; the authenticator answers those with
/// `400 email and password are required`.
#[derive(Debug, Deserialize, Validate)]
pub struct CredentialsRequest {
    #[serde(default)]
    #[validate(length(max = 254, message = "Email must be at most 254 characters"))]
    pub email: String,

    #[serde(default)]
    #[validate(length(max = 128, message = "Password must be at most 128 characters"))]
    pub password: String,
}

/// Signup response
#[derive(Debug, Serialize, Deserialize)]
pub struct SignupResponse {
    pub id: String,
    pub email: String,
}

/// Login response
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
}

/// Register a new user
///
/// # Endpoint
///
/// ```text
/// POST /signup
/// Content-Type: application/json
///
/// { "email": "user@example.com", "password": "hunter22" }
/// ```
///
/// # Response
///
/// ```json
/// { "id": "uuid", "email": "user@example.com" }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: email or password missing
/// - `409 Conflict`: email already registered
/// - `422 Unprocessable Entity`: field too long
pub async fn signup(
    State(state): State<AppState>,
    AppJson(req): AppJson<CredentialsRequest>,
) -> ApiResult<Json<SignupResponse>> {
    req.validate()?;

    let user = state.auth.signup(&req.email, &req.password).await?;

    Ok(Json(SignupResponse {
        id: user.id.to_string(),
        email: user.email,
    }))
}

/// Login endpoint
///
/// # Response
///
/// ```json
/// { "token": "eyJ..." }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: email or password missing
/// - `401 Unauthorized`: unknown email or wrong password (same message)
pub async fn login(
    State(state): State<AppState>,
    AppJson(req): AppJson<CredentialsRequest>,
) -> ApiResult<Json<LoginResponse>> {
    req.validate()?;

    let token = state.auth.login(&req.email, &req.password).await?;

    Ok(Json(LoginResponse { token }))
}
