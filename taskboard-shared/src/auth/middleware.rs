/// Bearer-token authentication for Axum handlers
///
/// [`authenticate_header`] reads `Authorization: Bearer <token>`, validates
/// it, and yields an [`AuthContext`] for the request extensions. The raw
/// token is kept so the task service can forward it when it asks a remote
/// board service about membership.
///
/// # Example
///
/// ```no_run
/// use taskboard_shared::auth::middleware::{authenticate_header, AuthError};
///
/// let ctx = authenticate_header(Some("Bearer eyJ..."), "secret-at-least-32-bytes-long!!");
/// assert!(matches!(ctx, Err(AuthError::InvalidToken(_))));
/// ```

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use super::jwt::{validate_token, JwtError};

/// Identity of the caller, added to request extensions after authentication
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    /// Authenticated user ID
    pub user_id: Uuid,

    /// Email from the token claims
    pub email: String,

    /// The bearer token as presented
    #[serde(skip_serializing, default)]
    pub token: String,
}

/// Error type for authentication middleware
#[derive(Debug, PartialEq, Eq)]
pub enum AuthError {
    /// Missing authorization header
    MissingCredentials,

    /// Header present but not `Bearer <token>`
    InvalidFormat(String),

    /// Token validation failed
    InvalidToken(String),
}

impl AuthError {
    fn message(&self) -> String {
        match self {
            AuthError::MissingCredentials => "missing bearer token".to_string(),
            AuthError::InvalidFormat(msg) | AuthError::InvalidToken(msg) => msg.clone(),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": "unauthorized",
            "message": self.message(),
        }));
        (StatusCode::UNAUTHORIZED, body).into_response()
    }
}

/// Extracts and validates the bearer token from a header value
pub fn authenticate_header(header_value: Option<&str>, secret: &str) -> Result<AuthContext, AuthError> {
    let header_value = header_value.ok_or(AuthError::MissingCredentials)?;

    let token = header_value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AuthError::InvalidFormat("expected Bearer token".to_string()))?;

    let claims = validate_token(token, secret).map_err(|e| match e {
        JwtError::Expired => AuthError::InvalidToken("token expired".to_string()),
        JwtError::UnexpectedAlgorithm => {
            AuthError::InvalidToken("unexpected signing method".to_string())
        }
        _ => AuthError::InvalidToken("invalid token".to_string()),
    })?;

    Ok(AuthContext {
        user_id: claims.sub,
        email: claims.email,
        token: token.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::{create_token, Claims};

    const SECRET: &str = "middleware-test-secret-at-least-32-bytes";

    #[test]
    fn test_valid_bearer_header() {
        let user_id = Uuid::new_v4();
        let token = create_token(&Claims::new(user_id, "a@example.com"), SECRET).unwrap();
        let header = format!("Bearer {}", token);

        let ctx = authenticate_header(Some(&header), SECRET).unwrap();
        assert_eq!(ctx.user_id, user_id);
        assert_eq!(ctx.email, "a@example.com");
        assert_eq!(ctx.token, token);
    }

    #[test]
    fn test_missing_and_malformed_headers() {
        assert_eq!(
            authenticate_header(None, SECRET),
            Err(AuthError::MissingCredentials)
        );
        assert!(matches!(
            authenticate_header(Some("Token abc"), SECRET),
            Err(AuthError::InvalidFormat(_))
        ));
        assert!(matches!(
            authenticate_header(Some("Bearer "), SECRET),
            Err(AuthError::InvalidFormat(_))
        ));
        assert!(matches!(
            authenticate_header(Some("Bearer garbage"), SECRET),
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_auth_error_is_unauthorized() {
        let response = AuthError::MissingCredentials.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
