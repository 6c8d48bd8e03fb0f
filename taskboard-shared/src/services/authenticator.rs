//! Credential store front end: signup, login and token validation

use std::sync::Arc;

use uuid::Uuid;

use crate::auth::jwt::{create_token, validate_token, Claims};
use crate::auth::password::{hash_password, verify_against_dummy, verify_password};
use crate::error::{ServiceError, ServiceResult};
use crate::models::{CreateUser, User};
use crate::store::{StoreError, UserStore};

const INVALID_CREDENTIALS: &str = "invalid email or password";

/// Issues and validates bearer tokens against the users database
#[derive(Clone)]
pub struct Authenticator {
    users: Arc<dyn UserStore>,
    secret: String,
}

impl Authenticator {
    pub fn new(users: Arc<dyn UserStore>, secret: impl Into<String>) -> Self {
        Self {
            users,
            secret: secret.into(),
        }
    }

    /// Registers a user with an Argon2id password hash
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` if email or password is empty
    /// - `AlreadyExists` if the email is already registered
    pub async fn signup(&self, email: &str, password: &str) -> ServiceResult<User> {
        if email.is_empty() || password.is_empty() {
            return Err(ServiceError::invalid_argument("email and password are required"));
        }

        let password = password.to_string();
        let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
            .await
            .map_err(|e| ServiceError::internal(format!("hashing task failed: {}", e)))??;

        let user = self
            .users
            .insert_user(CreateUser {
                email: email.to_string(),
                password_hash,
            })
            .await
            .map_err(|err| match err {
                StoreError::Duplicate(_) => ServiceError::already_exists("user already exists"),
                other => other.into(),
            })?;

        tracing::info!(user_id = %user.id, "User signed up");
        Ok(user)
    }

    /// Checks credentials and issues a token
    ///
    /// Unknown emails still pay for a full hash verification, and both
    /// failure modes return the same error.
    pub async fn login(&self, email: &str, password: &str) -> ServiceResult<String> {
        if email.is_empty() || password.is_empty() {
            return Err(ServiceError::invalid_argument("email and password are required"));
        }

        let user = self.users.find_user_by_email(email).await?;

        let password = password.to_string();
        let stored_hash = user.as_ref().map(|u| u.password_hash.clone());
        let verified = tokio::task::spawn_blocking(move || match stored_hash {
            Some(hash) => verify_password(&password, &hash),
            None => verify_against_dummy(&password),
        })
        .await
        .map_err(|e| ServiceError::internal(format!("verification task failed: {}", e)))??;

        match user {
            Some(user) if verified => {
                tracing::debug!(user_id = %user.id, "Login succeeded");
                self.issue_token(user.id, &user.email)
            }
            _ => {
                tracing::debug!("Login rejected");
                Err(ServiceError::unauthenticated(INVALID_CREDENTIALS))
            }
        }
    }

    /// Signs a 24-hour token for `user_id`
    pub fn issue_token(&self, user_id: Uuid, email: &str) -> ServiceResult<String> {
        Ok(create_token(&Claims::new(user_id, email), &self.secret)?)
    }

    /// Returns the subject of a valid token
    ///
    /// # Errors
    ///
    /// `Unauthenticated` for an empty, malformed, wrongly signed or expired token
    pub fn validate(&self, token: &str) -> ServiceResult<Uuid> {
        if token.is_empty() {
            return Err(ServiceError::unauthenticated("token is required"));
        }
        Ok(validate_token(token, &self.secret)?.sub)
    }

    pub fn secret(&self) -> &str {
        &self.secret
    }

    pub async fn ping(&self) -> ServiceResult<()> {
        Ok(self.users.ping().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryUserStore;

    const SECRET: &str = "authenticator-test-secret-32-bytes!!";

    fn authenticator() -> Authenticator {
        Authenticator::new(Arc::new(InMemoryUserStore::new()), SECRET)
    }

    #[tokio::test]
    async fn test_signup_then_login() {
        let auth = authenticator();
        let user = auth.signup("ada@example.com", "hunter2").await.unwrap();

        let token = auth.login("ada@example.com", "hunter2").await.unwrap();
        assert_eq!(auth.validate(&token).unwrap(), user.id);
    }

    #[tokio::test]
    async fn test_signup_requires_fields() {
        let auth = authenticator();
        let err = auth.signup("", "pw").await.unwrap_err();
        assert_eq!(
            err,
            ServiceError::invalid_argument("email and password are required")
        );
        assert!(auth.signup("a@example.com", "").await.is_err());
    }

    #[tokio::test]
    async fn test_duplicate_email() {
        let auth = authenticator();
        auth.signup("dup@example.com", "pw").await.unwrap();
        let err = auth.signup("dup@example.com", "other").await.unwrap_err();
        assert_eq!(err, ServiceError::already_exists("user already exists"));
    }

    #[tokio::test]
    async fn test_wrong_password_matches_unknown_email() {
        let auth = authenticator();
        auth.signup("known@example.com", "right").await.unwrap();

        let wrong_password = auth.login("known@example.com", "wrong").await.unwrap_err();
        let unknown_email = auth.login("nobody@example.com", "right").await.unwrap_err();

        assert_eq!(wrong_password, unknown_email);
        assert_eq!(wrong_password, ServiceError::unauthenticated(INVALID_CREDENTIALS));
    }

    #[test]
    fn test_validate_rejects_garbage() {
        let auth = authenticator();
        assert_eq!(
            auth.validate(""),
            Err(ServiceError::unauthenticated("token is required"))
        );
        assert!(matches!(
            auth.validate("not.a.token"),
            Err(ServiceError::Unauthenticated(_))
        ));
    }

    #[test]
    fn test_token_from_other_secret_is_rejected() {
        let other = Authenticator::new(
            Arc::new(InMemoryUserStore::new()),
            "a-completely-different-secret-value!",
        );
        let token = other.issue_token(Uuid::new_v4(), "x@example.com").unwrap();
        assert!(authenticator().validate(&token).is_err());
    }
}
