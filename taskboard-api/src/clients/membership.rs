/// HTTP membership checker
///
/// Used when the task routes run apart from the board service. Asks
/// `GET {base}/board/:id/membership` with the caller's own bearer token, so
/// the board service answers for exactly the user who made the task request.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use taskboard_api::clients::HttpMembershipChecker;
/// use taskboard_shared::services::TaskRegistry;
/// use taskboard_shared::store::InMemoryTaskStore;
///
/// # fn example() -> anyhow::Result<()> {
/// let checker = HttpMembershipChecker::new("http://boards.internal:8080")?;
/// let tasks = TaskRegistry::new(Arc::new(InMemoryTaskStore::new()), Arc::new(checker));
/// # Ok(())
/// # }
/// ```

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;
use taskboard_shared::{
    auth::middleware::AuthContext,
    models::BoardRole,
    services::{MembershipCheckError, MembershipChecker},
};
use tracing::{debug, warn};
use uuid::Uuid;

/// Per-request timeout for membership calls
const DEFAULT_TIMEOUT_SECS: u64 = 5;

#[derive(Debug, Deserialize)]
struct MembershipAnswer {
    is_member: bool,
    #[serde(default)]
    role: Option<BoardRole>,
}

impl MembershipAnswer {
    fn into_role(self) -> Result<Option<BoardRole>, MembershipCheckError> {
        match (self.is_member, self.role) {
            (true, Some(role)) => Ok(Some(role)),
            (true, None) => Err(MembershipCheckError::InvalidResponse(
                "member without a role".to_string(),
            )),
            (false, _) => Ok(None),
        }
    }
}

/// [`MembershipChecker`] backed by a remote board service
#[derive(Debug, Clone)]
pub struct HttpMembershipChecker {
    base_url: String,
    client: reqwest::Client,
}

impl HttpMembershipChecker {
    /// Creates a checker with a 5 second request timeout
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>) -> Result<Self, reqwest::Error> {
        Self::with_timeout(base_url, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    pub fn with_timeout(
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    fn membership_url(&self, board_id: Uuid) -> String {
        format!("{}/board/{}/membership", self.base_url, board_id)
    }
}

#[async_trait]
impl MembershipChecker for HttpMembershipChecker {
    async fn role_of(
        &self,
        board_id: Uuid,
        caller: &AuthContext,
    ) -> Result<Option<BoardRole>, MembershipCheckError> {
        let response = self
            .client
            .get(self.membership_url(board_id))
            .bearer_auth(&caller.token)
            .send()
            .await
            .map_err(|e| {
                warn!(board_id = %board_id, error = %e, "Membership request failed");
                MembershipCheckError::Unavailable(e.to_string())
            })?;

        match response.status() {
            status if status.is_success() => {}
            StatusCode::UNAUTHORIZED => {
                return Err(MembershipCheckError::Unauthorized(
                    "board service rejected the token".to_string(),
                ));
            }
            status => {
                return Err(MembershipCheckError::Unavailable(format!(
                    "board service returned {}",
                    status
                )));
            }
        }

        let answer: MembershipAnswer = response
            .json()
            .await
            .map_err(|e| MembershipCheckError::InvalidResponse(e.to_string()))?;

        debug!(board_id = %board_id, user_id = %caller.user_id, is_member = answer.is_member, "Membership answered");
        answer.into_role()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_membership_url_trims_trailing_slash() {
        let checker = HttpMembershipChecker::new("http://boards.local:8080/").unwrap();
        let board_id = Uuid::nil();
        assert_eq!(
            checker.membership_url(board_id),
            format!("http://boards.local:8080/board/{}/membership", board_id)
        );
    }

    #[test]
    fn test_answer_parsing() {
        let member: MembershipAnswer =
            serde_json::from_str(r#"{"is_member":true,"role":"Viewer"}"#).unwrap();
        assert_eq!(member.into_role().unwrap(), Some(BoardRole::Viewer));

        let stranger: MembershipAnswer = serde_json::from_str(r#"{"is_member":false}"#).unwrap();
        assert_eq!(stranger.into_role().unwrap(), None);

        let broken: MembershipAnswer = serde_json::from_str(r#"{"is_member":true}"#).unwrap();
        assert!(matches!(
            broken.into_role(),
            Err(MembershipCheckError::InvalidResponse(_))
        ));
    }

    #[tokio::test]
    async fn test_unreachable_service_is_unavailable() {
        // Port 9 (discard) is closed on test hosts
        let checker =
            HttpMembershipChecker::with_timeout("http://127.0.0.1:9", Duration::from_millis(500))
                .unwrap();
        let caller = AuthContext {
            user_id: Uuid::new_v4(),
            email: "a@example.com".to_string(),
            token: "t".to_string(),
        };

        let err = checker.role_of(Uuid::new_v4(), &caller).await.unwrap_err();
        assert!(matches!(err, MembershipCheckError::Unavailable(_)));
    }
}
