use std::{sync::Arc, time::Duration};

use tracing::debug;
use uuid::Uuid;

use crate::auth::{
    claims::Claims,
    dto::UserDto,
    jwt::JwtKeys,
    repo::TokenRepo,
    repo_types::RefreshTokenRecord,
};

#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Issues and validates JWTs and keeps the refresh-token store.
#[derive(Clone)]
pub struct TokenService {
    keys: JwtKeys,
    repo: Arc<dyn TokenRepo>,
}

impl TokenService {
    pub fn new(keys: JwtKeys, repo: Arc<dyn TokenRepo>) -> Self {
        Self { keys, repo }
    }

    pub fn refresh_ttl(&self) -> Duration {
        self.keys.refresh_ttl
    }

    pub fn generate_tokens(&self, user: &UserDto) -> anyhow::Result<TokenPair> {
        Ok(TokenPair {
            access_token: self.keys.sign_access(user)?,
            refresh_token: self.keys.sign_refresh(user)?,
        })
    }

    pub async fn save_token(&self, user_id: Uuid, refresh_token: &str) -> anyhow::Result<()> {
        self.repo.save(user_id, refresh_token).await
    }

    pub async fn find_token(
        &self,
        refresh_token: &str,
    ) -> anyhow::Result<Option<RefreshTokenRecord>> {
        self.repo.find(refresh_token).await
    }

    pub async fn remove_token(&self, refresh_token: &str) -> anyhow::Result<u64> {
        self.repo.remove(refresh_token).await
    }

    /// Claims of a well-signed, unexpired refresh token, or `None`.
    pub fn validate_refresh_token(&self, token: &str) -> Option<Claims> {
        self.keys
            .verify_refresh(token)
            .map_err(|e| debug!(error = %e, "refresh token rejected"))
            .ok()
    }

    pub fn validate_access_token(&self, token: &str) -> Option<Claims> {
        self.keys
            .verify_access(token)
            .map_err(|e| debug!(error = %e, "access token rejected"))
            .ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{test_config, InMemoryTokens};

    fn service() -> (TokenService, Arc<InMemoryTokens>) {
        let repo = Arc::new(InMemoryTokens::default());
        let keys = JwtKeys::from(&test_config().jwt);
        (TokenService::new(keys, repo.clone()), repo)
    }

    fn user() -> UserDto {
        UserDto {
            id: Uuid::new_v4(),
            email: "tokens@example.com".into(),
            is_activated: false,
        }
    }

    #[test]
    fn generated_pair_validates_by_kind() {
        let (svc, _) = service();
        let pair = svc.generate_tokens(&user()).unwrap();
        assert!(svc.validate_access_token(&pair.access_token).is_some());
        assert!(svc.validate_refresh_token(&pair.refresh_token).is_some());
        assert!(svc.validate_access_token(&pair.refresh_token).is_none());
        assert!(svc.validate_refresh_token(&pair.access_token).is_none());
    }

    #[test]
    fn garbage_is_rejected() {
        let (svc, _) = service();
        assert!(svc.validate_refresh_token("not.a.jwt").is_none());
        assert!(svc.validate_refresh_token("").is_none());
    }

    #[tokio::test]
    async fn save_replaces_previous_token() {
        let (svc, repo) = service();
        let user = user();
        svc.save_token(user.id, "first").await.unwrap();
        svc.save_token(user.id, "second").await.unwrap();
        assert_eq!(repo.len(), 1);
        assert!(svc.find_token("first").await.unwrap().is_none());
        let found = svc.find_token("second").await.unwrap().unwrap();
        assert_eq!(found.user_id, user.id);
    }

    #[tokio::test]
    async fn remove_reports_count() {
        let (svc, _) = service();
        let user = user();
        svc.save_token(user.id, "tok").await.unwrap();
        assert_eq!(svc.remove_token("tok").await.unwrap(), 1);
        assert_eq!(svc.remove_token("tok").await.unwrap(), 0);
    }
}
