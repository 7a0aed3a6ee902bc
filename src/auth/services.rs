use std::sync::Arc;

use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::{
        dto::{AuthResponse, UserDto},
        password::Hasher,
        repo::UserRepo,
        repo_types::User,
        tokens::TokenService,
    },
    error::{AuthError, BadRequestKind},
    mail::Mailer,
};

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Normalizes the email and checks both fields before they reach the service.
pub(crate) fn validate_credentials(email: &str, password: &str) -> Result<String, AuthError> {
    let email = email.trim().to_lowercase();
    if !is_valid_email(&email) {
        return Err(AuthError::BadRequest(BadRequestKind::InvalidEmail));
    }
    if !(4..=32).contains(&password.chars().count()) {
        return Err(AuthError::BadRequest(BadRequestKind::InvalidPassword));
    }
    Ok(email)
}

pub fn activation_url(api_url: &str, link: &str) -> String {
    format!("{}/api/activate/{}", api_url.trim_end_matches('/'), link)
}

/// Account lifecycle: registration, activation and sessions.
///
/// Built once at startup; every collaborator is injected so tests can swap
/// the database and mail transport for in-memory doubles.
pub struct UserService {
    users: Arc<dyn UserRepo>,
    tokens: TokenService,
    mailer: Arc<dyn Mailer>,
    hasher: Hasher,
    api_url: String,
}

impl UserService {
    pub fn new(
        users: Arc<dyn UserRepo>,
        tokens: TokenService,
        mailer: Arc<dyn Mailer>,
        hasher: Hasher,
        api_url: impl Into<String>,
    ) -> Self {
        Self {
            users,
            tokens,
            mailer,
            hasher,
            api_url: api_url.into(),
        }
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    /// Signs a fresh pair for `user` and stores the refresh half.
    async fn issue_session(&self, user: &User) -> Result<AuthResponse, AuthError> {
        let dto = UserDto::from(user);
        let pair = self.tokens.generate_tokens(&dto)?;
        self.tokens.save_token(dto.id, &pair.refresh_token).await?;
        Ok(AuthResponse {
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
            user: dto,
        })
    }

    /// The user row and the refresh token are written separately; if the
    /// second write fails the account exists without a session and the next
    /// login repairs it.
    #[instrument(skip(self, password))]
    pub async fn register(&self, email: &str, password: &str) -> Result<AuthResponse, AuthError> {
        let duplicate = || AuthError::BadRequest(BadRequestKind::DuplicateEmail(email.to_string()));

        if self.users.find_by_email(email).await?.is_some() {
            warn!(email = %email, "email already registered");
            return Err(duplicate());
        }

        let password_hash = self.hasher.hash(password).await?;
        let activation_link = Uuid::new_v4().to_string();
        let user = self
            .users
            .create(email, &password_hash, &activation_link)
            .await?
            .ok_or_else(|| {
                warn!(email = %email, "email taken concurrently");
                duplicate()
            })?;

        self.mailer
            .send_activation_mail(email, &activation_url(&self.api_url, &activation_link))
            .await?;

        let response = self.issue_session(&user).await?;
        info!(user_id = %user.id, email = %user.email, "user registered");
        Ok(response)
    }

    /// Repeated calls with the same link succeed; the link is kept after use.
    #[instrument(skip(self))]
    pub async fn activate(&self, activation_link: &str) -> Result<User, AuthError> {
        if self
            .users
            .find_by_activation_link(activation_link)
            .await?
            .is_none()
        {
            warn!("unknown activation link");
            return Err(AuthError::BadRequest(BadRequestKind::InvalidActivationLink));
        }

        let user = self
            .users
            .activate(activation_link)
            .await?
            .ok_or(AuthError::BadRequest(BadRequestKind::InvalidActivationLink))?;
        info!(user_id = %user.id, "user activated");
        Ok(user)
    }

    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, AuthError> {
        let Some(user) = self.users.find_by_email(email).await? else {
            self.hasher.verify_dummy(password).await?;
            warn!(email = %email, "login unknown email");
            return Err(AuthError::BadRequest(BadRequestKind::UnregisteredEmail));
        };

        if !self.hasher.verify(password, &user.password_hash).await? {
            warn!(email = %email, user_id = %user.id, "login invalid password");
            return Err(AuthError::BadRequest(BadRequestKind::InvalidCredentials));
        }

        let response = self.issue_session(&user).await?;
        info!(user_id = %user.id, email = %user.email, "user logged in");
        Ok(response)
    }

    /// Deletes the stored token without checking its signature.
    #[instrument(skip_all)]
    pub async fn logout(&self, refresh_token: &str) -> Result<u64, AuthError> {
        let removed = self.tokens.remove_token(refresh_token).await?;
        info!(removed, "logout");
        Ok(removed)
    }

    /// Both the signature and the stored copy must check out, so a token
    /// removed by logout or rotation is dead even before it expires.
    #[instrument(skip_all)]
    pub async fn refresh(&self, refresh_token: Option<&str>) -> Result<AuthResponse, AuthError> {
        let token = refresh_token
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::Unauthorized)?;

        let claims = self.tokens.validate_refresh_token(token);
        let stored = self.tokens.find_token(token).await?;
        let (Some(claims), Some(stored)) = (claims, stored) else {
            warn!("refresh token invalid or revoked");
            return Err(AuthError::Unauthorized);
        };
        if stored.user_id != claims.sub {
            warn!(user_id = %claims.sub, "refresh token owner mismatch");
            return Err(AuthError::Unauthorized);
        }

        let Some(user) = self.users.find_by_id(claims.sub).await? else {
            warn!(user_id = %claims.sub, "refresh for missing user");
            return Err(AuthError::Unauthorized);
        };

        let response = self.issue_session(&user).await?;
        info!(user_id = %user.id, "session refreshed");
        Ok(response)
    }

    pub async fn get_users(&self) -> Result<Vec<UserDto>, AuthError> {
        Ok(self.users.list().await?)
    }
}
