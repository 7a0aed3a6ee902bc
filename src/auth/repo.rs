use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::{
    dto::UserDto,
    repo_types::{RefreshTokenRecord, User},
};

/// Persistence for user records.
#[async_trait]
pub trait UserRepo: Send + Sync {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>>;
    async fn find_by_activation_link(&self, link: &str) -> anyhow::Result<Option<User>>;
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>>;
    /// Inserts a new inactive user. Returns `None` when the email is taken.
    async fn create(
        &self,
        email: &str,
        password_hash: &str,
        activation_link: &str,
    ) -> anyhow::Result<Option<User>>;
    /// Marks the user owning `link` as activated and returns the updated row.
    async fn activate(&self, link: &str) -> anyhow::Result<Option<User>>;
    async fn list(&self) -> anyhow::Result<Vec<UserDto>>;
}

/// Persistence for refresh tokens, one per user.
#[async_trait]
pub trait TokenRepo: Send + Sync {
    /// Inserts or replaces the user's refresh token.
    async fn save(&self, user_id: Uuid, refresh_token: &str) -> anyhow::Result<()>;
    async fn find(&self, refresh_token: &str) -> anyhow::Result<Option<RefreshTokenRecord>>;
    /// Returns the number of rows deleted.
    async fn remove(&self, refresh_token: &str) -> anyhow::Result<u64>;
}

#[derive(Clone)]
pub struct PgUserRepo {
    db: PgPool,
}

impl PgUserRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

const USER_COLUMNS: &str = "id, email, password_hash, is_activated, activation_link, created_at";

#[async_trait]
impl UserRepo for PgUserRepo {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.db)
        .await
        .context("find user by email")?;
        Ok(user)
    }

    async fn find_by_activation_link(&self, link: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE activation_link = $1"
        ))
        .bind(link)
        .fetch_optional(&self.db)
        .await
        .context("find user by activation link")?;
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("find user by id")?;
        Ok(user)
    }

    async fn create(
        &self,
        email: &str,
        password_hash: &str,
        activation_link: &str,
    ) -> anyhow::Result<Option<User>> {
        // ON CONFLICT turns a lost registration race into `None` instead of an error.
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (id, email, password_hash, activation_link)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (email) DO NOTHING
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(email)
        .bind(password_hash)
        .bind(activation_link)
        .fetch_optional(&self.db)
        .await
        .context("insert user")?;
        Ok(user)
    }

    async fn activate(&self, link: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
               SET is_activated = TRUE
             WHERE activation_link = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(link)
        .fetch_optional(&self.db)
        .await
        .context("activate user")?;
        Ok(user)
    }

    async fn list(&self) -> anyhow::Result<Vec<UserDto>> {
        let rows = sqlx::query_as::<_, UserDto>(
            r#"
            SELECT id, email, is_activated
              FROM users
             ORDER BY created_at ASC
            "#,
        )
        .fetch_all(&self.db)
        .await
        .context("list users")?;
        Ok(rows)
    }
}

#[derive(Clone)]
pub struct PgTokenRepo {
    db: PgPool,
}

impl PgTokenRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl TokenRepo for PgTokenRepo {
    async fn save(&self, user_id: Uuid, refresh_token: &str) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO tokens (user_id, refresh_token)
            VALUES ($1, $2)
            ON CONFLICT (user_id)
            DO UPDATE SET refresh_token = EXCLUDED.refresh_token, updated_at = now()
            "#,
        )
        .bind(user_id)
        .bind(refresh_token)
        .execute(&self.db)
        .await
        .context("save refresh token")?;
        Ok(())
    }

    async fn find(&self, refresh_token: &str) -> anyhow::Result<Option<RefreshTokenRecord>> {
        let row = sqlx::query_as::<_, RefreshTokenRecord>(
            r#"
            SELECT user_id
              FROM tokens
             WHERE refresh_token = $1
            "#,
        )
        .bind(refresh_token)
        .fetch_optional(&self.db)
        .await
        .context("find refresh token")?;
        Ok(row)
    }

    async fn remove(&self, refresh_token: &str) -> anyhow::Result<u64> {
        let res = sqlx::query("DELETE FROM tokens WHERE refresh_token = $1")
            .bind(refresh_token)
            .execute(&self.db)
            .await
            .context("remove refresh token")?;
        Ok(res.rows_affected())
    }
}
