use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// User record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,                   // unique user ID
    pub email: String,              // unique
    #[serde(skip_serializing)]
    pub password_hash: String,      // Argon2 hash, not exposed in JSON
    pub is_activated: bool,         // set once the activation link is followed
    #[serde(skip_serializing)]
    pub activation_link: String,    // single-use token mailed at registration
    pub created_at: OffsetDateTime, // creation timestamp
}

/// Owner of a persisted refresh token; one row per user.
#[derive(Debug, Clone, FromRow)]
pub struct RefreshTokenRecord {
    pub user_id: Uuid,
}
