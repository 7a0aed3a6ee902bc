use std::str::FromStr;

use anyhow::Context;

use crate::messages::Locale;

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub access_secret: String,
    pub refresh_secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
    pub refresh_ttl_minutes: i64,
}

/// Argon2 cost parameters used for new password hashes.
#[derive(Debug, Clone)]
pub struct HashConfig {
    pub m_cost: u32,
    pub t_cost: u32,
    pub p_cost: u32,
}

impl Default for HashConfig {
    fn default() -> Self {
        Self {
            m_cost: argon2::Params::DEFAULT_M_COST,
            t_cost: argon2::Params::DEFAULT_T_COST,
            p_cost: argon2::Params::DEFAULT_P_COST,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MailDriver {
    /// Only logs the activation link. Handy for local development.
    Log,
    /// Sends through AWS SES v2.
    Ses,
}

impl FromStr for MailDriver {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "log" => Ok(Self::Log),
            "ses" => Ok(Self::Ses),
            other => anyhow::bail!("unknown MAIL_DRIVER {other:?}"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MailConfig {
    pub driver: MailDriver,
    pub from: String,
    pub region: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    /// Public base URL of this API, used to build activation links.
    pub api_url: String,
    /// Frontend URL; activation redirects here and CORS allows it.
    pub client_url: String,
    pub jwt: JwtConfig,
    pub hash: HashConfig,
    pub mail: MailConfig,
    pub locale: Locale,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL")?;
        let jwt = JwtConfig {
            access_secret: std::env::var("JWT_ACCESS_SECRET").context("JWT_ACCESS_SECRET")?,
            refresh_secret: std::env::var("JWT_REFRESH_SECRET").context("JWT_REFRESH_SECRET")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "user-auth".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "user-auth-clients".into()),
            ttl_minutes: env_or("JWT_TTL_MINUTES", 30)?,
            refresh_ttl_minutes: env_or("JWT_REFRESH_TTL_MINUTES", 60 * 24 * 30)?,
        };
        let defaults = HashConfig::default();
        let hash = HashConfig {
            m_cost: env_or("PASSWORD_HASH_M_COST", defaults.m_cost)?,
            t_cost: env_or("PASSWORD_HASH_T_COST", defaults.t_cost)?,
            p_cost: env_or("PASSWORD_HASH_P_COST", defaults.p_cost)?,
        };
        let mail = MailConfig {
            driver: env_or("MAIL_DRIVER", MailDriver::Log)?,
            from: std::env::var("MAIL_FROM").unwrap_or_else(|_| "no-reply@localhost".into()),
            region: std::env::var("AWS_REGION").unwrap_or_else(|_| "us-east-1".into()),
        };

        Ok(Self {
            database_url,
            api_url: std::env::var("API_URL").unwrap_or_else(|_| "http://localhost:8080".into()),
            client_url: std::env::var("CLIENT_URL")
                .unwrap_or_else(|_| "http://localhost:3000".into()),
            jwt,
            hash,
            mail,
            locale: env_or("MESSAGES_LOCALE", Locale::En)?,
        })
    }
}

/// Parses an optional variable. Unset means `default`; a malformed value is an error.
fn env_or<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(v) => v
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("invalid {key}={v:?}: {e}")),
        Err(_) => Ok(default),
    }
}
