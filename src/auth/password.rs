use std::sync::Arc;

use anyhow::Context;
use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use rand::rngs::OsRng;
use tracing::error;

use crate::config::HashConfig;

/// Argon2id hashing with cost parameters taken from configuration.
///
/// Hashing is CPU bound, so the async entry points run on the blocking pool.
#[derive(Clone)]
pub struct Hasher {
    params: Params,
    /// Hash of a random secret at the configured cost; no account owns it.
    dummy: Arc<str>,
}

impl Hasher {
    pub fn new(cfg: &HashConfig) -> anyhow::Result<Self> {
        let params = Params::new(cfg.m_cost, cfg.t_cost, cfg.p_cost, None).map_err(|e| {
            error!(error = %e, "invalid argon2 params");
            anyhow::anyhow!("invalid password hash params: {e}")
        })?;
        let mut hasher = Self {
            params,
            dummy: Arc::from(""),
        };
        let secret = SaltString::generate(&mut OsRng);
        hasher.dummy = hasher.hash_password(secret.as_str())?.into();
        Ok(hasher)
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    pub fn hash_password(&self, plain: &str) -> anyhow::Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2()
            .hash_password(plain.as_bytes(), &salt)
            .map_err(|e| {
                error!(error = %e, "argon2 hash_password error");
                anyhow::anyhow!(e.to_string())
            })?
            .to_string();
        Ok(hash)
    }

    /// Stored hashes carry their own params, so older hashes still verify
    /// after the configured cost changes.
    pub fn verify_password(&self, plain: &str, hash: &str) -> anyhow::Result<bool> {
        let parsed = PasswordHash::new(hash).map_err(|e| {
            error!(error = %e, "argon2 parse hash error");
            anyhow::anyhow!(e.to_string())
        })?;
        Ok(self
            .argon2()
            .verify_password(plain.as_bytes(), &parsed)
            .is_ok())
    }

    pub async fn hash(&self, plain: &str) -> anyhow::Result<String> {
        let hasher = self.clone();
        let plain = plain.to_owned();
        tokio::task::spawn_blocking(move || hasher.hash_password(&plain))
            .await
            .context("hash task panicked")?
    }

    pub async fn verify(&self, plain: &str, hash: &str) -> anyhow::Result<bool> {
        let hasher = self.clone();
        let (plain, hash) = (plain.to_owned(), hash.to_owned());
        tokio::task::spawn_blocking(move || hasher.verify_password(&plain, &hash))
            .await
            .context("verify task panicked")?
    }

    /// Spends one verification's worth of work when there is no stored hash
    /// to check, so a missing account costs as much as a wrong password.
    pub async fn verify_dummy(&self, plain: &str) -> anyhow::Result<bool> {
        let dummy = self.dummy.clone();
        self.verify(plain, &dummy).await
    }
}
