use std::sync::Arc;

use crate::{
    auth::{
        jwt::JwtKeys,
        password::Hasher,
        repo::{PgTokenRepo, PgUserRepo},
        services::UserService,
        tokens::TokenService,
    },
    config::AppConfig,
    db, mail,
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub accounts: Arc<UserService>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let pool = db::connect(&config.database_url).await?;
        db::migrate(&pool).await?;

        let tokens = TokenService::new(
            JwtKeys::from(&config.jwt),
            Arc::new(PgTokenRepo::new(pool.clone())),
        );
        let accounts = Arc::new(UserService::new(
            Arc::new(PgUserRepo::new(pool)),
            tokens,
            mail::from_config(&config.mail).await,
            Hasher::new(&config.hash)?,
            config.api_url.clone(),
        ));

        Ok(Self::from_parts(config, accounts))
    }

    pub fn from_parts(config: Arc<AppConfig>, accounts: Arc<UserService>) -> Self {
        Self { config, accounts }
    }
}
