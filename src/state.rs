use std::sync::Arc;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;

use crate::auth::jwt::JwtKeys;
use crate::config::AppConfig;
use crate::memory::MemoryStore;
use crate::observations::repo::{ObservationStore, PgObservationStore};
use crate::users::repo::{PgUserStore, UserStore};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub keys: JwtKeys,
    pub users: Arc<dyn UserStore>,
    pub observations: Arc<dyn ObservationStore>,
}

impl AppState {
    pub async fn init(config: AppConfig) -> anyhow::Result<Self> {
        let config = Arc::new(config);

        let (users, observations) = match &config.database_url {
            Some(url) => {
                let db = PgPoolOptions::new()
                    .max_connections(10)
                    .connect(url)
                    .await
                    .context("connect to database")?;
                (
                    Arc::new(PgUserStore::new(db.clone())) as Arc<dyn UserStore>,
                    Arc::new(PgObservationStore::new(db)) as Arc<dyn ObservationStore>,
                )
            }
            None => {
                tracing::warn!("DATABASE_URL not set; using in-memory store");
                let store = Arc::new(MemoryStore::new());
                (
                    store.clone() as Arc<dyn UserStore>,
                    store as Arc<dyn ObservationStore>,
                )
            }
        };

        Ok(Self::from_parts(config, users, observations))
    }

    pub fn from_parts(
        config: Arc<AppConfig>,
        users: Arc<dyn UserStore>,
        observations: Arc<dyn ObservationStore>,
    ) -> Self {
        let keys = JwtKeys::new(&config.jwt);
        Self {
            config,
            keys,
            users,
            observations,
        }
    }

    #[cfg(test)]
    pub fn fake() -> Self {
        Self::fake_with(|_| {})
    }

    /// In-memory state with a test config, adjusted by `tweak`.
    #[cfg(test)]
    pub fn fake_with(tweak: impl FnOnce(&mut AppConfig)) -> Self {
        use crate::config::{Environment, JwtConfig};

        let mut config = AppConfig {
            environment: Environment::Development,
            database_url: None,
            jwt: JwtConfig {
                secret: "test-jwt-secret".into(),
                expiry: std::time::Duration::from_secs(600 * 60),
            },
            owner_scoping: false,
            host: "127.0.0.1".into(),
            port: 0,
        };
        tweak(&mut config);

        let store = Arc::new(MemoryStore::new());
        Self::from_parts(
            Arc::new(config),
            store.clone() as Arc<dyn UserStore>,
            store as Arc<dyn ObservationStore>,
        )
    }
}
