use crate::config::AppConfig;
use crate::store::{MemoryStore, PgStore, Store};
use std::sync::Arc;
use tracing::warn;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let store: Arc<dyn Store> = match &config.database {
            Some(db) => {
                let store = PgStore::connect(db).await?;
                if let Err(e) = store.migrate().await {
                    warn!(error = %e, "migration failed; continuing");
                }
                Arc::new(store)
            }
            None => {
                warn!("using in-memory store; data is lost on restart");
                Arc::new(MemoryStore::new())
            }
        };

        Ok(Self { store, config })
    }

    /// State over a fresh [`MemoryStore`]; nothing touches a database.
    #[cfg(test)]
    pub fn in_memory() -> Self {
        let config = Arc::new(AppConfig {
            database: None,
            host: "127.0.0.1".into(),
            port: 0,
        });
        Self {
            store: Arc::new(MemoryStore::new()),
            config,
        }
    }
}
