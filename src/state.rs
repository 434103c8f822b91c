use crate::config::AppConfig;
use crate::db;
use crate::tickets::{SqliteTicketStore, TicketService};
use axum::extract::FromRef;
use sqlx::SqlitePool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: Arc<AppConfig>,
    pub tickets: TicketService,
}

impl AppState {
    /// Opens the configured database and brings its schema up to date.
    pub async fn init(config: AppConfig) -> anyhow::Result<Self> {
        let db = db::connect(&config).await?;
        db::migrate(&db).await?;
        Ok(Self::from_parts(db, Arc::new(config)))
    }

    pub fn from_parts(db: SqlitePool, config: Arc<AppConfig>) -> Self {
        let tickets = TicketService::new(Arc::new(SqliteTicketStore::new(db.clone())));
        Self {
            db,
            config,
            tickets,
        }
    }
}

impl FromRef<AppState> for TicketService {
    fn from_ref(state: &AppState) -> Self {
        state.tickets.clone()
    }
}

#[cfg(test)]
impl AppState {
    /// Fresh state over a private in-memory database.
    pub async fn in_memory() -> Self {
        let config = AppConfig::from_lookup(|key| (key == "DB_PATH").then(|| ":memory:".into()))
            .expect("default config");
        Self::init(config).await.expect("in-memory state")
    }
}
