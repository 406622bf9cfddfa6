use std::path::PathBuf;
use std::sync::Arc;

use microblog_db::{Database, DbResult};
use tracing::error;

use crate::error::ApiError;
use crate::names::NameList;

/// Knobs the server hands to the handlers.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Where "save and clear" on the name-list page writes the list.
    pub names_file: PathBuf,
    /// Number of accounts generated by `/admin/populate_db`.
    pub seed_users: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            names_file: PathBuf::from("name_list.txt"),
            seed_users: 10,
        }
    }
}

/// Shared application state for all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub names: Arc<NameList>,
    pub settings: Arc<Settings>,
}

impl AppState {
    pub fn new(db: Arc<Database>, settings: Settings) -> Self {
        Self {
            db,
            names: Arc::new(NameList::generated()),
            settings: Arc::new(settings),
        }
    }

    /// Runs a blocking store operation off the async runtime.
    pub async fn run_db<F, T>(&self, f: F) -> Result<T, ApiError>
    where
        F: FnOnce(&Database) -> DbResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let db = self.db.clone();
        tokio::task::spawn_blocking(move || f(db.as_ref()))
            .await
            .map_err(|e| {
                error!("spawn_blocking join error: {}", e);
                ApiError::Internal("background task failed".into())
            })?
            .map_err(ApiError::from)
    }
}
