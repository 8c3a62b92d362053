use std::sync::Arc;
use std::time::Duration;

use axum::extract::FromRef;
use chrono::Utc;

use crate::config::{Config, SecretKey};
use crate::error::AppError;
use crate::file_store::{FileStore, LocalFsFileStore};
use crate::session;
use crate::storage::Database;

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub files: Arc<dyn FileStore>,
    pub secret_key: SecretKey,
    pub csrf_ttl: Duration,
}

impl AppState {
    pub fn new(config: &Config) -> Self {
        Self {
            db: Database::new(&config.database_path),
            files: Arc::new(LocalFsFileStore::new(&config.upload_dir)),
            secret_key: config.secret_key.clone(),
            csrf_ttl: config.csrf_ttl,
        }
    }

    /// Runs blocking SQLite work off the async executor.
    pub async fn with_db<T, F>(&self, f: F) -> Result<T, AppError>
    where
        F: FnOnce(&Database) -> Result<T, AppError> + Send + 'static,
        T: Send + 'static,
    {
        let db = self.db.clone();
        tokio::task::spawn_blocking(move || f(&db))
            .await
            .map_err(|err| AppError::Internal(format!("join database task: {err}")))?
    }

    pub fn csrf_token(&self) -> String {
        session::issue_csrf_token(&self.secret_key, Utc::now())
    }

    pub fn csrf_ok(&self, token: &str) -> bool {
        session::verify_csrf_token(&self.secret_key, token, Utc::now(), self.csrf_ttl)
    }
}

impl FromRef<AppState> for SecretKey {
    fn from_ref(state: &AppState) -> Self {
        state.secret_key.clone()
    }
}
