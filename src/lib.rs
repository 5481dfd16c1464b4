pub mod activity;
pub mod backend;
pub mod cache;
pub mod chat;
pub mod db;
pub mod errors;
pub mod identity;
pub mod models;
pub mod store;
pub mod sync;
pub mod views;

use crate::errors::AppResult;
use crate::models::AppSettings;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;

pub use crate::backend::{ApplicationScope, InMemoryBackend, JobBoardBackend, PostingScope};
pub use crate::cache::CacheCodec;
pub use crate::db::CacheDb;
pub use crate::errors::AppError;
pub use crate::identity::{IdentityProvider, StaticIdentityProvider};
pub use crate::models::{Identity, Role, WorkspaceRecord};
pub use crate::store::WorkspaceStore;

static LOG_GUARD: std::sync::OnceLock<WorkerGuard> = std::sync::OnceLock::new();

pub fn load_settings(data_dir: &Path) -> AppSettings {
    let path = data_dir.join("settings.yaml");
    let raw = match std::fs::read_to_string(&path) {
        Ok(raw) => raw,
        Err(_) => return AppSettings::default(),
    };
    match serde_yaml::from_str(&raw) {
        Ok(settings) => settings,
        Err(error) => {
            tracing::warn!(error = %error, path = %path.display(), "settings file unreadable, using defaults");
            AppSettings::default()
        }
    }
}

pub fn init_tracing(data_dir: &Path) -> AppResult<()> {
    let settings = load_settings(data_dir);
    let log_dir = data_dir.join(&settings.log_dir);
    std::fs::create_dir_all(&log_dir)?;
    let file_appender = tracing_appender::rolling::daily(log_dir, "workspace.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    let _ = LOG_GUARD.set(guard);

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .json()
        .with_writer(non_blocking)
        .try_init()
        .map_err(|error| crate::errors::AppError::Internal(error.to_string()))
}

#[cfg(test)]
mod tests {
    use super::load_settings;

    #[test]
    fn settings_default_when_file_missing_or_broken() {
        let dir = tempfile::tempdir().expect("tempdir");
        let settings = load_settings(dir.path());
        assert_eq!(settings.cache_db_file, "workspace.db");
        assert_eq!(settings.slot_name, "workspaceRecords");

        std::fs::write(dir.path().join("settings.yaml"), "slotName: [broken").expect("write");
        let settings = load_settings(dir.path());
        assert_eq!(settings.slot_name, "workspaceRecords");

        std::fs::write(dir.path().join("settings.yaml"), "slotName: customSlot\n").expect("write");
        let settings = load_settings(dir.path());
        assert_eq!(settings.slot_name, "customSlot");
        assert_eq!(settings.cache_db_file, "workspace.db");
    }
}
