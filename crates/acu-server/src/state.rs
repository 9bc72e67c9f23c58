use acu_auth::{MemorySessionStore, SessionStore};
use acu_store::Store;
use std::{fs, path::Path, sync::Arc};

use crate::config::AppConfig;

/// Shared application state, cloned into every handler.
#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<AppConfig>,
    pub store: Store,
    pub sessions: Arc<dyn SessionStore>,
}

impl AppState {
    pub async fn init(cfg: &AppConfig) -> anyhow::Result<Self> {
        ensure_parent_dir(&cfg.database.sqlite_path)?;
        let store = Store::connect(&sqlite_url(&cfg.database.sqlite_path)).await?;

        // Bootstrap admin if no identities exist
        crate::bootstrap::bootstrap_admin(&store, cfg).await?;

        Ok(Self::new(cfg.clone(), store))
    }

    /// Assemble state around an already-open store with in-process sessions.
    pub fn new(cfg: AppConfig, store: Store) -> Self {
        Self {
            cfg: Arc::new(cfg),
            store,
            sessions: Arc::new(MemorySessionStore::new()),
        }
    }
}

fn sqlite_url(path: &str) -> String {
    // sqlx sqlite URL format: sqlite://relative/path.db (or sqlite:/abs/path.db)
    if Path::new(path).is_absolute() {
        format!("sqlite:{}", path)
    } else {
        format!("sqlite://{}", path)
    }
}

fn ensure_parent_dir(file_path: &str) -> anyhow::Result<()> {
    let p = Path::new(file_path);
    if let Some(parent) = p.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sqlite_url() {
        assert_eq!(sqlite_url("/srv/acu.sqlite"), "sqlite:/srv/acu.sqlite");
        assert_eq!(sqlite_url("data/acu.sqlite"), "sqlite://data/acu.sqlite");
    }
}
