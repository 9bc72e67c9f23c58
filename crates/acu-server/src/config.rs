use serde::{Deserialize, Serialize};
use std::{
    env, fs,
    path::{Path, PathBuf},
};

/// Env var naming the settings file.
pub const CONFIG_ENV: &str = "ACU_SERVER_CONFIG";

/// Env var that overrides `[auth].admin_password`.
pub const ADMIN_PASSWORD_ENV: &str = "ACU_ADMIN_PASSWORD";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address, e.g. "0.0.0.0:8000"
    #[serde(default = "default_bind")]
    pub bind: String,
}

fn default_bind() -> String {
    "0.0.0.0:8000".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite file holding all school data.
    #[serde(default = "default_sqlite_path")]
    pub sqlite_path: String,
}

fn default_sqlite_path() -> String {
    "data/acuverify.sqlite".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            sqlite_path: default_sqlite_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Password for the `admin` identity created on an empty database.
    /// Prefer setting `ACU_ADMIN_PASSWORD`.
    #[serde(default = "default_admin_password")]
    pub admin_password: String,

    /// Email recorded on the bootstrapped admin identity.
    #[serde(default = "default_admin_email")]
    pub admin_email: String,
}

fn default_admin_password() -> String {
    "changeme".to_string()
}

fn default_admin_email() -> String {
    "admin@acuverify.local".to_string()
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            admin_password: default_admin_password(),
            admin_email: default_admin_email(),
        }
    }
}

/// Load settings from `path`, or from `ACU_SERVER_CONFIG` / `config.toml`.
///
/// A missing file yields the defaults; an unreadable or malformed one is an
/// error.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<AppConfig> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(config_path);
    if !path.exists() {
        tracing::info!(path = %path.display(), "no config file, using defaults");
        return Ok(AppConfig::default());
    }
    let raw = fs::read_to_string(&path)?;
    let cfg: AppConfig = toml::from_str(&raw)?;
    Ok(cfg)
}

fn config_path() -> PathBuf {
    if let Ok(p) = env::var(CONFIG_ENV) {
        return PathBuf::from(p);
    }
    PathBuf::from("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let cfg: AppConfig = toml::from_str(
            r#"
            [database]
            sqlite_path = "/var/lib/acu/school.sqlite"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.database.sqlite_path, "/var/lib/acu/school.sqlite");
        assert_eq!(cfg.server.bind, "0.0.0.0:8000");
        assert_eq!(cfg.auth.admin_password, "changeme");
    }

    #[test]
    fn test_missing_file_is_default() {
        let cfg = load_config(Some(Path::new("/nonexistent/acu/config.toml"))).unwrap();
        assert_eq!(cfg.server.bind, default_bind());
    }
}
