use acu_auth::password::hash_password;
use acu_store::{NewIdentity, Store};

use crate::config::{ADMIN_PASSWORD_ENV, AppConfig};

/// On startup, if there are no identities at all, create an `admin` one.
///
/// Password source (highest precedence first):
/// - env `ACU_ADMIN_PASSWORD`
/// - `config.toml` `[auth].admin_password`
pub async fn bootstrap_admin(store: &Store, cfg: &AppConfig) -> anyhow::Result<()> {
    if store.count_identities().await? > 0 {
        return Ok(());
    }

    let admin_password =
        std::env::var(ADMIN_PASSWORD_ENV).unwrap_or_else(|_| cfg.auth.admin_password.clone());

    if admin_password.trim().is_empty() {
        anyhow::bail!(
            "admin password is empty (set {ADMIN_PASSWORD_ENV} or config.toml [auth].admin_password)"
        );
    }

    let hash = hash_password(&admin_password)?;
    store
        .create_identity(&NewIdentity {
            username: "admin".to_string(),
            email: cfg.auth.admin_email.trim().to_lowercase(),
            password_hash: hash,
            is_admin: true,
        })
        .await?;

    tracing::warn!("bootstrapped identity 'admin' (password taken from env/config)");
    Ok(())
}
