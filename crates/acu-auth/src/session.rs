//! Per-visitor session data and where it is kept between requests.

use acu_store::Identity;
use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::flow::LoginState;

/// How long a session lives after it was last saved.
pub const SESSION_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Opaque random key carried in the session cookie.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Accept a cookie value only if it looks like an id we issued.
    pub fn parse(raw: &str) -> Option<Self> {
        Uuid::parse_str(raw).ok().map(|u| Self(u.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The logged-in identity, as remembered by the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatedIdentity {
    pub identity_id: i64,
    pub username: String,
    pub email: String,
    pub is_admin: bool,
}

impl From<&Identity> for AuthenticatedIdentity {
    fn from(identity: &Identity) -> Self {
        Self {
            identity_id: identity.id,
            username: identity.username.clone(),
            email: identity.email.clone(),
            is_admin: identity.is_admin,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashLevel {
    Success,
    Info,
    Error,
}

impl FlashLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlashLevel::Success => "success",
            FlashLevel::Info => "info",
            FlashLevel::Error => "error",
        }
    }
}

/// A one-shot message shown on the next rendered page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub level: FlashLevel,
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Session {
    #[serde(default, deserialize_with = "login_state_or_reset")]
    pub login: LoginState,
    #[serde(default)]
    pub identity: Option<AuthenticatedIdentity>,
    #[serde(default)]
    pub flashes: Vec<Flash>,
}

/// A stored login step that no longer parses (missing email, unknown step
/// tag) starts the flow over instead of failing the whole session.
fn login_state_or_reset<'de, D>(deserializer: D) -> Result<LoginState, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = serde_json::Value::deserialize(deserializer)?;
    Ok(LoginState::deserialize(raw).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "corrupt login state in session; resetting");
        LoginState::EmailEntry
    }))
}

impl Session {
    pub fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }

    /// Nothing worth keeping: no identity, no login progress, no pending
    /// flashes.
    pub fn is_blank(&self) -> bool {
        self.identity.is_none() && self.login == LoginState::EmailEntry && self.flashes.is_empty()
    }

    /// Record a successful login and forget the login flow.
    pub fn establish(&mut self, identity: AuthenticatedIdentity) {
        self.identity = Some(identity);
        self.login = LoginState::EmailEntry;
    }

    /// Drop the identity and any login progress. Pending flashes survive.
    pub fn logout(&mut self) {
        self.identity = None;
        self.login = LoginState::EmailEntry;
    }

    pub fn flash(&mut self, level: FlashLevel, message: impl Into<String>) {
        self.flashes.push(Flash {
            level,
            message: message.into(),
        });
    }

    pub fn take_flashes(&mut self) -> Vec<Flash> {
        std::mem::take(&mut self.flashes)
    }
}

/// Storage for sessions between requests.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn load(&self, id: &SessionId) -> Option<Session>;

    async fn save(&self, id: &SessionId, session: &Session);

    async fn remove(&self, id: &SessionId);
}

/// Process-local session storage. Sessions are kept serialized so a
/// malformed entry behaves the same as it would in an external store.
///
/// An entry expires `ttl` after its last save. Expired entries read as
/// absent and are swept out on the next save.
#[derive(Debug)]
pub struct MemorySessionStore {
    ttl: Duration,
    entries: RwLock<HashMap<SessionId, Entry>>,
}

#[derive(Debug)]
struct Entry {
    raw: String,
    saved_at: Instant,
}

impl Entry {
    fn is_expired(&self, ttl: Duration, now: Instant) -> bool {
        now.saturating_duration_since(self.saved_at) >= ttl
    }
}

impl Default for MemorySessionStore {
    fn default() -> Self {
        Self::with_ttl(SESSION_TTL)
    }
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Overwrite an entry with raw JSON.
    pub async fn put_raw(&self, id: &SessionId, json: impl Into<String>) {
        self.entries.write().await.insert(
            id.clone(),
            Entry {
                raw: json.into(),
                saved_at: Instant::now(),
            },
        );
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self, id: &SessionId) -> Option<Session> {
        let entries = self.entries.read().await;
        let entry = entries.get(id)?;
        if entry.is_expired(self.ttl, Instant::now()) {
            return None;
        }
        match serde_json::from_str(&entry.raw) {
            Ok(session) => Some(session),
            Err(e) => {
                tracing::warn!(session = %id, error = %e, "unreadable session discarded");
                None
            }
        }
    }

    async fn save(&self, id: &SessionId, session: &Session) {
        let raw = match serde_json::to_string(session) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::error!(session = %id, error = %e, "failed to serialize session");
                return;
            }
        };

        let now = Instant::now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(self.ttl, now));
        let swept = before - entries.len();
        if swept > 0 {
            tracing::debug!(swept, "expired sessions removed");
        }
        entries.insert(id.clone(), Entry { raw, saved_at: now });
    }

    async fn remove(&self, id: &SessionId) {
        self.entries.write().await.remove(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use acu_core::Role;

    fn who() -> AuthenticatedIdentity {
        AuthenticatedIdentity {
            identity_id: 1,
            username: "alice".into(),
            email: "alice@x.com".into(),
            is_admin: false,
        }
    }

    #[test]
    fn test_session_id_parse() {
        let id = SessionId::generate();
        assert_eq!(SessionId::parse(id.as_str()), Some(id));
        assert_eq!(SessionId::parse("../../etc/passwd"), None);
    }

    #[test]
    fn test_login_state_tagging() {
        let state = LoginState::CreatePassword {
            email: "a@x.com".into(),
            role: Role::Staff,
            person_id: 7,
        };
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["step"], "create_password");
        assert_eq!(json["role"], "staff");
        assert_eq!(json["person_id"], 7);
    }

    #[test]
    fn test_corrupt_login_state_resets() {
        let raw = r#"{"login":{"step":"create_password","email":"a@x.com"},"identity":null}"#;
        let session: Session = serde_json::from_str(raw).unwrap();
        assert_eq!(session.login, LoginState::EmailEntry);

        let raw = r#"{"login":{"step":"teleport"}}"#;
        let session: Session = serde_json::from_str(raw).unwrap();
        assert_eq!(session.login, LoginState::EmailEntry);
    }

    #[test]
    fn test_establish_and_logout() {
        let mut session = Session {
            login: LoginState::PasswordEntry {
                email: "alice@x.com".into(),
            },
            ..Session::default()
        };
        session.establish(who());
        assert!(session.is_authenticated());
        assert_eq!(session.login, LoginState::EmailEntry);

        session.flash(FlashLevel::Success, "You have been logged out.");
        session.logout();
        assert!(!session.is_authenticated());
        assert_eq!(session.take_flashes().len(), 1);
        assert!(session.flashes.is_empty());
    }

    #[tokio::test]
    async fn test_memory_store_roundtrip_and_garbage() {
        let store = MemorySessionStore::new();
        let id = SessionId::generate();
        assert!(store.load(&id).await.is_none());

        let mut session = Session::default();
        session.establish(who());
        store.save(&id, &session).await;
        let loaded = store.load(&id).await.unwrap();
        assert_eq!(loaded.identity, Some(who()));

        store.put_raw(&id, "{not json").await;
        assert!(store.load(&id).await.is_none());

        store.remove(&id).await;
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_memory_store_expires_entries() {
        let store = MemorySessionStore::with_ttl(Duration::ZERO);
        let stale = SessionId::generate();
        let mut session = Session::default();
        session.establish(who());

        store.save(&stale, &session).await;
        assert!(store.load(&stale).await.is_none(), "expired entry reads as absent");

        let fresh = SessionId::generate();
        store.save(&fresh, &session).await;
        assert_eq!(store.len().await, 1, "stale entry swept on save");

        let store = MemorySessionStore::new();
        store.save(&stale, &session).await;
        assert!(store.load(&stale).await.is_some());
    }

    #[test]
    fn test_blank_session() {
        let mut session = Session::default();
        assert!(session.is_blank());

        session.flash(FlashLevel::Error, "A user with this email does not exist.");
        assert!(!session.is_blank());
        session.take_flashes();
        assert!(session.is_blank());

        session.login = LoginState::PasswordEntry {
            email: "alice@x.com".into(),
        };
        assert!(!session.is_blank());
        session.establish(who());
        assert!(!session.is_blank());
    }
}
