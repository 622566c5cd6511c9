//! crates/avatar_studio_core/src/session.rs
//!
//! The session store: the bearer token lives in a durable scope, the cached user
//! record in a volatile one.
//!
//! Because the scopes have different lifetimes, a restart can leave a token with no
//! cached user. `get_session() == None` therefore means "unknown", not "logged out";
//! callers re-verify before deciding.

use crate::domain::{Session, User};
use crate::ports::{PortError, PortResult, StorageScope};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

/// Durable-scope key holding the bearer token.
pub const TOKEN_KEY: &str = "auth_token";
/// Volatile-scope key holding the JSON user record.
pub const USER_KEY: &str = "user";

//=========================================================================================
// Stored Record
//=========================================================================================

#[derive(Serialize, Deserialize)]
struct UserRecord {
    user_id: i64,
    username: String,
    email: String,
}

impl UserRecord {
    fn from_domain(user: &User) -> Self {
        Self {
            user_id: user.user_id,
            username: user.username.clone(),
            email: user.email.clone(),
        }
    }

    fn to_domain(self) -> User {
        User {
            user_id: self.user_id,
            username: self.username,
            email: self.email,
        }
    }
}

//=========================================================================================
// SessionStore
//=========================================================================================

#[derive(Clone)]
pub struct SessionStore {
    durable: Arc<dyn StorageScope>,
    volatile: Arc<dyn StorageScope>,
}

impl SessionStore {
    pub fn new(durable: Arc<dyn StorageScope>, volatile: Arc<dyn StorageScope>) -> Self {
        Self { durable, volatile }
    }

    /// Writes the token to the durable scope and the user to the volatile scope.
    /// The token format is not checked. If the user cannot be written the token is
    /// removed again.
    pub async fn set_session(&self, session: &Session) -> PortResult<()> {
        self.durable.set(TOKEN_KEY, &session.token).await?;
        if let Err(e) = self.cache_user(&session.user).await {
            // Never leave a token without its user.
            warn!("Failed to cache user, dropping stored token: {}", e);
            if let Err(e) = self.durable.remove(TOKEN_KEY).await {
                warn!("Failed to remove stored token: {}", e);
            }
            return Err(e);
        }
        Ok(())
    }

    /// Replaces the cached user record without touching the token.
    pub async fn cache_user(&self, user: &User) -> PortResult<()> {
        let json = serde_json::to_string(&UserRecord::from_domain(user))
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        self.volatile.set(USER_KEY, &json).await
    }

    /// The stored bearer token. Storage failures read as "no token".
    pub async fn token(&self) -> Option<String> {
        match self.durable.get(TOKEN_KEY).await {
            Ok(token) => token.filter(|t| !t.is_empty()),
            Err(e) => {
                warn!("Failed to read stored token: {}", e);
                None
            }
        }
    }

    /// The cached user, or `None` when absent or when the stored value is not a
    /// well-formed user record.
    pub async fn cached_user(&self) -> Option<User> {
        let raw = match self.volatile.get(USER_KEY).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!("Failed to read cached user: {}", e);
                return None;
            }
        };
        match serde_json::from_str::<UserRecord>(&raw) {
            Ok(record) => Some(record.to_domain()),
            Err(e) => {
                debug!("Ignoring malformed cached user: {}", e);
                None
            }
        }
    }

    /// The full session, present only when both the token and the user are.
    pub async fn get_session(&self) -> Option<Session> {
        let user = self.cached_user().await?;
        let token = self.token().await?;
        Some(Session { token, user })
    }

    /// Removes both halves of the session. Safe to call when nothing is stored.
    pub async fn clear_session(&self) {
        if let Err(e) = self.durable.remove(TOKEN_KEY).await {
            warn!("Failed to remove stored token: {}", e);
        }
        if let Err(e) = self.volatile.remove(USER_KEY).await {
            warn!("Failed to remove cached user: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MapScope {
        entries: Mutex<HashMap<String, String>>,
    }

    #[async_trait]
    impl StorageScope for MapScope {
        async fn get(&self, key: &str) -> PortResult<Option<String>> {
            Ok(self.entries.lock().unwrap().get(key).cloned())
        }
        async fn set(&self, key: &str, value: &str) -> PortResult<()> {
            self.entries
                .lock()
                .unwrap()
                .insert(key.to_string(), value.to_string());
            Ok(())
        }
        async fn remove(&self, key: &str) -> PortResult<()> {
            self.entries.lock().unwrap().remove(key);
            Ok(())
        }
    }

    struct BrokenScope;

    #[async_trait]
    impl StorageScope for BrokenScope {
        async fn get(&self, _key: &str) -> PortResult<Option<String>> {
            Err(PortError::Unexpected("disk on fire".to_string()))
        }
        async fn set(&self, _key: &str, _value: &str) -> PortResult<()> {
            Err(PortError::Unexpected("disk on fire".to_string()))
        }
        async fn remove(&self, _key: &str) -> PortResult<()> {
            Err(PortError::Unexpected("disk on fire".to_string()))
        }
    }

    fn store() -> (SessionStore, Arc<MapScope>, Arc<MapScope>) {
        let durable = Arc::new(MapScope::default());
        let volatile = Arc::new(MapScope::default());
        (
            SessionStore::new(durable.clone(), volatile.clone()),
            durable,
            volatile,
        )
    }

    fn alice() -> Session {
        Session {
            token: "tok-123".to_string(),
            user: User {
                user_id: 7,
                username: "alice".to_string(),
                email: "alice@example.com".to_string(),
            },
        }
    }

    #[tokio::test]
    async fn set_then_get_round_trips_both_scopes() {
        let (sessions, durable, volatile) = store();
        sessions.set_session(&alice()).await.unwrap();

        assert_eq!(sessions.get_session().await, Some(alice()));
        assert_eq!(
            durable.get(TOKEN_KEY).await.unwrap().as_deref(),
            Some("tok-123")
        );
        assert!(durable.get(USER_KEY).await.unwrap().is_none());
        assert!(volatile.get(TOKEN_KEY).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn corrupted_user_reads_as_absent() {
        let (sessions, _durable, volatile) = store();
        sessions.set_session(&alice()).await.unwrap();

        volatile.set(USER_KEY, "{not json").await.unwrap();
        assert_eq!(sessions.cached_user().await, None);
        assert_eq!(sessions.get_session().await, None);

        volatile
            .set(USER_KEY, r#"{"user_id":"seven","username":"alice"}"#)
            .await
            .unwrap();
        assert_eq!(sessions.cached_user().await, None);
    }

    #[tokio::test]
    async fn token_without_user_is_not_a_session() {
        let (sessions, durable, _volatile) = store();
        durable.set(TOKEN_KEY, "tok-123").await.unwrap();

        assert_eq!(sessions.token().await.as_deref(), Some("tok-123"));
        assert_eq!(sessions.get_session().await, None);
    }

    #[tokio::test]
    async fn clear_is_idempotent() {
        let (sessions, _durable, _volatile) = store();
        sessions.clear_session().await;

        sessions.set_session(&alice()).await.unwrap();
        sessions.clear_session().await;
        sessions.clear_session().await;

        assert_eq!(sessions.token().await, None);
        assert_eq!(sessions.cached_user().await, None);
    }

    #[tokio::test]
    async fn storage_failures_read_as_absent() {
        let sessions = SessionStore::new(Arc::new(BrokenScope), Arc::new(BrokenScope));
        assert_eq!(sessions.token().await, None);
        assert_eq!(sessions.get_session().await, None);
        sessions.clear_session().await;
        assert!(sessions.set_session(&alice()).await.is_err());
    }

    #[tokio::test]
    async fn failed_user_write_rolls_back_the_token() {
        let durable = Arc::new(MapScope::default());
        let sessions = SessionStore::new(durable.clone(), Arc::new(BrokenScope));

        assert!(sessions.set_session(&alice()).await.is_err());
        assert_eq!(durable.get(TOKEN_KEY).await.unwrap(), None);
        assert_eq!(sessions.token().await, None);
        assert_eq!(sessions.get_session().await, None);
    }
}
