#![allow(dead_code)]

use avatar_studio_core::domain::{Session, User};
use axum::Router;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use studio_client_lib::adapters::MemoryScope;
use studio_client_lib::config::Config;
use studio_client_lib::remote::ClientState;

/// Serves `app` on an ephemeral local port and returns its base URL.
pub async fn spawn(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

/// A base URL nothing is listening on.
pub async fn dead_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

pub fn config_for(base_url: &str) -> Arc<Config> {
    let vars: HashMap<&str, String> = HashMap::from([
        ("STUDIO_API_URL", base_url.to_string()),
        ("DISPLAY_UTC_OFFSET", "+05:30".to_string()),
        ("REQUEST_TIMEOUT_SECS", "1".to_string()),
    ]);
    Arc::new(Config::from_vars(|name| vars.get(name).cloned()).unwrap())
}

/// Client state with both scopes in memory.
pub fn state_for(base_url: &str) -> Arc<ClientState> {
    let state = ClientState::new(
        config_for(base_url),
        Arc::new(MemoryScope::new()),
        Arc::new(MemoryScope::new()),
    )
    .unwrap();
    Arc::new(state)
}

pub async fn signed_in_state(base_url: &str) -> Arc<ClientState> {
    let state = state_for(base_url);
    state.sessions.set_session(&alice()).await.unwrap();
    state
}

pub fn alice() -> Session {
    Session {
        token: "tok-alice".to_string(),
        user: User {
            user_id: 7,
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
        },
    }
}

pub fn user_json(user_id: i64, username: &str, email: &str) -> Value {
    json!({ "user_id": user_id, "username": username, "email": email })
}

/// Request counter shared between a test and its mock routes.
#[derive(Clone, Default)]
pub struct Hits(Arc<AtomicUsize>);

impl Hits {
    /// Records a hit and returns its 1-based ordinal.
    pub fn record(&self) -> usize {
        self.0.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

pub fn bearer_of(headers: &axum::http::HeaderMap) -> Option<String> {
    headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}
