//! services/studio_client/src/remote/auth.rs
//!
//! The authentication gateway: register, login, logout, verify and current-user
//! lookups against the backend, with the session store as the persistence side
//! effect.
//!
//! Token validity is fail-closed. A network error, a non-success status or a
//! malformed body all resolve to "not authenticated" and clear the local session.

use crate::error::ClientError;
use crate::remote::protocol::{
    AuthResponse, ErrorBody, LoginRequest, RegisterRequest, UserRecord, VerifyResponse,
};
use crate::remote::request::{failure_from_detail, require_bearer};
use crate::remote::state::ClientState;
use avatar_studio_core::domain::{Session, User, Verification};
use reqwest::Response;
use std::sync::Arc;
use tracing::{info, warn};

const REGISTRATION_FAILED: &str = "Registration failed";
const LOGIN_FAILED: &str = "Login failed";
const LOGIN_REJECTED: &str = "Invalid username or password";

#[derive(Clone)]
pub struct AuthGateway {
    state: Arc<ClientState>,
}

impl AuthGateway {
    pub fn new(state: Arc<ClientState>) -> Self {
        Self { state }
    }

    //=====================================================================================
    // Credential Exchange
    //=====================================================================================

    /// POST /auth/register. Stores and returns the new session.
    #[tracing::instrument(skip(self, email, password))]
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<Session, ClientError> {
        let response = self
            .state
            .http
            .post(self.state.endpoint("/auth/register"))
            .json(&RegisterRequest {
                username,
                email,
                password,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(failure_from_detail(response, REGISTRATION_FAILED).await);
        }
        let session = self.store_auth_response(response).await?;
        info!("Registered user {}", session.user.username);
        Ok(session)
    }

    /// POST /auth/login. Stores and returns the new session.
    #[tracing::instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &str) -> Result<Session, ClientError> {
        let response = self
            .state
            .http
            .post(self.state.endpoint("/auth/login"))
            .json(&LoginRequest { username, password })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(login_failure(response).await);
        }
        let session = self.store_auth_response(response).await?;
        info!("Logged in as {}", session.user.username);
        Ok(session)
    }

    async fn store_auth_response(&self, response: Response) -> Result<Session, ClientError> {
        let body: AuthResponse = response.json().await?;
        let session = body.to_domain();
        self.state.sessions.set_session(&session).await?;
        Ok(session)
    }

    /// Best-effort POST /auth/logout. The local session is cleared whatever happens.
    #[tracing::instrument(skip(self))]
    pub async fn logout(&self) {
        if let Some(token) = self.state.sessions.token().await {
            let outcome = self
                .state
                .http
                .post(self.state.endpoint("/auth/logout"))
                .bearer_auth(token)
                .send()
                .await;
            match outcome {
                Ok(response) if !response.status().is_success() => {
                    warn!("Logout returned HTTP {}", response.status().as_u16());
                }
                Ok(_) => {}
                Err(e) => warn!("Logout error: {}", e),
            }
        }
        self.state.sessions.clear_session().await;
        info!("Local session cleared.");
    }

    //=====================================================================================
    // Token Checks
    //=====================================================================================

    /// POST /auth/verify. Without a stored token this returns invalid without
    /// touching the network. Anything other than a valid answer clears the session.
    #[tracing::instrument(skip(self))]
    pub async fn verify(&self) -> Verification {
        let request = self.state.http.post(self.state.endpoint("/auth/verify"));
        let request = match require_bearer(request, &self.state.sessions).await {
            Ok(request) => request,
            Err(_) => return Verification::invalid(),
        };

        let verification = match fetch_verification(request).await {
            Ok(verification) => verification,
            Err(e) => {
                warn!("Token verification failed: {}", e);
                Verification::invalid()
            }
        };

        match &verification.user {
            Some(user) if verification.valid => self.refresh_cache(user).await,
            _ => self.state.sessions.clear_session().await,
        }
        verification
    }

    /// GET /auth/me. Refreshes the cached user on success; any failure clears the
    /// session and yields `None`.
    #[tracing::instrument(skip(self))]
    pub async fn get_current_user(&self) -> Option<User> {
        let request = self.state.http.get(self.state.endpoint("/auth/me"));
        let request = require_bearer(request, &self.state.sessions).await.ok()?;

        match fetch_user(request).await {
            Ok(user) => {
                self.refresh_cache(&user).await;
                Some(user)
            }
            Err(e) => {
                warn!("Fetching current user failed: {}", e);
                self.state.sessions.clear_session().await;
                None
            }
        }
    }

    /// The cached user if there is one; otherwise, when a token survives without a
    /// cached user, the user is re-fetched from the backend.
    pub async fn resolve_user(&self) -> Option<User> {
        if let Some(user) = self.state.sessions.cached_user().await {
            return Some(user);
        }
        self.state.sessions.token().await?;
        self.get_current_user().await
    }

    async fn refresh_cache(&self, user: &User) {
        if let Err(e) = self.state.sessions.cache_user(user).await {
            warn!("Failed to cache user record: {}", e);
        }
    }
}

async fn fetch_verification(request: reqwest::RequestBuilder) -> Result<Verification, ClientError> {
    let response = request.send().await?;
    if !response.status().is_success() {
        return Err(failure_from_detail(response, "Token verification failed").await);
    }
    let body: VerifyResponse = response.json().await?;
    Ok(body.to_domain())
}

async fn fetch_user(request: reqwest::RequestBuilder) -> Result<User, ClientError> {
    let response = request.send().await?;
    if !response.status().is_success() {
        return Err(failure_from_detail(response, "Failed to load user").await);
    }
    let body: UserRecord = response.json().await?;
    Ok(body.to_domain())
}

/// Login failures distinguish an unreadable body from a JSON body lacking `detail`.
async fn login_failure(response: Response) -> ClientError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    let message = match serde_json::from_str::<ErrorBody>(&body) {
        Ok(parsed) => parsed
            .message()
            .unwrap_or_else(|| LOGIN_REJECTED.to_string()),
        Err(_) => LOGIN_FAILED.to_string(),
    };
    ClientError::Http { status, message }
}
