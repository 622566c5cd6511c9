//! services/studio_client/src/remote/submit.rs
//!
//! Job submission for the four generation features. Each call uploads its media
//! as a multipart form and returns the backend's acknowledgement.

use crate::error::ClientError;
use crate::remote::auth::AuthGateway;
use crate::remote::protocol::SubmissionReceipt;
use crate::remote::request::{failure_verbatim, require_bearer, with_bearer};
use crate::remote::state::ClientState;
use avatar_studio_core::domain::User;
use reqwest::multipart::{Form, Part};
use reqwest::RequestBuilder;
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

const JOB_CREATION_FAILED: &str = "Job creation failed";
/// Recipients accepted in one personalised-wishes batch.
pub const MAX_WISH_NAMES: usize = 5;

//=========================================================================================
// Media Payloads
//=========================================================================================

/// An upload: raw bytes plus the file name reported to the backend.
#[derive(Debug, Clone)]
pub struct MediaFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl MediaFile {
    pub fn from_bytes(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }

    /// Reads a file from disk, keeping its file name.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, ClientError> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload.bin".to_string());
        Ok(Self { file_name, bytes })
    }

    fn into_part(self) -> Part {
        Part::bytes(self.bytes).file_name(self.file_name)
    }
}

//=========================================================================================
// Submissions
//=========================================================================================

#[derive(Clone)]
pub struct Submissions {
    state: Arc<ClientState>,
    auth: AuthGateway,
}

impl Submissions {
    pub fn new(state: Arc<ClientState>) -> Self {
        let auth = AuthGateway::new(state.clone());
        Self { state, auth }
    }

    /// Avatar Sync Studio: lip-syncs `video` to `audio`. Requires a stored token.
    #[tracing::instrument(skip_all)]
    pub async fn avatar_sync(
        &self,
        audio: MediaFile,
        video: MediaFile,
    ) -> Result<SubmissionReceipt, ClientError> {
        let request = self.post("/feature1/create-job");
        let request = require_bearer(request, &self.state.sessions).await?;
        let form = Form::new()
            .part("audio", audio.into_part())
            .part("video", video.into_part());
        self.send(request, form).await
    }

    /// Text-to-Avatar: synthesises `text` as speech for the avatar in `video`.
    #[tracing::instrument(skip_all)]
    pub async fn text_to_avatar(
        &self,
        text: &str,
        gender: &str,
        video: MediaFile,
    ) -> Result<SubmissionReceipt, ClientError> {
        if text.trim().is_empty() {
            return Err(ClientError::Invalid("text must not be empty".to_string()));
        }
        let user = self.require_user().await?;
        let form = Form::new()
            .text("user_id", user.email)
            .text("text", text.to_string())
            .text("gender", gender.to_string())
            .part("video", video.into_part());
        self.send(self.post("/feature2/text-to-avatar"), form).await
    }

    /// Personalised wishes: one job per name, with `{name}` substituted in `script`.
    #[tracing::instrument(skip_all, fields(recipients = names.len()))]
    pub async fn personalized_wishes(
        &self,
        script: &str,
        names: &[String],
        gender: &str,
        video: MediaFile,
    ) -> Result<SubmissionReceipt, ClientError> {
        if names.is_empty() {
            return Err(ClientError::Invalid("at least one name is required".to_string()));
        }
        if names.len() > MAX_WISH_NAMES {
            return Err(ClientError::Invalid(format!(
                "at most {} names are allowed",
                MAX_WISH_NAMES
            )));
        }
        let mut seen = HashSet::new();
        for name in names {
            let name = name.trim();
            if name.is_empty() {
                return Err(ClientError::Invalid("names must not be blank".to_string()));
            }
            if !seen.insert(name) {
                return Err(ClientError::Invalid(format!("duplicate name '{}'", name)));
            }
        }
        if script.trim().is_empty() {
            return Err(ClientError::Invalid("script must not be empty".to_string()));
        }
        let user = self.require_user().await?;
        let mut form = Form::new()
            .text("user_id", user.username)
            .text("gender", gender.to_string())
            .text("script", script.to_string());
        for name in names {
            form = form.text("names", name.trim().to_string());
        }
        let form = form.part("video", video.into_part());
        self.send(self.post("/feature3/personalized-wishes"), form).await
    }

    /// IntelliTutor: turns a slide deck into a narrated lecture video.
    #[tracing::instrument(skip_all)]
    pub async fn lecture(
        &self,
        slides: MediaFile,
        avatar: Option<MediaFile>,
        language: &str,
        gender: &str,
    ) -> Result<SubmissionReceipt, ClientError> {
        let user = self.require_user().await?;
        let mut form = Form::new()
            .text("user_id", user.username)
            .text("language", language.to_string())
            .text("gender", gender.to_string())
            .part("ppt", slides.into_part());
        if let Some(avatar) = avatar {
            form = form.part("avatar", avatar.into_part());
        }
        let request = with_bearer(self.post("/feature4/create-job"), &self.state.sessions).await;
        self.send(request, form).await
    }

    //=====================================================================================
    // Helpers
    //=====================================================================================

    fn post(&self, path: &str) -> RequestBuilder {
        self.state.http.post(self.state.endpoint(path))
    }

    async fn require_user(&self) -> Result<User, ClientError> {
        self.auth
            .resolve_user()
            .await
            .ok_or_else(|| ClientError::Auth("user not authenticated".to_string()))
    }

    async fn send(&self, request: RequestBuilder, form: Form) -> Result<SubmissionReceipt, ClientError> {
        let response = request.multipart(form).send().await?;
        if !response.status().is_success() {
            return Err(failure_verbatim(response, JOB_CREATION_FAILED).await);
        }

        let body = response.bytes().await?;
        let receipt = if body.iter().all(u8::is_ascii_whitespace) {
            SubmissionReceipt::default()
        } else {
            serde_json::from_slice(&body).unwrap_or_else(|e| {
                warn!("Unreadable submission receipt: {}", e);
                SubmissionReceipt::default()
            })
        };
        info!("Submission accepted ({} job(s))", receipt.job_count());
        Ok(receipt)
    }
}
