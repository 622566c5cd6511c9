//! services/studio_client/src/remote/jobs.rs
//!
//! Job-list synchronisation.
//!
//! `JobSyncService` is a read-only fetch-and-map of `/feature1/jobs`. `JobBoard`
//! owns the list shown to the user and fences overlapping refreshes with a request
//! epoch, so a slow, older response can never overwrite a newer one.

use crate::error::ClientError;
use crate::remote::protocol::JobRecord;
use crate::remote::request::{failure_from_detail, with_bearer};
use crate::remote::state::ClientState;
use avatar_studio_core::domain::JobView;
use bytes::Bytes;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

const LOAD_FAILED: &str = "Failed to load jobs";
const DOWNLOAD_FAILED: &str = "Download failed";
/// `watch` never polls faster than this; a zero period is raised to it.
pub const MIN_POLL_PERIOD: Duration = Duration::from_millis(1);

//=========================================================================================
// JobSyncService
//=========================================================================================

#[derive(Clone)]
pub struct JobSyncService {
    state: Arc<ClientState>,
}

impl JobSyncService {
    pub fn new(state: Arc<ClientState>) -> Self {
        Self { state }
    }

    /// Fetches every job and maps it to a display row, keeping the backend's order.
    ///
    /// Records that fail to deserialize are skipped. On error nothing is mutated.
    #[tracing::instrument(skip(self))]
    pub async fn list_jobs(&self) -> Result<Vec<JobView>, ClientError> {
        let request = self.state.http.get(self.state.endpoint("/feature1/jobs"));
        let response = with_bearer(request, &self.state.sessions)
            .await
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(failure_from_detail(response, LOAD_FAILED).await);
        }

        let entries: Vec<serde_json::Value> = response.json().await?;
        let mut views = Vec::with_capacity(entries.len());
        for entry in entries {
            match serde_json::from_value::<JobRecord>(entry) {
                Ok(record) => views.push(JobView::from_job(&record.to_domain(), &self.state.clock)),
                Err(e) => warn!("Skipping malformed job record: {}", e),
            }
        }
        debug!("Loaded {} jobs", views.len());
        Ok(views)
    }

    /// GET /feature1/download/{job_id}: the rendered video payload.
    #[tracing::instrument(skip(self))]
    pub async fn fetch_output(&self, job_id: &str) -> Result<Bytes, ClientError> {
        if !is_safe_job_id(job_id) {
            return Err(ClientError::Invalid(format!("unusable job id '{}'", job_id)));
        }
        let response = self
            .state
            .http
            .get(self.state.endpoint(&format!("/feature1/download/{}", job_id)))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(failure_from_detail(response, DOWNLOAD_FAILED).await);
        }
        Ok(response.bytes().await?)
    }

    /// Downloads a job's output into `dir/<job_id>.mp4` and returns the path written.
    pub async fn download(&self, job_id: &str, dir: &Path) -> Result<PathBuf, ClientError> {
        let payload = self.fetch_output(job_id).await?;
        tokio::fs::create_dir_all(dir).await?;
        let path = dir.join(format!("{}.mp4", job_id));
        tokio::fs::write(&path, &payload).await?;
        info!("Saved {} bytes to {}", payload.len(), path.display());
        Ok(path)
    }
}

fn is_safe_job_id(job_id: &str) -> bool {
    !job_id.is_empty()
        && job_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

//=========================================================================================
// JobBoard
//=========================================================================================

/// What happened to the board after a refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The response was the newest issued and replaced the list.
    Applied { jobs: usize },
    /// A newer refresh was issued while this one was in flight; its result was dropped.
    Stale,
}

/// The job list shown to the user.
pub struct JobBoard {
    service: JobSyncService,
    issued: AtomicU64,
    current: Mutex<Arc<Vec<JobView>>>,
}

impl JobBoard {
    pub fn new(service: JobSyncService) -> Self {
        Self {
            service,
            issued: AtomicU64::new(0),
            current: Mutex::new(Arc::new(Vec::new())),
        }
    }

    /// The most recently applied list.
    pub fn snapshot(&self) -> Arc<Vec<JobView>> {
        match self.current.lock() {
            Ok(current) => current.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Fetches the list under a fresh epoch.
    ///
    /// The result replaces the board only if no later refresh was issued meanwhile.
    /// On error the board keeps its previous list.
    pub async fn refresh(&self) -> Result<RefreshOutcome, ClientError> {
        let epoch = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        let jobs = self.service.list_jobs().await?;

        let mut current = match self.current.lock() {
            Ok(current) => current,
            Err(poisoned) => poisoned.into_inner(),
        };
        if self.issued.load(Ordering::SeqCst) != epoch {
            debug!("Discarding job list from stale epoch {}", epoch);
            return Ok(RefreshOutcome::Stale);
        }
        let count = jobs.len();
        *current = Arc::new(jobs);
        Ok(RefreshOutcome::Applied { jobs: count })
    }

    /// Refreshes every `period` (at least `MIN_POLL_PERIOD`) until `cancel` fires.
    /// `on_update` sees each applied list; failed refreshes are logged and the
    /// previous list is kept.
    pub async fn watch<F>(&self, period: Duration, cancel: CancellationToken, mut on_update: F)
    where
        F: FnMut(&[JobView]),
    {
        let period = period.max(MIN_POLL_PERIOD);
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!("Polling jobs every {:?}", period);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = interval.tick() => {}
            }
            let outcome = tokio::select! {
                _ = cancel.cancelled() => break,
                outcome = self.refresh() => outcome,
            };

            match outcome {
                Ok(RefreshOutcome::Applied { .. }) => on_update(&self.snapshot()),
                Ok(RefreshOutcome::Stale) => {}
                Err(e) => warn!("Job refresh failed, keeping previous list: {}", e),
            }
        }
        info!("Job polling stopped.");
    }
}
