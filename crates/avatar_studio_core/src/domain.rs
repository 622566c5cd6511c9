//! crates/avatar_studio_core/src/domain.rs
//!
//! Defines the pure, core data structures for the studio client.
//! These structs are independent of the HTTP wire format and of any storage medium.

use crate::time::{format_seconds, TimeNormalizer, Timestamp};

/// Feature label shown for jobs whose record carries no feature name.
pub const DEFAULT_FEATURE: &str = "Avatar Sync Studio";

// Represents an authenticated user, replaced wholesale on re-verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub user_id: i64,
    pub username: String,
    pub email: String,
}

/// A bearer token paired with the user it belongs to.
///
/// Both halves are always present together; a missing half means no session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub user: User,
}

/// Outcome of a token verification round-trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verification {
    pub valid: bool,
    pub user: Option<User>,
}

impl Verification {
    pub fn invalid() -> Self {
        Self {
            valid: false,
            user: None,
        }
    }
}

//=========================================================================================
// Jobs
//=========================================================================================

/// Backend-driven job state. The client only ever observes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    Queued,
    InProgress,
    Completed,
    Failed,
    /// A status this client does not know, kept verbatim.
    Other(String),
}

impl JobStatus {
    pub fn from_wire(raw: &str) -> Self {
        match raw {
            "QUEUED" => JobStatus::Queued,
            "IN_PROGRESS" => JobStatus::InProgress,
            "COMPLETED" => JobStatus::Completed,
            "FAILED" => JobStatus::Failed,
            other => JobStatus::Other(other.to_string()),
        }
    }

    pub fn as_wire(&self) -> &str {
        match self {
            JobStatus::Queued => "QUEUED",
            JobStatus::InProgress => "IN_PROGRESS",
            JobStatus::Completed => "COMPLETED",
            JobStatus::Failed => "FAILED",
            JobStatus::Other(raw) => raw,
        }
    }

    /// Human-readable badge text.
    pub fn badge(&self) -> &str {
        match self {
            JobStatus::Queued => "Queued",
            JobStatus::InProgress => "Processing",
            JobStatus::Completed => "Completed",
            JobStatus::Failed => "Failed",
            JobStatus::Other(raw) => raw,
        }
    }
}

/// A video-generation job as reported by the backend.
///
/// Timestamps are tagged with their emission convention; `None` means the value was
/// missing or could not be parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct Job {
    pub job_id: String,
    pub user_id: String,
    pub feature: String,
    pub input_refs: Vec<String>,
    pub output_ref: Option<String>,
    pub status: JobStatus,
    pub created_at: Option<Timestamp>,
    pub started_at: Option<Timestamp>,
    pub completed_at: Option<Timestamp>,
}

/// Display row for one job, rebuilt from scratch on every synchronisation.
#[derive(Debug, Clone, PartialEq)]
pub struct JobView {
    pub id: String,
    pub feature: String,
    pub status: JobStatus,
    pub badge: String,
    pub submitted: String,
    pub started: String,
    pub ended: String,
    /// Seconds from start to completion. Only defined for completed jobs.
    pub duration: Option<u64>,
    /// Seconds from submission to completion. Only defined for completed jobs.
    pub end_to_end: Option<u64>,
}

impl JobView {
    pub fn from_job(job: &Job, clock: &TimeNormalizer) -> Self {
        let completed = job.status == JobStatus::Completed;
        let (duration, end_to_end) = if completed {
            (
                clock.interval(job.started_at, job.completed_at),
                clock.interval(job.created_at, job.completed_at),
            )
        } else {
            (None, None)
        };

        let feature = if job.feature.trim().is_empty() {
            DEFAULT_FEATURE.to_string()
        } else {
            job.feature.clone()
        };

        Self {
            id: job.job_id.clone(),
            feature,
            badge: job.status.badge().to_string(),
            status: job.status.clone(),
            submitted: clock.render(job.created_at),
            started: clock.render(job.started_at),
            ended: clock.render(job.completed_at),
            duration,
            end_to_end,
        }
    }

    pub fn duration_label(&self) -> String {
        format_seconds(self.duration)
    }

    pub fn end_to_end_label(&self) -> String {
        format_seconds(self.end_to_end)
    }

    /// Only completed jobs have an output to fetch.
    pub fn is_downloadable(&self) -> bool {
        self.status == JobStatus::Completed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    fn clock() -> TimeNormalizer {
        TimeNormalizer::new(FixedOffset::east_opt(5 * 3600 + 30 * 60).unwrap())
    }

    fn job(status: JobStatus) -> Job {
        Job {
            job_id: "job-1".to_string(),
            user_id: "alice".to_string(),
            feature: String::new(),
            input_refs: vec!["in.mp4".to_string(), "in.wav".to_string()],
            output_ref: Some("out.mp4".to_string()),
            status,
            created_at: Timestamp::local("2024-01-05 10:00:00").ok(),
            started_at: Timestamp::utc("2024-01-05 10:05:00").ok(),
            completed_at: Timestamp::utc("2024-01-05 10:07:30").ok(),
        }
    }

    #[test]
    fn completed_job_gets_metrics() {
        let view = JobView::from_job(&job(JobStatus::Completed), &clock());
        assert_eq!(view.duration, Some(150));
        assert_eq!(
            view.end_to_end,
            clock().end_to_end("2024-01-05 10:00:00", "2024-01-05 10:07:30")
        );
        assert_eq!(view.submitted, "2024-01-05 10:00:00");
        assert_eq!(view.started, "2024-01-05 15:35:00");
        assert_eq!(view.ended, "2024-01-05 15:37:30");
        assert_eq!(view.duration_label(), "150 sec");
        assert!(view.is_downloadable());
    }

    #[test]
    fn unfinished_jobs_never_report_metrics() {
        for status in [
            JobStatus::Queued,
            JobStatus::InProgress,
            JobStatus::Failed,
            JobStatus::Other("PAUSED".to_string()),
        ] {
            let view = JobView::from_job(&job(status), &clock());
            assert_eq!(view.duration, None);
            assert_eq!(view.end_to_end, None);
            assert_eq!(view.end_to_end_label(), "-");
            assert!(!view.is_downloadable());
        }
    }

    #[test]
    fn missing_timestamps_render_as_unavailable() {
        let mut record = job(JobStatus::Completed);
        record.started_at = None;
        let view = JobView::from_job(&record, &clock());
        assert_eq!(view.started, "-");
        assert_eq!(view.duration, None);
        assert!(view.end_to_end.is_some());
    }

    #[test]
    fn empty_feature_falls_back_to_default_label() {
        let view = JobView::from_job(&job(JobStatus::Queued), &clock());
        assert_eq!(view.feature, DEFAULT_FEATURE);

        let mut named = job(JobStatus::Queued);
        named.feature = "Text-to-Avatar".to_string();
        assert_eq!(JobView::from_job(&named, &clock()).feature, "Text-to-Avatar");
    }

    #[test]
    fn status_badges() {
        assert_eq!(JobStatus::from_wire("QUEUED").badge(), "Queued");
        assert_eq!(JobStatus::from_wire("IN_PROGRESS").badge(), "Processing");
        assert_eq!(JobStatus::from_wire("COMPLETED").badge(), "Completed");
        assert_eq!(JobStatus::from_wire("FAILED").badge(), "Failed");
        let unknown = JobStatus::from_wire("CANCELLED");
        assert_eq!(unknown.badge(), "CANCELLED");
        assert_eq!(unknown.as_wire(), "CANCELLED");
    }
}
