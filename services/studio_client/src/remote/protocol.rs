//! services/studio_client/src/remote/protocol.rs
//!
//! Defines the JSON shapes exchanged with the video-generation backend and their
//! conversion into core domain types.

use avatar_studio_core::domain::{Job, JobStatus, Session, User, Verification};
use avatar_studio_core::time::Timestamp;
use serde::{Deserialize, Serialize};
use tracing::debug;

//=========================================================================================
// Payloads Sent TO the Backend
//=========================================================================================

#[derive(Serialize, Debug)]
pub struct RegisterRequest<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Serialize, Debug)]
pub struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

//=========================================================================================
// Payloads Received FROM the Backend
//=========================================================================================

#[derive(Deserialize, Debug, Clone)]
pub struct UserRecord {
    pub user_id: i64,
    pub username: String,
    pub email: String,
}

impl UserRecord {
    pub fn to_domain(self) -> User {
        User {
            user_id: self.user_id,
            username: self.username,
            email: self.email,
        }
    }
}

/// Returned by `/auth/register` and `/auth/login`.
#[derive(Deserialize, Debug)]
pub struct AuthResponse {
    #[serde(alias = "token")]
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    pub user: UserRecord,
}

impl AuthResponse {
    pub fn to_domain(self) -> Session {
        Session {
            token: self.access_token,
            user: self.user.to_domain(),
        }
    }
}

/// Returned by `/auth/verify`.
#[derive(Deserialize, Debug)]
pub struct VerifyResponse {
    pub valid: bool,
    #[serde(default)]
    pub user: Option<UserRecord>,
}

impl VerifyResponse {
    /// A verification only counts when it is both marked valid and names a user.
    pub fn to_domain(self) -> Verification {
        match (self.valid, self.user) {
            (true, Some(user)) => Verification {
                valid: true,
                user: Some(user.to_domain()),
            },
            _ => Verification::invalid(),
        }
    }
}

/// Body of a failed request, as produced by the backend's error handler.
#[derive(Deserialize, Debug)]
pub struct ErrorBody {
    #[serde(default)]
    pub detail: Option<serde_json::Value>,
}

impl ErrorBody {
    /// The `detail` message when it is a non-empty string.
    pub fn message(&self) -> Option<String> {
        match &self.detail {
            Some(serde_json::Value::String(s)) if !s.trim().is_empty() => Some(s.clone()),
            _ => None,
        }
    }
}

/// One entry of `/feature1/jobs`.
#[derive(Deserialize, Debug, Clone)]
pub struct JobRecord {
    pub job_id: String,
    /// Email, username or numeric id depending on the feature that created the job.
    #[serde(default)]
    pub user_id: Option<serde_json::Value>,
    #[serde(default)]
    pub feature: Option<String>,
    #[serde(default)]
    pub input_video: Option<String>,
    #[serde(default)]
    pub input_audio: Option<String>,
    #[serde(default)]
    pub output_video: Option<String>,
    pub status: String,
    pub created_at: String,
    #[serde(default)]
    pub started_at: Option<String>,
    #[serde(default)]
    pub completed_at: Option<String>,
}

impl JobRecord {
    /// Tags each timestamp with its emission convention. Unreadable timestamps
    /// become `None`.
    pub fn to_domain(self) -> Job {
        let job_id = self.job_id;
        let created_at = read_timestamp(
            &job_id,
            "created_at",
            Some(self.created_at.as_str()),
            Timestamp::local,
        );
        let started_at = read_timestamp(
            &job_id,
            "started_at",
            self.started_at.as_deref(),
            Timestamp::utc,
        );
        let completed_at = read_timestamp(
            &job_id,
            "completed_at",
            self.completed_at.as_deref(),
            Timestamp::utc,
        );

        let input_refs = [self.input_video, self.input_audio]
            .into_iter()
            .flatten()
            .filter(|r| !r.is_empty())
            .collect();

        Job {
            user_id: match self.user_id {
                Some(serde_json::Value::String(s)) => s,
                Some(serde_json::Value::Null) | None => String::new(),
                Some(other) => other.to_string(),
            },
            feature: self.feature.unwrap_or_default(),
            input_refs,
            output_ref: self.output_video.filter(|r| !r.is_empty()),
            status: JobStatus::from_wire(&self.status),
            created_at,
            started_at,
            completed_at,
            job_id,
        }
    }
}

fn read_timestamp<F, E>(job_id: &str, field: &str, raw: Option<&str>, parse: F) -> Option<Timestamp>
where
    F: Fn(&str) -> Result<Timestamp, E>,
    E: std::fmt::Display,
{
    let raw = raw?;
    match parse(raw) {
        Ok(ts) => Some(ts),
        Err(e) => {
            debug!("Job {}: unreadable {}: {}", job_id, field, e);
            None
        }
    }
}

/// Acknowledgement of a job submission. Every field is optional because each
/// feature endpoint answers with a slightly different shape.
#[derive(Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmissionReceipt {
    #[serde(default)]
    pub job_id: Option<String>,
    #[serde(default)]
    pub job_ids: Vec<String>,
    #[serde(default)]
    pub jobs_created: Option<u64>,
}

impl SubmissionReceipt {
    /// Number of jobs the backend reported as queued.
    pub fn job_count(&self) -> u64 {
        if let Some(n) = self.jobs_created {
            return n;
        }
        let listed = self.job_ids.len() as u64;
        listed.max(u64::from(self.job_id.is_some()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_response_accepts_either_token_field() {
        let a: AuthResponse = serde_json::from_str(
            r#"{"access_token":"t1","token_type":"bearer","user":{"user_id":1,"username":"a","email":"a@x"}}"#,
        )
        .unwrap();
        assert_eq!(a.to_domain().token, "t1");

        let b: AuthResponse = serde_json::from_str(
            r#"{"token":"t2","user":{"user_id":2,"username":"b","email":"b@x"}}"#,
        )
        .unwrap();
        let session = b.to_domain();
        assert_eq!(session.token, "t2");
        assert_eq!(session.user.user_id, 2);
    }

    #[test]
    fn verification_needs_valid_flag_and_user() {
        let ok: VerifyResponse = serde_json::from_str(
            r#"{"valid":true,"user":{"user_id":1,"username":"a","email":"a@x"}}"#,
        )
        .unwrap();
        assert!(ok.to_domain().valid);

        let no_user: VerifyResponse = serde_json::from_str(r#"{"valid":true,"user":null}"#).unwrap();
        assert_eq!(no_user.to_domain(), Verification::invalid());

        let invalid: VerifyResponse = serde_json::from_str(r#"{"valid":false}"#).unwrap();
        assert_eq!(invalid.to_domain(), Verification::invalid());
    }

    #[test]
    fn error_detail_only_counts_when_it_is_a_string() {
        let body: ErrorBody = serde_json::from_str(r#"{"detail":"Username taken"}"#).unwrap();
        assert_eq!(body.message().as_deref(), Some("Username taken"));

        let list: ErrorBody =
            serde_json::from_str(r#"{"detail":[{"msg":"field required"}]}"#).unwrap();
        assert_eq!(list.message(), None);

        let empty: ErrorBody = serde_json::from_str("{}").unwrap();
        assert_eq!(empty.message(), None);
    }

    #[test]
    fn job_record_tags_timestamps_by_field() {
        let record: JobRecord = serde_json::from_str(
            r#"{
                "job_id": "j1",
                "user_id": 7,
                "feature": "",
                "input_video": "v.mp4",
                "input_audio": "a.wav",
                "output_video": "",
                "status": "COMPLETED",
                "created_at": "2024-01-05 10:00:00",
                "started_at": "2024-01-05 10:05:00",
                "completed_at": "garbage"
            }"#,
        )
        .unwrap();
        let job = record.to_domain();
        assert!(matches!(job.created_at, Some(Timestamp::Local(_))));
        assert!(matches!(job.started_at, Some(Timestamp::Utc(_))));
        assert_eq!(job.completed_at, None);
        assert_eq!(job.input_refs, vec!["v.mp4", "a.wav"]);
        assert_eq!(job.output_ref, None);
        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.user_id, "7");
    }

    #[test]
    fn receipt_counts_jobs() {
        let batch: SubmissionReceipt = serde_json::from_str(r#"{"jobs_created":3}"#).unwrap();
        assert_eq!(batch.job_count(), 3);

        let single: SubmissionReceipt = serde_json::from_str(r#"{"job_id":"j1"}"#).unwrap();
        assert_eq!(single.job_count(), 1);

        let listed: SubmissionReceipt =
            serde_json::from_str(r#"{"job_ids":["a","b"],"message":"ok"}"#).unwrap();
        assert_eq!(listed.job_count(), 2);

        assert_eq!(SubmissionReceipt::default().job_count(), 0);
    }
}
