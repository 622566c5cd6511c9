pub mod auth;
pub mod jobs;
pub mod protocol;
pub mod request;
pub mod state;
pub mod submit;

// Re-export the main components so the binary and tests can reach them directly.
pub use auth::AuthGateway;
pub use jobs::{JobBoard, JobSyncService, RefreshOutcome};
pub use protocol::SubmissionReceipt;
pub use state::ClientState;
pub use submit::{MediaFile, Submissions};
