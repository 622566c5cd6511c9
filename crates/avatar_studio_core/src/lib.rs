pub mod domain;
pub mod ports;
pub mod session;
pub mod time;

pub use domain::{Job, JobStatus, JobView, Session, User, Verification};
pub use ports::{PortError, PortResult, StorageScope};
pub use session::SessionStore;
pub use time::{TimeNormalizer, Timestamp, TimestampError};
