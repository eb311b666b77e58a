//! Remote persistence seam for the entry log.

use async_trait::async_trait;
use thiserror::Error;

use crate::entry::TimeEntry;
use crate::types::Identity;

/// Failures talking to the remote log service.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// The request did not complete.
    #[error("network error: {0}")]
    Network(String),
    /// The service answered with a non-success status.
    #[error("remote returned status {status}: {body}")]
    Status { status: u16, body: String },
    /// The response envelope could not be decoded.
    #[error("invalid remote payload: {0}")]
    Decode(String),
}

/// Full-collection transfer to and from the remote log service.
///
/// Both directions carry the whole log, never a delta. `pull` skips records
/// it cannot decode and only fails when the response as a whole is unusable.
#[async_trait]
pub trait RemoteLog: Send + Sync {
    async fn push(&self, identity: &Identity, entries: &[TimeEntry]) -> Result<(), RemoteError>;

    async fn pull(&self, identity: &Identity) -> Result<Vec<TimeEntry>, RemoteError>;
}
