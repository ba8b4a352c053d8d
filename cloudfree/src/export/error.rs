//! Export job errors.

use std::time::Duration;

use thiserror::Error;

use crate::service::ServiceError;

/// An export job could not be submitted or did not succeed.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Submission or status polling failed.
    #[error("export request failed: {0}")]
    Service(#[from] ServiceError),

    /// The job reached a terminal state other than success.
    #[error("export {description} failed with state {state}:\n{payload}")]
    JobFailed {
        description: String,
        state: String,
        /// Full status record as returned by the service.
        payload: String,
    },

    /// Monitoring was cancelled before the job finished.
    #[error("monitoring of export {description} was cancelled")]
    Cancelled { description: String },

    /// The job did not finish within the configured bound.
    #[error("export {description} did not finish within {}s", .elapsed.as_secs())]
    TimedOut {
        description: String,
        elapsed: Duration,
    },
}
