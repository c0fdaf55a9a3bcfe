//! Error types for the scheduler.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("storage error: {0}")]
    Storage(#[from] prodad_storage::StorageError),

    #[error("scheduler not running")]
    NotRunning,
}

pub type SchedulerResult<T> = Result<T, SchedulerError>;
