//! Error types for allocation operations.

use thiserror::Error;

/// Reasons a submission is refused.
///
/// Capacity is never one of them: a valid submission is always either
/// assigned or queued.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AllocationError {
    /// The requester id was empty.
    #[error("requester id must not be empty")]
    EmptyRequesterId,
    /// The requested duration was zero minutes.
    #[error("duration must be at least one minute")]
    ZeroDuration,
    /// The requester already holds a machine or a place in the queue.
    #[error("requester '{requester_id}' is already assigned or queued")]
    AlreadyActive { requester_id: String },
}
