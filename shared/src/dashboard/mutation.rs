use serde::Serialize;
use thiserror::Error;

use crate::error::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionStatus {
    Idle,
    Pending,
    Success,
    Error,
}

/// `idle -> pending -> {success | error}` for one kind of mutation.
/// A new invocation moves straight back to `pending`.
#[derive(Debug, Clone)]
pub enum MutationState<T> {
    Idle,
    Pending,
    Success(T),
    Error(String),
}

impl<T> Default for MutationState<T> {
    fn default() -> Self {
        MutationState::Idle
    }
}

impl<T> MutationState<T> {
    pub fn status(&self) -> ActionStatus {
        match self {
            MutationState::Idle => ActionStatus::Idle,
            MutationState::Pending => ActionStatus::Pending,
            MutationState::Success(_) => ActionStatus::Success,
            MutationState::Error(_) => ActionStatus::Error,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, MutationState::Pending)
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            MutationState::Success(data) => Some(data),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            MutationState::Error(message) => Some(message),
            _ => None,
        }
    }

    /// Move to `pending`. Returns false, leaving the state untouched, when a
    /// call is already in flight.
    pub fn begin(&mut self) -> bool {
        if self.is_pending() {
            return false;
        }
        *self = MutationState::Pending;
        true
    }

    pub fn settle(&mut self, result: Result<T, String>) {
        *self = match result {
            Ok(data) => MutationState::Success(data),
            Err(message) => MutationState::Error(message),
        };
    }
}

/// Why an action was not sent to the backend at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    BlankCode,
    AlreadyPending,
    EmptyList,
    UnknownSymbol,
    NotConfirmed,
}

#[derive(Debug, Error)]
pub enum ActionError {
    #[error("action skipped: {0:?}")]
    Skipped(SkipReason),

    #[error(transparent)]
    Api(#[from] ApiError),

    /// The task running the backend call panicked or was cancelled.
    #[error("background task failed: {0}")]
    Task(String),
}

impl ActionError {
    pub fn skip_reason(&self) -> Option<SkipReason> {
        match self {
            ActionError::Skipped(reason) => Some(*reason),
            _ => None,
        }
    }
}
