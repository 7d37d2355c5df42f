use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::api_client::ApiError;

/// Failure as seen by pages. Cloneable so one failed request can be handed
/// to every caller that was waiting on it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct QueryError {
    message: String,
}

impl QueryError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<ApiError> for QueryError {
    fn from(err: ApiError) -> Self {
        Self::new(err.to_string())
    }
}

/// Result of reading a query through the cache.
#[derive(Debug, Clone)]
pub enum QueryState<T> {
    /// Disabled because a required input is missing. No request was made.
    Idle,
    Ready {
        data: Arc<T>,
        updated_at: DateTime<Utc>,
    },
    /// The fetch failed. `data` holds the last good value, if any.
    Failed {
        error: QueryError,
        data: Option<Arc<T>>,
    },
}

impl<T> QueryState<T> {
    pub fn data(&self) -> Option<&T> {
        match self {
            QueryState::Ready { data, .. } => Some(data.as_ref()),
            QueryState::Failed { data, .. } => data.as_deref(),
            QueryState::Idle => None,
        }
    }

    pub fn error(&self) -> Option<&QueryError> {
        match self {
            QueryState::Failed { error, .. } => Some(error),
            _ => None,
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, QueryState::Idle)
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        match self {
            QueryState::Ready { updated_at, .. } => Some(*updated_at),
            _ => None,
        }
    }
}

/// In-flight counter for one kind of mutation. Mutations are never
/// deduplicated, so this only reports whether any call is running.
#[derive(Debug, Default)]
pub struct MutationState {
    in_flight: AtomicUsize,
}

impl MutationState {
    pub fn is_pending(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }

    pub(crate) fn begin(&self) -> PendingGuard<'_> {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        PendingGuard { state: self }
    }
}

pub(crate) struct PendingGuard<'a> {
    state: &'a MutationState,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.state.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}
