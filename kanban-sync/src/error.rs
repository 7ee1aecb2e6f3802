//! Error types for the board engine

use crate::gateway::{FailureKind, RemoteFailure};
use crate::types::{ColumnId, ItemId, MoveTicket, Slot};
use std::time::Duration;
use thiserror::Error;

/// Result type for board operations
pub type Result<T> = std::result::Result<T, SyncError>;

/// Errors that can occur while moving items or syncing with the remote side
#[derive(Debug, Error)]
pub enum SyncError {
    /// Item is not on the board
    #[error("item not found: {id}")]
    NotFound { id: String },

    /// The move was computed against a board state that has since changed
    #[error("stale move for item {id}: recorded at {expected}, now at {actual}")]
    StaleMove {
        id: String,
        expected: Slot,
        actual: Slot,
    },

    /// Column not found
    #[error("column not found: {id}")]
    ColumnNotFound { id: String },

    /// The same item appears twice
    #[error("duplicate item ID: {id}")]
    DuplicateItem { id: String },

    /// The move gate is closed for this session
    #[error("moving item {id} is not permitted")]
    MoveNotPermitted { id: String },

    /// Operation needs the engine to be idle
    #[error("a move is still waiting for the remote side")]
    MoveInFlight,

    /// Outcome reported for a ticket that is not in flight
    #[error("no move in flight for ticket {ticket}")]
    UnknownTicket { ticket: MoveTicket },

    /// The remote side refused the mutation
    #[error("remote rejected the move ({reason}){}", detail(.message))]
    RemoteRejected {
        reason: FailureKind,
        message: Option<String>,
    },

    /// Network failure or timeout
    #[error("remote unavailable: {message}")]
    RemoteUnavailable { message: String },

    /// The session actor has stopped
    #[error("board session closed")]
    SessionClosed,

    /// Invalid configuration value
    #[error("invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    /// Configuration could not be loaded
    #[error("configuration error: {0}")]
    Config(#[from] figment::Error),
}

fn detail(message: &Option<String>) -> String {
    message
        .as_deref()
        .map(|m| format!(": {}", m))
        .unwrap_or_default()
}

impl SyncError {
    /// Create a not found error for an item
    pub fn not_found(id: &ItemId) -> Self {
        Self::NotFound { id: id.to_string() }
    }

    /// Create a column not found error
    pub fn column_not_found(id: &ColumnId) -> Self {
        Self::ColumnNotFound { id: id.to_string() }
    }

    /// Create a duplicate item error
    pub fn duplicate_item(id: &ItemId) -> Self {
        Self::DuplicateItem { id: id.to_string() }
    }

    /// Create the error used when a remote call exceeds its deadline
    pub fn timed_out(limit: Duration) -> Self {
        Self::RemoteUnavailable {
            message: format!("no response within {}ms", limit.as_millis()),
        }
    }

    /// Create an invalid value error
    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Errors the user must be told about. These always roll back the board.
    pub fn is_user_visible(&self) -> bool {
        matches!(
            self,
            Self::RemoteRejected { .. } | Self::RemoteUnavailable { .. }
        )
    }

    /// Expected races of drag-and-drop: swallowed without a notice.
    pub fn is_local_race(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::StaleMove { .. })
    }
}

impl From<RemoteFailure> for SyncError {
    fn from(failure: RemoteFailure) -> Self {
        match failure.kind {
            FailureKind::Unavailable => Self::RemoteUnavailable {
                message: failure
                    .message
                    .unwrap_or_else(|| "remote unavailable".to_string()),
            },
            reason => Self::RemoteRejected {
                reason,
                message: failure.message,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SyncError::not_found(&ItemId::from(7));
        assert_eq!(err.to_string(), "item not found: 7");

        let err = SyncError::StaleMove {
            id: "3".into(),
            expected: Slot::new("A", 0),
            actual: Slot::new("A", 2),
        };
        assert_eq!(
            err.to_string(),
            "stale move for item 3: recorded at A/0, now at A/2"
        );
    }

    #[test]
    fn test_rejected_display_with_and_without_message() {
        let err = SyncError::from(RemoteFailure::permission("teachers only"));
        assert_eq!(
            err.to_string(),
            "remote rejected the move (permission): teachers only"
        );

        let err = SyncError::from(RemoteFailure::new(FailureKind::Conflict));
        assert_eq!(err.to_string(), "remote rejected the move (conflict)");
    }

    #[test]
    fn test_unavailable_conversion() {
        let err = SyncError::from(RemoteFailure::new(FailureKind::Unavailable));
        assert!(matches!(err, SyncError::RemoteUnavailable { .. }));
        assert!(err.is_user_visible());

        let err = SyncError::timed_out(Duration::from_millis(250));
        assert_eq!(err.to_string(), "remote unavailable: no response within 250ms");
    }

    #[test]
    fn test_classification() {
        assert!(SyncError::not_found(&ItemId::from(1)).is_local_race());
        assert!(!SyncError::not_found(&ItemId::from(1)).is_user_visible());
        assert!(!SyncError::MoveInFlight.is_local_race());
        assert!(SyncError::from(RemoteFailure::validation("bad order")).is_user_visible());
    }
}
