//! User-visible failure notices.

use crate::error::SyncError;
use crate::types::{BoardScope, ItemId, Move};
use serde::Serialize;
use std::sync::Mutex;
use tracing::warn;

/// Why a notice was raised
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    /// The remote side refused a move
    Rejected,
    /// The remote side could not be reached in time
    Unavailable,
    /// Reloading the board after a rollback failed
    RefetchFailed,
}

/// Message shown to the user after a failed move or reload
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureNotice {
    pub kind: NoticeKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item: Option<ItemId>,
    pub message: String,
}

impl FailureNotice {
    pub fn move_failed(mv: &Move, error: &SyncError) -> Self {
        let kind = match error {
            SyncError::RemoteUnavailable { .. } => NoticeKind::Unavailable,
            _ => NoticeKind::Rejected,
        };
        Self {
            kind,
            item: Some(mv.item.clone()),
            message: format!("Could not move item {}: {}", mv.item, error),
        }
    }

    pub fn refetch_failed(scope: &BoardScope, error: &SyncError) -> Self {
        Self {
            kind: NoticeKind::RefetchFailed,
            item: None,
            message: format!("Could not reload {}: {}", scope, error),
        }
    }
}

/// Surface for failure notices
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: &FailureNotice);
}

/// Writes notices to the log. Used when no other notifier is installed.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notice: &FailureNotice) {
        warn!(kind = ?notice.kind, item = ?notice.item, "{}", notice.message);
    }
}

/// Keeps every notice for later inspection
#[derive(Debug, Default)]
pub struct CollectingNotifier {
    notices: Mutex<Vec<FailureNotice>>,
}

impl CollectingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notices(&self) -> Vec<FailureNotice> {
        self.notices
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl Notifier for CollectingNotifier {
    fn notify(&self, notice: &FailureNotice) {
        self.notices
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(notice.clone());
    }
}
