//! Contract with the remote system that persists board arrangements.

mod memory;

pub use memory::MemoryGateway;

use crate::types::{BoardScope, ItemRecord, MoveRequest};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Machine-readable reason a remote call failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Validation,
    Permission,
    NotFound,
    Conflict,
    /// Network error, server error or timeout
    Unavailable,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Validation => "validation",
            Self::Permission => "permission",
            Self::NotFound => "not found",
            Self::Conflict => "conflict",
            Self::Unavailable => "unavailable",
        };
        f.write_str(name)
    }
}

/// Failure reported by a gateway, with an optional human-readable message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteFailure {
    pub kind: FailureKind,
    pub message: Option<String>,
}

impl fmt::Display for RemoteFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.message {
            Some(message) => write!(f, "{}: {}", self.kind, message),
            None => write!(f, "{}", self.kind),
        }
    }
}

impl std::error::Error for RemoteFailure {}

impl RemoteFailure {
    pub fn new(kind: FailureKind) -> Self {
        Self {
            kind,
            message: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Validation).with_message(message)
    }

    pub fn permission(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Permission).with_message(message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(FailureKind::NotFound).with_message(message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Conflict).with_message(message)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Unavailable).with_message(message)
    }
}

/// The remote API the engine persists moves through.
///
/// Implementations must not retry on their own; the session decides what a
/// failure means for the local board.
#[async_trait]
pub trait RemoteGateway: Send + Sync {
    /// Full listing used to (re)build a board
    async fn list_items(&self, scope: &BoardScope) -> Result<Vec<ItemRecord>, RemoteFailure>;

    /// Persist a single move
    async fn move_item(&self, scope: &BoardScope, request: &MoveRequest)
        -> Result<(), RemoteFailure>;
}
