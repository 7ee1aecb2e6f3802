//! Ordered-position board engine with optimistic moves
//!
//! This crate keeps a kanban-style board (named columns, each holding a
//! dense ordered list of item ids) in step with a remote system that
//! persists the arrangement. Drags are applied locally at once and rolled
//! back exactly if the remote side refuses them.
//!
//! ## Overview
//!
//! - **Board** - columns of [`PositionList`]s plus an `item -> slot` index
//! - **MoveReconciler** - turns a finished drag gesture into one [`Move`]
//! - **OptimisticSyncEngine** - sans-IO state machine: apply, then commit or roll back
//! - **BoardSession** - tokio actor driving the engine against a [`RemoteGateway`]
//!
//! ## Basic Usage
//!
//! ```rust,no_run
//! use kanban_sync::{BoardScope, BoardSession, DragEnd, MemoryGateway, SyncConfig};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let gateway = Arc::new(MemoryGateway::new());
//! let config = SyncConfig::load()?;
//!
//! let handle = BoardSession::mount(gateway, BoardScope::Projects, config)
//!     .await?
//!     .spawn();
//!
//! // Drop project 7 into the "Done" column
//! handle.drag(DragEnd::onto_column(7, "column3")).await?;
//! handle.settled().await?;
//!
//! println!("{} projects on the board", handle.board().len());
//! # Ok(())
//! # }
//! ```
//!
//! ## Failure handling
//!
//! A rejected or timed-out move restores the board to the snapshot taken
//! just before it, raises a [`FailureNotice`] and reloads the board once.
//! Gestures that race a newer arrangement (the dragged item has moved or
//! vanished) are dropped silently.

pub mod board;
pub mod config;
pub mod engine;
pub mod error;
pub mod gateway;
pub mod notice;
pub mod position;
pub mod reconciler;
pub mod session;
pub mod types;

pub use board::{Board, BoardSnapshot};
pub use config::SyncConfig;
pub use engine::{MovePhase, OptimisticSyncEngine, Resolution, Submission};
pub use error::{Result, SyncError};
pub use gateway::{FailureKind, MemoryGateway, RemoteFailure, RemoteGateway};
pub use notice::{CollectingNotifier, FailureNotice, NoticeKind, Notifier, TracingNotifier};
pub use position::PositionList;
pub use reconciler::{DragEnd, DropTarget, MoveReconciler};
pub use session::{BoardHandle, BoardSession, DragAck};
pub use types::{
    BoardScope, ColumnId, ColumnSpec, ItemId, ItemRecord, Move, MoveRequest, MoveTicket, Slot,
};
