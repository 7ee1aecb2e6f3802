//! REST gateway for kanban-sync boards
//!
//! [`RestGateway`] implements [`kanban_sync::RemoteGateway`] over the
//! projects API. Paths are relative to `api/projects/`:
//!
//! | scope | listing | move |
//! |-------|---------|------|
//! | projects | `GET projects/` | `PATCH projects/{id}/move_card/` |
//! | project cards | `GET kanban-cards/?project={p}` | `PATCH kanban-cards/{id}/move/` |
//! | stage tasks | `GET tasks/?stage={s}` | `PATCH tasks/{id}/` |
//!
//! ```rust,no_run
//! use kanban_sync::{BoardScope, BoardSession, SyncConfig};
//! use kanban_sync_rest::RestGateway;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = SyncConfig::load()?;
//! let gateway = Arc::new(RestGateway::from_config(&config)?);
//! let handle = BoardSession::mount(gateway, BoardScope::Projects, config)
//!     .await?
//!     .spawn();
//! handle.settled().await?;
//! # Ok(())
//! # }
//! ```

mod client;
mod error;
mod wire;

pub use client::RestGateway;
pub use error::RestError;
