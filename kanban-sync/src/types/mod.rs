//! Core types for the board engine

mod ids;
mod item;
mod scope;

pub use ids::{ColumnId, ItemId, MoveTicket};
pub use item::{ItemRecord, Move, MoveRequest, Slot};
pub use scope::{BoardScope, ColumnSpec};
