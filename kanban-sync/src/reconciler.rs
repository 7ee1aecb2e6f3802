//! Turns a finished drag gesture into a single Move intent.
//!
//! Gesture libraries report the drop target either as a droppable column
//! surface or as the sibling card under the pointer. Both are resolved here
//! against the live board; nothing is mutated.

use crate::board::Board;
use crate::types::{ColumnId, ItemId, Move};
use serde::{Deserialize, Serialize};
use tracing::trace;

/// What the dragged item was released over
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum DropTarget {
    /// Empty area of a column
    Column(ColumnId),
    /// Another item
    Item(ItemId),
}

/// A completed drag gesture
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DragEnd {
    /// The dragged item
    pub active: ItemId,
    /// Drop target, `None` when released outside any droppable
    pub over: Option<DropTarget>,
}

impl DragEnd {
    pub fn onto_column(active: impl Into<ItemId>, column: impl Into<ColumnId>) -> Self {
        Self {
            active: active.into(),
            over: Some(DropTarget::Column(column.into())),
        }
    }

    pub fn onto_item(active: impl Into<ItemId>, sibling: impl Into<ItemId>) -> Self {
        Self {
            active: active.into(),
            over: Some(DropTarget::Item(sibling.into())),
        }
    }

    pub fn cancelled(active: impl Into<ItemId>) -> Self {
        Self {
            active: active.into(),
            over: None,
        }
    }
}

/// Resolves gestures against a board without mutating it
pub struct MoveReconciler<'a> {
    board: &'a Board,
}

impl<'a> MoveReconciler<'a> {
    pub fn new(board: &'a Board) -> Self {
        Self { board }
    }

    /// Compute the move a gesture asks for, or `None` when the gesture no
    /// longer points at anything on the board.
    pub fn reconcile(&self, gesture: &DragEnd) -> Option<Move> {
        let Some(origin) = self.board.slot(&gesture.active).cloned() else {
            trace!(item = %gesture.active, "dragged item is not on the board");
            return None;
        };
        let Some(over) = &gesture.over else {
            trace!(item = %gesture.active, "released outside any drop target");
            return None;
        };

        let (to_column, to_index) = match over {
            DropTarget::Column(column) => {
                let Some(list) = self.board.column(column) else {
                    trace!(%column, "drop target column vanished");
                    return None;
                };
                // Append; the dragged item does not count against its own column.
                let len = if origin.column == *column {
                    list.len() - 1
                } else {
                    list.len()
                };
                (column.clone(), len)
            }
            DropTarget::Item(sibling) => {
                let Some(target) = self.board.slot(sibling) else {
                    trace!(%sibling, "drop target item vanished");
                    return None;
                };
                let index = if target.column == origin.column && origin.index < target.index {
                    target.index - 1
                } else {
                    target.index
                };
                (target.column.clone(), index)
            }
        };

        Some(Move::new(
            gesture.active.clone(),
            origin,
            to_column,
            to_index,
        ))
    }
}
