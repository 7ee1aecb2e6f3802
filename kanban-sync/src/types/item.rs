//! Item placement types: Slot, ItemRecord, Move, MoveRequest

use super::ids::{ColumnId, ItemId, MoveTicket};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Where an item currently sits: column + 0-based index
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Slot {
    pub column: ColumnId,
    pub index: usize,
}

impl Slot {
    pub fn new(column: impl Into<ColumnId>, index: usize) -> Self {
        Self {
            column: column.into(),
            index,
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.column, self.index)
    }
}

/// One row of a remote listing.
///
/// `order` is whatever the server stores; it may have gaps or be missing
/// entirely (task boards carry no order). The board assigns dense positions
/// on load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRecord {
    pub id: ItemId,
    pub column: ColumnId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,
}

impl ItemRecord {
    pub fn new(id: impl Into<ItemId>, column: impl Into<ColumnId>, order: i64) -> Self {
        Self {
            id: id.into(),
            column: column.into(),
            order: Some(order),
        }
    }

    /// A record without a stored order; listing position decides.
    pub fn unordered(id: impl Into<ItemId>, column: impl Into<ColumnId>) -> Self {
        Self {
            id: id.into(),
            column: column.into(),
            order: None,
        }
    }
}

/// Intent to relocate one item.
///
/// `from_*` records where the item was when the gesture was reconciled; the
/// board refuses the move if that no longer holds. For moves within one
/// column `to_index` is the final index after the item is lifted out.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Move {
    pub item: ItemId,
    pub from_column: ColumnId,
    pub from_index: usize,
    pub to_column: ColumnId,
    pub to_index: usize,
}

impl Move {
    pub fn new(
        item: impl Into<ItemId>,
        from: Slot,
        to_column: impl Into<ColumnId>,
        to_index: usize,
    ) -> Self {
        Self {
            item: item.into(),
            from_column: from.column,
            from_index: from.index,
            to_column: to_column.into(),
            to_index,
        }
    }

    pub fn origin(&self) -> Slot {
        Slot::new(self.from_column.clone(), self.from_index)
    }

    pub fn is_within_column(&self) -> bool {
        self.from_column == self.to_column
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}/{} -> {}/{}",
            self.item, self.from_column, self.from_index, self.to_column, self.to_index
        )
    }
}

/// The single remote mutation issued for an optimistically applied move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRequest {
    pub ticket: MoveTicket,
    pub item: ItemId,
    pub column: ColumnId,
    pub order: usize,
}
