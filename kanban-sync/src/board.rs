//! Board: named columns of dense position lists plus an item index.
//!
//! The board is the single source of truth a view renders from. Every
//! mutation keeps two structures in step: the ordered columns and the
//! `item -> slot` index used for constant-time lookups.

use crate::error::{Result, SyncError};
use crate::position::PositionList;
use crate::types::{BoardScope, ColumnId, ItemId, ItemRecord, Move, Slot};
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::HashMap;
use tracing::{trace, warn};

/// Columns in display order, each with its ordered items
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Board {
    columns: IndexMap<ColumnId, PositionList>,
    #[serde(skip)]
    index: HashMap<ItemId, Slot>,
}

/// Point-in-time copy of a board, kept only until the move it guards is
/// confirmed or rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardSnapshot {
    board: Board,
}

impl BoardSnapshot {
    pub fn board(&self) -> &Board {
        &self.board
    }
}

impl Board {
    /// Empty board with the given columns, in order
    pub fn with_columns(columns: impl IntoIterator<Item = ColumnId>) -> Self {
        Self {
            columns: columns
                .into_iter()
                .map(|id| (id, PositionList::new()))
                .collect(),
            index: HashMap::new(),
        }
    }

    /// Build a board from a remote listing.
    ///
    /// Records are ordered by stored `order` (listing position when missing),
    /// ties broken by listing position, then assigned dense positions.
    /// Columns not in `columns` are appended so no listed item is lost.
    pub fn from_records(
        columns: impl IntoIterator<Item = ColumnId>,
        records: impl IntoIterator<Item = ItemRecord>,
    ) -> Result<Self> {
        let mut board = Self::with_columns(columns);
        let mut records: Vec<(usize, ItemRecord)> = records.into_iter().enumerate().collect();
        records.sort_by_key(|(listed, record)| {
            (record.order.unwrap_or(*listed as i64), *listed)
        });

        for (_, record) in records {
            if board.index.contains_key(&record.id) {
                return Err(SyncError::duplicate_item(&record.id));
            }
            let list = board.columns.entry(record.column.clone()).or_insert_with(|| {
                warn!(column = %record.column, "listing references undeclared column, adding it");
                PositionList::new()
            });
            let index = list.insert(record.id.clone(), usize::MAX);
            board.index.insert(record.id, Slot::new(record.column, index));
        }

        Ok(board)
    }

    /// Build a board with the column layout of `scope`
    pub fn for_scope(
        scope: &BoardScope,
        records: impl IntoIterator<Item = ItemRecord>,
    ) -> Result<Self> {
        Self::from_records(scope.column_ids(), records)
    }

    // =========================================================================
    // Lookups
    // =========================================================================

    /// Where `id` currently sits
    pub fn find_item(&self, id: &ItemId) -> Result<Slot> {
        self.index
            .get(id)
            .cloned()
            .ok_or_else(|| SyncError::not_found(id))
    }

    pub fn slot(&self, id: &ItemId) -> Option<&Slot> {
        self.index.get(id)
    }

    pub fn contains(&self, id: &ItemId) -> bool {
        self.index.contains_key(id)
    }

    pub fn column(&self, id: &ColumnId) -> Option<&PositionList> {
        self.columns.get(id)
    }

    pub fn has_column(&self, id: &ColumnId) -> bool {
        self.columns.contains_key(id)
    }

    /// Columns in display order
    pub fn columns(&self) -> impl Iterator<Item = (&ColumnId, &PositionList)> {
        self.columns.iter()
    }

    /// Total number of items across all columns
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Current arrangement as listing rows with dense orders
    pub fn to_records(&self) -> Vec<ItemRecord> {
        self.columns
            .iter()
            .flat_map(|(column, list)| {
                list.iter().enumerate().map(move |(order, id)| {
                    ItemRecord::new(id.clone(), column.clone(), order as i64)
                })
            })
            .collect()
    }

    /// Check that the index and the columns describe the same arrangement
    pub fn is_consistent(&self) -> bool {
        let listed: usize = self.columns.values().map(PositionList::len).sum();
        listed == self.index.len()
            && self.columns.iter().all(|(column, list)| {
                list.iter().enumerate().all(|(index, id)| {
                    self.index.get(id) == Some(&Slot::new(column.clone(), index))
                })
            })
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Apply a move, returning the slot the item landed in.
    ///
    /// Fails without touching the board when the item is unknown, when the
    /// recorded origin no longer matches the live slot, or when the
    /// destination column does not exist.
    pub fn apply_move(&mut self, mv: &Move) -> Result<Slot> {
        let current = self.find_item(&mv.item)?;
        if current.column != mv.from_column || current.index != mv.from_index {
            return Err(SyncError::StaleMove {
                id: mv.item.to_string(),
                expected: mv.origin(),
                actual: current,
            });
        }
        if !self.has_column(&mv.to_column) {
            return Err(SyncError::column_not_found(&mv.to_column));
        }

        let landed = if mv.is_within_column() {
            let list = self
                .columns
                .get_mut(&mv.to_column)
                .ok_or_else(|| SyncError::column_not_found(&mv.to_column))?;
            let landed = list
                .move_within(&mv.item, mv.to_index)
                .ok_or_else(|| SyncError::not_found(&mv.item))?;
            let (low, high) = (current.index.min(landed), current.index.max(landed));
            self.reindex(&mv.to_column, low, Some(high));
            landed
        } else {
            if let Some(source) = self.columns.get_mut(&mv.from_column) {
                source.remove(&mv.item);
            }
            self.reindex(&mv.from_column, current.index, None);

            let dest = self
                .columns
                .get_mut(&mv.to_column)
                .ok_or_else(|| SyncError::column_not_found(&mv.to_column))?;
            let landed = dest.insert(mv.item.clone(), mv.to_index);
            self.reindex(&mv.to_column, landed, None);
            landed
        };

        trace!(item = %mv.item, column = %mv.to_column, index = landed, "applied move");
        debug_assert!(self.is_consistent());
        Ok(Slot::new(mv.to_column.clone(), landed))
    }

    /// Place a new item at `index` (clamped) in `column`
    pub fn insert(&mut self, id: ItemId, column: &ColumnId, index: usize) -> Result<Slot> {
        if self.contains(&id) {
            return Err(SyncError::duplicate_item(&id));
        }
        let list = self
            .columns
            .get_mut(column)
            .ok_or_else(|| SyncError::column_not_found(column))?;
        let landed = list.insert(id, index);
        self.reindex(column, landed, None);
        Ok(Slot::new(column.clone(), landed))
    }

    /// Take an item off the board. Absent items are a no-op.
    pub fn remove(&mut self, id: &ItemId) -> Option<Slot> {
        let slot = self.index.remove(id)?;
        if let Some(list) = self.columns.get_mut(&slot.column) {
            list.remove(id);
        }
        self.reindex(&slot.column, slot.index, None);
        Some(slot)
    }

    /// Deep copy for rollback
    pub fn snapshot(&self) -> BoardSnapshot {
        BoardSnapshot {
            board: self.clone(),
        }
    }

    /// Replace the whole board with a snapshot
    pub fn restore(&mut self, snapshot: BoardSnapshot) {
        *self = snapshot.board;
    }

    /// Rewrite index entries for `column` from `start` through `end` (or the
    /// end of the column).
    fn reindex(&mut self, column: &ColumnId, start: usize, end: Option<usize>) {
        let Some(list) = self.columns.get(column) else {
            return;
        };
        let end = end.unwrap_or(usize::MAX);
        for (index, id) in list.iter().enumerate().skip(start) {
            if index > end {
                break;
            }
            self.index.insert(id.clone(), Slot::new(column.clone(), index));
        }
    }
}
