//! Dense per-column ordering of item ids.
//!
//! Positions are implicit: an item's position is its index in the list, so
//! the list is 0-based, contiguous and duplicate-free by construction as long
//! as callers never insert an id twice (the board guarantees that).

use crate::types::ItemId;
use serde::{Deserialize, Serialize};

/// Ordered item ids of one column
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PositionList {
    items: Vec<ItemId>,
}

impl PositionList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ItemId> {
        self.items.get(index)
    }

    /// Current index of `item`, if present
    pub fn position(&self, item: &ItemId) -> Option<usize> {
        self.items.iter().position(|id| id == item)
    }

    pub fn contains(&self, item: &ItemId) -> bool {
        self.items.contains(item)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ItemId> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[ItemId] {
        &self.items
    }

    /// Insert at `index` clamped to `[0, len]`. Returns the index used.
    pub fn insert(&mut self, item: ItemId, index: usize) -> usize {
        debug_assert!(!self.contains(&item), "item {} inserted twice", item);
        let at = index.min(self.items.len());
        self.items.insert(at, item);
        at
    }

    /// Remove `item`, returning the index it held. Absent items are a no-op.
    pub fn remove(&mut self, item: &ItemId) -> Option<usize> {
        let at = self.position(item)?;
        self.items.remove(at);
        Some(at)
    }

    /// Relocate `item` inside this list in one step.
    ///
    /// Same result as `remove` followed by `insert(new_index)`, with
    /// `new_index` clamped to the last slot. Returns the final index, or
    /// `None` if the item is not in this list.
    pub fn move_within(&mut self, item: &ItemId, new_index: usize) -> Option<usize> {
        let from = self.position(item)?;
        let to = new_index.min(self.items.len() - 1);
        if from < to {
            self.items[from..=to].rotate_left(1);
        } else if to < from {
            self.items[to..=from].rotate_right(1);
        }
        Some(to)
    }
}

impl FromIterator<ItemId> for PositionList {
    fn from_iter<I: IntoIterator<Item = ItemId>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a PositionList {
    type Item = &'a ItemId;
    type IntoIter = std::slice::Iter<'a, ItemId>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
