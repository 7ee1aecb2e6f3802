//! Identifier types for board items, columns and in-flight moves.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a card, project or task.
///
/// The remote API keys most boards by integer primary key, but string keys
/// are accepted too. The engine never looks inside an id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ItemId {
    Int(i64),
    Str(String),
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(id) => write!(f, "{}", id),
            Self::Str(id) => f.write_str(id),
        }
    }
}

impl From<i64> for ItemId {
    fn from(id: i64) -> Self {
        Self::Int(id)
    }
}

impl From<i32> for ItemId {
    fn from(id: i32) -> Self {
        Self::Int(id.into())
    }
}

impl From<&str> for ItemId {
    fn from(id: &str) -> Self {
        Self::Str(id.to_string())
    }
}

impl From<String> for ItemId {
    fn from(id: String) -> Self {
        Self::Str(id)
    }
}

/// Name of a column (kanban lane), e.g. `column1` or `in_progress`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColumnId(String);

impl ColumnId {
    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ColumnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ColumnId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ColumnId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Ticket handed out when a move is applied optimistically. The remote
/// outcome is reported back against this ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MoveTicket(u64);

impl MoveTicket {
    pub fn new(seq: u64) -> Self {
        Self(seq)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for MoveTicket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_id_untagged_serde() {
        let int: ItemId = serde_json::from_str("42").unwrap();
        assert_eq!(int, ItemId::Int(42));

        let text: ItemId = serde_json::from_str("\"card-7\"").unwrap();
        assert_eq!(text, ItemId::from("card-7"));

        assert_eq!(serde_json::to_string(&ItemId::from(5)).unwrap(), "5");
    }

    #[test]
    fn test_item_id_display() {
        assert_eq!(ItemId::from(12).to_string(), "12");
        assert_eq!(ItemId::from("abc").to_string(), "abc");
    }

    #[test]
    fn test_column_id_transparent() {
        let col = ColumnId::from("column2");
        assert_eq!(col.as_str(), "column2");
        assert_eq!(serde_json::to_string(&col).unwrap(), "\"column2\"");
    }

    #[test]
    fn test_ticket_display() {
        assert_eq!(MoveTicket::new(3).to_string(), "#3");
        assert_eq!(MoveTicket::new(3).as_u64(), 3);
    }
}
