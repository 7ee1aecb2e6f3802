//! Board scopes and their column layouts.

use super::ids::{ColumnId, ItemId};
use serde::{Deserialize, Serialize};
use std::fmt;

const PROJECT_COLUMNS: [(&str, &str); 3] = [
    ("column1", "In progress"),
    ("column2", "Under review"),
    ("column3", "Done"),
];

const TASK_COLUMNS: [(&str, &str); 4] = [
    ("new", "New"),
    ("in_progress", "In progress"),
    ("completed", "Completed"),
    ("returned", "Returned"),
];

/// Which remote listing a board mirrors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BoardScope {
    /// Cross-project board: every project the user can see.
    Projects,
    /// Card board inside one project.
    ProjectCards { project: ItemId },
    /// Task board of one development stage, columns are task statuses.
    StageTasks { stage: ItemId },
}

/// A declared column with its display title
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub id: ColumnId,
    pub title: String,
}

impl BoardScope {
    /// Declared columns in display order
    pub fn columns(&self) -> Vec<ColumnSpec> {
        let layout: &[(&str, &str)] = match self {
            Self::Projects | Self::ProjectCards { .. } => &PROJECT_COLUMNS,
            Self::StageTasks { .. } => &TASK_COLUMNS,
        };
        layout
            .iter()
            .map(|(id, title)| ColumnSpec {
                id: ColumnId::from(*id),
                title: (*title).to_string(),
            })
            .collect()
    }

    pub fn column_ids(&self) -> Vec<ColumnId> {
        self.columns().into_iter().map(|spec| spec.id).collect()
    }

    /// Whether the remote side stores an explicit order for this scope
    pub fn has_stored_order(&self) -> bool {
        !matches!(self, Self::StageTasks { .. })
    }
}

impl fmt::Display for BoardScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Projects => f.write_str("projects"),
            Self::ProjectCards { project } => write!(f, "project {} cards", project),
            Self::StageTasks { stage } => write!(f, "stage {} tasks", stage),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_columns() {
        let cols = BoardScope::Projects.columns();
        assert_eq!(cols.len(), 3);
        assert_eq!(cols[0].id.as_str(), "column1");
        assert_eq!(cols[1].title, "Under review");
        assert_eq!(
            BoardScope::ProjectCards { project: 4.into() }.column_ids(),
            BoardScope::Projects.column_ids()
        );
    }

    #[test]
    fn test_task_columns() {
        let scope = BoardScope::StageTasks { stage: 9.into() };
        let ids: Vec<String> = scope
            .column_ids()
            .iter()
            .map(|c| c.to_string())
            .collect();
        assert_eq!(ids, ["new", "in_progress", "completed", "returned"]);
        assert!(!scope.has_stored_order());
        assert!(BoardScope::Projects.has_stored_order());
    }

    #[test]
    fn test_scope_serialization() {
        let scope = BoardScope::ProjectCards { project: 7.into() };
        let json = serde_json::to_value(&scope).unwrap();
        assert_eq!(json["kind"], "project_cards");
        assert_eq!(json["project"], 7);
        assert_eq!(scope.to_string(), "project 7 cards");
    }
}
