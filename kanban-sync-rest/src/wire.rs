//! Paths, bodies and listing decoding for each board scope.

use kanban_sync::{BoardScope, ItemId, ItemRecord, MoveRequest, RemoteFailure};
use serde::Deserialize;
use serde_json::{json, Map, Value};

/// Relative listing path and query for `scope`
pub(crate) fn list_path(scope: &BoardScope) -> (&'static str, Option<(&'static str, String)>) {
    match scope {
        BoardScope::Projects => ("api/projects/projects/", None),
        BoardScope::ProjectCards { project } => (
            "api/projects/kanban-cards/",
            Some(("project", project.to_string())),
        ),
        BoardScope::StageTasks { stage } => {
            ("api/projects/tasks/", Some(("stage", stage.to_string())))
        }
    }
}

/// Relative move path for `item` in `scope`
pub(crate) fn move_path(scope: &BoardScope, item: &ItemId) -> String {
    match scope {
        BoardScope::Projects => format!("api/projects/projects/{}/move_card/", item),
        BoardScope::ProjectCards { .. } => format!("api/projects/kanban-cards/{}/move/", item),
        BoardScope::StageTasks { .. } => format!("api/projects/tasks/{}/", item),
    }
}

/// Name of the field holding an item's column
pub(crate) fn column_field(scope: &BoardScope) -> &'static str {
    match scope {
        BoardScope::Projects => "kanban_column",
        BoardScope::ProjectCards { .. } => "column",
        BoardScope::StageTasks { .. } => "status",
    }
}

/// PATCH body for a move. Tasks carry no stored order, only their status.
pub(crate) fn move_body(scope: &BoardScope, request: &MoveRequest) -> Value {
    let mut body = Map::new();
    body.insert(column_field(scope).to_string(), json!(request.column));
    if scope.has_stored_order() {
        body.insert("order".to_string(), json!(request.order));
    }
    Value::Object(body)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Listing {
    Page { results: Vec<Value> },
    Items(Vec<Value>),
}

/// Decode a listing body, either a bare array or a `{ "results": [...] }` page
pub(crate) fn decode_listing(
    scope: &BoardScope,
    body: Value,
) -> Result<Vec<ItemRecord>, RemoteFailure> {
    let entries = match serde_json::from_value::<Listing>(body) {
        Ok(Listing::Page { results }) => results,
        Ok(Listing::Items(items)) => items,
        Err(_) => return Err(RemoteFailure::validation("listing is not a list of items")),
    };

    let field = column_field(scope);
    entries
        .into_iter()
        .enumerate()
        .map(|(position, entry)| {
            let id = entry
                .get("id")
                .cloned()
                .and_then(|id| serde_json::from_value::<ItemId>(id).ok())
                .ok_or_else(|| {
                    RemoteFailure::validation(format!("listing entry {} has no id", position))
                })?;
            let column = entry.get(field).and_then(Value::as_str).ok_or_else(|| {
                RemoteFailure::validation(format!("item {} has no '{}' field", id, field))
            })?;

            let order = if scope.has_stored_order() {
                entry.get("order").and_then(Value::as_i64)
            } else {
                None
            };
            Ok(ItemRecord {
                id,
                column: column.into(),
                order,
            })
        })
        .collect()
}
