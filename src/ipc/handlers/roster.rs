use crate::ipc::error::ok;
use crate::ipc::helpers::database_path;
use crate::ipc::types::{AppState, Request};
use crate::report::layout::ColumnKey;
use crate::roster;
use serde_json::json;

fn handle_roster_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let db_path = match database_path(state) {
        Ok(p) => p,
        Err(e) => return e.response(&req.id),
    };
    let loaded = roster::load(&db_path);
    let columns: Vec<serde_json::Value> = [
        ("rollNo", ColumnKey::RollNo),
        ("name", ColumnKey::Name),
        ("groupName", ColumnKey::Group),
    ]
    .into_iter()
    .map(|(key, col)| json!({ "key": key, "label": col.label() }))
    .collect();

    ok(
        &req.id,
        json!({
            "columns": columns,
            "students": loaded.roster.students(),
            "available": !loaded.roster.is_empty(),
            "diagnostic": loaded.diagnostic.as_ref().map(|d| d.to_json()),
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "roster.list" => Some(handle_roster_list(state, req)),
        _ => None,
    }
}
