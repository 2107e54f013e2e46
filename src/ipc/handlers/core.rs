use crate::config::Config;
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use log::info;
use serde_json::json;
use std::path::{Path, PathBuf};

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "workspacePath": state.workspace.as_ref().map(|p| p.to_string_lossy().to_string())
        }),
    )
}

/// Points the sidecar at a workspace directory. Nothing is opened here; the
/// database is only read when a roster is needed.
pub fn select_workspace(state: &mut AppState, path: &Path) -> anyhow::Result<serde_json::Value> {
    let config = Config::load(path)?;
    let db_path = config.database_path(path);
    let result = json!({
        "workspacePath": path.to_string_lossy(),
        "databasePath": db_path.to_string_lossy(),
        "databaseExists": db_path.is_file(),
        "config": serde_json::to_value(&config)?,
    });
    info!("workspace selected: {}", path.to_string_lossy());
    state.workspace = Some(path.to_path_buf());
    state.config = config;
    Ok(result)
}

fn handle_workspace_select(state: &mut AppState, req: &Request) -> serde_json::Value {
    let p = req
        .params
        .get("path")
        .and_then(|v| v.as_str())
        .filter(|s| !s.trim().is_empty())
        .map(PathBuf::from);
    let Some(path) = p else {
        return err(&req.id, "bad_params", "missing params.path", None);
    };
    if !path.is_dir() {
        return err(
            &req.id,
            "not_found",
            "workspace directory not found",
            Some(json!({ "path": path.to_string_lossy() })),
        );
    }

    match select_workspace(state, &path) {
        Ok(result) => ok(&req.id, result),
        Err(e) => err(
            &req.id,
            "config_invalid",
            format!("{e:#}"),
            Some(json!({ "path": path.to_string_lossy() })),
        ),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "workspace.select" => Some(handle_workspace_select(state, req)),
        _ => None,
    }
}
