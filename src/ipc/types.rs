use crate::config::Config;
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

/// Only the workspace location and its config persist between requests; the
/// roster is read fresh for every request that needs it.
pub struct AppState {
    pub workspace: Option<PathBuf>,
    pub config: Config,
}

impl AppState {
    pub fn new() -> AppState {
        AppState {
            workspace: None,
            config: Config::default(),
        }
    }
}
