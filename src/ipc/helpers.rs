use crate::attendance::EntryMode;
use crate::error::AppError;
use crate::ipc::error::err;
use crate::ipc::types::AppState;
use crate::roster::{self, Roster};
use serde_json::json;
use std::path::PathBuf;

pub struct HandlerErr {
    pub code: &'static str,
    pub message: String,
    pub details: Option<serde_json::Value>,
}

impl HandlerErr {
    pub fn bad_params(message: impl Into<String>) -> HandlerErr {
        HandlerErr {
            code: "bad_params",
            message: message.into(),
            details: None,
        }
    }

    pub fn response(self, id: &str) -> serde_json::Value {
        err(id, self.code, self.message, self.details)
    }
}

impl From<AppError> for HandlerErr {
    fn from(e: AppError) -> Self {
        HandlerErr {
            code: e.code(),
            message: e.to_string(),
            details: e.details(),
        }
    }
}

pub fn get_required_str<'a>(params: &'a serde_json::Value, key: &str) -> Result<&'a str, HandlerErr> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| HandlerErr::bad_params(format!("missing {}", key)))
}

pub fn get_mode(params: &serde_json::Value) -> Result<EntryMode, HandlerErr> {
    let raw = get_required_str(params, "mode")?;
    EntryMode::parse(raw).ok_or_else(|| HandlerErr {
        code: "bad_params",
        message: "mode must be one of: absentees, present".to_string(),
        details: Some(json!({ "mode": raw })),
    })
}

pub fn database_path(state: &AppState) -> Result<PathBuf, HandlerErr> {
    let Some(ws) = state.workspace.as_ref() else {
        return Err(HandlerErr {
            code: "no_workspace",
            message: "select a workspace first".to_string(),
            details: None,
        });
    };
    Ok(state.config.database_path(ws))
}

/// Roster for an action that cannot run without students. A storage failure
/// surfaces as `empty_roster` carrying the underlying diagnostic.
pub fn roster_for_action(state: &AppState) -> Result<Roster, HandlerErr> {
    let db_path = database_path(state)?;
    let loaded = roster::load(&db_path);
    if loaded.roster.is_empty() {
        return Err(HandlerErr {
            code: AppError::EmptyRoster.code(),
            message: "no student data available".to_string(),
            details: loaded
                .diagnostic
                .map(|d| json!({ "diagnostic": d.to_json() })),
        });
    }
    Ok(loaded.roster)
}
