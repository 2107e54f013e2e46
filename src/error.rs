use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("cannot open student database {path}: {message}")]
    StorageUnavailable { path: String, message: String },

    #[error("failed to read students table: {0}")]
    QueryFailed(String),

    #[error("no students in roster")]
    EmptyRoster,

    #[error("{0}")]
    InvalidInput(String),

    #[error("missing render resource {resource}: {message}")]
    RenderResourceMissing { resource: String, message: String },

    #[error("PDF generation failed: {0}")]
    RenderFailed(String),
}

impl AppError {
    /// Stable code used in IPC error objects and roster diagnostics.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::StorageUnavailable { .. } => "storage_unavailable",
            AppError::QueryFailed(_) => "query_failed",
            AppError::EmptyRoster => "empty_roster",
            AppError::InvalidInput(_) => "invalid_input",
            AppError::RenderResourceMissing { .. } => "render_resource_missing",
            AppError::RenderFailed(_) => "render_failed",
        }
    }

    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            AppError::StorageUnavailable { path, .. } => Some(json!({ "path": path })),
            AppError::RenderResourceMissing { resource, .. } => {
                Some(json!({ "resource": resource }))
            }
            _ => None,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        let mut obj = json!({
            "code": self.code(),
            "message": self.to_string(),
        });
        if let Some(d) = self.details() {
            obj["details"] = d;
        }
        obj
    }
}

impl From<rusqlite::Error> for AppError {
    fn from(e: rusqlite::Error) -> Self {
        AppError::QueryFailed(e.to_string())
    }
}

impl From<printpdf::Error> for AppError {
    fn from(e: printpdf::Error) -> Self {
        AppError::RenderFailed(e.to_string())
    }
}
