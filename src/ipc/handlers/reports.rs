use crate::attendance;
use crate::course::CourseContext;
use crate::ipc::error::ok;
use crate::ipc::helpers::{get_mode, get_required_str, roster_for_action, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::report::{self, Sheet, Variant, MIME_TYPE};
use log::{info, warn};
use serde_json::json;
use std::path::PathBuf;

use super::attendance::reconciliation_json;

fn get_variant(params: &serde_json::Value) -> Result<Variant, HandlerErr> {
    let raw = get_required_str(params, "variant")?;
    Variant::parse(raw).ok_or_else(|| HandlerErr {
        code: "bad_params",
        message: "variant must be one of: plainList, signatureSheet, attendanceSheet".to_string(),
        details: Some(json!({ "variant": raw })),
    })
}

fn reports_render(state: &AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let variant = get_variant(params)?;
    let out_path = match params.get("outPath").and_then(|v| v.as_str()) {
        Some(v) if !v.trim().is_empty() => PathBuf::from(v.trim()),
        _ => return Err(HandlerErr::bad_params("missing outPath")),
    };

    // Parameters are validated before the roster is read.
    let attendance_input = match variant {
        Variant::AttendanceSheet => {
            let raw = get_required_str(params, "rollNumbers")?;
            let mode = get_mode(params)?;
            let course = params
                .get("course")
                .ok_or_else(|| HandlerErr::bad_params("missing course"))?;
            let course = CourseContext::from_json(course)?;
            Some((raw, mode, course))
        }
        _ => None,
    };

    let roster = roster_for_action(state)?;
    let (doc, attendance_result) = match &attendance_input {
        Some((raw, mode, course)) => {
            let rec = attendance::reconcile(&roster, raw, *mode)?;
            let doc = report::render(
                &roster,
                Sheet::Attendance {
                    reconciliation: &rec,
                    course,
                },
                &state.config,
            )?;
            (doc, Some(reconciliation_json(&roster, &rec)))
        }
        None => {
            let sheet = match variant {
                Variant::SignatureSheet => Sheet::SignatureSheet,
                _ => Sheet::PlainList,
            };
            (report::render(&roster, sheet, &state.config)?, None)
        }
    };

    if let Err(e) = report::write_document(&out_path, &doc.bytes) {
        warn!("failed to write {}: {:#}", out_path.to_string_lossy(), e);
        return Err(HandlerErr {
            code: "io_failed",
            message: format!("{e:#}"),
            details: Some(json!({ "path": out_path.to_string_lossy() })),
        });
    }
    info!(
        "wrote {} ({} pages) to {}",
        variant.as_str(),
        doc.page_count,
        out_path.to_string_lossy()
    );

    let filename = out_path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| variant.default_filename().to_string());
    let mut result = json!({
        "path": out_path.to_string_lossy(),
        "filename": filename,
        "mimeType": MIME_TYPE,
        "variant": variant.as_str(),
        "byteCount": doc.bytes.len(),
        "pageCount": doc.page_count,
    });
    if let Some(a) = attendance_result {
        result["summary"] = json!({
            "presentCount": a["presentCount"],
            "absentCount": a["absentCount"],
            "rosterSize": a["rosterSize"],
        });
        result["unknownRolls"] = a["unknownRolls"].clone();
        result["warnings"] = a["warnings"].clone();
    }
    Ok(result)
}

fn handle_reports_render(state: &mut AppState, req: &Request) -> serde_json::Value {
    match reports_render(state, &req.params) {
        Ok(v) => ok(&req.id, v),
        Err(e) => {
            warn!("reports.render failed: {} {}", e.code, e.message);
            e.response(&req.id)
        }
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "reports.render" => Some(handle_reports_render(state, req)),
        _ => None,
    }
}
