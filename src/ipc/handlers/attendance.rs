use crate::attendance::{self, EntryMode, Reconciliation};
use crate::course::{CourseName, CourseType, CLASSES_HELD};
use crate::ipc::error::ok;
use crate::ipc::helpers::{get_mode, get_required_str, roster_for_action, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::report::Variant;
use crate::roster::Roster;
use serde_json::json;

/// Marks joined back to the roster rows they belong to, in roster order.
pub fn reconciliation_json(roster: &Roster, rec: &Reconciliation) -> serde_json::Value {
    let marks: Vec<serde_json::Value> = roster
        .students()
        .iter()
        .zip(rec.marks.iter())
        .map(|(s, m)| {
            json!({
                "rollNo": s.roll_no,
                "name": s.name,
                "groupName": s.group_name,
                "status": m.status,
            })
        })
        .collect();
    json!({
        "marks": marks,
        "unknownRolls": rec.unknown_rolls,
        "outOfRange": rec.out_of_range,
        "presentCount": rec.present_count(),
        "absentCount": rec.absent_count(),
        "rosterSize": roster.len(),
        "warnings": rec.warnings().iter().map(|w| w.to_json()).collect::<Vec<_>>(),
    })
}

fn attendance_reconcile(state: &AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let raw = get_required_str(params, "rollNumbers")?;
    let mode = get_mode(params)?;
    if raw.trim().is_empty() {
        return Err(HandlerErr {
            code: "invalid_input",
            message: "enter at least one roll number".to_string(),
            details: None,
        });
    }
    let roster = roster_for_action(state)?;
    let rec = attendance::reconcile(&roster, raw, mode)?;
    Ok(reconciliation_json(&roster, &rec))
}

fn handle_attendance_reconcile(state: &mut AppState, req: &Request) -> serde_json::Value {
    match attendance_reconcile(state, &req.params) {
        Ok(v) => ok(&req.id, v),
        Err(e) => e.response(&req.id),
    }
}

fn handle_course_options(req: &Request) -> serde_json::Value {
    let modes: Vec<serde_json::Value> = [EntryMode::AbsenteesEntered, EntryMode::PresentEntered]
        .into_iter()
        .map(|m| json!({ "value": m.as_str(), "label": m.label() }))
        .collect();
    let variants: Vec<serde_json::Value> = Variant::ALL
        .into_iter()
        .map(|v| {
            json!({
                "value": v.as_str(),
                "label": v.heading(),
                "defaultFilename": v.default_filename(),
            })
        })
        .collect();
    ok(
        &req.id,
        json!({
            "courses": CourseName::ALL.iter().map(|c| c.label()).collect::<Vec<_>>(),
            "sessionTypes": CourseType::ALL.iter().map(|t| t.label()).collect::<Vec<_>>(),
            "classesHeld": CLASSES_HELD.collect::<Vec<u8>>(),
            "modes": modes,
            "variants": variants,
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "attendance.reconcile" => Some(handle_attendance_reconcile(state, req)),
        "course.options" => Some(handle_course_options(req)),
        _ => None,
    }
}
