use chrono::NaiveDate;
use serde_json::json;

use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::model::{Class, UserData};
use crate::roster::{self, ClassDraft};
use crate::stats;
use crate::store::today_string;

fn handle_classes_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(data) = state.data.as_ref() else {
        return ok(&req.id, json!({ "classes": [] }));
    };

    // The dashboard column defaults to today; tests and backfill views pass
    // an explicit date.
    let date = match req.params.get("date").and_then(|v| v.as_str()) {
        Some(d) => {
            if NaiveDate::parse_from_str(d, "%Y-%m-%d").is_err() {
                return err(&req.id, "bad_params", "date must be YYYY-MM-DD", None);
            }
            d.to_string()
        }
        None => today_string(),
    };

    let summary = stats::class_today_summary(&data.classes, &data.attendance_records, &date);

    let mut classes: Vec<&Class> = data.classes.iter().collect();
    classes.sort_by(|a, b| a.name.cmp(&b.name));

    let classes_json: Vec<serde_json::Value> = classes
        .iter()
        .map(|c| {
            let today = summary.get(&c.id).copied().unwrap_or_default();
            json!({
                "id": c.id,
                "name": c.name,
                "tuitionFee": c.tuition_fee,
                "studentCount": c.students.len(),
                "today": {
                    "present": today.present,
                    "total": today.total
                }
            })
        })
        .collect();

    ok(&req.id, json!({ "date": date, "classes": classes_json }))
}

fn handle_classes_upsert(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(data) = state.data.as_ref() else {
        return err(&req.id, "not_signed_in", "sign in first", None);
    };

    let draft: ClassDraft = match serde_json::from_value(req.params.clone()) {
        Ok(d) => d,
        Err(e) => return err(&req.id, "bad_params", e.to_string(), None),
    };

    let (classes, class_id) = match roster::upsert_class(&data.classes, &draft) {
        Ok(v) => v,
        Err(e) => {
            return err(
                &req.id,
                "validation_failed",
                e.to_string(),
                Some(json!({ "field": e.field })),
            )
        }
    };

    let updated = UserData {
        classes,
        attendance_records: data.attendance_records.clone(),
    };
    if let Some(resp) = super::apply_and_persist(state, req, updated) {
        return resp;
    }
    ok(&req.id, json!({ "classId": class_id }))
}

fn handle_classes_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(data) = state.data.as_ref() else {
        return err(&req.id, "not_signed_in", "sign in first", None);
    };

    let class_id = match req.params.get("classId").and_then(|v| v.as_str()) {
        Some(v) => v.to_string(),
        None => return err(&req.id, "bad_params", "missing classId", None),
    };
    if !data.classes.iter().any(|c| c.id == class_id) {
        return err(&req.id, "not_found", "class not found", None);
    }

    let before = data.attendance_records.len();
    let (classes, attendance_records) =
        roster::delete_class(&data.classes, &data.attendance_records, &class_id);
    let removed_records = before - attendance_records.len();

    let updated = UserData {
        classes,
        attendance_records,
    };
    if let Some(resp) = super::apply_and_persist(state, req, updated) {
        return resp;
    }
    ok(&req.id, json!({ "ok": true, "removedRecords": removed_records }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "classes.list" => Some(handle_classes_list(state, req)),
        "classes.upsert" => Some(handle_classes_upsert(state, req)),
        "classes.delete" => Some(handle_classes_delete(state, req)),
        _ => None,
    }
}
