use serde_json::json;

use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::roster::{self, StudentDraft};

fn handle_students_add(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(data) = state.data.as_ref() else {
        return err(&req.id, "not_signed_in", "sign in first", None);
    };

    let class_id = match req.params.get("classId").and_then(|v| v.as_str()) {
        Some(v) => v.to_string(),
        None => return err(&req.id, "bad_params", "missing classId", None),
    };
    let draft: StudentDraft = match serde_json::from_value(req.params.clone()) {
        Ok(d) => d,
        Err(e) => return err(&req.id, "bad_params", e.to_string(), None),
    };

    let Some(class) = data.classes.iter().find(|c| c.id == class_id) else {
        return err(&req.id, "not_found", "class not found", None);
    };

    let students = match roster::add_student(&class.students, &draft) {
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
    // add_student appends, so the new student is the last entry.
    let student_id = students.last().map(|s| s.id.clone()).unwrap_or_default();

    let mut updated = data.clone();
    if let Some(c) = updated.classes.iter_mut().find(|c| c.id == class_id) {
        c.students = students;
    }
    if let Some(resp) = super::apply_and_persist(state, req, updated) {
        return resp;
    }
    ok(&req.id, json!({ "studentId": student_id }))
}

fn handle_students_remove(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(data) = state.data.as_ref() else {
        return err(&req.id, "not_signed_in", "sign in first", None);
    };

    let class_id = match req.params.get("classId").and_then(|v| v.as_str()) {
        Some(v) => v.to_string(),
        None => return err(&req.id, "bad_params", "missing classId", None),
    };
    let student_id = match req.params.get("studentId").and_then(|v| v.as_str()) {
        Some(v) => v.to_string(),
        None => return err(&req.id, "bad_params", "missing studentId", None),
    };

    let Some(class) = data.classes.iter().find(|c| c.id == class_id) else {
        return err(&req.id, "not_found", "class not found", None);
    };

    // Idempotent: removing an unknown student id is a no-op, not an error.
    let students = roster::remove_student(&class.students, &student_id);

    let mut updated = data.clone();
    if let Some(c) = updated.classes.iter_mut().find(|c| c.id == class_id) {
        c.students = students;
    }
    if let Some(resp) = super::apply_and_persist(state, req, updated) {
        return resp;
    }
    ok(&req.id, json!({ "ok": true }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "students.add" => Some(handle_students_add(state, req)),
        "students.remove" => Some(handle_students_remove(state, req)),
        _ => None,
    }
}
