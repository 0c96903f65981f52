use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde_json::json;

use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::model::{AttendanceStatus, Class, UserData};
use crate::reconcile;
use crate::stats;

struct HandlerErr {
    code: &'static str,
    message: String,
    details: Option<serde_json::Value>,
}

impl HandlerErr {
    fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    fn response(self, id: &str) -> serde_json::Value {
        err(id, self.code, self.message, self.details)
    }
}

fn get_required_str(params: &serde_json::Value, key: &str) -> Result<String, HandlerErr> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| HandlerErr::new("bad_params", format!("missing {}", key)))
}

fn get_valid_date(params: &serde_json::Value) -> Result<String, HandlerErr> {
    let date = get_required_str(params, "date")?;
    if NaiveDate::parse_from_str(&date, "%Y-%m-%d").is_err() {
        return Err(HandlerErr::new("bad_params", "date must be YYYY-MM-DD"));
    }
    Ok(date)
}

fn find_class<'a>(data: &'a UserData, class_id: &str) -> Result<&'a Class, HandlerErr> {
    data.classes
        .iter()
        .find(|c| c.id == class_id)
        .ok_or_else(|| HandlerErr::new("not_found", "class not found"))
}

fn parse_statuses(
    params: &serde_json::Value,
) -> Result<BTreeMap<String, AttendanceStatus>, HandlerErr> {
    let Some(raw) = params.get("statuses") else {
        return Err(HandlerErr::new("bad_params", "missing statuses"));
    };
    serde_json::from_value(raw.clone())
        .map_err(|e| HandlerErr::new("bad_params", format!("bad statuses: {}", e)))
}

fn session_open(data: &UserData, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let class_id = get_required_str(params, "classId")?;
    let date = get_valid_date(params)?;
    let class = find_class(data, &class_id)?;

    let session = reconcile::build_session_status(class, &date, &data.attendance_records);
    let summary = stats::daily_summary(&session);

    let mut students = class.students.clone();
    students.sort_by(|a, b| a.name.cmp(&b.name));

    let statuses: serde_json::Map<String, serde_json::Value> = session
        .iter()
        .map(|(id, status)| (id.clone(), json!(status)))
        .collect();

    Ok(json!({
        "classId": class.id,
        "date": date,
        "tuitionFee": class.tuition_fee,
        "students": students,
        "statuses": statuses,
        "summary": summary
    }))
}

fn student_stats(data: &UserData, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let class_id = get_required_str(params, "classId")?;
    let class = find_class(data, &class_id)?;

    let stats_map = stats::student_lifetime_stats(class, &data.attendance_records);

    let mut students = class.students.clone();
    students.sort_by(|a, b| a.name.cmp(&b.name));

    let rows: Vec<serde_json::Value> = students
        .iter()
        .map(|s| {
            let counts = stats_map.get(&s.id).copied().unwrap_or_default();
            json!({
                "studentId": s.id,
                "name": s.name,
                "present": counts.present,
                "absent": counts.absent,
                "late": counts.late,
                "attended": counts.attended(),
                "tuitionDue": stats::tuition_due(&counts, class.tuition_fee)
            })
        })
        .collect();

    Ok(json!({
        "classId": class.id,
        "tuitionFee": class.tuition_fee,
        "stats": rows
    }))
}

fn handle_session_open(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(data) = state.data.as_ref() else {
        return err(&req.id, "not_signed_in", "sign in first", None);
    };
    match session_open(data, &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

fn handle_session_commit(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(data) = state.data.as_ref() else {
        return err(&req.id, "not_signed_in", "sign in first", None);
    };

    let prepared = (|| {
        let class_id = get_required_str(&req.params, "classId")?;
        let date = get_valid_date(&req.params)?;
        let session = parse_statuses(&req.params)?;
        find_class(data, &class_id)?;
        let records =
            reconcile::commit_session(&class_id, &date, &session, &data.attendance_records);
        let summary = stats::daily_summary(&session);
        Ok::<_, HandlerErr>((records, summary))
    })();
    let (attendance_records, summary) = match prepared {
        Ok(v) => v,
        Err(e) => return e.response(&req.id),
    };

    let updated = UserData {
        classes: data.classes.clone(),
        attendance_records,
    };
    if let Some(resp) = super::apply_and_persist(state, req, updated) {
        return resp;
    }
    ok(&req.id, json!({ "ok": true, "summary": summary }))
}

fn handle_student_stats(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(data) = state.data.as_ref() else {
        return err(&req.id, "not_signed_in", "sign in first", None);
    };
    match student_stats(data, &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "attendance.sessionOpen" => Some(handle_session_open(state, req)),
        "attendance.sessionCommit" => Some(handle_session_commit(state, req)),
        "attendance.studentStats" => Some(handle_student_stats(state, req)),
        _ => None,
    }
}
