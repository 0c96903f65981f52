use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_dir(prefix: &str) -> PathBuf {
    let p = std::env::temp_dir().join(format!(
        "{}-{}",
        prefix,
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos()
    ));
    std::fs::create_dir_all(&p).expect("create temp dir");
    p
}

fn spawn_sidecar() -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_rollbookd");
    let mut child = Command::new(exe)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn rollbookd");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
}

fn request(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let payload = json!({
        "id": id,
        "method": method,
        "params": params,
    });
    writeln!(stdin, "{}", payload).expect("write request");
    stdin.flush().expect("flush request");

    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    assert!(!line.trim().is_empty(), "empty response for {}", method);
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse response json");
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    value
}

fn request_ok(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let value = request(stdin, reader, id, method, params);
    assert!(
        value.get("ok").and_then(|v| v.as_bool()).unwrap_or(false),
        "{} failed: {}",
        method,
        value
    );
    value.get("result").cloned().unwrap_or_else(|| json!({}))
}

fn sign_in(stdin: &mut ChildStdin, reader: &mut BufReader<ChildStdout>, workspace: &PathBuf) {
    let _ = request_ok(
        stdin,
        reader,
        "setup-1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    let _ = request_ok(stdin, reader, "setup-2", "auth.signIn", json!({}));
}

fn add_student(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    class_id: &str,
    name: &str,
) -> String {
    let result = request_ok(
        stdin,
        reader,
        id,
        "students.add",
        json!({ "classId": class_id, "name": name, "age": 17 }),
    );
    result
        .get("studentId")
        .and_then(|v| v.as_str())
        .expect("studentId")
        .to_string()
}

fn stats_row<'a>(stats: &'a [serde_json::Value], student_id: &str) -> Option<&'a serde_json::Value> {
    stats
        .iter()
        .find(|row| row.get("studentId").and_then(|v| v.as_str()) == Some(student_id))
}

#[test]
fn lifetime_stats_and_tuition_follow_the_record_history() {
    let workspace = temp_dir("rollbook-lifetime-stats");
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    sign_in(&mut stdin, &mut reader, &workspace);

    let created = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "classes.upsert",
        json!({ "name": "Stats class", "tuitionFee": 100000 }),
    );
    let class_id = created
        .get("classId")
        .and_then(|v| v.as_str())
        .expect("classId")
        .to_string();

    let a = add_student(&mut stdin, &mut reader, "2", &class_id, "An");
    let b = add_student(&mut stdin, &mut reader, "3", &class_id, "Binh");

    let mut statuses = serde_json::Map::new();
    statuses.insert(a.clone(), json!("present"));
    statuses.insert(b.clone(), json!("late"));
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "attendance.sessionCommit",
        json!({
            "classId": class_id,
            "date": "2024-01-01",
            "statuses": statuses
        }),
    );

    let result = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "attendance.studentStats",
        json!({ "classId": class_id }),
    );
    let stats = result
        .get("stats")
        .and_then(|v| v.as_array())
        .expect("stats");
    assert_eq!(stats.len(), 2);

    let row_a = stats_row(stats, &a).expect("row for A");
    assert_eq!(row_a.get("present").and_then(|v| v.as_u64()), Some(1));
    assert_eq!(row_a.get("absent").and_then(|v| v.as_u64()), Some(0));
    assert_eq!(row_a.get("late").and_then(|v| v.as_u64()), Some(0));
    assert_eq!(row_a.get("tuitionDue").and_then(|v| v.as_i64()), Some(100_000));

    // Late bills as a full attended session.
    let row_b = stats_row(stats, &b).expect("row for B");
    assert_eq!(row_b.get("late").and_then(|v| v.as_u64()), Some(1));
    assert_eq!(row_b.get("attended").and_then(|v| v.as_u64()), Some(1));
    assert_eq!(row_b.get("tuitionDue").and_then(|v| v.as_i64()), Some(100_000));
}

#[test]
fn removed_students_disappear_from_stats_but_history_stays_stored() {
    let workspace = temp_dir("rollbook-roster-anchored");
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    sign_in(&mut stdin, &mut reader, &workspace);

    let created = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "classes.upsert",
        json!({ "name": "Shrinking class", "tuitionFee": 90000 }),
    );
    let class_id = created
        .get("classId")
        .and_then(|v| v.as_str())
        .expect("classId")
        .to_string();

    let a = add_student(&mut stdin, &mut reader, "2", &class_id, "An");
    let b = add_student(&mut stdin, &mut reader, "3", &class_id, "Binh");

    let mut statuses = serde_json::Map::new();
    statuses.insert(a.clone(), json!("present"));
    statuses.insert(b.clone(), json!("present"));
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "attendance.sessionCommit",
        json!({
            "classId": class_id,
            "date": "2024-02-01",
            "statuses": statuses
        }),
    );

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "students.remove",
        json!({ "classId": class_id, "studentId": b }),
    );
    // Removing the same id again is a quiet no-op.
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "6",
        "students.remove",
        json!({ "classId": class_id, "studentId": b }),
    );

    let result = request_ok(
        &mut stdin,
        &mut reader,
        "7",
        "attendance.studentStats",
        json!({ "classId": class_id }),
    );
    let stats = result
        .get("stats")
        .and_then(|v| v.as_array())
        .expect("stats");
    assert_eq!(stats.len(), 1);
    assert!(stats_row(stats, &a).is_some());
    assert!(stats_row(stats, &b).is_none());

    // The historical row is still in the stored record.
    let export = request_ok(&mut stdin, &mut reader, "8", "data.export", json!({}));
    let kept = export
        .get("attendanceRecords")
        .and_then(|v| v.as_array())
        .expect("records")
        .iter()
        .filter(|r| r.get("classId").and_then(|v| v.as_str()) == Some(class_id.as_str()))
        .any(|r| {
            r.get("records")
                .and_then(|v| v.as_array())
                .map(|rows| {
                    rows.iter()
                        .any(|row| row.get("studentId").and_then(|v| v.as_str()) == Some(b.as_str()))
                })
                .unwrap_or(false)
        });
    assert!(kept, "history for the removed student stays stored");
}
