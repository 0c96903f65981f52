use std::path::Path;

use anyhow::Context;
use chrono::{Days, Local};
use rusqlite::{Connection, OptionalExtension};

use crate::model::{
    AttendanceData, AttendanceRecord, AttendanceStatus, Class, Gender, Parent, Student, UserData,
};

/// SQLite-backed user data store: one JSON document per user id,
/// whole-document reads and writes, last write wins. No deltas, no
/// versioning.
pub struct UserDataStore {
    conn: Connection,
}

impl UserDataStore {
    pub fn open(workspace: &Path) -> anyhow::Result<Self> {
        std::fs::create_dir_all(workspace)?;
        let db_path = workspace.join("rollbook.sqlite3");
        let conn = Connection::open(db_path)?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS user_documents(
                user_id TEXT PRIMARY KEY,
                document TEXT NOT NULL,
                updated_at TEXT
            )",
            [],
        )?;

        Ok(Self { conn })
    }

    /// Returns the stored document for the user. A first-time user gets the
    /// default dataset, persisted before it is returned.
    pub fn get_user_data(&self, user_id: &str) -> anyhow::Result<UserData> {
        let raw: Option<String> = self
            .conn
            .query_row(
                "SELECT document FROM user_documents WHERE user_id = ?",
                [user_id],
                |r| r.get(0),
            )
            .optional()?;

        match raw {
            Some(raw) => serde_json::from_str(&raw).context("malformed user document"),
            None => {
                let data = default_user_data();
                self.save_user_data(user_id, &data)?;
                Ok(data)
            }
        }
    }

    /// Overwrites the user's entire document.
    pub fn save_user_data(&self, user_id: &str, data: &UserData) -> anyhow::Result<()> {
        let document = serde_json::to_string(data)?;
        let updated_at = Local::now().format("%Y-%m-%dT%H:%M:%S").to_string();
        self.conn.execute(
            "INSERT INTO user_documents(user_id, document, updated_at)
             VALUES(?, ?, ?)
             ON CONFLICT(user_id) DO UPDATE SET
               document = excluded.document,
               updated_at = excluded.updated_at",
            (user_id, &document, &updated_at),
        )?;
        Ok(())
    }
}

/// Today's local calendar date, YYYY-MM-DD.
pub fn today_string() -> String {
    Local::now().format("%Y-%m-%d").to_string()
}

fn days_ago_string(days: u64) -> String {
    let today = Local::now().date_naive();
    today
        .checked_sub_days(Days::new(days))
        .unwrap_or(today)
        .format("%Y-%m-%d")
        .to_string()
}

fn student(id: &str, name: &str, age: u32, gender: Gender, parent: Option<Parent>) -> Student {
    Student {
        id: id.to_string(),
        name: name.to_string(),
        avatar_url: format!("https://picsum.photos/seed/{}/100/100", id),
        age,
        gender,
        parent,
    }
}

fn parent(name: &str, phone: &str, email: &str) -> Parent {
    Parent {
        name: name.to_string(),
        phone: phone.to_string(),
        email: email.to_string(),
    }
}

fn row(student_id: &str, status: AttendanceStatus) -> AttendanceData {
    AttendanceData {
        student_id: student_id.to_string(),
        status,
    }
}

/// Starter dataset for a brand-new user: two classes and two days of
/// history, dated relative to the current day so the dashboard has
/// something recent to show.
fn default_user_data() -> UserData {
    let classes = vec![
        Class {
            id: "C001".to_string(),
            name: "Lớp 12A1".to_string(),
            tuition_fee: 100_000,
            students: vec![
                student(
                    "S001",
                    "Nguyễn Văn An",
                    17,
                    Gender::Male,
                    Some(parent("Nguyễn Văn A", "0901234567", "phuhuynh.an@email.com")),
                ),
                student(
                    "S002",
                    "Trần Thị Bình",
                    17,
                    Gender::Female,
                    Some(parent("Trần Văn B", "0902345678", "phuhuynh.binh@email.com")),
                ),
                student("S003", "Lê Minh Cường", 18, Gender::Male, None),
                student("S004", "Phạm Thị Dung", 17, Gender::Female, None),
                student("S005", "Hoàng Văn Em", 18, Gender::Male, None),
                student("S006", "Vũ Thị Giang", 17, Gender::Female, None),
            ],
        },
        Class {
            id: "C002".to_string(),
            name: "Lớp 11B2".to_string(),
            tuition_fee: 90_000,
            students: vec![
                student("S007", "Đỗ Minh Hải", 16, Gender::Male, None),
                student(
                    "S008",
                    "Bùi Thu Hương",
                    16,
                    Gender::Female,
                    Some(parent("Bùi Văn H", "0903456789", "phuhuynh.huong@email.com")),
                ),
                student("S009", "Ngô Gia Khánh", 16, Gender::Male, None),
            ],
        },
    ];

    let attendance_records = vec![
        AttendanceRecord {
            class_id: "C001".to_string(),
            date: days_ago_string(1),
            records: vec![
                row("S001", AttendanceStatus::Present),
                row("S002", AttendanceStatus::Present),
                row("S003", AttendanceStatus::Absent),
                row("S004", AttendanceStatus::Present),
                row("S005", AttendanceStatus::Late),
                row("S006", AttendanceStatus::Present),
            ],
        },
        AttendanceRecord {
            class_id: "C001".to_string(),
            date: days_ago_string(2),
            records: vec![
                row("S001", AttendanceStatus::Present),
                row("S002", AttendanceStatus::Late),
                row("S003", AttendanceStatus::Present),
                row("S004", AttendanceStatus::Present),
                row("S005", AttendanceStatus::Present),
                row("S006", AttendanceStatus::Absent),
            ],
        },
    ];

    UserData {
        classes,
        attendance_records,
    }
}
