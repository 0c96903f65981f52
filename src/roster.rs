use serde::Deserialize;
use uuid::Uuid;

use crate::model::{AttendanceRecord, Class, Gender, Parent, Student};

/// Rejected roster-edit input. Surfaced as a form-level message; nothing is
/// applied when validation fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ParentDraft {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentDraft {
    pub name: String,
    pub age: i64,
    #[serde(default)]
    pub gender: Gender,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub parent: Option<ParentDraft>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassDraft {
    #[serde(default)]
    pub class_id: Option<String>,
    pub name: String,
    pub tuition_fee: i64,
}

/// Appends a freshly-identified student to the roster.
///
/// Name must be non-empty after trimming, age must be positive. A missing
/// avatar URL gets a deterministic placeholder keyed by the new id.
pub fn add_student(roster: &[Student], draft: &StudentDraft) -> Result<Vec<Student>, ValidationError> {
    let name = draft.name.trim();
    if name.is_empty() {
        return Err(ValidationError::new("name", "name must not be empty"));
    }
    let age = match u32::try_from(draft.age) {
        Ok(a) if a > 0 => a,
        _ => return Err(ValidationError::new("age", "age must be a positive number")),
    };

    let id = Uuid::new_v4().to_string();
    let avatar_url = match draft.avatar_url.as_deref().map(str::trim) {
        Some(url) if !url.is_empty() => url.to_string(),
        _ => format!("https://picsum.photos/seed/{}/100/100", id),
    };

    let mut out = roster.to_vec();
    out.push(Student {
        id,
        name: name.to_string(),
        avatar_url,
        age,
        gender: draft.gender,
        parent: draft.parent.as_ref().and_then(parent_from_draft),
    });
    Ok(out)
}

// Parent is all-or-nothing: attached only when at least one field survives
// trimming, never stored as a record of empty strings.
fn parent_from_draft(draft: &ParentDraft) -> Option<Parent> {
    let name = draft.name.trim();
    let phone = draft.phone.trim();
    let email = draft.email.trim();
    if name.is_empty() && phone.is_empty() && email.is_empty() {
        return None;
    }
    Some(Parent {
        name: name.to_string(),
        phone: phone.to_string(),
        email: email.to_string(),
    })
}

/// Filters the student out. Removing an absent id is a no-op.
pub fn remove_student(roster: &[Student], student_id: &str) -> Vec<Student> {
    roster
        .iter()
        .filter(|s| s.id != student_id)
        .cloned()
        .collect()
}

/// Update-if-exists-else-insert, keyed by class id. Editing touches only
/// the class metadata; the roster is managed through `add_student` and
/// `remove_student`. Returns the new collection and the upserted id.
pub fn upsert_class(
    classes: &[Class],
    draft: &ClassDraft,
) -> Result<(Vec<Class>, String), ValidationError> {
    let name = draft.name.trim();
    if name.is_empty() {
        return Err(ValidationError::new("name", "name must not be empty"));
    }
    if draft.tuition_fee < 0 {
        return Err(ValidationError::new(
            "tuitionFee",
            "tuition fee must not be negative",
        ));
    }

    let mut out = classes.to_vec();
    if let Some(id) = &draft.class_id {
        if let Some(existing) = out.iter_mut().find(|c| c.id == *id) {
            existing.name = name.to_string();
            existing.tuition_fee = draft.tuition_fee;
            return Ok((out, id.clone()));
        }
    }

    let id = draft
        .class_id
        .clone()
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    out.push(Class {
        id: id.clone(),
        name: name.to_string(),
        students: Vec::new(),
        tuition_fee: draft.tuition_fee,
    });
    Ok((out, id))
}

/// Removes the class and every attendance record referencing it. The
/// destructive confirmation prompt lives at the UI boundary; the cascade
/// itself is unconditional.
pub fn delete_class(
    classes: &[Class],
    records: &[AttendanceRecord],
    class_id: &str,
) -> (Vec<Class>, Vec<AttendanceRecord>) {
    let classes_out = classes.iter().filter(|c| c.id != class_id).cloned().collect();
    let records_out = records
        .iter()
        .filter(|r| r.class_id != class_id)
        .cloned()
        .collect();
    (classes_out, records_out)
}
