use crate::ipc::error::err;
use crate::ipc::types::{AppState, Request};
use crate::model::UserData;

pub mod attendance;
pub mod classes;
pub mod core;
pub mod session;
pub mod students;

/// Applies an updated document to in-memory state, then persists it whole.
///
/// In-memory edits survive a failed write; the error is reported and the
/// next successful save writes the whole document anyway. Returns `None` on
/// success, or the error response to send.
pub(crate) fn apply_and_persist(
    state: &mut AppState,
    req: &Request,
    data: UserData,
) -> Option<serde_json::Value> {
    let uid = match state.auth.current_user() {
        Some(u) => u.uid.clone(),
        None => return Some(err(&req.id, "not_signed_in", "sign in first", None)),
    };

    let save = match state.store.as_ref() {
        Some(store) => store.save_user_data(&uid, &data),
        None => {
            state.data = Some(data);
            return Some(err(&req.id, "no_workspace", "select a workspace first", None));
        }
    };

    state.data = Some(data);
    match save {
        Ok(()) => None,
        Err(e) => Some(err(&req.id, "db_write_failed", format!("{e:?}"), None)),
    }
}
