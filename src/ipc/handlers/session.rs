use serde_json::json;

use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};

fn handle_sign_in(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };

    let user = match state.auth.sign_in() {
        Ok(u) => u,
        Err(e) => return err(&req.id, "auth_failed", e.to_string(), None),
    };

    match store.get_user_data(&user.uid) {
        Ok(data) => {
            state.data = Some(data);
            ok(&req.id, json!({ "user": user }))
        }
        Err(e) => {
            // Sign-in without a document is useless; roll it back.
            state.auth.sign_out();
            err(&req.id, "db_read_failed", format!("{e:?}"), None)
        }
    }
}

fn handle_sign_out(state: &mut AppState, req: &Request) -> serde_json::Value {
    state.auth.sign_out();
    state.data = None;
    ok(&req.id, json!({ "ok": true }))
}

fn handle_current(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(&req.id, json!({ "user": state.auth.current_user() }))
}

fn handle_data_export(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(data) = state.data.as_ref() else {
        return err(&req.id, "not_signed_in", "sign in first", None);
    };
    ok(&req.id, json!(data))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "auth.signIn" => Some(handle_sign_in(state, req)),
        "auth.signOut" => Some(handle_sign_out(state, req)),
        "auth.current" => Some(handle_current(state, req)),
        "data.export" => Some(handle_data_export(state, req)),
        _ => None,
    }
}
