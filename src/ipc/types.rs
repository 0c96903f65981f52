use std::path::PathBuf;

use serde::Deserialize;

use crate::auth::AuthService;
use crate::model::UserData;
use crate::store::UserDataStore;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

/// Per-process state: the opened store, the identity provider, and the
/// signed-in user's document. Between saves the in-memory document is the
/// source of truth; a failed write never discards it.
pub struct AppState {
    pub workspace: Option<PathBuf>,
    pub store: Option<UserDataStore>,
    pub auth: AuthService,
    pub data: Option<UserData>,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            workspace: None,
            store: None,
            auth: AuthService::new(),
            data: None,
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
