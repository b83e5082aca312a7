//! Session IPC commands. Authentication is mock — an in-memory flag
//! with no credential check — so login always succeeds.

use std::sync::Arc;

use tauri::State;

use crate::state::AppState;

#[tauri::command]
pub fn login(state: State<'_, Arc<AppState>>) -> bool {
    state.login();
    true
}

/// End the session. Capture state is torn down so a later login starts
/// from a clean slate.
#[tauri::command]
pub fn logout(state: State<'_, Arc<AppState>>) -> Result<(), String> {
    state.logout().map_err(|e| e.to_string())
}

#[tauri::command]
pub fn is_authenticated(state: State<'_, Arc<AppState>>) -> bool {
    state.session.is_authenticated()
}
