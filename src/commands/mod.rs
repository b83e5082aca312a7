pub mod analysis;
pub mod capture;
pub mod session;

use std::sync::Arc;

use tauri::State;

use crate::state::{AppState, Snapshot};

/// Static disclaimer shown beneath the report. Canonical wording lives
/// here so the webview cannot drift from it.
pub const DISCLAIMER: &str = "\
This AI-powered analysis is for informational purposes only and is not a \
substitute for professional medical advice, diagnosis, or treatment. Always \
seek the advice of a qualified dermatologist or other healthcare provider \
with any questions you may have regarding a medical condition.";

/// Health check IPC command — verifies backend is running
#[tauri::command]
pub fn health_check() -> String {
    tracing::debug!("Health check called");
    "ok".to_string()
}

/// Full UI snapshot: auth, mode, camera status, selection, view.
#[tauri::command]
pub fn get_view_state(state: State<'_, Arc<AppState>>) -> Result<Snapshot, String> {
    state.snapshot().map_err(|e| e.to_string())
}

/// Canonical disclaimer text for the webview.
#[tauri::command]
pub fn get_disclaimer() -> &'static str {
    DISCLAIMER
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_check_returns_ok() {
        assert_eq!(health_check(), "ok");
    }

    #[test]
    fn disclaimer_framing_is_intact() {
        assert!(DISCLAIMER.contains("informational purposes only"));
        assert!(DISCLAIMER.contains("not a substitute"));
        assert!(DISCLAIMER.contains("dermatologist"));
    }
}
