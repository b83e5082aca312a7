//! Analysis IPC command.

use std::sync::Arc;

use tauri::State;

use crate::report::ViewState;
use crate::state::AppState;

/// Run one analysis attempt against the selected image.
///
/// The HTTP round-trip blocks for up to the client timeout, so it runs
/// on a blocking thread; the event loop stays live and `get_view_state`
/// observes `loading` while the request is outstanding. The backend
/// single-flight guard rejects a concurrent duplicate regardless of
/// what the webview does with its Analyze button.
///
/// Pre-flight rejections (not logged in, busy, nothing selected) come
/// back as `Err`; analysis outcomes — report or failure — come back as
/// the updated view state.
#[tauri::command]
pub async fn analyze_image(state: State<'_, Arc<AppState>>) -> Result<ViewState, String> {
    let state = Arc::clone(state.inner());
    tauri::async_runtime::spawn_blocking(move || {
        state.run_analysis().map_err(|e| e.to_string())
    })
    .await
    .map_err(|e| format!("Task failed: {e}"))?
}
