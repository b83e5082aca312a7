//! Image acquisition IPC commands: mode switching, camera frame/error
//! relay from the webview, capture, and file selection.

use std::path::Path;
use std::sync::Arc;

use tauri::State;

use crate::capture::{CaptureMode, RgbFrame};
use crate::state::{AppState, SelectedImageInfo};

/// Switch between upload and camera acquisition modes.
///
/// Always releases any active stream before entering the new mode;
/// re-selecting camera mode doubles as the retry out of a camera error.
#[tauri::command]
pub fn select_capture_mode(
    mode: CaptureMode,
    state: State<'_, Arc<AppState>>,
) -> Result<(), String> {
    state.select_mode(mode).map_err(|e| e.to_string())
}

/// Latest preview frame from the webview's getUserMedia stream.
///
/// `pixels` is tightly-packed RGB8, `width * height * 3` bytes.
#[tauri::command]
pub fn submit_camera_frame(
    width: u32,
    height: u32,
    pixels: Vec<u8>,
    state: State<'_, Arc<AppState>>,
) -> Result<(), String> {
    let frame = RgbFrame::new(width, height, pixels)
        .ok_or("Frame buffer does not match its dimensions")?;
    state.submit_frame(frame).map_err(|e| e.to_string())
}

/// Webview-side acquisition failure (permission denied, no device).
#[tauri::command]
pub fn report_camera_error(
    message: String,
    state: State<'_, Arc<AppState>>,
) -> Result<(), String> {
    tracing::warn!(message = %message, "Webview reported camera error");
    state.report_camera_error(&message).map_err(|e| e.to_string())
}

/// One-shot capture of the current camera frame as the selected image.
/// Runs on a blocking thread (JPEG encode + preview write).
#[tauri::command]
pub async fn capture_photo(
    state: State<'_, Arc<AppState>>,
) -> Result<SelectedImageInfo, String> {
    let state = Arc::clone(state.inner());
    tauri::async_runtime::spawn_blocking(move || state.capture_photo())
        .await
        .map_err(|e| format!("Task failed: {e}"))?
}

/// Stage a file picked in the dialog as the selected image.
/// Runs on a blocking thread (full file read for the preview).
#[tauri::command]
pub async fn select_image_file(
    file_path: String,
    state: State<'_, Arc<AppState>>,
) -> Result<SelectedImageInfo, String> {
    let state = Arc::clone(state.inner());
    tauri::async_runtime::spawn_blocking(move || {
        let path = Path::new(&file_path);
        if !path.is_file() {
            return Err(format!("File not found: {file_path}"));
        }
        state.select_image_file(path)
    })
    .await
    .map_err(|e| format!("Task failed: {e}"))?
}

/// Drop the selected image (and its preview) and reset the view.
#[tauri::command]
pub fn clear_image(state: State<'_, Arc<AppState>>) -> Result<(), String> {
    state.clear_image().map_err(|e| e.to_string())
}
