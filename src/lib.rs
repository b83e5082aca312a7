pub mod analysis;
pub mod capture;
pub mod commands;
pub mod config;
pub mod encode;
pub mod report;
pub mod session;
pub mod state;

use std::sync::Arc;

use tauri::{Emitter, Manager};
use tracing_subscriber::EnvFilter;

use capture::{CameraControl, FrameSlot, WebviewCamera};

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    tauri::Builder::default()
        .plugin(tauri_plugin_dialog::init())
        .setup(|app| {
            // Camera control events flow backend → webview; frames and
            // errors flow back over the capture commands.
            let handle = app.handle().clone();
            let frame_slot = FrameSlot::new();
            let control = Arc::new(move |control: CameraControl| {
                let event = match control {
                    CameraControl::Acquire { .. } => "camera:acquire",
                    CameraControl::Release => "camera:release",
                };
                if let Err(e) = handle.emit(event, &control) {
                    tracing::warn!(event, error = %e, "Failed to emit camera control");
                }
            });
            let camera = Arc::new(WebviewCamera::new(Arc::clone(&frame_slot), control));
            let model = Arc::new(analysis::GeminiClient::from_env());

            app.manage(Arc::new(state::AppState::new(camera, model, frame_slot)));
            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            commands::health_check,
            commands::get_view_state,
            commands::get_disclaimer,
            commands::session::login,
            commands::session::logout,
            commands::session::is_authenticated,
            commands::capture::select_capture_mode,
            commands::capture::submit_camera_frame,
            commands::capture::report_camera_error,
            commands::capture::capture_photo,
            commands::capture::select_image_file,
            commands::capture::clear_image,
            commands::analysis::analyze_image,
        ])
        .run(tauri::generate_context!())
        .expect("error while running DermaLens");
}
