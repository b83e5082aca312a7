//! Shared application state and the analyze orchestration.
//!
//! `AppState` is wrapped in `Arc` and managed by Tauri. It owns the
//! session flag, the image source manager, the selected image, the view
//! state, and the single-flight guard for analysis requests. Exactly one
//! of {idle, loading, result, error} is meaningful at a time; the
//! previous selected image survives a failed analysis so the user can
//! retry without re-selecting.

use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use serde::Serialize;
use thiserror::Error;

use crate::analysis::{self, VisionModel};
use crate::capture::{CameraDevice, CaptureMode, FrameSlot, ImageSourceManager, RgbFrame};
use crate::encode::{self, SelectedImage};
use crate::report::{self, ViewState};
use crate::session::Session;

/// Pre-flight rejections of a user action. Analysis outcomes are carried
/// in `ViewState`, not here.
#[derive(Error, Debug)]
pub enum StateError {
    #[error("Not logged in.")]
    NotAuthenticated,

    /// At most one analysis request is in flight; a second invocation is
    /// rejected, not queued.
    #[error("An analysis is already in progress.")]
    AnalysisInFlight,

    #[error("Please select an image first.")]
    NoImageSelected,

    #[error("State lock poisoned")]
    LockPoisoned,
}

/// Selected-image facts the webview renders (name, declared type,
/// preview location).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectedImageInfo {
    pub file_name: String,
    pub media_type: String,
    pub preview_path: Option<String>,
}

impl SelectedImageInfo {
    fn from_image(image: &SelectedImage) -> Self {
        Self {
            file_name: image.file_name().to_string(),
            media_type: image.media_type().to_string(),
            preview_path: image
                .preview_path()
                .map(|p| p.to_string_lossy().into_owned()),
        }
    }
}

/// Full UI snapshot returned by `get_view_state`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub authenticated: bool,
    pub mode: CaptureMode,
    pub camera_error: Option<String>,
    pub camera_active: bool,
    pub selected: Option<SelectedImageInfo>,
    pub view: ViewState,
}

pub struct AppState {
    pub session: Session,
    capture: Mutex<ImageSourceManager>,
    selected: Mutex<Option<SelectedImage>>,
    view: Mutex<ViewState>,
    /// Single-flight guard: true while an analysis request is outstanding.
    analysis_in_flight: AtomicBool,
    /// Bumped on every selection change; a completed analysis whose
    /// generation no longer matches is dropped (cleared mid-flight).
    selection_generation: AtomicU64,
    frame_slot: Arc<FrameSlot>,
    model: Arc<dyn VisionModel>,
}

impl AppState {
    pub fn new(
        camera: Arc<dyn CameraDevice>,
        model: Arc<dyn VisionModel>,
        frame_slot: Arc<FrameSlot>,
    ) -> Self {
        Self {
            session: Session::new(),
            capture: Mutex::new(ImageSourceManager::new(camera)),
            selected: Mutex::new(None),
            view: Mutex::new(ViewState::Idle),
            analysis_in_flight: AtomicBool::new(false),
            selection_generation: AtomicU64::new(0),
            frame_slot,
            model,
        }
    }

    fn capture_guard(&self) -> Result<MutexGuard<'_, ImageSourceManager>, StateError> {
        self.capture.lock().map_err(|_| StateError::LockPoisoned)
    }

    fn selected_guard(&self) -> Result<MutexGuard<'_, Option<SelectedImage>>, StateError> {
        self.selected.lock().map_err(|_| StateError::LockPoisoned)
    }

    fn set_view(&self, view: ViewState) {
        if let Ok(mut guard) = self.view.lock() {
            *guard = view;
        }
    }

    // ── Session ─────────────────────────────────────────────

    pub fn login(&self) {
        self.session.login();
    }

    /// End the session and tear down capture state: camera released,
    /// selection (and its preview) dropped, view back to idle.
    pub fn logout(&self) -> Result<(), StateError> {
        self.session.logout();
        self.capture_guard()?.select_mode(CaptureMode::Upload);
        self.clear_image()?;
        Ok(())
    }

    // ── Image acquisition ───────────────────────────────────

    pub fn select_mode(&self, mode: CaptureMode) -> Result<(), StateError> {
        self.capture_guard()?.select_mode(mode);
        Ok(())
    }

    /// Latest frame pushed from the webview. Dropped unless a stream is
    /// active.
    pub fn submit_frame(&self, frame: RgbFrame) -> Result<(), StateError> {
        if self.capture_guard()?.has_active_stream() {
            self.frame_slot.put(frame);
        }
        Ok(())
    }

    /// Webview-reported acquisition failure (permission prompts resolve
    /// after `request_stream` returns).
    pub fn report_camera_error(&self, message: &str) -> Result<(), StateError> {
        self.capture_guard()?.report_camera_error(message);
        Ok(())
    }

    pub fn capture_photo(&self) -> Result<SelectedImageInfo, String> {
        let image = self
            .capture_guard()
            .map_err(|e| e.to_string())?
            .capture_frame()
            .map_err(|e| e.to_string())?;
        self.stage_selection(image).map_err(|e| e.to_string())
    }

    pub fn select_image_file(&self, path: &Path) -> Result<SelectedImageInfo, String> {
        let image = self
            .capture_guard()
            .map_err(|e| e.to_string())?
            .select_file(path)
            .map_err(|e| e.to_string())?;
        self.stage_selection(image).map_err(|e| e.to_string())
    }

    /// Stage a new selection. The previous image (and preview handle)
    /// drops here; any prior result or error is cleared.
    fn stage_selection(&self, image: SelectedImage) -> Result<SelectedImageInfo, StateError> {
        let info = SelectedImageInfo::from_image(&image);
        *self.selected_guard()? = Some(image);
        self.selection_generation.fetch_add(1, Ordering::SeqCst);
        self.set_view(ViewState::Idle);
        tracing::info!(file = %info.file_name, media_type = %info.media_type, "Image selected");
        Ok(info)
    }

    pub fn clear_image(&self) -> Result<(), StateError> {
        *self.selected_guard()? = None;
        self.selection_generation.fetch_add(1, Ordering::SeqCst);
        self.set_view(ViewState::Idle);
        Ok(())
    }

    // ── Analysis orchestration ──────────────────────────────

    /// Run one analysis attempt against the current selection.
    ///
    /// Pre-flight rejections (auth, busy, no image) return `StateError`
    /// and leave the view untouched. Everything after lift-off lands in
    /// the view state: loading while outstanding, then result or error.
    pub fn run_analysis(&self) -> Result<ViewState, StateError> {
        if !self.session.is_authenticated() {
            return Err(StateError::NotAuthenticated);
        }

        // Single-flight: reject, don't queue.
        if self
            .analysis_in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(StateError::AnalysisInFlight);
        }

        let outcome = self.run_analysis_inner();
        self.analysis_in_flight.store(false, Ordering::SeqCst);
        outcome
    }

    fn run_analysis_inner(&self) -> Result<ViewState, StateError> {
        let generation = self.selection_generation.load(Ordering::SeqCst);

        // Encode under the selection lock; the network call below runs
        // with no locks held.
        let encoded = {
            let guard = self.selected_guard()?;
            let image = guard.as_ref().ok_or(StateError::NoImageSelected)?;
            encode::encode(image)
        };

        let (payload, media_type) = match encoded {
            Ok(pair) => pair,
            Err(e) => {
                // Read failure: surfaced as an error view, selection kept.
                let view = ViewState::error(e.to_string());
                self.set_view(view.clone());
                return Ok(view);
            }
        };

        self.set_view(ViewState::Loading);

        let view = match analysis::analyze(self.model.as_ref(), &payload, &media_type) {
            Ok(result) => ViewState::Result {
                report: report::render(&result),
            },
            Err(e) => ViewState::error(e.to_string()),
        };

        // Selection cleared mid-flight: drop the late outcome (the view
        // was reset to idle by the clear).
        if self.selection_generation.load(Ordering::SeqCst) != generation {
            tracing::debug!("Dropping analysis outcome for superseded selection");
            return Ok(self.current_view());
        }

        self.set_view(view.clone());
        Ok(view)
    }

    // ── Snapshot ────────────────────────────────────────────

    fn current_view(&self) -> ViewState {
        self.view
            .lock()
            .map(|v| v.clone())
            .unwrap_or(ViewState::Idle)
    }

    pub fn snapshot(&self) -> Result<Snapshot, StateError> {
        let capture = self.capture_guard()?;
        let selected = self.selected_guard()?;
        Ok(Snapshot {
            authenticated: self.session.is_authenticated(),
            mode: capture.mode(),
            camera_error: capture.camera_error().map(String::from),
            camera_active: capture.has_active_stream(),
            selected: selected.as_ref().map(SelectedImageInfo::from_image),
            view: self.current_view(),
        })
    }
}
