//! Camera collaborator seam.
//!
//! The physical camera lives in the webview (getUserMedia); the backend
//! talks to it through the `CameraDevice`/`CameraStream` traits so the
//! state machine in `manager` is testable without hardware. The shipped
//! `WebviewCamera` emits acquire/release control events to the frontend
//! and reads frames the frontend pushes over IPC.

use std::sync::{Arc, Mutex};

use serde::Serialize;
use thiserror::Error;

/// Camera acquisition failure: permission denied or device unavailable.
///
/// One fixed user-facing message regardless of cause; the detail goes to
/// the logs.
#[derive(Error, Debug, Clone)]
#[error("Could not access camera. Please check permissions.")]
pub struct CameraAccessError {
    pub detail: String,
}

/// Which camera to prefer when acquiring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FacingMode {
    /// Rear camera — biased toward photographing skin, not the user.
    Environment,
    User,
}

/// Constraints handed to the camera collaborator on acquisition.
#[derive(Debug, Clone, Serialize)]
pub struct StreamConstraints {
    pub facing_mode: FacingMode,
}

impl StreamConstraints {
    pub fn environment() -> Self {
        Self {
            facing_mode: FacingMode::Environment,
        }
    }
}

/// One decoded video frame, RGB8 at the stream's native resolution.
#[derive(Debug, Clone)]
pub struct RgbFrame {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl RgbFrame {
    /// `pixels` must be exactly `width * height * 3` bytes and non-empty.
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Option<Self> {
        let expected = (width as usize)
            .checked_mul(height as usize)?
            .checked_mul(3)?;
        if expected == 0 || pixels.len() != expected {
            return None;
        }
        Some(Self {
            width,
            height,
            pixels,
        })
    }
}

/// Live camera stream handle.
pub trait CameraStream: Send {
    /// Latest frame, if one has arrived yet.
    fn current_frame(&self) -> Option<RgbFrame>;

    /// Stop all tracks. Idempotent; called on every exit path.
    fn stop_all_tracks(&mut self);
}

/// Camera device collaborator.
pub trait CameraDevice: Send + Sync {
    fn request_stream(
        &self,
        constraints: &StreamConstraints,
    ) -> Result<Box<dyn CameraStream>, CameraAccessError>;
}

// ──────────────────────────────────────────────
// WebviewCamera
// ──────────────────────────────────────────────

/// Control messages emitted to the webview.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CameraControl {
    Acquire { constraints: StreamConstraints },
    Release,
}

/// Shared slot the IPC layer writes incoming frames into.
#[derive(Default)]
pub struct FrameSlot {
    frame: Mutex<Option<RgbFrame>>,
}

impl FrameSlot {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn put(&self, frame: RgbFrame) {
        if let Ok(mut guard) = self.frame.lock() {
            *guard = Some(frame);
        }
    }

    pub fn take_latest(&self) -> Option<RgbFrame> {
        self.frame.lock().ok().and_then(|g| g.clone())
    }

    pub fn clear(&self) {
        if let Ok(mut guard) = self.frame.lock() {
            *guard = None;
        }
    }
}

type ControlSink = Arc<dyn Fn(CameraControl) + Send + Sync>;

/// Production camera device bridging to the webview.
///
/// `request_stream` succeeds immediately (the permission prompt is
/// user-gated on the webview side); a denial arrives asynchronously via
/// the `report_camera_error` command, which moves the manager into its
/// error state.
pub struct WebviewCamera {
    slot: Arc<FrameSlot>,
    control: ControlSink,
}

impl WebviewCamera {
    pub fn new(slot: Arc<FrameSlot>, control: ControlSink) -> Self {
        Self { slot, control }
    }
}

impl CameraDevice for WebviewCamera {
    fn request_stream(
        &self,
        constraints: &StreamConstraints,
    ) -> Result<Box<dyn CameraStream>, CameraAccessError> {
        self.slot.clear();
        (self.control)(CameraControl::Acquire {
            constraints: constraints.clone(),
        });
        Ok(Box::new(WebviewStream {
            slot: Arc::clone(&self.slot),
            control: Arc::clone(&self.control),
            stopped: false,
        }))
    }
}

struct WebviewStream {
    slot: Arc<FrameSlot>,
    control: ControlSink,
    stopped: bool,
}

impl CameraStream for WebviewStream {
    fn current_frame(&self) -> Option<RgbFrame> {
        if self.stopped {
            return None;
        }
        self.slot.take_latest()
    }

    fn stop_all_tracks(&mut self) {
        if self.stopped {
            return;
        }
        self.stopped = true;
        self.slot.clear();
        (self.control)(CameraControl::Release);
        tracing::debug!("Webview camera stream stopped");
    }
}
