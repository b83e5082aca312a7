//! Image source manager: the upload/camera mode state machine.
//!
//! Owns the camera session exclusively. The stream is released on every
//! path that leaves camera-active state — mode switch, successful
//! capture, reported error, teardown — via a scoped guard that stops all
//! tracks on drop, independent of any UI lifecycle.

use std::sync::Arc;

use thiserror::Error;

use super::camera::{CameraDevice, CameraStream, StreamConstraints};
use crate::encode::SelectedImage;

/// JPEG quality for captured frames.
const CAPTURE_JPEG_QUALITY: u8 = 90;

/// Acquisition mode. Mutually exclusive, switchable at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureMode {
    Upload,
    Camera,
}

#[derive(Error, Debug)]
pub enum CaptureError {
    /// Capture requested with no active stream. Not a fault — the UI
    /// may race a mode switch; the call is rejected, never a panic.
    #[error("No active camera stream.")]
    NoActiveStream,

    /// Capture requested while the camera is in its error state.
    #[error("Could not access camera. Please check permissions.")]
    CameraFaulted,

    /// Stream is active but no frame has arrived yet.
    #[error("Camera has not produced a frame yet. Try again in a moment.")]
    NoFrameAvailable,

    /// Frame could not be rasterized or JPEG-encoded.
    #[error("Failed to encode the captured photo: {0}")]
    FrameEncode(String),

    /// File selection outside upload mode.
    #[error("Switch to upload mode to select a file.")]
    NotInUploadMode,

    /// Picked file could not be read.
    #[error(transparent)]
    Read(#[from] crate::encode::EncodeError),
}

/// Scoped camera session: zero-or-one active stream.
///
/// Dropping the session stops all tracks, so every exit path — explicit
/// or unwinding — releases the device.
struct CameraSession {
    stream: Box<dyn CameraStream>,
}

impl Drop for CameraSession {
    fn drop(&mut self) {
        self.stream.stop_all_tracks();
    }
}

/// Owner of the acquisition-mode state machine.
///
/// States: `Idle(upload)` ⇄ camera acquiring/active, terminal-per-entry
/// `CameraError` exited only by leaving camera mode or retrying
/// acquisition.
pub struct ImageSourceManager {
    device: Arc<dyn CameraDevice>,
    mode: CaptureMode,
    session: Option<CameraSession>,
    camera_error: Option<String>,
}

impl ImageSourceManager {
    pub fn new(device: Arc<dyn CameraDevice>) -> Self {
        Self {
            device,
            mode: CaptureMode::Upload,
            session: None,
            camera_error: None,
        }
    }

    pub fn mode(&self) -> CaptureMode {
        self.mode
    }

    /// User-facing camera error message, when in the error state.
    pub fn camera_error(&self) -> Option<&str> {
        self.camera_error.as_deref()
    }

    pub fn has_active_stream(&self) -> bool {
        self.session.is_some()
    }

    /// Switch acquisition mode.
    ///
    /// Always releases any active stream first, even when the target
    /// equals the current mode — re-selecting camera doubles as the
    /// retry path out of the error state.
    pub fn select_mode(&mut self, mode: CaptureMode) {
        self.release_camera();
        self.camera_error = None;
        self.mode = mode;

        if mode == CaptureMode::Camera {
            self.acquire_camera();
        }
    }

    /// Request a stream biased toward the environment-facing camera.
    ///
    /// On failure the manager enters the error state; capture stays
    /// disabled until the user leaves camera mode or retries.
    pub fn acquire_camera(&mut self) {
        self.release_camera();
        self.camera_error = None;

        match self.device.request_stream(&StreamConstraints::environment()) {
            Ok(stream) => {
                tracing::info!("Camera stream acquired");
                self.session = Some(CameraSession { stream });
            }
            Err(e) => {
                tracing::warn!(detail = %e.detail, "Camera acquisition failed");
                self.camera_error = Some(e.to_string());
            }
        }
    }

    /// Stop all tracks and clear the handle. No-op when idle.
    pub fn release_camera(&mut self) {
        if self.session.take().is_some() {
            tracing::debug!("Camera stream released");
        }
    }

    /// Record an asynchronously-reported acquisition failure (the
    /// webview's permission prompt resolves after `acquire_camera`).
    ///
    /// A rejection can also land after the user has already left camera
    /// mode; the error state only exists in camera mode, so a late
    /// report is dropped.
    pub fn report_camera_error(&mut self, message: &str) {
        if self.mode != CaptureMode::Camera {
            tracing::debug!("Ignoring camera error reported outside camera mode");
            return;
        }
        self.release_camera();
        self.camera_error = Some(message.to_string());
    }

    /// Capture the current frame as the selected image.
    ///
    /// One-shot per acquisition: renders the latest frame at native
    /// resolution, JPEG-encodes it, wraps it as `capture.jpg`, then
    /// releases the camera.
    pub fn capture_frame(&mut self) -> Result<SelectedImage, CaptureError> {
        if self.camera_error.is_some() {
            return Err(CaptureError::CameraFaulted);
        }
        let session = self.session.as_ref().ok_or(CaptureError::NoActiveStream)?;
        let frame = session
            .stream
            .current_frame()
            .ok_or(CaptureError::NoFrameAvailable)?;

        let raster = image::RgbImage::from_raw(frame.width, frame.height, frame.pixels)
            .ok_or_else(|| CaptureError::FrameEncode("frame buffer size mismatch".into()))?;

        let mut jpeg = Vec::new();
        let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(
            std::io::Cursor::new(&mut jpeg),
            CAPTURE_JPEG_QUALITY,
        );
        image::DynamicImage::ImageRgb8(raster)
            .write_with_encoder(encoder)
            .map_err(|e| CaptureError::FrameEncode(e.to_string()))?;

        self.release_camera();
        tracing::info!(
            width = frame.width,
            height = frame.height,
            jpeg_len = jpeg.len(),
            "Frame captured"
        );

        Ok(SelectedImage::from_capture(jpeg))
    }

    /// Stage a user-picked file as the selected image (upload mode).
    pub fn select_file(
        &self,
        path: &std::path::Path,
    ) -> Result<SelectedImage, CaptureError> {
        if self.mode != CaptureMode::Upload {
            return Err(CaptureError::NotInUploadMode);
        }
        Ok(SelectedImage::from_path(path)?)
    }
}

impl Drop for ImageSourceManager {
    fn drop(&mut self) {
        // Teardown path: the session guard stops tracks.
        self.release_camera();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::camera::{CameraAccessError, RgbFrame};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Mock device: counts acquisitions and track-stops, optionally
    /// denies access, serves a configurable frame.
    struct MockCamera {
        deny: bool,
        frame: Mutex<Option<RgbFrame>>,
        acquisitions: AtomicUsize,
        stops: Arc<AtomicUsize>,
    }

    impl MockCamera {
        fn granting(frame: Option<RgbFrame>) -> Arc<Self> {
            Arc::new(Self {
                deny: false,
                frame: Mutex::new(frame),
                acquisitions: AtomicUsize::new(0),
                stops: Arc::new(AtomicUsize::new(0)),
            })
        }

        fn denying() -> Arc<Self> {
            Arc::new(Self {
                deny: true,
                frame: Mutex::new(None),
                acquisitions: AtomicUsize::new(0),
                stops: Arc::new(AtomicUsize::new(0)),
            })
        }
    }

    struct MockStream {
        frame: Option<RgbFrame>,
        stops: Arc<AtomicUsize>,
        stopped: bool,
    }

    impl CameraStream for MockStream {
        fn current_frame(&self) -> Option<RgbFrame> {
            if self.stopped {
                None
            } else {
                self.frame.clone()
            }
        }

        fn stop_all_tracks(&mut self) {
            if !self.stopped {
                self.stopped = true;
                self.stops.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    impl CameraDevice for MockCamera {
        fn request_stream(
            &self,
            _constraints: &StreamConstraints,
        ) -> Result<Box<dyn CameraStream>, CameraAccessError> {
            self.acquisitions.fetch_add(1, Ordering::SeqCst);
            if self.deny {
                return Err(CameraAccessError {
                    detail: "NotAllowedError".into(),
                });
            }
            Ok(Box::new(MockStream {
                frame: self.frame.lock().unwrap().clone(),
                stops: Arc::clone(&self.stops),
                stopped: false,
            }))
        }
    }

    fn solid_frame(width: u32, height: u32) -> RgbFrame {
        RgbFrame::new(width, height, vec![128u8; (width * height * 3) as usize]).unwrap()
    }

    #[test]
    fn starts_idle_in_upload_mode() {
        let manager = ImageSourceManager::new(MockCamera::granting(None));
        assert_eq!(manager.mode(), CaptureMode::Upload);
        assert!(!manager.has_active_stream());
        assert!(manager.camera_error().is_none());
    }

    #[test]
    fn entering_camera_mode_acquires() {
        let camera = MockCamera::granting(None);
        let mut manager = ImageSourceManager::new(Arc::clone(&camera) as Arc<dyn CameraDevice>);
        manager.select_mode(CaptureMode::Camera);
        assert!(manager.has_active_stream());
        assert_eq!(camera.acquisitions.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn switching_to_upload_stops_all_tracks() {
        let camera = MockCamera::granting(None);
        let stops = Arc::clone(&camera.stops);
        let mut manager = ImageSourceManager::new(Arc::clone(&camera) as Arc<dyn CameraDevice>);

        manager.select_mode(CaptureMode::Camera);
        manager.select_mode(CaptureMode::Upload);
        assert!(!manager.has_active_stream());
        assert_eq!(stops.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn switching_to_upload_from_every_prior_state_leaves_no_stream() {
        // idle
        let mut m = ImageSourceManager::new(MockCamera::granting(None));
        m.select_mode(CaptureMode::Upload);
        assert!(!m.has_active_stream());

        // active
        let mut m = ImageSourceManager::new(MockCamera::granting(Some(solid_frame(2, 2))));
        m.select_mode(CaptureMode::Camera);
        m.select_mode(CaptureMode::Upload);
        assert!(!m.has_active_stream());

        // error
        let mut m = ImageSourceManager::new(MockCamera::denying());
        m.select_mode(CaptureMode::Camera);
        m.select_mode(CaptureMode::Upload);
        assert!(!m.has_active_stream());
        assert!(m.camera_error().is_none(), "leaving camera mode clears the error");
    }

    #[test]
    fn denied_acquisition_enters_error_state() {
        let mut manager = ImageSourceManager::new(MockCamera::denying());
        manager.select_mode(CaptureMode::Camera);
        assert!(!manager.has_active_stream());
        assert_eq!(
            manager.camera_error().unwrap(),
            "Could not access camera. Please check permissions."
        );
    }

    #[test]
    fn reported_error_enters_error_state_in_camera_mode() {
        let camera = MockCamera::granting(None);
        let mut manager = ImageSourceManager::new(Arc::clone(&camera) as Arc<dyn CameraDevice>);
        manager.select_mode(CaptureMode::Camera);
        manager.report_camera_error("Could not access camera. Please check permissions.");
        assert!(!manager.has_active_stream());
        assert!(manager.camera_error().is_some());
    }

    #[test]
    fn late_error_report_after_leaving_camera_mode_is_dropped() {
        let camera = MockCamera::granting(None);
        let mut manager = ImageSourceManager::new(Arc::clone(&camera) as Arc<dyn CameraDevice>);
        manager.select_mode(CaptureMode::Camera);
        manager.select_mode(CaptureMode::Upload);
        // The getUserMedia promise rejects after the release event.
        manager.report_camera_error("Could not access camera. Please check permissions.");
        assert!(manager.camera_error().is_none());
        assert_eq!(manager.mode(), CaptureMode::Upload);
    }

    #[test]
    fn capture_disabled_while_in_error_state() {
        let mut manager = ImageSourceManager::new(MockCamera::denying());
        manager.select_mode(CaptureMode::Camera);
        assert!(matches!(
            manager.capture_frame(),
            Err(CaptureError::CameraFaulted)
        ));
    }

    #[test]
    fn reselecting_camera_mode_retries_acquisition() {
        let camera = MockCamera::granting(None);
        let mut manager = ImageSourceManager::new(Arc::clone(&camera) as Arc<dyn CameraDevice>);
        manager.select_mode(CaptureMode::Camera);
        manager.select_mode(CaptureMode::Camera);
        // Idempotent on mode, but never leaves a dangling stream.
        assert_eq!(camera.acquisitions.load(Ordering::SeqCst), 2);
        assert_eq!(camera.stops.load(Ordering::SeqCst), 1);
        assert!(manager.has_active_stream());
    }

    #[test]
    fn capture_without_stream_is_typed_error_not_panic() {
        let mut manager = ImageSourceManager::new(MockCamera::granting(None));
        assert!(matches!(
            manager.capture_frame(),
            Err(CaptureError::NoActiveStream)
        ));
    }

    #[test]
    fn capture_before_first_frame_is_rejected() {
        let mut manager = ImageSourceManager::new(MockCamera::granting(None));
        manager.select_mode(CaptureMode::Camera);
        assert!(matches!(
            manager.capture_frame(),
            Err(CaptureError::NoFrameAvailable)
        ));
        // The stream survives a failed capture.
        assert!(manager.has_active_stream());
    }

    #[test]
    fn successful_capture_yields_jpeg_and_releases_camera() {
        let camera = MockCamera::granting(Some(solid_frame(4, 2)));
        let stops = Arc::clone(&camera.stops);
        let mut manager = ImageSourceManager::new(Arc::clone(&camera) as Arc<dyn CameraDevice>);

        manager.select_mode(CaptureMode::Camera);
        let image = manager.capture_frame().unwrap();

        assert_eq!(image.file_name(), "capture.jpg");
        assert_eq!(image.media_type(), "image/jpeg");
        let (payload, _) = crate::encode::encode(&image).unwrap();
        // JPEG SOI marker, base64 "/9j/".
        assert!(payload.starts_with("/9j/"));

        assert!(!manager.has_active_stream(), "capture is one-shot");
        assert_eq!(stops.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn dropping_manager_stops_active_stream() {
        let camera = MockCamera::granting(None);
        let stops = Arc::clone(&camera.stops);
        {
            let mut manager =
                ImageSourceManager::new(Arc::clone(&camera) as Arc<dyn CameraDevice>);
            manager.select_mode(CaptureMode::Camera);
        }
        assert_eq!(stops.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn select_file_requires_upload_mode() {
        let camera = MockCamera::granting(None);
        let mut manager = ImageSourceManager::new(Arc::clone(&camera) as Arc<dyn CameraDevice>);
        manager.select_mode(CaptureMode::Camera);
        assert!(matches!(
            manager.select_file(std::path::Path::new("skin.jpg")),
            Err(CaptureError::NotInUploadMode)
        ));
    }

    #[test]
    fn select_file_stages_picked_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rash.png");
        std::fs::write(&path, b"png-bytes").unwrap();

        let manager = ImageSourceManager::new(MockCamera::granting(None));
        let image = manager.select_file(&path).unwrap();
        assert_eq!(image.file_name(), "rash.png");
        assert_eq!(image.media_type(), "image/png");
    }
}
