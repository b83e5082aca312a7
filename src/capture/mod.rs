//! Image acquisition: camera collaborator seam and the upload/camera
//! mode state machine.

pub mod camera;
pub mod manager;

pub use camera::{
    CameraAccessError, CameraControl, CameraDevice, CameraStream, FacingMode, FrameSlot,
    RgbFrame, StreamConstraints, WebviewCamera,
};
pub use manager::{CaptureError, CaptureMode, ImageSourceManager};
