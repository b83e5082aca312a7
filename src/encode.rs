//! Image encoder and selected-image lifecycle.
//!
//! `encode()` turns the selected image into a transfer-ready pair of
//! (base64 payload, declared media type). The payload is pure base64 —
//! never a data-URI — and the media type is passed through verbatim with
//! no sniffing or validation. The only failure mode is a read failure.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use base64::Engine as _;
use thiserror::Error;

/// File name given to camera captures.
pub const CAPTURE_FILE_NAME: &str = "capture.jpg";

/// Media type of camera captures.
pub const CAPTURE_MEDIA_TYPE: &str = "image/jpeg";

/// Fallback declared type when the picker gives no recognizable extension.
const UNKNOWN_MEDIA_TYPE: &str = "application/octet-stream";

#[derive(Error, Debug)]
pub enum EncodeError {
    /// Underlying read failed or was aborted. Surfaced to the user as a
    /// request to select the image again.
    #[error("Could not read the selected image. Please select an image again.")]
    Read {
        #[source]
        source: io::Error,
    },
}

// ──────────────────────────────────────────────
// Preview handle
// ──────────────────────────────────────────────

/// Locally-generated preview copy shown in the webview.
///
/// Object-URL analog: a file in the OS temp directory, removed when the
/// handle is dropped so repeated selections within one session do not
/// accumulate.
#[derive(Debug)]
pub struct PreviewHandle {
    path: PathBuf,
}

impl PreviewHandle {
    fn write(file_name: &str, bytes: &[u8]) -> io::Result<Self> {
        use std::sync::atomic::{AtomicU64, Ordering};
        // Uniquifier so a same-named reselection never aliases the old
        // preview (whose Drop would otherwise delete the new file).
        static NEXT: AtomicU64 = AtomicU64::new(0);
        let path = std::env::temp_dir().join(format!(
            "dermalens-preview-{}-{}-{}",
            std::process::id(),
            NEXT.fetch_add(1, Ordering::Relaxed),
            file_name
        ));
        fs::write(&path, bytes)?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for PreviewHandle {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}

// ──────────────────────────────────────────────
// SelectedImage
// ──────────────────────────────────────────────

/// Where the selected image's bytes come from.
#[derive(Debug)]
enum ImageBytes {
    /// User-picked file, read in full at encode time.
    File(PathBuf),
    /// Camera capture already in memory.
    Memory(Vec<u8>),
}

/// The image currently staged for analysis.
///
/// Created on selection or capture; dropped (releasing its preview) when
/// the user clears it or selects a new one.
#[derive(Debug)]
pub struct SelectedImage {
    file_name: String,
    media_type: String,
    bytes: ImageBytes,
    preview: Option<PreviewHandle>,
}

impl SelectedImage {
    /// Stage a user-picked file. The declared media type comes from the
    /// file name; content is not read until `encode()`.
    pub fn from_path(path: &Path) -> Result<Self, EncodeError> {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload")
            .to_string();

        let media_type = mime_guess::from_path(path)
            .first_raw()
            .unwrap_or(UNKNOWN_MEDIA_TYPE)
            .to_string();

        // Preview needs the bytes now; a failed read here is the same
        // user-facing error as a failed encode read.
        let bytes = fs::read(path).map_err(|source| EncodeError::Read { source })?;
        let preview = PreviewHandle::write(&file_name, &bytes).ok();

        Ok(Self {
            file_name,
            media_type,
            bytes: ImageBytes::File(path.to_path_buf()),
            preview,
        })
    }

    /// Stage a camera capture: fixed name, `image/jpeg` media type.
    pub fn from_capture(jpeg_bytes: Vec<u8>) -> Self {
        let preview = PreviewHandle::write(CAPTURE_FILE_NAME, &jpeg_bytes).ok();
        Self {
            file_name: CAPTURE_FILE_NAME.to_string(),
            media_type: CAPTURE_MEDIA_TYPE.to_string(),
            bytes: ImageBytes::Memory(jpeg_bytes),
            preview,
        }
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    /// Preview file path for the webview, if a preview could be written.
    pub fn preview_path(&self) -> Option<&Path> {
        self.preview.as_ref().map(|p| p.path())
    }
}

/// Encode the selected image for transfer.
///
/// Reads the full binary content and returns standard base64 of the raw
/// bytes plus the declared media type, unmodified.
pub fn encode(image: &SelectedImage) -> Result<(String, String), EncodeError> {
    let raw = match &image.bytes {
        ImageBytes::File(path) => {
            fs::read(path).map_err(|source| EncodeError::Read { source })?
        }
        ImageBytes::Memory(bytes) => bytes.clone(),
    };

    let payload = base64::engine::general_purpose::STANDARD.encode(raw);
    Ok((payload, image.media_type.clone()))
}
