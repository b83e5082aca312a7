//! Analysis client: builds the request to the remote vision model,
//! declares the expected output shape, and validates the response into
//! an `AnalysisResult`.
//!
//! Exactly one attempt per user-initiated analyze — no retry, no backoff.
//! Transport causes are logged but never shown; the user sees one fixed
//! "temporarily unavailable" message for every transport-level failure.

pub mod gemini;
pub mod prompt;
pub mod types;
pub mod validate;

pub use gemini::{GeminiClient, VisionModel};
pub use types::{AnalysisResult, Severity};
pub use validate::validate_response;

use thiserror::Error;

/// Failure contacting the remote analysis service.
#[derive(Error, Debug, Clone)]
pub enum TransportError {
    #[error("API key not configured (set {})", crate::config::API_KEY_ENV)]
    NotConfigured,

    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("API returned error (status {status}): {body}")]
    Api { status: u16, body: String },

    #[error("API returned no candidates")]
    EmptyResponse,
}

/// Failure of one analysis attempt, as surfaced to the user.
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// Response text failed the structural gate — not a bracketed JSON
    /// object. Surfaced verbatim.
    #[error("Invalid JSON response from API.")]
    InvalidResponseFormat,

    /// Response parsed but violated the required-field set or the closed
    /// severity enum. The detail is for logs and tests, not the user.
    #[error("The AI response did not match the expected report format.")]
    SchemaViolation { detail: String },

    /// Any transport-level failure, cause withheld from the user.
    #[error("Failed to analyze image. The AI model may be temporarily unavailable.")]
    Transport {
        #[source]
        source: TransportError,
    },
}

/// Run one analysis round-trip against the remote model.
///
/// `image_payload` is the base64 output of the image encoder;
/// `media_type` is the selected image's declared type, verbatim.
pub fn analyze(
    model: &dyn VisionModel,
    image_payload: &str,
    media_type: &str,
) -> Result<AnalysisResult, AnalysisError> {
    let _span = tracing::info_span!(
        "analyze_image",
        media_type = %media_type,
        payload_len = image_payload.len(),
    )
    .entered();
    let start = std::time::Instant::now();

    let schema = prompt::analysis_schema();
    let raw = model
        .generate(
            image_payload,
            media_type,
            prompt::ANALYSIS_INSTRUCTION,
            &schema,
            prompt::ANALYSIS_TEMPERATURE,
        )
        .map_err(|source| {
            tracing::warn!(error = %source, "Analysis transport failure");
            AnalysisError::Transport { source }
        })?;

    let result = validate_response(&raw).inspect_err(|e| match e {
        AnalysisError::SchemaViolation { detail } => {
            tracing::warn!(detail = %detail, "Response failed schema validation");
        }
        _ => {
            tracing::warn!(raw_len = raw.len(), "Response failed structural gate");
        }
    })?;

    tracing::info!(
        elapsed_ms = %start.elapsed().as_millis(),
        condition = %result.condition_name,
        severity = ?result.severity,
        "Analysis complete"
    );

    Ok(result)
}
