/// Application-level constants
pub const APP_NAME: &str = "DermaLens";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default tracing filter when RUST_LOG is not set.
pub fn default_log_filter() -> String {
    "info,dermalens_lib=debug".to_string()
}

/// Gemini REST endpoint base (v1beta generateContent).
pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Vision model used for skin analysis.
pub const ANALYSIS_MODEL: &str = "gemini-2.5-flash";

/// Environment variable holding the Gemini API key.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// HTTP timeout for one analysis round-trip, in seconds.
pub const ANALYSIS_TIMEOUT_SECS: u64 = 120;

/// Read the Gemini API key from the environment.
///
/// The key is never persisted or logged. Absence is surfaced as a
/// transport-level analysis failure, not a startup panic.
pub fn api_key() -> Option<String> {
    std::env::var(API_KEY_ENV).ok().filter(|k| !k.is_empty())
}
