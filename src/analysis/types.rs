use serde::{Deserialize, Serialize};

/// Estimated severity of a detected condition.
///
/// Closed set — the remote model is instructed to pick one of these four
/// and anything else is rejected by response validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Low,
    Medium,
    High,
    Unknown,
}

impl Severity {
    /// All accepted wire values, matching the serde representation.
    pub const ALLOWED: &'static [&'static str] = &["Low", "Medium", "High", "Unknown"];
}

/// Complete result of a skin analysis round-trip.
///
/// Only ever constructed from a response that passed the structural gate
/// and full field validation — partial results do not exist.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    /// Name of the detected condition. The model uses the sentinel
    /// "No specific condition detected" when nothing is visible.
    pub condition_name: String,
    /// Plain-language description of the condition.
    pub description: String,
    /// Suggested home remedies. Empty is valid (no remedies applicable).
    pub home_remedies: Vec<String>,
    /// Advice block. Always non-empty; carries the not-medical-advice
    /// framing produced by the model.
    pub advice: String,
    pub severity: Severity,
}
