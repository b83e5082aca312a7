//! Result presentation: pure mapping from a validated `AnalysisResult`
//! (or a failure) into display data for the webview. No I/O.

use serde::Serialize;

use crate::analysis::{AnalysisResult, Severity};

/// Shown in place of the remedy list when the model suggests none.
pub const NO_REMEDIES_FALLBACK: &str = "No specific home remedies suggested.";

/// Display style bucket derived from severity. Four fixed buckets;
/// response validation closes the severity enum upstream, so every
/// value the presentation layer sees maps to one of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SeverityBucket {
    Low,
    Medium,
    High,
    Unknown,
}

impl SeverityBucket {
    /// Badge style token consumed by the webview.
    pub fn badge_style(self) -> &'static str {
        match self {
            SeverityBucket::Low => "badge-green",
            SeverityBucket::Medium => "badge-yellow",
            SeverityBucket::High => "badge-orange",
            SeverityBucket::Unknown => "badge-slate",
        }
    }

}

impl From<Severity> for SeverityBucket {
    fn from(severity: Severity) -> Self {
        match severity {
            Severity::Low => SeverityBucket::Low,
            Severity::Medium => SeverityBucket::Medium,
            Severity::High => SeverityBucket::High,
            Severity::Unknown => SeverityBucket::Unknown,
        }
    }
}

/// Sectioned report rendered from one analysis.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportView {
    pub condition_name: String,
    pub severity: Severity,
    pub severity_bucket: SeverityBucket,
    pub badge_style: String,
    pub description: String,
    /// Remedy items; empty when `no_remedies_note` is set.
    pub remedies: Vec<String>,
    /// Fallback line shown when the model suggested no remedies.
    pub no_remedies_note: Option<String>,
    pub advice: String,
}

/// Map a validated result into its display form.
pub fn render(result: &AnalysisResult) -> ReportView {
    let bucket = SeverityBucket::from(result.severity);
    let no_remedies_note = if result.home_remedies.is_empty() {
        Some(NO_REMEDIES_FALLBACK.to_string())
    } else {
        None
    };

    ReportView {
        condition_name: result.condition_name.clone(),
        severity: result.severity,
        severity_bucket: bucket,
        badge_style: bucket.badge_style().to_string(),
        description: result.description.clone(),
        remedies: result.home_remedies.clone(),
        no_remedies_note,
        advice: result.advice.clone(),
    }
}

/// Orchestrator view state: exactly one of these is shown at a time.
#[derive(Debug, Clone, Serialize, Default)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ViewState {
    /// Awaiting an image / analyze action.
    #[default]
    Idle,
    /// Analysis request outstanding.
    Loading,
    /// Completed report.
    Result { report: ReportView },
    /// Failure message, rendered verbatim.
    Error { message: String },
}

impl ViewState {
    pub fn error(message: impl Into<String>) -> Self {
        ViewState::Error {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(severity: Severity, remedies: Vec<&str>) -> AnalysisResult {
        AnalysisResult {
            condition_name: "Mild Acne".into(),
            description: "Small inflamed spots.".into(),
            home_remedies: remedies.into_iter().map(String::from).collect(),
            advice: "Not medical advice. Consult a dermatologist.".into(),
            severity,
        }
    }

    #[test]
    fn severity_maps_to_fixed_buckets() {
        assert_eq!(SeverityBucket::from(Severity::Low).badge_style(), "badge-green");
        assert_eq!(SeverityBucket::from(Severity::Medium).badge_style(), "badge-yellow");
        assert_eq!(SeverityBucket::from(Severity::High).badge_style(), "badge-orange");
        assert_eq!(SeverityBucket::from(Severity::Unknown).badge_style(), "badge-slate");
    }

    #[test]
    fn render_with_remedies_has_no_fallback_note() {
        let view = render(&result(Severity::Low, vec!["Wash twice daily"]));
        assert_eq!(view.remedies, vec!["Wash twice daily"]);
        assert!(view.no_remedies_note.is_none());
        assert_eq!(view.severity_bucket, SeverityBucket::Low);
    }

    #[test]
    fn render_empty_remedies_uses_fallback_note() {
        let view = render(&result(Severity::Unknown, vec![]));
        assert!(view.remedies.is_empty());
        assert_eq!(view.no_remedies_note.as_deref(), Some(NO_REMEDIES_FALLBACK));
    }

    #[test]
    fn error_state_carries_message_verbatim() {
        let state = ViewState::error("Invalid JSON response from API.");
        match state {
            ViewState::Error { message } => {
                assert_eq!(message, "Invalid JSON response from API.");
            }
            other => panic!("expected error state, got {other:?}"),
        }
    }

    #[test]
    fn view_state_serializes_with_state_tag() {
        let json = serde_json::to_value(ViewState::Loading).unwrap();
        assert_eq!(json["state"], "loading");

        let json = serde_json::to_value(render(&result(Severity::High, vec![]))).unwrap();
        assert_eq!(json["severityBucket"], "high");
        assert_eq!(json["badgeStyle"], "badge-orange");
    }
}
