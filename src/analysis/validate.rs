//! Response validation: structural gate, then full field validation.
//!
//! The declared response schema is advisory — the model is asked, not
//! forced, to comply. Validation therefore never trusts the remote side:
//! a cheap bracket check rejects obvious prose before any parse is
//! attempted, and a parsed object is checked field by field against the
//! required set and the closed severity enum.

use serde_json::Value;

use super::types::{AnalysisResult, Severity};
use super::AnalysisError;

/// Required top-level fields, in schema order.
const REQUIRED_FIELDS: &[&str] = &[
    "conditionName",
    "description",
    "homeRemedies",
    "advice",
    "severity",
];

/// Validate raw response text into an `AnalysisResult`.
///
/// Fails with `InvalidResponseFormat` when the trimmed text is not a
/// bracketed JSON object (no parse attempted), and with `SchemaViolation`
/// when the parsed object misses a required field, mistypes one, or
/// carries a severity outside {Low, Medium, High, Unknown}.
pub fn validate_response(raw: &str) -> Result<AnalysisResult, AnalysisError> {
    let trimmed = raw.trim();

    // Structural gate: cheap delimiter check before any parse.
    if !(trimmed.starts_with('{') && trimmed.ends_with('}')) {
        return Err(AnalysisError::InvalidResponseFormat);
    }

    let value: Value = serde_json::from_str(trimmed)
        .map_err(|e| AnalysisError::SchemaViolation {
            detail: format!("response is not valid JSON: {e}"),
        })?;

    let object = value.as_object().ok_or_else(|| AnalysisError::SchemaViolation {
        detail: "response is not a JSON object".to_string(),
    })?;

    for field in REQUIRED_FIELDS {
        if !object.contains_key(*field) {
            return Err(AnalysisError::SchemaViolation {
                detail: format!("missing required field '{field}'"),
            });
        }
    }

    check_non_empty_string(object, "conditionName")?;
    check_non_empty_string(object, "advice")?;

    if !object["description"].is_string() {
        return Err(AnalysisError::SchemaViolation {
            detail: "field 'description' must be a string".to_string(),
        });
    }

    let remedies = object["homeRemedies"]
        .as_array()
        .ok_or_else(|| AnalysisError::SchemaViolation {
            detail: "field 'homeRemedies' must be an array".to_string(),
        })?;
    if remedies.iter().any(|r| !r.is_string()) {
        return Err(AnalysisError::SchemaViolation {
            detail: "field 'homeRemedies' must contain only strings".to_string(),
        });
    }

    let severity = object["severity"]
        .as_str()
        .ok_or_else(|| AnalysisError::SchemaViolation {
            detail: "field 'severity' must be a string".to_string(),
        })?;
    if !Severity::ALLOWED.contains(&severity) {
        return Err(AnalysisError::SchemaViolation {
            detail: format!(
                "severity '{severity}' is outside the allowed set {:?}",
                Severity::ALLOWED
            ),
        });
    }

    serde_json::from_value(value).map_err(|e| AnalysisError::SchemaViolation {
        detail: format!("typed deserialization failed: {e}"),
    })
}

fn check_non_empty_string(
    object: &serde_json::Map<String, Value>,
    field: &str,
) -> Result<(), AnalysisError> {
    match object[field].as_str() {
        Some(s) if !s.trim().is_empty() => Ok(()),
        Some(_) => Err(AnalysisError::SchemaViolation {
            detail: format!("field '{field}' must be non-empty"),
        }),
        None => Err(AnalysisError::SchemaViolation {
            detail: format!("field '{field}' must be a string"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_json() -> String {
        r#"{
            "conditionName": "Mild Acne",
            "description": "Small inflamed spots on the cheek.",
            "homeRemedies": ["Wash twice daily"],
            "advice": "This is not medical advice. Consult a dermatologist.",
            "severity": "Low"
        }"#
        .to_string()
    }

    #[test]
    fn accepts_valid_response() {
        let result = validate_response(&valid_json()).unwrap();
        assert_eq!(result.condition_name, "Mild Acne");
        assert_eq!(result.severity, Severity::Low);
        assert_eq!(result.home_remedies, vec!["Wash twice daily"]);
    }

    #[test]
    fn accepts_surrounding_whitespace() {
        let padded = format!("\n  {}  \n", valid_json());
        assert!(validate_response(&padded).is_ok());
    }

    #[test]
    fn gate_rejects_prose_without_parsing() {
        let err = validate_response("I cannot process this.").unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidResponseFormat));
        assert_eq!(err.to_string(), "Invalid JSON response from API.");
    }

    #[test]
    fn gate_rejects_json_array() {
        let err = validate_response("[1, 2, 3]").unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidResponseFormat));
    }

    #[test]
    fn gate_rejects_truncated_object() {
        let err = validate_response("{\"conditionName\": \"Ecz").unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidResponseFormat));
    }

    #[test]
    fn bracketed_garbage_is_schema_violation_not_format_error() {
        // Passes the gate, fails the parse.
        let err = validate_response("{not json}").unwrap_err();
        assert!(matches!(err, AnalysisError::SchemaViolation { .. }));
    }

    #[test]
    fn rejects_each_missing_required_field() {
        for field in REQUIRED_FIELDS {
            let mut value: Value = serde_json::from_str(&valid_json()).unwrap();
            value.as_object_mut().unwrap().remove(*field);
            let err = validate_response(&value.to_string()).unwrap_err();
            match err {
                AnalysisError::SchemaViolation { detail } => {
                    assert!(detail.contains(field), "detail for {field}: {detail}");
                }
                other => panic!("expected SchemaViolation for {field}, got {other:?}"),
            }
        }
    }

    #[test]
    fn rejects_severity_outside_closed_set() {
        let mut value: Value = serde_json::from_str(&valid_json()).unwrap();
        value["severity"] = Value::String("Critical".to_string());
        let err = validate_response(&value.to_string()).unwrap_err();
        assert!(matches!(err, AnalysisError::SchemaViolation { .. }));
    }

    #[test]
    fn rejects_lowercase_severity() {
        let mut value: Value = serde_json::from_str(&valid_json()).unwrap();
        value["severity"] = Value::String("low".to_string());
        assert!(validate_response(&value.to_string()).is_err());
    }

    #[test]
    fn rejects_empty_advice() {
        let mut value: Value = serde_json::from_str(&valid_json()).unwrap();
        value["advice"] = Value::String("  ".to_string());
        assert!(validate_response(&value.to_string()).is_err());
    }

    #[test]
    fn rejects_non_string_remedy_items() {
        let mut value: Value = serde_json::from_str(&valid_json()).unwrap();
        value["homeRemedies"] = serde_json::json!(["ok", 42]);
        assert!(validate_response(&value.to_string()).is_err());
    }

    #[test]
    fn accepts_empty_remedies() {
        let mut value: Value = serde_json::from_str(&valid_json()).unwrap();
        value["homeRemedies"] = serde_json::json!([]);
        let result = validate_response(&value.to_string()).unwrap();
        assert!(result.home_remedies.is_empty());
    }

    #[test]
    fn tolerates_extra_fields() {
        let mut value: Value = serde_json::from_str(&valid_json()).unwrap();
        value["modelNote"] = Value::String("extra".to_string());
        assert!(validate_response(&value.to_string()).is_ok());
    }
}
