//! Fixed instruction and response schema for the skin-analysis request.
//!
//! The schema is a request *to* the model, not an enforced server-side
//! contract — `validate` re-checks every field after parsing.

use serde_json::{json, Value};

/// Dermatology-assistant instruction sent alongside the image.
///
/// The model is told to decline (and ask for a better image) when the
/// image is not clearly skin, rather than guessing.
pub const ANALYSIS_INSTRUCTION: &str = "\
Analyze the provided image of human skin. Act as a helpful AI dermatology assistant.
1. Identify any potential skin conditions visible in the image.
2. Provide a simple description of the condition.
3. List some common and safe home remedies.
4. Give clear advice, emphasizing that this is not a substitute for professional \
medical diagnosis and they should consult a dermatologist for any concerns.
5. Estimate the severity.

If the image is not of skin or is unclear, state that and ask for a better image.";

/// Structured-output schema declared to the model: an object with exactly
/// the five required fields of `AnalysisResult`, none optional.
pub fn analysis_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "conditionName": {
                "type": "STRING",
                "description": "The name of the potential skin condition detected. \
If none, say 'No specific condition detected'."
            },
            "description": {
                "type": "STRING",
                "description": "A brief, easy-to-understand description of the condition."
            },
            "homeRemedies": {
                "type": "ARRAY",
                "items": { "type": "STRING" },
                "description": "A list of suggested home remedies. If not applicable, \
provide general skin care tips."
            },
            "advice": {
                "type": "STRING",
                "description": "Crucial advice, including whether to consult a doctor. \
Start with a disclaimer that this is not medical advice."
            },
            "severity": {
                "type": "STRING",
                "description": "An estimated severity level: 'Low', 'Medium', 'High', or 'Unknown'."
            }
        },
        "required": ["conditionName", "description", "homeRemedies", "advice", "severity"]
    })
}

/// Near-deterministic sampling for structured output.
pub const ANALYSIS_TEMPERATURE: f32 = 0.2;
