//! Gemini HTTP client for the remote skin-analysis model.
//!
//! The remote service is an opaque capability behind the `VisionModel`
//! trait: image payload + media type + instruction + schema + temperature
//! in, raw response text out. Command handlers hold an `Arc<dyn
//! VisionModel>` so tests can substitute a mock.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::TransportError;
use crate::config;

/// Opaque remote image-understanding capability.
pub trait VisionModel: Send + Sync {
    /// One generation round-trip. `image_payload` is base64 with no
    /// data-URI prefix; `media_type` is passed through verbatim.
    fn generate(
        &self,
        image_payload: &str,
        media_type: &str,
        instruction: &str,
        schema: &Value,
        temperature: f32,
    ) -> Result<String, TransportError>;
}

/// Production client for the Gemini `generateContent` REST endpoint.
pub struct GeminiClient {
    base_url: String,
    model: String,
    api_key: Option<String>,
    client: reqwest::blocking::Client,
}

impl GeminiClient {
    pub fn new(base_url: &str, model: &str, api_key: Option<String>) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(config::ANALYSIS_TIMEOUT_SECS))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key,
            client,
        }
    }

    /// Default client: configured endpoint + model, key from the environment.
    pub fn from_env() -> Self {
        Self::new(
            config::GEMINI_API_BASE,
            config::ANALYSIS_MODEL,
            config::api_key(),
        )
    }
}

// ──────────────────────────────────────────────
// Wire types (Gemini generateContent)
// ──────────────────────────────────────────────

#[derive(Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig<'a>,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
enum Part<'a> {
    #[serde(rename_all = "camelCase")]
    InlineData { mime_type: &'a str, data: &'a str },
    Text(&'a str),
}

#[derive(Serialize)]
struct GenerationConfig<'a> {
    #[serde(rename = "responseMimeType")]
    response_mime_type: &'a str,
    #[serde(rename = "responseSchema")]
    response_schema: &'a Value,
    temperature: f32,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

impl VisionModel for GeminiClient {
    fn generate(
        &self,
        image_payload: &str,
        media_type: &str,
        instruction: &str,
        schema: &Value,
        temperature: f32,
    ) -> Result<String, TransportError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(TransportError::NotConfigured)?;

        let url = format!(
            "{}/models/{}:generateContent",
            self.base_url, self.model
        );

        let body = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![
                    Part::InlineData {
                        mime_type: media_type,
                        data: image_payload,
                    },
                    Part::Text(instruction),
                ],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
                response_schema: schema,
                temperature,
            },
        };

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .map_err(|e| TransportError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(TransportError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateContentResponse = response
            .json()
            .map_err(|e| TransportError::Http(e.to_string()))?;

        let candidate = parsed
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| TransportError::EmptyResponse)?;

        // Concatenate part texts — structured output arrives as one part,
        // but the API reserves the right to split.
        let text: String = candidate
            .content
            .parts
            .into_iter()
            .map(|p| p.text)
            .collect();

        if text.is_empty() {
            return Err(TransportError::EmptyResponse);
        }

        Ok(text)
    }
}

// ──────────────────────────────────────────────
// MockVisionModel (testing)
// ──────────────────────────────────────────────

/// Mock remote model returning a canned response or a canned failure.
#[cfg(test)]
pub struct MockVisionModel {
    response: Result<String, TransportError>,
    calls: std::sync::Mutex<Vec<MockCall>>,
}

/// Arguments captured from one `generate` invocation.
#[cfg(test)]
#[derive(Debug, Clone)]
pub struct MockCall {
    pub image_payload: String,
    pub media_type: String,
    pub temperature: f32,
}

#[cfg(test)]
impl MockVisionModel {
    pub fn returning(response: &str) -> Self {
        Self {
            response: Ok(response.to_string()),
            calls: std::sync::Mutex::new(Vec::new()),
        }
    }

    pub fn failing(error: TransportError) -> Self {
        Self {
            response: Err(error),
            calls: std::sync::Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<MockCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[cfg(test)]
impl VisionModel for MockVisionModel {
    fn generate(
        &self,
        image_payload: &str,
        media_type: &str,
        _instruction: &str,
        _schema: &Value,
        temperature: f32,
    ) -> Result<String, TransportError> {
        self.calls.lock().unwrap().push(MockCall {
            image_payload: image_payload.to_string(),
            media_type: media_type.to_string(),
            temperature,
        });
        self.response.clone()
    }
}
