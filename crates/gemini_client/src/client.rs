//! Gemini `generateContent` client.
//!
//! Blocking reqwest client (no Tokio runtime required). One request per
//! call; the caller decides which thread blocks.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use leadgen_config::ResolvedAIConfig;
use leadgen_core::{Coordinates, GroundingChunk};

use crate::error::AiErrorKind;

/// Server-side grounding tool to enable for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    GoogleMaps,
    GoogleSearch,
}

/// One prompt plus its generation options.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateRequest {
    pub prompt: String,
    /// Ask for `application/json` output. Not allowed together with tools.
    pub json_mode: bool,
    pub tool: Option<Tool>,
    /// Location bias for maps retrieval.
    pub retrieval_bias: Option<Coordinates>,
}

impl GenerateRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            json_mode: false,
            tool: None,
            retrieval_bias: None,
        }
    }

    pub fn json(mut self) -> Self {
        self.json_mode = true;
        self
    }

    pub fn tool(mut self, tool: Tool) -> Self {
        self.tool = Some(tool);
        self
    }

    pub fn retrieval_bias(mut self, coordinates: Option<Coordinates>) -> Self {
        self.retrieval_bias = coordinates;
        self
    }
}

/// Text of the first candidate plus its grounding chunks.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerateOutput {
    pub text: String,
    pub grounding_chunks: Vec<GroundingChunk>,
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentBody<'a> {
    contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_config: Option<serde_json::Value>,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<TextPart<'a>>,
}

#[derive(Serialize)]
struct TextPart<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
    #[serde(default)]
    grounding_metadata: Option<GroundingMetadata>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GroundingMetadata {
    #[serde(default)]
    grounding_chunks: Vec<GroundingChunk>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: String,
}

impl GenerateRequest {
    fn to_body(&self) -> GenerateContentBody<'_> {
        let tools = match self.tool {
            Some(Tool::GoogleMaps) => vec![serde_json::json!({ "googleMaps": {} })],
            Some(Tool::GoogleSearch) => vec![serde_json::json!({ "googleSearch": {} })],
            None => Vec::new(),
        };
        let tool_config = self.retrieval_bias.map(|c| {
            serde_json::json!({
                "retrievalConfig": {
                    "latLng": { "latitude": c.latitude, "longitude": c.longitude }
                }
            })
        });

        GenerateContentBody {
            contents: vec![Content {
                role: "user",
                parts: vec![TextPart { text: &self.prompt }],
            }],
            generation_config: self.json_mode.then_some(GenerationConfig {
                response_mime_type: "application/json",
            }),
            tools,
            tool_config,
        }
    }
}

// ============================================================================
// Client
// ============================================================================

/// Gemini API client (blocking).
#[derive(Clone)]
pub struct GeminiClient {
    http: reqwest::blocking::Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl GeminiClient {
    /// Create a client from the resolved configuration.
    pub fn new(config: &ResolvedAIConfig) -> Result<Self, AiErrorKind> {
        let api_key = config.api_key.clone().ok_or(AiErrorKind::MissingKey)?;
        Self::build(api_key, config.model.clone(), config.endpoint.clone(), config.timeout)
    }

    /// Create a client against an explicit base URL, bypassing settings.
    ///
    /// Used by tests and mock servers.
    pub fn with_base_url(
        api_key: String,
        model: String,
        base_url: String,
        timeout: Duration,
    ) -> Result<Self, AiErrorKind> {
        Self::build(api_key, model, base_url, timeout)
    }

    fn build(api_key: String, model: String, endpoint: String, timeout: Duration) -> Result<Self, AiErrorKind> {
        let http = reqwest::blocking::Client::builder()
            .user_agent(format!("leadgen/{}", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| AiErrorKind::Network(e.to_string()))?;

        Ok(Self {
            http,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key,
            model,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn url(&self) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.endpoint, self.model)
    }

    /// Send one prompt and return the first candidate's text.
    pub fn generate(&self, request: &GenerateRequest) -> Result<GenerateOutput, AiErrorKind> {
        let response = self
            .http
            .post(self.url())
            .header("x-goog-api-key", &self.api_key)
            .json(&request.to_body())
            .send()
            .map_err(|e| AiErrorKind::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().unwrap_or_default();
            let message = match serde_json::from_str::<ApiErrorBody>(&error_text) {
                Ok(body) => body.error.message,
                Err(_) => error_text,
            };
            return Err(AiErrorKind::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: GenerateContentResponse = response
            .json()
            .map_err(|e| AiErrorKind::Malformed(format!("unreadable response body: {}", e)))?;

        if let Some(reason) = body.prompt_feedback.and_then(|p| p.block_reason) {
            log::warn!("gemini: prompt blocked ({})", reason);
            return Err(AiErrorKind::EmptyResponse);
        }

        let candidate = body.candidates.into_iter().next().ok_or(AiErrorKind::EmptyResponse)?;

        let text: String = candidate
            .content
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();
        let text = text.trim().to_string();
        if text.is_empty() {
            log::warn!(
                "gemini: candidate without text (finish reason: {})",
                candidate.finish_reason.as_deref().unwrap_or("unknown")
            );
            return Err(AiErrorKind::EmptyResponse);
        }

        let grounding_chunks = candidate
            .grounding_metadata
            .map(|m| m.grounding_chunks)
            .unwrap_or_default();

        Ok(GenerateOutput { text, grounding_chunks })
    }
}
