// AI gateway - the three prompt-driven operations
//
// Each operation is prompt -> generateContent -> JSON extraction -> typed
// result. Parsing is kept in free functions so it can be tested without HTTP.

use leadgen_config::ResolvedAIConfig;
use leadgen_core::{
    extract_json, ExtractError, Fragment, GeneratedLeads, LeadRequest, RawLead, Source, Strategy,
    VerificationResult,
};

use crate::client::{GeminiClient, GenerateOutput, GenerateRequest, Tool};
use crate::error::{AiError, AiErrorKind, AiOperation};
use crate::prompts;

/// The operations the app needs from a model backend.
///
/// Implementations block; callers run them off the UI thread.
pub trait LeadGateway: Send + Sync {
    fn request_strategy(&self, problem: &str) -> Result<Strategy, AiError>;

    fn request_leads(&self, request: &LeadRequest) -> Result<GeneratedLeads, AiError>;

    fn verify_requirement(
        &self,
        business_name: &str,
        website_url: &str,
        requirement: &str,
    ) -> Result<VerificationResult, AiError>;
}

/// Gateway backed by the Gemini API.
#[derive(Debug, Clone)]
pub struct GeminiGateway {
    client: GeminiClient,
    request_coordinates: bool,
}

impl GeminiGateway {
    pub fn new(config: &ResolvedAIConfig) -> Result<Self, AiErrorKind> {
        Ok(Self {
            client: GeminiClient::new(config)?,
            request_coordinates: config.request_coordinates,
        })
    }

    pub fn from_client(client: GeminiClient, request_coordinates: bool) -> Self {
        Self {
            client,
            request_coordinates,
        }
    }

    fn call(&self, operation: AiOperation, request: &GenerateRequest) -> Result<GenerateOutput, AiError> {
        log::debug!(
            "gemini: {} request (model={}, tool={:?}, bias={})",
            operation.as_str(),
            self.client.model(),
            request.tool,
            request.retrieval_bias.is_some()
        );
        self.client.generate(request).map_err(|kind| {
            log::warn!("gemini: {} call failed: {}", operation.as_str(), kind);
            kind.during(operation)
        })
    }
}

impl LeadGateway for GeminiGateway {
    fn request_strategy(&self, problem: &str) -> Result<Strategy, AiError> {
        let request = GenerateRequest::new(prompts::strategy_prompt(problem)).json();
        let output = self.call(AiOperation::Strategy, &request)?;
        parse_strategy(&output.text).map_err(|kind| report(AiOperation::Strategy, kind))
    }

    fn request_leads(&self, request: &LeadRequest) -> Result<GeneratedLeads, AiError> {
        let generate = GenerateRequest::new(prompts::leads_prompt(request, self.request_coordinates))
            .tool(Tool::GoogleMaps)
            .retrieval_bias(request.coordinates);
        let output = self.call(AiOperation::Leads, &generate)?;
        let mut generated = parse_leads(&output).map_err(|kind| report(AiOperation::Leads, kind))?;

        let limit = request.count as usize;
        if generated.leads.len() > limit {
            log::debug!("gemini: trimming {} leads to requested {}", generated.leads.len(), limit);
            generated.leads.truncate(limit);
        }
        log::info!(
            "gemini: {} leads, {} sources",
            generated.leads.len(),
            generated.sources.len()
        );
        Ok(generated)
    }

    fn verify_requirement(
        &self,
        business_name: &str,
        website_url: &str,
        requirement: &str,
    ) -> Result<VerificationResult, AiError> {
        let request = GenerateRequest::new(prompts::verification_prompt(business_name, website_url, requirement))
            .tool(Tool::GoogleSearch);
        let output = self.call(AiOperation::Verification, &request)?;
        parse_verification(&output.text).map_err(|kind| report(AiOperation::Verification, kind))
    }
}

fn report(operation: AiOperation, kind: AiErrorKind) -> AiError {
    if let AiErrorKind::Malformed(detail) = &kind {
        log::warn!("gemini: {} response not in expected format: {}", operation.as_str(), detail);
    } else {
        log::warn!("gemini: {} response unusable: {}", operation.as_str(), kind);
    }
    kind.during(operation)
}

// ============================================================================
// Response parsing
// ============================================================================

/// Strategy responses are JSON-mode, so the whole body must parse.
pub fn parse_strategy(text: &str) -> Result<Strategy, AiErrorKind> {
    let strategy: Strategy =
        serde_json::from_str(text.trim()).map_err(|e| AiErrorKind::Malformed(e.to_string()))?;
    if strategy.business_type.trim().is_empty() {
        return Err(AiErrorKind::Malformed("empty businessType".to_string()));
    }
    Ok(strategy)
}

/// Extract the lead array from free text and collect grounding sources.
pub fn parse_leads(output: &GenerateOutput) -> Result<GeneratedLeads, AiErrorKind> {
    let leads: Vec<RawLead> = extract_json(&output.text, Fragment::Array).map_err(extract_failure)?;
    Ok(GeneratedLeads {
        leads,
        sources: Source::from_chunks(&output.grounding_chunks),
    })
}

pub fn parse_verification(text: &str) -> Result<VerificationResult, AiErrorKind> {
    extract_json(text, Fragment::Object).map_err(extract_failure)
}

fn extract_failure(e: ExtractError) -> AiErrorKind {
    match e {
        ExtractError::NotFound => AiErrorKind::NoJson,
        ExtractError::Malformed(detail) => AiErrorKind::Malformed(detail),
    }
}
