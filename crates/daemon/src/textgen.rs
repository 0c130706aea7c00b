//! Text generation client: the policy and insight calls, and the Gemini
//! `generateContent` backend they go through.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use phoneauth_core::model::{
    GenerationConfig, InsightText, PolicyDocument, PolicyRequest, VerificationResult,
};
use phoneauth_core::prompts::{insight_prompt, policy_prompt};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::config::GeminiConfig;

#[derive(Debug, Error)]
pub enum TextGenError {
    #[error("API key is empty")]
    MissingApiKey,
    #[error("http: {0}")]
    Http(#[from] reqwest::Error),
    #[error("backend returned {status}: {body}")]
    Api { status: u16, body: String },
    #[error("decode response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("backend returned no text")]
    EmptyResponse,
}

/// A prompt-in, text-out completion service.
#[async_trait]
pub trait TextBackend: Send + Sync {
    async fn generate(&self, prompt: &str, config: &GenerationConfig) -> Result<String, TextGenError>;
}

/// The two fixed calls the demo makes.
#[derive(Clone)]
pub struct TextService {
    backend: Arc<dyn TextBackend>,
}

impl TextService {
    pub fn new(backend: Arc<dyn TextBackend>) -> Self {
        Self { backend }
    }

    pub async fn generate_policy(&self, request: &PolicyRequest) -> Result<PolicyDocument, TextGenError> {
        let prompt = policy_prompt(&request.company_name, &request.website_url);
        let text = self.backend.generate(&prompt, &GenerationConfig::POLICY).await?;
        info!(company = %request.company_name, chars = text.len(), "privacy policy generated");
        Ok(PolicyDocument { text })
    }

    pub async fn get_insight(&self, result: &VerificationResult) -> Result<InsightText, TextGenError> {
        let prompt = insight_prompt(&result.url);
        let text = self.backend.generate(&prompt, &GenerationConfig::INSIGHT).await?;
        info!(chars = text.len(), "security insight generated");
        Ok(InsightText { text })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: SamplingConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SamplingConfig {
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: Option<u32>,
    #[serde(default)]
    candidates_token_count: Option<u32>,
}

/// Gemini REST backend.
#[derive(Clone)]
pub struct GeminiBackend {
    client: Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl fmt::Debug for GeminiBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiBackend")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl GeminiBackend {
    pub fn new(config: &GeminiConfig, api_key: impl Into<String>) -> Result<Self, TextGenError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(TextGenError::MissingApiKey);
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model)
    }
}

#[async_trait]
impl TextBackend for GeminiBackend {
    async fn generate(&self, prompt: &str, config: &GenerationConfig) -> Result<String, TextGenError> {
        let body = GenerateRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![RequestPart { text: prompt }],
            }],
            generation_config: SamplingConfig {
                temperature: config.temperature,
                top_p: config.top_p,
            },
        };

        debug!(model = %self.model, prompt_chars = prompt.len(), "generateContent");
        let resp = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        let raw = resp.text().await?;
        if !status.is_success() {
            return Err(TextGenError::Api {
                status: status.as_u16(),
                body: raw,
            });
        }

        let parsed: GenerateResponse = serde_json::from_str(&raw)?;
        if let Some(usage) = &parsed.usage_metadata {
            debug!(
                prompt_tokens = ?usage.prompt_token_count,
                output_tokens = ?usage.candidates_token_count,
                "generateContent usage"
            );
        }

        let text: String = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();
        if text.trim().is_empty() {
            return Err(TextGenError::EmptyResponse);
        }
        Ok(text)
    }
}
