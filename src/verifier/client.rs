//! OpenAI-compatible verifier backend.
//!
//! Asks for exactly one output token with `logprobs` enabled and reads the
//! TRUE/FALSE candidates at that position.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::error::{Error, Result};

use super::types::{probability_from_logprobs, TokenLogprob, VerifierConfig, VerifierRequest};
use super::Verifier;

const BACKEND: &str = "openai";

fn build_http_client(timeout_secs: u64) -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| Error::config(format!("failed to create HTTP client: {}", e)))
}

/// Verifier backed by an OpenAI-compatible chat completions endpoint.
pub struct OpenAIVerifier {
    config: VerifierConfig,
    http: Client,
}

impl OpenAIVerifier {
    const DEFAULT_BASE_URL: &'static str = "https://api.openai.com";

    /// Create a verifier. Fails on invalid configuration.
    pub fn new(config: VerifierConfig) -> Result<Self> {
        config.validate()?;
        let http = build_http_client(config.timeout_secs)?;
        Ok(Self { config, http })
    }

    /// Create a verifier from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::new(VerifierConfig::from_env()?)
    }

    pub fn config(&self) -> &VerifierConfig {
        &self.config
    }

    fn base_url(&self) -> &str {
        self.config
            .base_url
            .as_deref()
            .unwrap_or(Self::DEFAULT_BASE_URL)
            .trim_end_matches('/')
    }

    fn endpoint(&self) -> String {
        let base = self.base_url();
        // OpenRouter-style bases already carry the version segment.
        if base.ends_with("/v1") {
            format!("{}/chat/completions", base)
        } else {
            format!("{}/v1/chat/completions", base)
        }
    }

    fn build_request(&self, claim: &str, context: &str) -> ChatRequest {
        let request = VerifierRequest {
            model_id: self.config.model.clone(),
            system_prompt: self.config.system_prompt.clone(),
            claim: claim.to_string(),
            context: context.to_string(),
        };

        ChatRequest {
            model: request.model_id.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: request.system_prompt.clone(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: request.prompt(),
                },
            ],
            max_tokens: 1,
            temperature: 0.0,
            logprobs: true,
            top_logprobs: self.config.top_logprobs,
        }
    }
}

// Chat completions wire types
#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f64,
    logprobs: bool,
    top_logprobs: u8,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    logprobs: Option<ChoiceLogprobs>,
}

#[derive(Debug, Deserialize)]
struct ChoiceLogprobs {
    #[serde(default)]
    content: Vec<PositionLogprobs>,
}

#[derive(Debug, Deserialize)]
struct PositionLogprobs {
    token: String,
    logprob: f64,
    #[serde(default)]
    top_logprobs: Vec<TokenLogprob>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// Extract the first position's candidate tokens from a response body.
fn candidates_from_body(body: &str) -> Result<Vec<TokenLogprob>> {
    let response: ChatResponse = serde_json::from_str(body)
        .map_err(|e| Error::verifier(BACKEND, format!("Failed to parse response: {}", e)))?;

    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| Error::verifier(BACKEND, "No choices in response"))?;

    let position = choice
        .logprobs
        .and_then(|l| l.content.into_iter().next())
        .ok_or_else(|| Error::verifier(BACKEND, "Response carries no logprobs"))?;

    let mut candidates = position.top_logprobs;
    if candidates.is_empty() {
        // Some backends only report the sampled token.
        candidates.push(TokenLogprob::new(position.token, position.logprob));
    }
    Ok(candidates)
}

/// Parse a response body into P(TRUE).
fn probability_from_body(body: &str, floor_logprob: f64) -> Result<f64> {
    let candidates = candidates_from_body(body)?;
    Ok(probability_from_logprobs(&candidates, floor_logprob))
}

#[async_trait]
impl Verifier for OpenAIVerifier {
    async fn probability(&self, claim: &str, context: &str) -> Result<f64> {
        let api_request = self.build_request(claim, context);

        let response = self
            .http
            .post(self.endpoint())
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("content-type", "application/json")
            .json(&api_request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::timeout(self.config.timeout_secs * 1000)
                } else {
                    Error::verifier(BACKEND, format!("HTTP request failed: {}", e))
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::verifier(BACKEND, format!("Failed to read response: {}", e)))?;

        if !status.is_success() {
            if let Ok(error) = serde_json::from_str::<ApiError>(&body) {
                return Err(Error::verifier(
                    BACKEND,
                    format!("API error ({}): {}", status, error.error.message),
                ));
            }
            return Err(Error::verifier(
                BACKEND,
                format!("API error ({}): {}", status, body),
            ));
        }

        let p = probability_from_body(&body, self.config.floor_logprob)?;
        debug!(model = %self.config.model, probability = p, "Verifier judgment");
        Ok(p)
    }

    fn name(&self) -> &str {
        &self.config.model
    }
}
