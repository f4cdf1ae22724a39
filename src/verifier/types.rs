//! Types for the verifier boundary.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default verifier model.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Default system prompt for yes/no judgments.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a precise fact-checker.";

/// Log-probability assigned to a label absent from the top candidates.
pub const DEFAULT_FLOOR_LOGPROB: f64 = -10.0;

/// Configuration for the verifier backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifierConfig {
    /// API key
    pub api_key: String,
    /// Base URL override (OpenAI-compatible endpoint)
    pub base_url: Option<String>,
    /// Model used for judgments
    pub model: String,
    /// System prompt sent with every judgment
    pub system_prompt: String,
    /// Number of candidate tokens to request log-probabilities for
    pub top_logprobs: u8,
    /// Log-probability substituted for a missing TRUE/FALSE candidate
    pub floor_logprob: f64,
    /// HTTP timeout in seconds
    pub timeout_secs: u64,
}

impl VerifierConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: None,
            model: DEFAULT_MODEL.to_string(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            top_logprobs: 5,
            floor_logprob: DEFAULT_FLOOR_LOGPROB,
            timeout_secs: 30,
        }
    }

    /// Read configuration from the environment.
    ///
    /// `OPENAI_API_KEY` is required; `OPENAI_BASE_URL` and
    /// `STRAWBERRY_VERIFIER_MODEL` are optional overrides.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| Error::config("OPENAI_API_KEY is not set"))?;

        let mut config = Self::new(api_key);
        config.base_url = std::env::var("OPENAI_BASE_URL")
            .ok()
            .filter(|u| !u.trim().is_empty());
        if let Ok(model) = std::env::var("STRAWBERRY_VERIFIER_MODEL") {
            if !model.trim().is_empty() {
                config.model = model;
            }
        }
        Ok(config)
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub fn with_top_logprobs(mut self, n: u8) -> Self {
        self.top_logprobs = n;
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Check the configuration before any scoring starts.
    pub fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(Error::config("verifier API key is empty"));
        }
        if self.model.trim().is_empty() {
            return Err(Error::config("verifier model is empty"));
        }
        if !(1..=20).contains(&self.top_logprobs) {
            return Err(Error::config(format!(
                "top_logprobs must be between 1 and 20, got {}",
                self.top_logprobs
            )));
        }
        if !self.floor_logprob.is_finite() || self.floor_logprob > 0.0 {
            return Err(Error::config("floor_logprob must be a finite non-positive number"));
        }
        if self.timeout_secs == 0 {
            return Err(Error::config("verifier timeout must be positive"));
        }
        Ok(())
    }
}

/// A yes/no judgment request at the verifier boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifierRequest {
    pub model_id: String,
    pub system_prompt: String,
    pub claim: String,
    pub context: String,
}

impl VerifierRequest {
    /// User message asking for a single TRUE/FALSE token.
    pub fn prompt(&self) -> String {
        format!(
            "Context:\n{}\n\nQuestion/Claim: {}\n\nAnswer the claim with just \"TRUE\" or \"FALSE\" based on the context.",
            self.context, self.claim
        )
    }
}

/// A judgment response at the verifier boundary.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VerifierResponse {
    /// Probability the claim is true, in `[0, 1]`
    pub probability: f64,
}

/// A candidate token with its log-probability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenLogprob {
    pub token: String,
    pub logprob: f64,
}

impl TokenLogprob {
    pub fn new(token: impl Into<String>, logprob: f64) -> Self {
        Self {
            token: token.into(),
            logprob,
        }
    }
}

/// Normalize TRUE/FALSE candidate log-probabilities into P(TRUE).
///
/// Tokens are compared after trimming and upper-casing, so `" True"` counts as
/// TRUE. A label missing from the candidates gets `floor_logprob`.
pub fn probability_from_logprobs(candidates: &[TokenLogprob], floor_logprob: f64) -> f64 {
    let best = |label: &str| {
        candidates
            .iter()
            .filter(|c| c.token.trim().to_uppercase() == label && c.logprob.is_finite())
            .map(|c| c.logprob)
            .fold(None, |acc: Option<f64>, lp| Some(acc.map_or(lp, |a| a.max(lp))))
            .unwrap_or(floor_logprob)
    };

    let true_lp = best("TRUE");
    let false_lp = best("FALSE");

    // Subtract the max before exponentiating to stay in range.
    let max_lp = true_lp.max(false_lp);
    let true_p = (true_lp - max_lp).exp();
    let false_p = (false_lp - max_lp).exp();
    let total = true_p + false_p;

    if total > 0.0 {
        true_p / total
    } else {
        0.5
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = VerifierConfig::new("test-key")
            .with_base_url("https://openrouter.ai/api")
            .with_model("openai/gpt-4o-mini")
            .with_top_logprobs(10)
            .with_timeout(60);

        assert_eq!(config.api_key, "test-key");
        assert_eq!(config.base_url.as_deref(), Some("https://openrouter.ai/api"));
        assert_eq!(config.model, "openai/gpt-4o-mini");
        assert_eq!(config.top_logprobs, 10);
        assert_eq!(config.timeout_secs, 60);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        assert!(VerifierConfig::new("").validate().is_err());
        assert!(VerifierConfig::new("k").with_top_logprobs(0).validate().is_err());
        assert!(VerifierConfig::new("k").with_timeout(0).validate().is_err());
        assert!(VerifierConfig::new("k").with_model(" ").validate().is_err());
    }

    #[test]
    fn test_prompt_contains_claim_and_context() {
        let request = VerifierRequest {
            model_id: DEFAULT_MODEL.to_string(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            claim: "Imports are unused.".to_string(),
            context: "import os".to_string(),
        };
        let prompt = request.prompt();
        assert!(prompt.starts_with("Context:\nimport os\n\n"));
        assert!(prompt.contains("Question/Claim: Imports are unused."));
        assert!(prompt.ends_with("based on the context."));
    }

    #[test]
    fn test_probability_equal_logprobs() {
        let candidates = vec![TokenLogprob::new("TRUE", -0.7), TokenLogprob::new("FALSE", -0.7)];
        assert!((probability_from_logprobs(&candidates, -10.0) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_probability_normalizes_two_labels() {
        let candidates = vec![
            TokenLogprob::new("TRUE", (0.6f64).ln()),
            TokenLogprob::new("FALSE", (0.2f64).ln()),
            TokenLogprob::new("Maybe", (0.2f64).ln()),
        ];
        let p = probability_from_logprobs(&candidates, -10.0);
        assert!((p - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_missing_label_uses_floor() {
        let candidates = vec![TokenLogprob::new("TRUE", 0.0)];
        let p = probability_from_logprobs(&candidates, -10.0);
        let expected = 1.0 / (1.0 + (-10.0f64).exp());
        assert!((p - expected).abs() < 1e-12);

        // Neither label present: both floored, uninformative.
        assert!((probability_from_logprobs(&[], -10.0) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_token_normalization() {
        let candidates = vec![TokenLogprob::new(" true", -0.1), TokenLogprob::new("False", -3.0)];
        assert!(probability_from_logprobs(&candidates, -10.0) > 0.9);
    }
}
