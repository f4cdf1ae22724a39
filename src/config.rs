//! Audit configuration.
//!
//! The target confidence and the two-bit flag threshold are empirical
//! constants; both are tunable here rather than fixed in the scorer.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::budget::evidence::DEFAULT_PLACEHOLDER;
use crate::budget::types::CounterfactualMode;
use crate::error::{Error, Result};

/// Default target confidence a claim must justify.
pub const DEFAULT_TARGET_CONFIDENCE: f64 = 0.95;

/// Default baseline belief before evidence.
pub const DEFAULT_PRIOR: f64 = 0.5;

/// Default budget gap, in bits, above which a claim is flagged.
pub const DEFAULT_FLAG_THRESHOLD_BITS: f64 = 2.0;

/// Default maximum concurrent verifier queries.
pub const DEFAULT_MAX_CONCURRENCY: usize = 4;

/// Configuration for scoring and aggregation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    /// Confidence the claim is expected to justify
    pub target_confidence: f64,
    /// Baseline belief used when the counterfactual is reused
    pub prior: f64,
    /// Budget gap above which a claim is flagged
    pub flag_threshold_bits: f64,
    /// Whether to issue a real scrubbed query for the baseline
    pub counterfactual: CounterfactualMode,
    /// Maximum simultaneous verifier queries
    pub max_concurrency: usize,
    /// Per-query timeout in milliseconds
    pub query_timeout_ms: u64,
    /// Placeholder substituted for scrubbed evidence
    pub placeholder: String,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            target_confidence: DEFAULT_TARGET_CONFIDENCE,
            prior: DEFAULT_PRIOR,
            flag_threshold_bits: DEFAULT_FLAG_THRESHOLD_BITS,
            counterfactual: CounterfactualMode::Reused,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            query_timeout_ms: 30_000,
            placeholder: DEFAULT_PLACEHOLDER.to_string(),
        }
    }
}

impl AuditConfig {
    /// Configuration that performs the scrubbed second query.
    pub fn scrubbed() -> Self {
        Self {
            counterfactual: CounterfactualMode::Scrubbed,
            ..Self::default()
        }
    }

    pub fn with_target_confidence(mut self, target: f64) -> Self {
        self.target_confidence = target;
        self
    }

    pub fn with_prior(mut self, prior: f64) -> Self {
        self.prior = prior;
        self
    }

    pub fn with_flag_threshold(mut self, bits: f64) -> Self {
        self.flag_threshold_bits = bits;
        self
    }

    pub fn with_counterfactual(mut self, mode: CounterfactualMode) -> Self {
        self.counterfactual = mode;
        self
    }

    pub fn with_max_concurrency(mut self, max: usize) -> Self {
        self.max_concurrency = max;
        self
    }

    pub fn with_query_timeout_ms(mut self, ms: u64) -> Self {
        self.query_timeout_ms = ms;
        self
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = placeholder.into();
        self
    }

    pub fn query_timeout(&self) -> Duration {
        Duration::from_millis(self.query_timeout_ms)
    }

    /// Reject settings that cannot produce meaningful scores.
    pub fn validate(&self) -> Result<()> {
        let open_unit = |v: f64| v > 0.0 && v < 1.0;

        if !open_unit(self.target_confidence) {
            return Err(Error::config(format!(
                "target_confidence must be in (0, 1), got {}",
                self.target_confidence
            )));
        }
        if !open_unit(self.prior) {
            return Err(Error::config(format!(
                "prior must be in (0, 1), got {}",
                self.prior
            )));
        }
        if !self.flag_threshold_bits.is_finite() {
            return Err(Error::config("flag_threshold_bits must be finite"));
        }
        if self.max_concurrency == 0 {
            return Err(Error::config("max_concurrency must be at least 1"));
        }
        if self.query_timeout_ms == 0 {
            return Err(Error::config("query_timeout_ms must be positive"));
        }
        if self.counterfactual == CounterfactualMode::Scrubbed && self.placeholder.is_empty() {
            return Err(Error::config("scrubbing requires a non-empty placeholder"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AuditConfig::default();
        assert_eq!(config.target_confidence, 0.95);
        assert_eq!(config.prior, 0.5);
        assert_eq!(config.flag_threshold_bits, 2.0);
        assert_eq!(config.counterfactual, CounterfactualMode::Reused);
        assert_eq!(config.placeholder, "[REDACTED]");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation() {
        assert!(AuditConfig::default().with_target_confidence(1.0).validate().is_err());
        assert!(AuditConfig::default().with_target_confidence(0.0).validate().is_err());
        assert!(AuditConfig::default().with_prior(0.0).validate().is_err());
        assert!(AuditConfig::default().with_flag_threshold(f64::NAN).validate().is_err());
        assert!(AuditConfig::default().with_max_concurrency(0).validate().is_err());
        assert!(AuditConfig::default().with_query_timeout_ms(0).validate().is_err());
        assert!(AuditConfig::scrubbed().with_placeholder("").validate().is_err());
        assert!(AuditConfig::default().with_flag_threshold(-1.0).validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: AuditConfig =
            serde_json::from_str(r#"{"target_confidence": 0.9, "counterfactual": "scrubbed"}"#)
                .unwrap();
        assert_eq!(config.target_confidence, 0.9);
        assert_eq!(config.counterfactual, CounterfactualMode::Scrubbed);
        assert_eq!(config.max_concurrency, DEFAULT_MAX_CONCURRENCY);
    }
}
