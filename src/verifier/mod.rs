//! Verifier boundary.
//!
//! A verifier estimates the probability that a claim is true given a context.
//! The audit core only depends on the [`Verifier`] trait; any backend that can
//! produce a probability can be substituted, including mocks in tests.
//!
//! ## Example
//!
//! ```rust,ignore
//! use strawberry_audit::verifier::{CachedVerifier, OpenAIVerifier, Verifier, VerifierConfig};
//!
//! let verifier = CachedVerifier::new(OpenAIVerifier::new(
//!     VerifierConfig::from_env()?.with_model("gpt-4o-mini"),
//! )?);
//!
//! let p = verifier.probability("The function is pure.", "def f(): return 1").await?;
//! ```

mod cache;
mod client;
mod types;

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::Result;

pub use cache::{CacheKey, CacheStats, CachedVerifier};
pub use client::OpenAIVerifier;
pub use types::{
    probability_from_logprobs, TokenLogprob, VerifierConfig, VerifierRequest, VerifierResponse,
    DEFAULT_FLOOR_LOGPROB, DEFAULT_MODEL, DEFAULT_SYSTEM_PROMPT,
};

/// Capability to judge a claim against a context.
///
/// Implementations return errors for transport or service failures; callers
/// in the audit core map those to a neutral judgment.
#[async_trait]
pub trait Verifier: Send + Sync {
    /// Probability in `[0, 1]` that `claim` is true given `context`.
    async fn probability(&self, claim: &str, context: &str) -> Result<f64>;

    /// Backend or model name, for logs and cache keys.
    fn name(&self) -> &str;

    /// Query at the wire boundary: request in, response out.
    async fn respond(&self, request: &VerifierRequest) -> Result<VerifierResponse> {
        let probability = self.probability(&request.claim, &request.context).await?;
        Ok(VerifierResponse { probability })
    }
}

#[async_trait]
impl<V: Verifier + ?Sized> Verifier for Arc<V> {
    async fn probability(&self, claim: &str, context: &str) -> Result<f64> {
        (**self).probability(claim, context).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted verifiers for tests.

    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;

    use super::Verifier;
    use crate::error::{Error, Result};

    /// Returns one probability for every query.
    pub struct FixedVerifier {
        pub probability: f64,
        pub calls: AtomicUsize,
    }

    impl FixedVerifier {
        pub fn new(probability: f64) -> Self {
            Self {
                probability,
                calls: AtomicUsize::new(0),
            }
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Verifier for FixedVerifier {
        async fn probability(&self, _claim: &str, _context: &str) -> Result<f64> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.probability)
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    /// Scripted per-claim behaviour; unknown claims fail.
    #[derive(Default)]
    pub struct ScriptedVerifier {
        /// claim -> probability with evidence
        pub answers: HashMap<String, f64>,
        /// claim -> probability for the scrubbed context
        pub scrubbed_answers: HashMap<String, f64>,
        /// claim -> artificial latency
        pub delays: HashMap<String, Duration>,
        pub placeholder: String,
        pub calls: AtomicUsize,
    }

    impl ScriptedVerifier {
        pub fn new() -> Self {
            Self {
                placeholder: "[REDACTED]".to_string(),
                ..Default::default()
            }
        }

        pub fn answer(mut self, claim: &str, p: f64) -> Self {
            self.answers.insert(claim.to_string(), p);
            self
        }

        pub fn scrubbed(mut self, claim: &str, p: f64) -> Self {
            self.scrubbed_answers.insert(claim.to_string(), p);
            self
        }

        pub fn delay(mut self, claim: &str, delay: Duration) -> Self {
            self.delays.insert(claim.to_string(), delay);
            self
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Verifier for ScriptedVerifier {
        async fn probability(&self, claim: &str, context: &str) -> Result<f64> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delays.get(claim) {
                tokio::time::sleep(*delay).await;
            }
            if context.contains(&self.placeholder) {
                if let Some(p) = self.scrubbed_answers.get(claim) {
                    return Ok(*p);
                }
            }
            self.answers
                .get(claim)
                .copied()
                .ok_or_else(|| Error::verifier("scripted", format!("no answer for '{}'", claim)))
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }
}
