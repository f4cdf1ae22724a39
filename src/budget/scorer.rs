//! Budget scoring for a single claim.
//!
//! For a claim C with assembled evidence context E:
//!
//! 1. **p1**: verifier belief in C given E
//! 2. **baseline**: the configured prior, or the verifier's belief given the
//!    scrubbed context when [`CounterfactualMode::Scrubbed`] is selected and
//!    scrubbing removed some evidence. A claim with nothing to scrub falls
//!    back to the prior and is labeled reused.
//! 3. **observed_bits** = KL(p1 || baseline)
//! 4. **required_bits** = KL(target_confidence || baseline)
//! 5. **gap** = required_bits - observed_bits, flagged above the threshold

use tokio::sync::watch;
use tokio::time::timeout;
use tracing::{debug, error, warn};

use crate::config::AuditConfig;
use crate::error::Error;
use crate::verifier::Verifier;

use super::evidence::{scrub, ClaimContext};
use super::kl::{bernoulli_kl_bits, required_bits};
use super::types::{BudgetResult, Claim, CounterfactualMode, Interpretation, Judgment, ProbabilityPair};

/// Bit accounting for one claim, independent of any verifier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BitBudget {
    pub observed_bits: f64,
    pub required_bits: f64,
    pub gap: f64,
    pub flagged: bool,
    pub interpretation: Interpretation,
}

impl BitBudget {
    /// Compute the budget for posterior `p1` against `baseline`.
    pub fn compute(p1: f64, baseline: f64, target_confidence: f64, threshold_bits: f64) -> Self {
        let observed_bits = bernoulli_kl_bits(p1, baseline);
        let required_bits = required_bits(target_confidence, baseline);
        let gap = required_bits - observed_bits;

        Self {
            observed_bits,
            required_bits,
            gap,
            flagged: gap > threshold_bits,
            interpretation: Interpretation::from_gap(gap),
        }
    }
}

/// Scores claims against a verifier.
#[derive(Debug, Clone)]
pub struct BudgetScorer {
    config: AuditConfig,
}

impl Default for BudgetScorer {
    fn default() -> Self {
        Self::new(AuditConfig::default())
    }
}

impl BudgetScorer {
    pub fn new(config: AuditConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AuditConfig {
        &self.config
    }

    /// Query the verifier, mapping failures and timeouts to a degraded
    /// judgment. Never fails.
    pub async fn judge<V: Verifier + ?Sized>(
        &self,
        verifier: &V,
        claim: &str,
        context: &str,
    ) -> Judgment {
        match timeout(self.config.query_timeout(), verifier.probability(claim, context)).await {
            Ok(Ok(p)) => Judgment::observed(p),
            Ok(Err(e)) => {
                if e.is_soft() {
                    warn!(verifier = verifier.name(), error = %e, "Verifier failed; using neutral probability");
                } else {
                    error!(verifier = verifier.name(), error = %e, "Unexpected verifier error; using neutral probability");
                }
                Judgment::degraded(e.to_string())
            }
            Err(_) => {
                let e = Error::timeout(self.config.query_timeout_ms);
                warn!(verifier = verifier.name(), error = %e, "Verifier timed out; using neutral probability");
                Judgment::degraded(e.to_string())
            }
        }
    }

    /// Score a claim given its full and scrubbed contexts.
    pub async fn score<V: Verifier + ?Sized>(
        &self,
        claim: &Claim,
        context: &ClaimContext,
        verifier: &V,
    ) -> BudgetResult {
        let with_evidence = self.judge(verifier, &claim.text, &context.full).await;
        let without_evidence = if self.needs_scrubbed_query(context) {
            Some(self.judge(verifier, &claim.text, &context.scrubbed).await)
        } else {
            None
        };
        self.finish(claim, with_evidence, without_evidence)
    }

    /// Like [`score`](Self::score), but issues no verifier query once
    /// `shutdown` is true. Returns `None` if any query was withheld.
    pub async fn score_until_shutdown<V: Verifier + ?Sized>(
        &self,
        claim: &Claim,
        context: &ClaimContext,
        verifier: &V,
        shutdown: &watch::Receiver<bool>,
    ) -> Option<BudgetResult> {
        if *shutdown.borrow() {
            return None;
        }
        let with_evidence = self.judge(verifier, &claim.text, &context.full).await;

        let without_evidence = if self.needs_scrubbed_query(context) {
            if *shutdown.borrow() {
                debug!(claim = claim.index, "Shutdown before scrubbed query");
                return None;
            }
            Some(self.judge(verifier, &claim.text, &context.scrubbed).await)
        } else {
            None
        };
        Some(self.finish(claim, with_evidence, without_evidence))
    }

    /// A scrubbed query runs only in scrubbed mode and only when scrubbing
    /// changed the context; otherwise it would repeat the first query.
    fn needs_scrubbed_query(&self, context: &ClaimContext) -> bool {
        self.config.counterfactual == CounterfactualMode::Scrubbed && context.scrubbed != context.full
    }

    /// Without a scrubbed judgment the pair is labeled reused and the prior is
    /// the baseline, whatever the configured mode.
    fn finish(
        &self,
        claim: &Claim,
        with_evidence: Judgment,
        without_evidence: Option<Judgment>,
    ) -> BudgetResult {
        let probabilities = match &without_evidence {
            Some(without) => {
                ProbabilityPair::scrubbed(with_evidence.probability(), without.probability())
            }
            None => ProbabilityPair::reused(with_evidence.probability()),
        };

        let degraded = [Some(&with_evidence), without_evidence.as_ref()]
            .into_iter()
            .flatten()
            .filter_map(|j| j.degraded_reason())
            .collect::<Vec<_>>();
        let degraded = if degraded.is_empty() {
            None
        } else {
            Some(degraded.join("; "))
        };

        self.budget(claim, probabilities, degraded)
    }

    /// Build the result for already-known probabilities.
    pub fn budget(
        &self,
        claim: &Claim,
        probabilities: ProbabilityPair,
        degraded: Option<String>,
    ) -> BudgetResult {
        let baseline = match probabilities.counterfactual {
            CounterfactualMode::Reused => self.config.prior,
            CounterfactualMode::Scrubbed => probabilities.without_evidence,
        };

        let budget = BitBudget::compute(
            probabilities.with_evidence,
            baseline,
            self.config.target_confidence,
            self.config.flag_threshold_bits,
        );

        debug!(
            claim = claim.index,
            p1 = probabilities.with_evidence,
            baseline,
            observed_bits = budget.observed_bits,
            required_bits = budget.required_bits,
            gap = budget.gap,
            flagged = budget.flagged,
            "Scored claim"
        );

        BudgetResult {
            claim_index: claim.index,
            claim: claim.text.clone(),
            probabilities,
            observed_bits: budget.observed_bits,
            required_bits: budget.required_bits,
            gap: budget.gap,
            flagged: budget.flagged,
            interpretation: budget.interpretation,
            degraded,
        }
    }
}

/// Score one claim against a plain context string.
///
/// Uses the reused counterfactual unless `config` selects scrubbing, in which
/// case the scrubbed context is derived from `context` itself.
pub async fn score_claim<V: Verifier + ?Sized>(
    claim: &Claim,
    context: &str,
    verifier: &V,
    config: &AuditConfig,
) -> BudgetResult {
    let claim_context = ClaimContext {
        full: context.to_string(),
        scrubbed: scrub(context, &[context], &config.placeholder),
        resolved_count: usize::from(!context.is_empty()),
    };
    BudgetScorer::new(config.clone())
        .score(claim, &claim_context, verifier)
        .await
}
