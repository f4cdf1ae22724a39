//! Core types for budget auditing.
//!
//! Fixed-shape records for evidence spans, parsed claims, verifier judgments,
//! per-claim budget results and the aggregated audit report.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A unit of verbatim evidence text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    /// Identifier, unique within one audit run (`S0`, `S1`, ...)
    pub id: String,
    /// Verbatim content
    pub text: String,
}

impl Span {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
        }
    }

    /// Build spans from ordered texts, assigning `S<position>` identifiers.
    pub fn from_texts<I, S>(texts: I) -> Vec<Span>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        texts
            .into_iter()
            .enumerate()
            .map(|(i, text)| Span::new(format!("S{}", i), text))
            .collect()
    }
}

/// An atomic assertion extracted from an answer.
///
/// A claim with no citations is valid; it is scored against an empty context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claim {
    /// Dense position among emitted claims, starting at 0
    pub index: usize,
    /// Claim text with citation markers stripped
    pub text: String,
    /// Cited span positions in order of appearance
    pub cited_span_ids: Vec<usize>,
}

impl Claim {
    pub fn new(index: usize, text: impl Into<String>, cited_span_ids: Vec<usize>) -> Self {
        Self {
            index,
            text: text.into(),
            cited_span_ids,
        }
    }

    /// Whether the claim cites no evidence at all.
    pub fn is_unsupported(&self) -> bool {
        self.cited_span_ids.is_empty()
    }
}

/// Outcome of one verifier query after the error-to-neutral mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Judgment {
    /// The verifier answered with a probability
    Observed { probability: f64 },
    /// The verifier failed or timed out; treated as uninformative (0.5)
    Degraded { reason: String },
}

impl Judgment {
    /// Probability used when a query could not be answered.
    pub const NEUTRAL: f64 = 0.5;

    /// Observed probability, limited to `[0, 1]`. NaN is treated as neutral.
    pub fn observed(probability: f64) -> Self {
        let probability = if probability.is_nan() {
            Self::NEUTRAL
        } else {
            probability.clamp(0.0, 1.0)
        };
        Self::Observed { probability }
    }

    pub fn degraded(reason: impl Into<String>) -> Self {
        Self::Degraded {
            reason: reason.into(),
        }
    }

    /// Probability the claim is true; neutral for degraded judgments.
    pub fn probability(&self) -> f64 {
        match self {
            Self::Observed { probability } => *probability,
            Self::Degraded { .. } => Self::NEUTRAL,
        }
    }

    /// Failure reason, if this judgment was degraded.
    pub fn degraded_reason(&self) -> Option<&str> {
        match self {
            Self::Observed { .. } => None,
            Self::Degraded { reason } => Some(reason),
        }
    }
}

/// How the without-evidence probability was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CounterfactualMode {
    /// The with-evidence judgment is reused and the configured prior is the
    /// baseline. No second query is issued.
    #[default]
    Reused,
    /// A second query runs against the scrubbed context; its probability is
    /// the baseline.
    Scrubbed,
}

impl std::fmt::Display for CounterfactualMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Reused => write!(f, "reused"),
            Self::Scrubbed => write!(f, "scrubbed"),
        }
    }
}

impl std::str::FromStr for CounterfactualMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "reused" | "reuse" => Ok(Self::Reused),
            "scrubbed" | "scrub" => Ok(Self::Scrubbed),
            other => Err(format!("unknown counterfactual mode: {}", other)),
        }
    }
}

/// Verifier belief in a claim with and without its evidence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProbabilityPair {
    pub with_evidence: f64,
    pub without_evidence: f64,
    /// Provenance of `without_evidence`
    pub counterfactual: CounterfactualMode,
}

impl ProbabilityPair {
    /// Pair whose without-evidence side reuses the with-evidence value.
    pub fn reused(with_evidence: f64) -> Self {
        Self {
            with_evidence,
            without_evidence: with_evidence,
            counterfactual: CounterfactualMode::Reused,
        }
    }

    pub fn scrubbed(with_evidence: f64, without_evidence: f64) -> Self {
        Self {
            with_evidence,
            without_evidence,
            counterfactual: CounterfactualMode::Scrubbed,
        }
    }
}

/// Human-facing reading of a budget gap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Interpretation {
    /// gap < 0
    WellSupported,
    /// 0 <= gap < 2
    MinorExtrapolation,
    /// 2 <= gap < 10
    Suspicious,
    /// gap >= 10
    LikelyHallucination,
}

impl Interpretation {
    pub fn from_gap(gap: f64) -> Self {
        if gap < 0.0 {
            Self::WellSupported
        } else if gap < 2.0 {
            Self::MinorExtrapolation
        } else if gap < 10.0 {
            Self::Suspicious
        } else {
            Self::LikelyHallucination
        }
    }
}

impl std::fmt::Display for Interpretation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::WellSupported => write!(f, "well-supported"),
            Self::MinorExtrapolation => write!(f, "minor extrapolation"),
            Self::Suspicious => write!(f, "suspicious, manual review"),
            Self::LikelyHallucination => write!(f, "likely hallucination"),
        }
    }
}

/// Result of budget scoring for a single claim.
///
/// `gap = required_bits - observed_bits`; positive means the stated
/// confidence is not paid for by the evidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetResult {
    pub claim_index: usize,
    pub claim: String,
    pub probabilities: ProbabilityPair,
    pub observed_bits: f64,
    pub required_bits: f64,
    pub gap: f64,
    pub flagged: bool,
    pub interpretation: Interpretation,
    /// Reason the verifier judgment was degraded, if it was
    pub degraded: Option<String>,
}

impl BudgetResult {
    /// Verifier's with-evidence belief, reported as the claim's confidence.
    pub fn confidence(&self) -> f64 {
        self.probabilities.with_evidence
    }

    pub fn is_degraded(&self) -> bool {
        self.degraded.is_some()
    }
}

/// Aggregated audit over a batch of claims.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditReport {
    pub total_claims: usize,
    pub flagged_claims: usize,
    pub flagged_indices: BTreeSet<usize>,
    /// Per-claim results in claim-index order
    pub results: Vec<BudgetResult>,
}

impl AuditReport {
    /// Build a report from results collected in any order.
    pub fn from_results(mut results: Vec<BudgetResult>) -> Self {
        results.sort_by_key(|r| r.claim_index);

        let flagged_indices: BTreeSet<usize> = results
            .iter()
            .filter(|r| r.flagged)
            .map(|r| r.claim_index)
            .collect();

        Self {
            total_claims: results.len(),
            flagged_claims: flagged_indices.len(),
            flagged_indices,
            results,
        }
    }

    /// Report for a run with nothing to audit.
    pub fn empty() -> Self {
        Self::from_results(Vec::new())
    }

    /// True when no claims were scored.
    pub fn is_empty(&self) -> bool {
        self.total_claims == 0
    }

    pub fn any_flagged(&self) -> bool {
        self.flagged_claims > 0
    }

    /// Number of results whose verifier judgment was degraded.
    pub fn degraded_claims(&self) -> usize {
        self.results.iter().filter(|r| r.is_degraded()).count()
    }

    /// Process exit status for CLI wrappers: 1 if any claim is flagged.
    pub fn exit_code(&self) -> i32 {
        if self.any_flagged() {
            1
        } else {
            0
        }
    }
}

/// A completed run: the deterministic report plus run metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRun {
    pub run_id: String,
    pub report: AuditReport,
    pub completed_at: DateTime<Utc>,
    pub latency_ms: u64,
}
