//! Output document for an audit.
//!
//! The document is the stable, machine-readable face of an [`AuditReport`]:
//! a top-level `flagged` verdict, a summary and one detail entry per claim.
//! Gap values are rounded to two decimals here; the report keeps full
//! precision.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::budget::types::{AuditReport, AuditRun, BudgetResult, CounterfactualMode};
use crate::error::Result;

/// Message attached to a run with nothing to audit.
pub const NOTHING_TO_AUDIT: &str =
    "No claims to audit. Cite evidence after each statement with markers such as [S0].";

/// Serialized audit result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportDocument {
    pub flagged: bool,
    pub summary: ReportSummary,
    pub details: Vec<ClaimDetail>,
    /// Present, and zero, only when nothing was audited
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_steps: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run: Option<RunMetadata>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub claims_scored: usize,
    pub flagged_claims: usize,
    pub flagged_idxs: Vec<usize>,
}

/// Per-claim entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimDetail {
    pub idx: usize,
    pub claim: String,
    pub flagged: bool,
    /// Verifier probability with evidence
    pub confidence: f64,
    pub budget_gap: BudgetGap,
    pub counterfactual: CounterfactualMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub degraded: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetGap {
    pub bits: f64,
    pub interpretation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMetadata {
    pub run_id: String,
    pub completed_at: DateTime<Utc>,
    pub latency_ms: u64,
}

impl From<&BudgetResult> for ClaimDetail {
    fn from(result: &BudgetResult) -> Self {
        Self {
            idx: result.claim_index,
            claim: result.claim.clone(),
            flagged: result.flagged,
            confidence: result.confidence(),
            budget_gap: BudgetGap {
                bits: round_bits(result.gap),
                interpretation: result.interpretation.to_string(),
            },
            counterfactual: result.probabilities.counterfactual,
            degraded: result.degraded.clone(),
        }
    }
}

impl ReportDocument {
    /// Document for a report. An empty report becomes the nothing-to-audit
    /// document.
    pub fn from_report(report: &AuditReport) -> Self {
        if report.is_empty() {
            return Self::nothing_to_audit();
        }

        Self {
            flagged: report.any_flagged(),
            summary: ReportSummary {
                claims_scored: report.total_claims,
                flagged_claims: report.flagged_claims,
                flagged_idxs: report.flagged_indices.iter().copied().collect(),
            },
            details: report.results.iter().map(ClaimDetail::from).collect(),
            total_steps: None,
            message: None,
            run: None,
        }
    }

    /// Document for a completed run, including its metadata.
    pub fn from_run(run: &AuditRun) -> Self {
        Self {
            run: Some(RunMetadata {
                run_id: run.run_id.clone(),
                completed_at: run.completed_at,
                latency_ms: run.latency_ms,
            }),
            ..Self::from_report(&run.report)
        }
    }

    /// Structured result for input with no claims.
    pub fn nothing_to_audit() -> Self {
        Self {
            flagged: false,
            summary: ReportSummary {
                claims_scored: 0,
                flagged_claims: 0,
                flagged_idxs: Vec::new(),
            },
            details: Vec::new(),
            total_steps: Some(0),
            message: Some(NOTHING_TO_AUDIT.to_string()),
            run: None,
        }
    }

    /// True for the nothing-to-audit document.
    pub fn is_nothing_to_audit(&self) -> bool {
        self.total_steps == Some(0)
    }

    /// Process exit status: 1 if any claim is flagged.
    pub fn exit_code(&self) -> i32 {
        i32::from(self.flagged)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

fn round_bits(bits: f64) -> f64 {
    (bits * 100.0).round() / 100.0
}
