//! Information budget auditing.
//!
//! A claim is only as credible as the evidence it cites. For each claim the
//! auditor measures how far the cited evidence moved the verifier's belief
//! (in bits of KL divergence) and compares that against the bits needed to
//! reach the confidence the claim is asserted with:
//!
//! 1. **p1**: P(claim | cited evidence)
//! 2. **baseline**: the prior, or P(claim | scrubbed context)
//! 3. **observed_bits** = KL(p1 || baseline)
//! 4. **required_bits** = KL(target_confidence || baseline)
//! 5. **gap** = required_bits - observed_bits
//!
//! A positive gap means the claim asserts more than its evidence supports.
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use strawberry_audit::budget::{parse_claims, Aggregator};
//! use strawberry_audit::{AuditConfig, Span};
//!
//! let aggregator = Aggregator::new(Arc::new(verifier), AuditConfig::default())?;
//! let claims = parse_claims("Imports are unused. [S0]");
//! let spans = Span::from_texts(["import os  # used on line 40"]);
//!
//! let report = aggregator.run(&claims, &spans).await;
//! for result in &report.results {
//!     println!("{}: gap={:.2} ({})", result.claim, result.gap, result.interpretation);
//! }
//! ```

pub mod aggregator;
pub mod claims;
pub mod evidence;
pub mod kl;
pub mod scorer;
pub mod types;

#[cfg(test)]
mod proptest;

pub use aggregator::Aggregator;
pub use claims::{parse_claims, ClaimParser};
pub use evidence::{assemble_context, resolve, scrub, ClaimContext, EvidenceStore};
pub use kl::{bernoulli_kl_bits, binary_entropy_bits, clamp_probability, required_bits};
pub use scorer::{score_claim, BitBudget, BudgetScorer};
pub use types::{
    AuditReport, AuditRun, BudgetResult, Claim, CounterfactualMode, Interpretation, Judgment,
    ProbabilityPair, Span,
};
