//! # strawberry-audit
//!
//! Information-theoretic auditing of AI-generated claims against the evidence
//! they cite.
//!
//! An answer cites evidence spans with `[S<n>]` markers. Each cited statement
//! becomes a claim; a verifier model estimates how likely the claim is true
//! given its evidence, and the auditor compares the bits of belief the
//! evidence actually bought against the bits needed to assert the claim with
//! the target confidence. Claims whose gap exceeds the threshold are flagged.
//!
//! ## Core Components
//!
//! - **Budget**: claim parsing, evidence resolution, KL budgets and batch
//!   aggregation
//! - **Verifier**: the probability-estimation boundary and its OpenAI-compatible
//!   backend
//! - **Report**: the JSON output document and process exit status
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use strawberry_audit::{Aggregator, AuditConfig, OpenAIVerifier, ReportDocument};
//!
//! let verifier = Arc::new(OpenAIVerifier::from_env()?);
//! let aggregator = Aggregator::new(verifier, AuditConfig::default())?;
//!
//! let (_tx, shutdown) = tokio::sync::watch::channel(false);
//! let run = aggregator
//!     .audit_answer("Imports are unused. [S0]", &["import os  # used on line 40".into()], shutdown)
//!     .await?;
//!
//! let doc = ReportDocument::from_run(&run);
//! println!("{}", doc.to_json_pretty()?);
//! std::process::exit(doc.exit_code());
//! ```

pub mod budget;
pub mod cli;
pub mod config;
pub mod error;
pub mod input;
pub mod report;
pub mod verifier;

// Re-exports for convenience
pub use budget::{
    parse_claims, Aggregator, AuditReport, AuditRun, BudgetResult, BudgetScorer, Claim,
    ClaimParser, CounterfactualMode, EvidenceStore, Interpretation, Judgment, ProbabilityPair,
    Span,
};
pub use config::AuditConfig;
pub use error::{Error, Result};
pub use input::AuditInput;
pub use report::ReportDocument;
pub use verifier::{CachedVerifier, OpenAIVerifier, Verifier, VerifierConfig};
