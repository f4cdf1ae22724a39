//! Command-line interface for strawberry-audit.
//!
//! Reads an answer and its evidence, audits every cited claim and writes the
//! JSON report to stdout or a file. The process exit status is 1 when any
//! claim is flagged.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{ArgGroup, Parser};
use tokio::sync::watch;
use tracing::{info, warn};

use crate::budget::{parse_claims, Aggregator, CounterfactualMode};
use crate::config::{
    AuditConfig, DEFAULT_FLAG_THRESHOLD_BITS, DEFAULT_MAX_CONCURRENCY, DEFAULT_PRIOR,
    DEFAULT_TARGET_CONFIDENCE,
};
use crate::error::Error;
use crate::input::AuditInput;
use crate::report::ReportDocument;
use crate::verifier::{CachedVerifier, OpenAIVerifier, VerifierConfig, DEFAULT_MODEL};

/// strawberry-audit - Detect claims that outrun their cited evidence
#[derive(Parser, Debug)]
#[command(name = "strawberry-audit")]
#[command(author, version, about, long_about = None)]
#[command(group(ArgGroup::new("source").required(true).args(["answer", "file"])))]
pub struct Cli {
    /// Answer text with [S<n>] citation markers
    #[arg(long, requires = "spans")]
    pub answer: Option<String>,

    /// Evidence spans separated by ";;"
    #[arg(long, requires = "answer")]
    pub spans: Option<String>,

    /// JSON file with {"answer": ..., "spans": [...]}
    #[arg(short, long)]
    pub file: Option<PathBuf>,

    /// Verifier model
    #[arg(long, env = "STRAWBERRY_VERIFIER_MODEL", default_value = DEFAULT_MODEL)]
    pub model: String,

    /// OpenAI-compatible base URL
    #[arg(long, env = "OPENAI_BASE_URL")]
    pub base_url: Option<String>,

    /// API key for the verifier backend
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Confidence each claim is expected to justify
    #[arg(long, default_value_t = DEFAULT_TARGET_CONFIDENCE)]
    pub target_confidence: f64,

    /// Budget gap in bits above which a claim is flagged
    #[arg(long, default_value_t = DEFAULT_FLAG_THRESHOLD_BITS)]
    pub threshold: f64,

    /// Baseline belief before evidence
    #[arg(long, default_value_t = DEFAULT_PRIOR)]
    pub prior: f64,

    /// Query the verifier again with evidence scrubbed to get the baseline
    #[arg(long)]
    pub scrubbed: bool,

    /// Maximum concurrent verifier queries
    #[arg(long, default_value_t = DEFAULT_MAX_CONCURRENCY)]
    pub max_concurrency: usize,

    /// Per-query timeout in milliseconds
    #[arg(long, default_value_t = 30_000)]
    pub timeout_ms: u64,

    /// Write the JSON report here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl Cli {
    /// Run the audit and return the process exit status.
    pub async fn execute(self) -> Result<i32> {
        let input = self.load_input().await?;

        // Nothing to audit needs no verifier.
        if parse_claims(&input.answer).is_empty() {
            return self.emit(&ReportDocument::nothing_to_audit()).await;
        }

        let verifier = OpenAIVerifier::new(self.verifier_config()?)
            .context("Failed to configure verifier")?;
        let aggregator = Aggregator::new(Arc::new(CachedVerifier::new(verifier)), self.audit_config())
            .context("Invalid audit configuration")?;

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted; waiting for in-flight queries");
                let _ = shutdown_tx.send(true);
            }
        });

        let run = aggregator
            .audit_answer(&input.answer, &input.spans, shutdown_rx)
            .await
            .context("Audit did not complete")?;

        self.emit(&ReportDocument::from_run(&run)).await
    }

    /// Scoring configuration from the command line.
    pub fn audit_config(&self) -> AuditConfig {
        let mode = if self.scrubbed {
            CounterfactualMode::Scrubbed
        } else {
            CounterfactualMode::Reused
        };

        AuditConfig::default()
            .with_target_confidence(self.target_confidence)
            .with_prior(self.prior)
            .with_flag_threshold(self.threshold)
            .with_counterfactual(mode)
            .with_max_concurrency(self.max_concurrency)
            .with_query_timeout_ms(self.timeout_ms)
    }

    /// Verifier configuration; a missing key is fatal.
    pub fn verifier_config(&self) -> crate::error::Result<VerifierConfig> {
        let api_key = self
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| Error::config("no API key: pass --api-key or set OPENAI_API_KEY"))?;

        let mut config = VerifierConfig::new(api_key).with_model(&self.model);
        if let Some(url) = &self.base_url {
            config = config.with_base_url(url);
        }
        // The HTTP timeout must not undercut the per-query timeout.
        config = config.with_timeout(self.timeout_ms.div_ceil(1000).max(1));
        config.validate()?;
        Ok(config)
    }

    async fn load_input(&self) -> Result<AuditInput> {
        if let Some(path) = &self.file {
            return AuditInput::from_json_file(path)
                .await
                .with_context(|| format!("Failed to load {}", path.display()));
        }

        match (&self.answer, &self.spans) {
            (Some(answer), Some(spans)) => Ok(AuditInput::from_inline(answer.as_str(), spans)),
            _ => anyhow::bail!("Provide either --file or both --answer and --spans"),
        }
    }

    async fn emit(&self, doc: &ReportDocument) -> Result<i32> {
        let json = doc.to_json_pretty()?;

        match &self.output {
            Some(path) => {
                tokio::fs::write(path, json)
                    .await
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                info!(path = %path.display(), "Results written");
            }
            None => println!("{}", json),
        }

        Ok(doc.exit_code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["strawberry-audit"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_inline_arguments() {
        let cli = parse(&["--answer", "Claim. [S0]", "--spans", "a;;b", "--scrubbed"]);

        assert_eq!(cli.answer.as_deref(), Some("Claim. [S0]"));
        let config = cli.audit_config();
        assert_eq!(config.counterfactual, CounterfactualMode::Scrubbed);
        assert_eq!(config.target_confidence, DEFAULT_TARGET_CONFIDENCE);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_source_is_required() {
        assert!(Cli::try_parse_from(["strawberry-audit"]).is_err());
        assert!(Cli::try_parse_from(["strawberry-audit", "--answer", "x"]).is_err());
        assert!(Cli::try_parse_from([
            "strawberry-audit",
            "--answer",
            "x",
            "--spans",
            "y",
            "--file",
            "doc.json"
        ])
        .is_err());
    }

    #[test]
    fn test_tunables() {
        let cli = parse(&[
            "--file",
            "doc.json",
            "--threshold",
            "1.5",
            "--prior",
            "0.2",
            "--max-concurrency",
            "8",
            "--timeout-ms",
            "2500",
        ]);

        let config = cli.audit_config();
        assert_eq!(config.flag_threshold_bits, 1.5);
        assert_eq!(config.prior, 0.2);
        assert_eq!(config.max_concurrency, 8);
        assert_eq!(config.query_timeout_ms, 2500);
        assert_eq!(config.counterfactual, CounterfactualMode::Reused);
    }

    #[test]
    fn test_verifier_config_from_flags() {
        let cli = parse(&[
            "--file",
            "doc.json",
            "--api-key",
            "sk-test",
            "--model",
            "gpt-4o",
            "--base-url",
            "http://localhost:8080",
            "--timeout-ms",
            "2500",
        ]);

        let config = cli.verifier_config().unwrap();
        assert_eq!(config.api_key, "sk-test");
        assert_eq!(config.model, "gpt-4o");
        assert_eq!(config.base_url.as_deref(), Some("http://localhost:8080"));
        assert_eq!(config.timeout_secs, 3);
    }

    #[test]
    fn test_blank_api_key_is_config_error() {
        let cli = parse(&["--file", "doc.json", "--api-key", "  "]);
        assert!(matches!(cli.verifier_config(), Err(Error::Config(_))));
    }

    #[tokio::test]
    async fn test_nothing_to_audit_skips_verifier() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("report.json");
        let cli = parse(&[
            "--answer",
            "   ",
            "--spans",
            "unused",
            "--output",
            out.to_str().unwrap(),
        ]);

        let code = cli.execute().await.unwrap();

        assert_eq!(code, 0);
        let doc: ReportDocument =
            serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
        assert!(doc.is_nothing_to_audit());
    }
}
