//! Batch auditing with bounded parallelism.
//!
//! Each claim is resolved against the evidence store and scored
//! independently. At most `max_concurrency` claims query the verifier at once.
//! Results are reordered by claim index after collection, so completion order
//! never leaks into the report.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use futures::future::join_all;
use tokio::sync::{watch, Semaphore};
use tracing::{info, instrument, warn};

use crate::config::AuditConfig;
use crate::error::{Error, Result};
use crate::verifier::Verifier;

use super::claims::ClaimParser;
use super::evidence::EvidenceStore;
use super::scorer::BudgetScorer;
use super::types::{AuditReport, AuditRun, BudgetResult, Claim, Span};

/// Runs the budget scorer over batches of claims.
pub struct Aggregator<V: Verifier + ?Sized> {
    verifier: Arc<V>,
    scorer: BudgetScorer,
}

impl<V: Verifier + ?Sized> Aggregator<V> {
    /// Create an aggregator. Fails on invalid configuration, before any
    /// claim is scored.
    pub fn new(verifier: Arc<V>, config: AuditConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            verifier,
            scorer: BudgetScorer::new(config),
        })
    }

    pub fn config(&self) -> &AuditConfig {
        self.scorer.config()
    }

    /// Score every claim. Verifier failures degrade individual results and
    /// never abort the batch.
    pub async fn run(&self, claims: &[Claim], spans: &[Span]) -> AuditReport {
        let results = self.collect(claims, spans, None).await;
        AuditReport::from_results(results.into_iter().flatten().collect())
    }

    /// Score every claim unless `shutdown` turns true first.
    ///
    /// Once shutdown is observed no new verifier calls are issued; calls
    /// already in flight finish or time out. A cancelled batch returns
    /// [`Error::Cancelled`] instead of a partial report.
    pub async fn run_until_shutdown(
        &self,
        claims: &[Claim],
        spans: &[Span],
        shutdown: watch::Receiver<bool>,
    ) -> Result<AuditReport> {
        let results = self.collect(claims, spans, Some(&shutdown)).await;
        let scored: Vec<BudgetResult> = results.into_iter().flatten().collect();

        if scored.len() < claims.len() {
            warn!(
                completed = scored.len(),
                total = claims.len(),
                "Audit cancelled; discarding partial results"
            );
            return Err(Error::Cancelled {
                completed: scored.len(),
                total: claims.len(),
            });
        }

        Ok(AuditReport::from_results(scored))
    }

    /// Parse an answer, score its claims and wrap the report with run
    /// metadata. An answer without claims yields an empty report.
    #[instrument(skip_all, fields(spans = span_texts.len()))]
    pub async fn audit_answer(
        &self,
        answer: &str,
        span_texts: &[String],
        shutdown: watch::Receiver<bool>,
    ) -> Result<AuditRun> {
        let start = Instant::now();
        let run_id = uuid::Uuid::new_v4().to_string();

        let claims = ClaimParser::new().parse(answer);
        let spans = Span::from_texts(span_texts.iter().cloned());

        let report = if claims.is_empty() {
            info!("No claims found; nothing to audit");
            AuditReport::empty()
        } else {
            self.run_until_shutdown(&claims, &spans, shutdown).await?
        };

        let latency_ms = start.elapsed().as_millis() as u64;
        info!(
            run_id = %run_id,
            claims = report.total_claims,
            flagged = report.flagged_claims,
            degraded = report.degraded_claims(),
            latency_ms,
            "Audit complete"
        );

        Ok(AuditRun {
            run_id,
            report,
            completed_at: Utc::now(),
            latency_ms,
        })
    }

    /// One slot per claim; `None` marks a claim skipped after shutdown.
    async fn collect(
        &self,
        claims: &[Claim],
        spans: &[Span],
        shutdown: Option<&watch::Receiver<bool>>,
    ) -> Vec<Option<BudgetResult>> {
        if claims.is_empty() {
            return Vec::new();
        }

        let config = self.scorer.config();
        let store = EvidenceStore::new(spans.to_vec()).with_placeholder(config.placeholder.clone());
        let semaphore = Semaphore::new(config.max_concurrency);

        let tasks = claims.iter().map(|claim| {
            let store = &store;
            let semaphore = &semaphore;

            async move {
                // The semaphore is never closed.
                let _permit = semaphore.acquire().await.ok()?;

                let context = store.contexts(&claim.cited_span_ids);
                let verifier = self.verifier.as_ref();
                match shutdown {
                    Some(rx) => {
                        self.scorer
                            .score_until_shutdown(claim, &context, verifier, rx)
                            .await
                    }
                    None => Some(self.scorer.score(claim, &context, verifier).await),
                }
            }
        });

        join_all(tasks).await
    }
}
