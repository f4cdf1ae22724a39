//! Memoization of verifier judgments.
//!
//! Identical (verifier, claim, context) queries return the stored probability
//! instead of hitting the backend again. Only successful judgments are
//! stored, so a transient failure is retried on the next query.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::Result;

use super::Verifier;

/// Cache key for a judgment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey(pub String);

impl CacheKey {
    /// Generate a cache key from the verifier name, claim and context.
    pub fn generate(verifier: &str, claim: &str, context: &str) -> Self {
        let mut hasher = Sha256::new();

        hasher.update(b"verifier:");
        hasher.update(verifier.as_bytes());
        hasher.update(b"\n");
        hasher.update(format!("claim:{}:", claim.len()).as_bytes());
        hasher.update(claim.as_bytes());
        hasher.update(b"\n");
        hasher.update(format!("context:{}:", context.len()).as_bytes());
        hasher.update(context.as_bytes());

        let hash = hasher.finalize();
        CacheKey(format!("{:x}", hash))
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", &self.0[..16.min(self.0.len())])
    }
}

/// Cache statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entry_count: u64,
}

impl CacheStats {
    /// Calculate hit rate.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Verifier wrapper that memoizes successful judgments.
pub struct CachedVerifier<V: Verifier> {
    inner: V,
    entries: RwLock<HashMap<CacheKey, f64>>,
    stats: RwLock<CacheStats>,
}

impl<V: Verifier> CachedVerifier<V> {
    pub fn new(inner: V) -> Self {
        Self {
            inner,
            entries: RwLock::new(HashMap::new()),
            stats: RwLock::new(CacheStats::default()),
        }
    }

    pub fn inner(&self) -> &V {
        &self.inner
    }

    /// Get current statistics.
    pub async fn stats(&self) -> CacheStats {
        self.stats.read().await.clone()
    }

    /// Drop all stored judgments.
    pub async fn clear(&self) {
        self.entries.write().await.clear();
        self.stats.write().await.entry_count = 0;
    }
}

#[async_trait]
impl<V: Verifier> Verifier for CachedVerifier<V> {
    async fn probability(&self, claim: &str, context: &str) -> Result<f64> {
        let key = CacheKey::generate(self.inner.name(), claim, context);

        if let Some(p) = self.entries.read().await.get(&key).copied() {
            self.stats.write().await.hits += 1;
            debug!(key = %key, "Verifier cache hit");
            return Ok(p);
        }

        self.stats.write().await.misses += 1;
        let p = self.inner.probability(claim, context).await?;

        let mut entries = self.entries.write().await;
        entries.insert(key, p);
        self.stats.write().await.entry_count = entries.len() as u64;
        Ok(p)
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}
