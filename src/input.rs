//! Audit input loading.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

use crate::budget::types::Span;
use crate::error::{Error, Result};

/// Separator for spans passed inline on the command line.
pub const INLINE_SPAN_SEPARATOR: &str = ";;";

/// An answer to audit plus the evidence texts it may cite.
///
/// Span positions are significant: `[S3]` in the answer cites `spans[3]`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditInput {
    #[serde(default)]
    pub answer: String,
    #[serde(default)]
    pub spans: Vec<String>,
}

impl AuditInput {
    pub fn new(answer: impl Into<String>, spans: Vec<String>) -> Self {
        Self {
            answer: answer.into(),
            spans,
        }
    }

    /// Input from an answer and a `;;`-separated span list.
    ///
    /// Spans are kept verbatim, including empty ones, so positions match the
    /// markers in the answer.
    pub fn from_inline(answer: impl Into<String>, spans: &str) -> Self {
        Self::new(
            answer,
            spans
                .split(INLINE_SPAN_SEPARATOR)
                .map(str::to_string)
                .collect(),
        )
    }

    /// Parse a `{"answer": ..., "spans": [...]}` document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::Input(format!("invalid input document: {}", e)))
    }

    /// Load a `{"answer": ..., "spans": [...]}` document from disk.
    pub async fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = tokio::fs::read_to_string(path).await?;
        let input = Self::from_json_str(&contents)?;
        debug!(path = %path.display(), spans = input.spans.len(), "Loaded audit input");
        Ok(input)
    }

    /// Spans with `S<position>` identifiers.
    pub fn spans(&self) -> Vec<Span> {
        Span::from_texts(self.spans.iter().cloned())
    }
}
