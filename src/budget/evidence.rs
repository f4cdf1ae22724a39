//! Evidence resolution and scrubbing.
//!
//! Citations address spans by position. Resolved texts are joined into the
//! context shown to the verifier; scrubbing replaces those same texts with a
//! placeholder to build the counterfactual context.

use std::collections::HashSet;

use tracing::warn;

use super::types::Span;

/// Default placeholder for scrubbed evidence.
pub const DEFAULT_PLACEHOLDER: &str = "[REDACTED]";

/// Separator between resolved evidence texts in an assembled context.
pub const CONTEXT_SEPARATOR: &str = "\n\n";

/// Resolve citation indices against ordered spans.
///
/// Out-of-range indices are dropped with a warning; the order of the
/// remaining citations is preserved.
pub fn resolve<'a>(citation_indices: &[usize], ordered_spans: &'a [Span]) -> Vec<&'a str> {
    citation_indices
        .iter()
        .filter_map(|&idx| match ordered_spans.get(idx) {
            Some(span) => Some(span.text.as_str()),
            None => {
                warn!(
                    citation = idx,
                    available = ordered_spans.len(),
                    "Dropping citation [S{}]: no such span",
                    idx
                );
                None
            }
        })
        .collect()
}

/// Join resolved texts with a blank line, preserving citation order.
pub fn assemble_context<S: AsRef<str>>(resolved_texts: &[S]) -> String {
    resolved_texts
        .iter()
        .map(|t| t.as_ref())
        .collect::<Vec<_>>()
        .join(CONTEXT_SEPARATOR)
}

/// Replace every literal occurrence of each evidence text with `placeholder`.
///
/// Distinct texts are processed once each, longest first, so a span that
/// contains another is replaced whole. Empty texts are ignored.
pub fn scrub<S: AsRef<str>>(context: &str, evidence_texts: &[S], placeholder: &str) -> String {
    let mut seen = HashSet::new();
    let mut distinct: Vec<&str> = evidence_texts
        .iter()
        .map(|t| t.as_ref())
        .filter(|t| !t.is_empty() && seen.insert(*t))
        .collect();
    // Stable for equal lengths, so input order breaks ties.
    distinct.sort_by(|a, b| b.len().cmp(&a.len()));

    let mut scrubbed = context.to_string();
    for text in distinct {
        if scrubbed.contains(text) {
            scrubbed = scrubbed.replace(text, placeholder);
        }
    }
    scrubbed
}

/// Evidence spans for one audit run.
#[derive(Debug, Clone, Default)]
pub struct EvidenceStore {
    spans: Vec<Span>,
    placeholder: String,
}

impl EvidenceStore {
    /// Create a store over ordered spans.
    pub fn new(spans: Vec<Span>) -> Self {
        Self {
            spans,
            placeholder: DEFAULT_PLACEHOLDER.to_string(),
        }
    }

    /// Create a store from ordered texts, assigning `S<n>` identifiers.
    pub fn from_texts<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(Span::from_texts(texts))
    }

    /// Set the scrub placeholder.
    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = placeholder.into();
        self
    }

    pub fn spans(&self) -> &[Span] {
        &self.spans
    }

    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    /// Look up a span by its identifier.
    pub fn get(&self, id: &str) -> Option<&Span> {
        self.spans.iter().find(|s| s.id == id)
    }

    /// Resolve citation indices to span texts.
    pub fn resolve(&self, citation_indices: &[usize]) -> Vec<&str> {
        resolve(citation_indices, &self.spans)
    }

    /// Build the full and scrubbed contexts for a set of citations.
    pub fn contexts(&self, citation_indices: &[usize]) -> ClaimContext {
        let resolved = self.resolve(citation_indices);
        let full = assemble_context(&resolved);
        let scrubbed = scrub(&full, &resolved, &self.placeholder);

        ClaimContext {
            full,
            scrubbed,
            resolved_count: resolved.len(),
        }
    }
}

/// Verifier contexts for one claim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimContext {
    /// Resolved evidence joined in citation order
    pub full: String,
    /// `full` with every resolved text replaced by the placeholder
    pub scrubbed: String,
    /// Number of citations that resolved
    pub resolved_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spans() -> Vec<Span> {
        Span::from_texts(["import os", "def f(): return 1"])
    }

    #[test]
    fn test_resolve_preserves_order() {
        let spans = spans();
        assert_eq!(resolve(&[1, 0], &spans), vec!["def f(): return 1", "import os"]);
    }

    #[test]
    fn test_resolve_drops_out_of_range() {
        let spans = spans();
        assert!(resolve(&[5], &spans).is_empty());
        assert_eq!(resolve(&[0, 5, 1], &spans).len(), 2);
    }

    #[test]
    fn test_assemble_context() {
        assert_eq!(assemble_context(&["a", "b"]), "a\n\nb");
        assert_eq!(assemble_context::<&str>(&[]), "");
    }

    #[test]
    fn test_scrub_replaces_every_occurrence() {
        let scrubbed = scrub("x = 1; x = 1; y", &["x = 1"], "[REDACTED]");
        assert_eq!(scrubbed, "[REDACTED]; [REDACTED]; y");
    }

    #[test]
    fn test_scrub_longest_first() {
        // "os" is contained in "import os"; the longer text wins.
        let scrubbed = scrub("import os\n\nos", &["os", "import os"], "<>");
        assert_eq!(scrubbed, "<>\n\n<>");
    }

    #[test]
    fn test_scrub_ignores_empty_and_duplicates() {
        let scrubbed = scrub("abc", &["", "b", "b"], "_");
        assert_eq!(scrubbed, "a_c");
    }

    #[test]
    fn test_store_contexts() {
        let store = EvidenceStore::from_texts(["import os", "print(1)"]).with_placeholder("[X]");
        let ctx = store.contexts(&[0, 1, 7]);
        assert_eq!(ctx.full, "import os\n\nprint(1)");
        assert_eq!(ctx.scrubbed, "[X]\n\n[X]");
        assert_eq!(ctx.resolved_count, 2);
        assert_eq!(store.get("S1").map(|s| s.text.as_str()), Some("print(1)"));
    }

    #[test]
    fn test_store_uncited_claim_has_empty_context() {
        let store = EvidenceStore::from_texts(["a"]);
        let ctx = store.contexts(&[]);
        assert_eq!(ctx.full, "");
        assert_eq!(ctx.scrubbed, "");
        assert_eq!(ctx.resolved_count, 0);
    }
}
