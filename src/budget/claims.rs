//! Claim parsing from cited answers.
//!
//! Answers cite evidence with markers of the form `[S<digits>]`. A statement
//! ends at a sentence boundary that carries citations: a terminator or line
//! break followed by a run of markers (`done. [S0]`), or a run of markers
//! followed by a terminator (`done [S0].`). Markers inside a sentence do not
//! split it; they are collected and stripped with the rest of the statement.
//! Blank lines also close a statement; text after the last cited boundary in
//! a paragraph becomes a claim with no citations.

use regex::Regex;
use tracing::debug;

use super::types::Claim;

/// Extract cited claims from answer text.
pub struct ClaimParser {
    /// A cited sentence boundary, including trailing punctuation
    anchor_re: Regex,
    /// A single marker, capturing the digits
    marker_re: Regex,
    /// A marker with the whitespace in front of it, for stripping
    strip_re: Regex,
    /// Paragraph separator
    paragraph_re: Regex,
}

impl Default for ClaimParser {
    fn default() -> Self {
        Self::new()
    }
}

impl ClaimParser {
    /// Create a new claim parser.
    pub fn new() -> Self {
        Self {
            anchor_re: Regex::new(r"[.!?\n](?:\s*\[S\d+\])+[.!?;:,]*|(?:\s*\[S\d+\])+[.!?]+")
                .expect("valid anchor regex"),
            marker_re: Regex::new(r"\[S(\d+)\]").expect("valid marker regex"),
            strip_re: Regex::new(r"\s*\[S\d+\]").expect("valid strip regex"),
            paragraph_re: Regex::new(r"\n[ \t\r]*\n").expect("valid paragraph regex"),
        }
    }

    /// Parse claims in input order, indexed densely from 0.
    ///
    /// Segments that are empty once markers are stripped are dropped.
    pub fn parse(&self, text: &str) -> Vec<Claim> {
        let mut claims = Vec::new();

        for segment in self.segments(text) {
            let cited = self.citations(segment);
            let stripped = self.strip_re.replace_all(segment, "");
            let trimmed = stripped.trim();

            if trimmed.is_empty() {
                continue;
            }

            claims.push(Claim::new(claims.len(), trimmed, cited));
        }

        debug!("Parsed {} claims", claims.len());
        claims
    }

    /// Citation indices in order of appearance.
    ///
    /// Digit runs too large for `usize` cannot address any span and are
    /// skipped.
    pub fn citations(&self, segment: &str) -> Vec<usize> {
        self.marker_re
            .captures_iter(segment)
            .filter_map(|cap| match cap[1].parse::<usize>() {
                Ok(idx) => Some(idx),
                Err(_) => {
                    debug!("Ignoring unaddressable citation [S{}]", &cap[1]);
                    None
                }
            })
            .collect()
    }

    fn segments<'a>(&self, text: &'a str) -> Vec<&'a str> {
        let mut segments = Vec::new();

        for paragraph in self.paragraph_re.split(text) {
            let mut start = 0;
            for anchor in self.anchor_re.find_iter(paragraph) {
                segments.push(&paragraph[start..anchor.end()]);
                start = anchor.end();
            }
            if start < paragraph.len() {
                segments.push(&paragraph[start..]);
            }
        }

        segments
    }
}

/// Parse claims with a default parser.
pub fn parse_claims(text: &str) -> Vec<Claim> {
    ClaimParser::new().parse(text)
}
