//! Property-based tests for budget auditing using proptest.
//!
//! These cover the invariants the report relies on: KL divergence is
//! non-negative and vanishes for identical beliefs, observed bits grow as the
//! posterior moves away from the baseline, the gap is a pure function of its
//! inputs, and every parsed claim is scored exactly once.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use proptest::prelude::*;

    use crate::budget::aggregator::Aggregator;
    use crate::budget::claims::parse_claims;
    use crate::budget::kl::{bernoulli_kl_bits, binary_entropy_bits};
    use crate::budget::scorer::BitBudget;
    use crate::budget::types::{Interpretation, Span};
    use crate::config::AuditConfig;
    use crate::verifier::testing::FixedVerifier;

    fn probability() -> impl Strategy<Value = f64> {
        0.01f64..0.99f64
    }

    fn probability_with_edges() -> impl Strategy<Value = f64> {
        prop_oneof![
            Just(0.0),
            Just(1e-12),
            Just(0.5),
            Just(1.0 - 1e-12),
            Just(1.0),
            0.01f64..0.99f64,
        ]
    }

    /// One sentence of lowercase words closed by one or two citation markers.
    fn cited_sentence() -> impl Strategy<Value = String> {
        (
            "[a-z]{1,8}( [a-z]{1,8}){0,4}",
            prop::collection::vec(0usize..5, 1..=2),
        )
            .prop_map(|(words, cites)| {
                let markers: String = cites.iter().map(|i| format!("[S{}]", i)).collect();
                format!("{}. {}", words, markers)
            })
    }

    fn block_on<F: std::future::Future>(future: F) -> F::Output {
        tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .unwrap()
            .block_on(future)
    }

    // =========================================================================
    // KL Divergence
    // =========================================================================

    proptest! {
        #[test]
        fn kl_is_non_negative(p in probability_with_edges(), q in probability_with_edges()) {
            let kl = bernoulli_kl_bits(p, q);
            prop_assert!(kl >= 0.0, "D({}, {}) = {} should be >= 0", p, q, kl);
            prop_assert!(kl.is_finite());
        }

        #[test]
        fn kl_vanishes_for_identical_beliefs(p in probability_with_edges()) {
            let kl = bernoulli_kl_bits(p, p);
            prop_assert!(kl.abs() < 1e-9, "D({}, {}) = {} should be ~0", p, p, kl);
        }

        #[test]
        fn kl_grows_as_posterior_moves_away(
            baseline in 0.01f64..0.5,
            a in 0.5f64..0.98,
            step in 0.001f64..0.01,
        ) {
            let near = bernoulli_kl_bits(a, baseline);
            let far = bernoulli_kl_bits(a + step, baseline);
            prop_assert!(far > near, "D({}) = {} should exceed D({}) = {}", a + step, far, a, near);
        }

        #[test]
        fn entropy_is_bounded(p in probability()) {
            let h = binary_entropy_bits(p);
            prop_assert!((0.0..=1.0 + 1e-12).contains(&h));
        }
    }

    // =========================================================================
    // Budget
    // =========================================================================

    proptest! {
        #[test]
        fn gap_is_deterministic(
            p1 in probability_with_edges(),
            baseline in probability(),
            target in probability(),
        ) {
            let a = BitBudget::compute(p1, baseline, target, 2.0);
            let b = BitBudget::compute(p1, baseline, target, 2.0);
            prop_assert_eq!(a, b);
            prop_assert!((a.gap - (a.required_bits - a.observed_bits)).abs() < 1e-12);
        }

        #[test]
        fn flag_matches_threshold(
            p1 in probability(),
            baseline in probability(),
            threshold in -5.0f64..5.0,
        ) {
            let budget = BitBudget::compute(p1, baseline, 0.95, threshold);
            prop_assert_eq!(budget.flagged, budget.gap > threshold);
        }

        #[test]
        fn interpretation_tracks_gap(p1 in probability(), baseline in probability()) {
            let budget = BitBudget::compute(p1, baseline, 0.95, 2.0);
            let expected = if budget.gap < 0.0 {
                Interpretation::WellSupported
            } else if budget.gap < 2.0 {
                Interpretation::MinorExtrapolation
            } else if budget.gap < 10.0 {
                Interpretation::Suspicious
            } else {
                Interpretation::LikelyHallucination
            };
            prop_assert_eq!(budget.interpretation, expected);
        }
    }

    // =========================================================================
    // Parsing and aggregation
    // =========================================================================

    proptest! {
        #[test]
        fn every_cited_sentence_becomes_one_claim(
            sentences in prop::collection::vec(cited_sentence(), 1..6)
        ) {
            let claims = parse_claims(&sentences.join(" "));
            prop_assert_eq!(claims.len(), sentences.len());
            for (i, claim) in claims.iter().enumerate() {
                prop_assert_eq!(claim.index, i);
                prop_assert!(!claim.text.contains("[S"));
                prop_assert!(!claim.cited_span_ids.is_empty());
            }
        }

        #[test]
        fn every_claim_is_scored(
            sentences in prop::collection::vec(cited_sentence(), 0..6),
            p in probability_with_edges(),
        ) {
            let claims = parse_claims(&sentences.join(" "));
            let spans = Span::from_texts(["a", "b", "c"]);
            let aggregator =
                Aggregator::new(Arc::new(FixedVerifier::new(p)), AuditConfig::default()).unwrap();

            let report = block_on(aggregator.run(&claims, &spans));

            prop_assert_eq!(report.total_claims, claims.len());
            prop_assert_eq!(report.flagged_claims, report.flagged_indices.len());
            prop_assert!(report.flagged_indices.iter().all(|i| *i < claims.len()));
        }
    }
}
