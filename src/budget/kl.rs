//! Bernoulli KL divergence for bit budgets.
//!
//! Every quantity in the audit is a divergence between two Bernoulli
//! distributions over the binary {TRUE, FALSE} judgment: how far the
//! verifier's belief moved away from a baseline (observed bits) and how far it
//! would have to move to reach the target confidence (required bits).

/// Clamp applied to probabilities before taking logarithms.
pub const PROBABILITY_EPSILON: f64 = 1e-9;

/// Clamp a probability into `[ε, 1-ε]`.
pub fn clamp_probability(p: f64) -> f64 {
    if p.is_nan() {
        return 0.5;
    }
    p.clamp(PROBABILITY_EPSILON, 1.0 - PROBABILITY_EPSILON)
}

/// Bernoulli KL divergence D_KL(P || Q) in bits.
///
/// D(p, q) = p * log2(p/q) + (1-p) * log2((1-p)/(1-q))
///
/// Returns 0 whenever either input is exactly 0. Otherwise both inputs are
/// clamped to `[ε, 1-ε]` so the result is always finite.
///
/// # Arguments
/// * `p` - Probability after evidence (posterior)
/// * `q` - Baseline probability (prior)
pub fn bernoulli_kl_bits(p: f64, q: f64) -> f64 {
    if p == 0.0 || q == 0.0 {
        return 0.0;
    }

    let p = clamp_probability(p);
    let q = clamp_probability(q);

    let kl = p * (p / q).log2() + (1.0 - p) * ((1.0 - p) / (1.0 - q)).log2();
    // Rounding can leave tiny negatives for p ~= q.
    kl.max(0.0)
}

/// Bits needed to move belief from `prior` to `target_confidence`.
pub fn required_bits(target_confidence: f64, prior: f64) -> f64 {
    bernoulli_kl_bits(target_confidence, prior)
}

/// Binary entropy H(p) in bits.
pub fn binary_entropy_bits(p: f64) -> f64 {
    let p = clamp_probability(p);
    -p * p.log2() - (1.0 - p) * (1.0 - p).log2()
}
