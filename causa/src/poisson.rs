//! Univariate Poisson probabilities: cumulative distribution, quantiles and over/under
//! probabilities at half-integer lines.
//!
//! A rate `λ ≤ 0` (or a non-finite rate) is treated as degenerate: all mass sits at zero, so every
//! quantile is `0` and every over-probability is `0`.

/// Upper bound on the count examined by [`quantile`], so that the search terminates for any `λ`.
pub const MAX_K: u16 = 60;

#[inline]
pub fn is_degenerate(lambda: f64) -> bool {
    !(lambda > 0.0 && lambda.is_finite())
}

/// `P(X ≤ k)`, accumulated term by term from `k = 0` upward.
pub fn cdf(k: u16, lambda: f64) -> f64 {
    if is_degenerate(lambda) {
        return 1.0;
    }
    let mut prob = f64::exp(-lambda);
    let mut cumulative = prob;
    for i in 1..=k {
        prob *= lambda / i as f64;
        cumulative += prob;
    }
    f64::min(cumulative, 1.0)
}

/// The smallest `k` such that `P(X ≤ k) ≥ q`, capped at [`MAX_K`].
pub fn quantile(lambda: f64, q: f64) -> u16 {
    if is_degenerate(lambda) {
        return 0;
    }
    let mut k = 0;
    let mut prob = f64::exp(-lambda);
    let mut cumulative = prob;
    while cumulative < q && k < MAX_K {
        k += 1;
        prob *= lambda / k as f64;
        cumulative += prob;
    }
    k
}

/// Probability that the realised count exceeds `threshold`; "over 9.5" is `P(X ≥ 10)`.
pub fn over(threshold: f64, lambda: f64) -> f64 {
    if is_degenerate(lambda) {
        return 0.0;
    }
    if threshold < 0.0 {
        return 1.0;
    }
    f64::max(0.0, 1.0 - cdf(threshold.floor() as u16, lambda))
}

/// Complement of [`over`]: "under 9.5" is `P(X ≤ 9)`.
pub fn under(threshold: f64, lambda: f64) -> f64 {
    1.0 - over(threshold, lambda)
}
