//! Monte Carlo sampling of the sum of two independent Poisson counts, as used to simulate the
//! combined tally of both sides in a match.

use serde::Serialize;
use tinyrand::{Rand, Seeded, StdRand};
use tinyrand_std::ClockSeed;
use tracing::debug;

use crate::poisson;
use crate::stats::SliceExt;

/// Ceiling on a single Poisson draw; guards inversion against rounding near a cumulative of 1.
pub const MAX_DRAW: u16 = 1_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Seed {
    Fixed(u64),
    Fresh,
}
impl Seed {
    pub fn rand(self) -> StdRand {
        match self {
            Seed::Fixed(seed) => StdRand::seed(seed),
            Seed::Fresh => StdRand::seed(ClockSeed::default().next_u64()),
        }
    }
}

impl From<Option<u64>> for Seed {
    fn from(seed: Option<u64>) -> Self {
        seed.map(Seed::Fixed).unwrap_or(Seed::Fresh)
    }
}

#[inline]
pub fn random_f64(rand: &mut impl Rand) -> f64 {
    rand.next_u64() as f64 / u64::MAX as f64
}

/// Draws one Poisson(`λ`) variate by inverting the cumulative distribution.
pub fn draw(lambda: f64, rand: &mut impl Rand) -> u16 {
    if poisson::is_degenerate(lambda) {
        return 0;
    }
    let random = random_f64(rand);
    let mut k = 0;
    let mut prob = f64::exp(-lambda);
    let mut cumulative = prob;
    while cumulative < random && k < MAX_DRAW {
        k += 1;
        prob *= lambda / k as f64;
        if prob == 0.0 {
            break;
        }
        cumulative += prob;
    }
    k
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Percentiles {
    pub p50: u16,
    pub p70: u16,
    pub p80: u16,
    pub p90: u16,
    pub p95: u16,
}

/// Probability that a simulated total exceeds `threshold`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverProbability {
    pub threshold: f64,
    pub probability: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Simulation {
    #[serde(skip)]
    pub samples: Vec<u16>,
    pub iterations: usize,
    pub mean: f64,
    pub std_dev: f64,
    pub percentiles: Percentiles,
    pub over: Vec<OverProbability>,
}
impl Simulation {
    pub fn over_probability(&self, threshold: f64) -> Option<f64> {
        self.over
            .iter()
            .find(|over| over.threshold == threshold)
            .map(|over| over.probability)
    }
}

pub fn monte_carlo(
    lambda_home: f64,
    lambda_away: f64,
    iterations: usize,
    thresholds: &[f64],
    seed: Seed,
) -> Simulation {
    let mut rand = seed.rand();
    monte_carlo_with(lambda_home, lambda_away, iterations, thresholds, &mut rand)
}

/// Draws `iterations` pairs of independent Poisson counts and summarises their sums. Statistics
/// of an empty run are all zero.
pub fn monte_carlo_with(
    lambda_home: f64,
    lambda_away: f64,
    iterations: usize,
    thresholds: &[f64],
    rand: &mut impl Rand,
) -> Simulation {
    let samples: Vec<u16> = (0..iterations)
        .map(|_| draw(lambda_home, rand) + draw(lambda_away, rand))
        .collect();

    let mut sorted: Vec<f64> = samples.iter().map(|&sample| sample as f64).collect();
    sorted.sort_by(f64::total_cmp);
    let percentile = |p: f64| sorted.percentile(p).unwrap_or_default() as u16;
    let percentiles = Percentiles {
        p50: percentile(50.0),
        p70: percentile(70.0),
        p80: percentile(80.0),
        p90: percentile(90.0),
        p95: percentile(95.0),
    };

    let over = thresholds
        .iter()
        .map(|&threshold| {
            let exceeding = samples
                .iter()
                .filter(|&&sample| sample as f64 > threshold)
                .count();
            let probability = if iterations == 0 {
                0.0
            } else {
                exceeding as f64 / iterations as f64
            };
            OverProbability {
                threshold,
                probability,
            }
        })
        .collect();

    let simulation = Simulation {
        iterations,
        mean: sorted.mean().unwrap_or_default(),
        std_dev: sorted.population_std_dev().unwrap_or_default(),
        percentiles,
        over,
        samples,
    };
    debug!(
        "simulated λ=({lambda_home:.3}, {lambda_away:.3}) x{iterations}: mean={:.3}, std_dev={:.3}",
        simulation.mean, simulation.std_dev
    );
    simulation
}
