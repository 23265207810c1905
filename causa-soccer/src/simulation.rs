//! Monte Carlo simulation of a projection's corner and card totals.

use serde::{Deserialize, Serialize};

use causa::mc;
use causa::mc::{Seed, Simulation};

use crate::domain::MarketCategory;
use crate::projection::MatchProjection;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub sims: usize,
    /// Fixes the random stream; a fresh seed is drawn when absent.
    pub seed: Option<u64>,
}
impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            sims: 10_000,
            seed: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SimulationSummary {
    pub corners: Simulation,
    pub cards: Simulation,
}

/// Simulates the home and away rates of corners and of cards independently, reporting
/// over-probabilities at the thresholds of the corresponding total markets.
pub fn simulate(projection: &MatchProjection, sims: usize, seed: Seed) -> SimulationSummary {
    let mut rand = seed.rand();
    let corners = mc::monte_carlo_with(
        projection.corners.home,
        projection.corners.away,
        sims,
        &MarketCategory::CornersTotal.thresholds(),
        &mut rand,
    );
    let cards = mc::monte_carlo_with(
        projection.cards.home,
        projection.cards.away,
        sims,
        &MarketCategory::CardsTotal.thresholds(),
        &mut rand,
    );
    SimulationSummary { corners, cards }
}
