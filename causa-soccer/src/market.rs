//! Over/under market lines and quantiles derived from a projection's Poisson rates.

use serde::Serialize;
use strum::IntoEnumIterator;

use causa::mc::Percentiles;
use causa::poisson;

use crate::domain::{MarketCategory, Over};
use crate::projection::MatchProjection;

/// Probability that the realised count in `category` exceeds `threshold`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MarketLine {
    pub category: MarketCategory,
    pub threshold: f64,
    /// Expected count per match behind the probability.
    pub estimate: f64,
    /// In `[0, 1]`.
    pub probability: f64,
}
impl MarketLine {
    pub fn new(category: MarketCategory, over: Over, estimate: f64) -> Self {
        let threshold = over.threshold();
        Self {
            category,
            threshold,
            estimate,
            probability: poisson::over(threshold, estimate),
        }
    }

    /// Decimal price with no margin; infinite when the line cannot win.
    pub fn fair_price(&self) -> f64 {
        1.0 / self.probability
    }
}

/// Lines for a single category at the given point estimate, in ascending threshold order.
pub fn lines_for(category: MarketCategory, estimate: f64) -> Vec<MarketLine> {
    category
        .lines()
        .map(|over| MarketLine::new(category, over, estimate))
        .collect()
}

/// Every line of every category, grouped by category in declaration order.
pub fn generate_market_lines(projection: &MatchProjection) -> Vec<MarketLine> {
    MarketCategory::iter()
        .flat_map(|category| lines_for(category, projection.estimate(category)))
        .collect()
}

pub fn poisson_percentiles(lambda: f64) -> Percentiles {
    Percentiles {
        p50: poisson::quantile(lambda, 0.50),
        p70: poisson::quantile(lambda, 0.70),
        p80: poisson::quantile(lambda, 0.80),
        p90: poisson::quantile(lambda, 0.90),
        p95: poisson::quantile(lambda, 0.95),
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Quantiles {
    pub corners_total: Percentiles,
    pub cards_total: Percentiles,
}
impl Quantiles {
    pub fn of(projection: &MatchProjection) -> Self {
        Self {
            corners_total: poisson_percentiles(projection.corners.total),
            cards_total: poisson_percentiles(projection.cards.total),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projection::{Expectation, ProjectionMetadata};
    use assert_float_eq::*;
    use causa_testing::{assert_non_increasing, assert_probabilities};

    fn projection(corners: (f64, f64), cards: (f64, f64), goals: (f64, f64)) -> MatchProjection {
        MatchProjection {
            corners: Expectation::new(corners.0, corners.1),
            cards: Expectation::new(cards.0, cards.1),
            goals: Expectation::new(goals.0, goals.1),
            metadata: ProjectionMetadata {
                pressure_home: 1.0,
                pressure_away: 1.0,
                violent_home: false,
                violent_away: false,
                violence_home: 0.85,
                violence_away: 0.85,
                referee_factor: 1.0,
                red_card_rate: 0.08,
                strictness: 1.0,
                red_card_probability: 0.077,
                used_referee: None,
            },
        }
    }

    #[test]
    fn adjacent_corner_lines() {
        let lines = lines_for(MarketCategory::CornersTotal, 10.5);
        let over_9_5 = lines.iter().find(|line| line.threshold == 9.5).unwrap();
        let over_10_5 = lines.iter().find(|line| line.threshold == 10.5).unwrap();
        assert!(over_9_5.probability > over_10_5.probability);
        assert_float_absolute_eq!(poisson::over(9.5, 10.5), over_9_5.probability);
        assert_float_absolute_eq!(0.6029, over_9_5.probability, 1e-4);
        assert_eq!(10.5, over_9_5.estimate);
    }

    #[test]
    fn all_categories_generated() {
        let lines = generate_market_lines(&projection((6.0, 4.5), (2.2, 1.9), (1.6, 1.1)));
        assert_eq!(6 + 4 + 4 + 5 + 3 + 3 + 5, lines.len());
        assert_eq!(MarketCategory::CornersTotal, lines[0].category);
        assert_eq!(8.5, lines[0].threshold);
        assert_eq!(10.5, lines[0].estimate);
        let goals = lines
            .iter()
            .filter(|line| line.category == MarketCategory::GoalsTotal)
            .collect::<Vec<_>>();
        assert_float_absolute_eq!(2.7, goals[0].estimate);
    }

    #[test]
    fn probability_non_increasing_in_threshold() {
        for estimate in [0.4, 1.9, 4.5, 10.5, 12.735, 20.0] {
            for category in MarketCategory::iter() {
                let probabilities = lines_for(category, estimate)
                    .iter()
                    .map(|line| line.probability)
                    .collect::<Vec<_>>();
                assert_non_increasing(&probabilities);
                assert_probabilities(&probabilities);
            }
        }
    }

    #[test]
    fn degenerate_estimate() {
        let lines = lines_for(MarketCategory::CardsHome, 0.0);
        assert!(lines.iter().all(|line| line.probability == 0.0));
        assert_eq!(f64::INFINITY, lines[0].fair_price());
    }

    #[test]
    fn fair_price() {
        let line = MarketLine {
            category: MarketCategory::CornersTotal,
            threshold: 9.5,
            estimate: 10.5,
            probability: 0.625,
        };
        assert_eq!(1.6, line.fair_price());
    }

    #[test]
    fn quantiles_match_market_distribution() {
        let quantiles = Quantiles::of(&projection((6.0, 4.5), (2.0, 1.0), (1.0, 1.0)));
        assert_eq!(
            Percentiles {
                p50: 10,
                p70: 12,
                p80: 13,
                p90: 15,
                p95: 16,
            },
            quantiles.corners_total
        );
        let p = quantiles.cards_total;
        assert!(p.p50 <= p.p70 && p.p70 <= p.p80 && p.p80 <= p.p90 && p.p90 <= p.p95);
        assert_eq!(Percentiles::default(), poisson_percentiles(0.0));
    }
}
