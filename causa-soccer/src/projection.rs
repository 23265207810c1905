//! The projection model: combines two sides' resolved inputs and a referee adjustment into
//! expected corners, cards and goals.
//!
//! Every multiplier applied is carried in [`ProjectionMetadata`]. The function is pure; inputs
//! must already be resolved to positive values (see [`crate::fallback::resolve`]).

use bincode::Encode;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::MarketCategory;
use crate::fallback::SideInputs;
use crate::referee::RefereeAdjustment;

#[derive(Clone, Debug, PartialEq, Encode, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Shots on target per match above which corners get the high-pressure factor.
    pub high_pressure_shots: f64,
    pub high_pressure_factor: f64,
    /// Shots on target per match above which corners get the medium-pressure factor.
    pub medium_pressure_shots: f64,
    pub medium_pressure_factor: f64,
    pub home_corner_factor: f64,
    pub away_corner_factor: f64,
    /// Fouls per match above which a side keeps its card base rate.
    pub violence_fouls: f64,
    pub violent_factor: f64,
    /// Applied to the card base of a side at or below the foul threshold.
    pub calm_factor: f64,
    /// Red cards per game above which the strict factor applies.
    pub strict_red_rate: f64,
    pub strict_factor: f64,
    /// Red cards per game above which the elevated factor applies.
    pub elevated_red_rate: f64,
    pub elevated_factor: f64,
    /// League-average goals per side, normalising the attack-defence product.
    pub league_goals: f64,
}
impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            high_pressure_shots: 6.0,
            high_pressure_factor: 1.20,
            medium_pressure_shots: 4.5,
            medium_pressure_factor: 1.10,
            home_corner_factor: 1.15,
            away_corner_factor: 0.90,
            violence_fouls: 12.5,
            violent_factor: 1.0,
            calm_factor: 0.85,
            strict_red_rate: 0.12,
            strict_factor: 1.15,
            elevated_red_rate: 0.08,
            elevated_factor: 1.08,
            league_goals: 1.3,
        }
    }
}
impl ModelConfig {
    pub fn pressure(&self, shots_on_target: f64) -> f64 {
        if shots_on_target > self.high_pressure_shots {
            self.high_pressure_factor
        } else if shots_on_target > self.medium_pressure_shots {
            self.medium_pressure_factor
        } else {
            1.0
        }
    }

    pub fn is_violent(&self, fouls: f64) -> bool {
        fouls > self.violence_fouls
    }

    pub fn violence(&self, fouls: f64) -> f64 {
        if self.is_violent(fouls) {
            self.violent_factor
        } else {
            self.calm_factor
        }
    }

    pub fn strictness(&self, red_card_rate: f64) -> f64 {
        if red_card_rate > self.strict_red_rate {
            self.strict_factor
        } else if red_card_rate > self.elevated_red_rate {
            self.elevated_factor
        } else {
            1.0
        }
    }
}

/// Expected count per match for each side; `total` is exactly `home + away`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Expectation {
    pub home: f64,
    pub away: f64,
    pub total: f64,
}
impl Expectation {
    pub fn new(home: f64, away: f64) -> Self {
        Self {
            home,
            away,
            total: home + away,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ProjectionMetadata {
    pub pressure_home: f64,
    pub pressure_away: f64,
    pub violent_home: bool,
    pub violent_away: bool,
    pub violence_home: f64,
    pub violence_away: f64,
    pub referee_factor: f64,
    pub red_card_rate: f64,
    pub strictness: f64,
    /// Probability of at least one red card.
    pub red_card_probability: f64,
    pub used_referee: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MatchProjection {
    pub corners: Expectation,
    pub cards: Expectation,
    pub goals: Expectation,
    pub metadata: ProjectionMetadata,
}
impl MatchProjection {
    /// The point estimate behind a market category.
    pub fn estimate(&self, category: MarketCategory) -> f64 {
        match category {
            MarketCategory::CornersTotal => self.corners.total,
            MarketCategory::CornersHome => self.corners.home,
            MarketCategory::CornersAway => self.corners.away,
            MarketCategory::CardsTotal => self.cards.total,
            MarketCategory::CardsHome => self.cards.home,
            MarketCategory::CardsAway => self.cards.away,
            MarketCategory::GoalsTotal => self.goals.total,
        }
    }
}

pub fn project(
    home: &SideInputs,
    away: &SideInputs,
    referee: &RefereeAdjustment,
    config: &ModelConfig,
) -> MatchProjection {
    let pressure_home = config.pressure(home.shots_on_target);
    let pressure_away = config.pressure(away.shots_on_target);
    let corners = Expectation::new(
        home.corners * config.home_corner_factor * pressure_home,
        away.corners * config.away_corner_factor * pressure_away,
    );

    let violence_home = config.violence(home.fouls);
    let violence_away = config.violence(away.fouls);
    let strictness = config.strictness(referee.red_card_rate);
    let cards = Expectation::new(
        home.cards * violence_home * referee.multiplier * strictness,
        away.cards * violence_away * referee.multiplier * strictness,
    );

    let goals = Expectation::new(
        home.goals_for * away.goals_against / config.league_goals,
        away.goals_for * home.goals_against / config.league_goals,
    );

    let metadata = ProjectionMetadata {
        pressure_home,
        pressure_away,
        violent_home: config.is_violent(home.fouls),
        violent_away: config.is_violent(away.fouls),
        violence_home,
        violence_away,
        referee_factor: referee.multiplier,
        red_card_rate: referee.red_card_rate,
        strictness,
        red_card_probability: 1.0 - f64::exp(-referee.red_card_rate * strictness),
        used_referee: referee.used_referee().map(ToString::to_string),
    };
    debug!("projected corners {corners:?}, cards {cards:?}, goals {goals:?}; {metadata:?}");
    MatchProjection {
        corners,
        cards,
        goals,
        metadata,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::referee::{AdjustmentSource, Severity};
    use assert_float_eq::*;

    fn inputs(corners: f64, shots_on_target: f64, cards: f64, fouls: f64) -> SideInputs {
        SideInputs {
            corners,
            cards,
            fouls,
            shots_on_target,
            goals_for: 1.5,
            goals_against: 1.2,
        }
    }

    #[test]
    fn corners_with_shot_pressure() {
        let home = inputs(6.0, 7.0, 2.0, 10.0);
        let away = inputs(4.5, 5.0, 2.0, 10.0);
        let projection = project(&home, &away, &RefereeAdjustment::neutral(), &ModelConfig::default());
        assert_float_relative_eq!(8.28, projection.corners.home);
        assert_float_relative_eq!(4.455, projection.corners.away);
        assert_float_relative_eq!(12.735, projection.corners.total);
        assert_eq!(1.20, projection.metadata.pressure_home);
        assert_eq!(1.10, projection.metadata.pressure_away);
    }

    #[test]
    fn pressure_thresholds_are_exclusive() {
        let config = ModelConfig::default();
        assert_eq!(1.0, config.pressure(4.5));
        assert_eq!(1.10, config.pressure(4.51));
        assert_eq!(1.10, config.pressure(6.0));
        assert_eq!(1.20, config.pressure(6.01));
    }

    #[test]
    fn cards_with_strict_referee() {
        let home = inputs(5.0, 3.0, 2.0, 11.0);
        let away = inputs(5.0, 3.0, 2.0, 13.0);
        let referee = RefereeAdjustment {
            multiplier: 1.1,
            red_card_rate: 0.15,
            source: AdjustmentSource::Referee("Michael Oliver".into()),
        };
        let projection = project(&home, &away, &referee, &ModelConfig::default());
        assert_eq!(1.15, projection.metadata.strictness);
        assert_float_relative_eq!(2.1505, projection.cards.home);
        assert_float_relative_eq!(2.53, projection.cards.away);
        assert!(!projection.metadata.violent_home);
        assert!(projection.metadata.violent_away);
        assert_eq!(Some("Michael Oliver".to_string()), projection.metadata.used_referee);
        assert_float_relative_eq!(1.0 - f64::exp(-0.15 * 1.15), projection.metadata.red_card_probability);
    }

    #[test]
    fn strictness_tiers() {
        let config = ModelConfig::default();
        assert_eq!(1.0, config.strictness(0.08));
        assert_eq!(1.08, config.strictness(0.1));
        assert_eq!(1.08, config.strictness(0.12));
        assert_eq!(1.15, config.strictness(0.13));
    }

    #[test]
    fn violence_threshold() {
        let config = ModelConfig::default();
        assert_eq!(0.85, config.violence(12.5));
        assert_eq!(1.0, config.violence(12.6));
    }

    #[test]
    fn expected_goals() {
        let home = SideInputs {
            goals_for: 1.8,
            goals_against: 0.9,
            ..inputs(5.0, 3.0, 2.0, 11.0)
        };
        let away = SideInputs {
            goals_for: 1.1,
            goals_against: 1.4,
            ..inputs(5.0, 3.0, 2.0, 11.0)
        };
        let projection = project(&home, &away, &RefereeAdjustment::neutral(), &ModelConfig::default());
        assert_float_relative_eq!(1.8 * 1.4 / 1.3, projection.goals.home);
        assert_float_relative_eq!(1.1 * 0.9 / 1.3, projection.goals.away);
    }

    #[test]
    fn totals_decompose_exactly() {
        let referee = RefereeAdjustment::from_severity(Severity::Lenient);
        let config = ModelConfig::default();
        for step in 1..50 {
            let x = step as f64 * 0.37;
            let home = inputs(x, x * 0.5, x * 0.3, x * 2.0);
            let away = inputs(x * 0.7, x * 0.4, x * 0.2, x * 1.5);
            let projection = project(&home, &away, &referee, &config);
            for expectation in [projection.corners, projection.cards, projection.goals] {
                assert_eq!(expectation.home + expectation.away, expectation.total);
                assert!(expectation.home > 0.0 && expectation.away > 0.0);
            }
        }
    }

    #[test]
    fn estimates_by_category() {
        let home = inputs(6.0, 7.0, 2.0, 10.0);
        let away = inputs(4.5, 5.0, 2.0, 10.0);
        let projection = project(&home, &away, &RefereeAdjustment::neutral(), &ModelConfig::default());
        assert_eq!(projection.corners.total, projection.estimate(MarketCategory::CornersTotal));
        assert_eq!(projection.cards.away, projection.estimate(MarketCategory::CardsAway));
        assert_eq!(projection.goals.total, projection.estimate(MarketCategory::GoalsTotal));
    }
}
