//! Resolution of a team's profile into the strictly positive per-side inputs of a projection,
//! substituting fallback constants where the profile has no data.

use bincode::Encode;
use serde::{Deserialize, Serialize};

use crate::data::{LeagueAverages, Warning};
use crate::domain::Side;
use crate::features::{Split, TeamFeatureProfile};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Fallbacks {
    pub corners_home: f64,
    pub corners_away: f64,
    pub cards: f64,
    pub fouls: f64,
    pub shots_on_target_home: f64,
    pub shots_on_target_away: f64,
    pub goals_for_home: f64,
    pub goals_for_away: f64,
    pub goals_against_home: f64,
    pub goals_against_away: f64,
    /// Lower bound on every resolved input.
    pub floor: f64,
}
impl Default for Fallbacks {
    fn default() -> Self {
        Self {
            corners_home: 5.5,
            corners_away: 4.5,
            cards: 2.5,
            fouls: 12.0,
            shots_on_target_home: 4.5,
            shots_on_target_away: 4.0,
            goals_for_home: 1.5,
            goals_for_away: 1.3,
            goals_against_home: 1.3,
            goals_against_away: 1.5,
            floor: 0.05,
        }
    }
}
impl Fallbacks {
    /// Replaces the constants with a competition's observed averages where those exist.
    pub fn calibrated(&self, averages: &LeagueAverages) -> Self {
        Self {
            corners_home: averages.corners_home,
            corners_away: averages.corners_away,
            cards: averages.cards_per_side,
            fouls: averages.fouls_per_side.unwrap_or(self.fouls),
            shots_on_target_home: averages.shots_on_target_home.unwrap_or(self.shots_on_target_home),
            shots_on_target_away: averages.shots_on_target_away.unwrap_or(self.shots_on_target_away),
            goals_for_home: averages.goals_home.unwrap_or(self.goals_for_home),
            goals_for_away: averages.goals_away.unwrap_or(self.goals_for_away),
            goals_against_home: averages.goals_away.unwrap_or(self.goals_against_home),
            goals_against_away: averages.goals_home.unwrap_or(self.goals_against_away),
            floor: self.floor,
        }
    }

    fn by_side(side: Side, home: f64, away: f64) -> f64 {
        match side {
            Side::Home => home,
            Side::Away => away,
        }
    }
}

/// The per-side quantities consumed by the projection, all strictly positive.
#[derive(Clone, Debug, PartialEq, Encode, Serialize)]
pub struct SideInputs {
    pub corners: f64,
    pub cards: f64,
    pub fouls: f64,
    pub shots_on_target: f64,
    pub goals_for: f64,
    pub goals_against: f64,
}

/// Picks each input from the venue-specific mean, then the overall mean, then the fallback
/// constant. Every use of a fallback constant is reported.
pub fn resolve(
    profile: &TeamFeatureProfile,
    side: Side,
    fallbacks: &Fallbacks,
) -> (SideInputs, Vec<Warning>) {
    let mut warnings = vec![];
    let mut pick = |label: &str, split: &Split, fallback: f64| {
        let value = split
            .venue(side)
            .or(split.overall.mean)
            .unwrap_or_else(|| {
                warnings.push(Warning::new(
                    &profile.team,
                    format!("no {label} data in {}; using {fallback:.2}", profile.competition),
                ));
                fallback
            });
        f64::max(value, fallbacks.floor)
    };
    let inputs = SideInputs {
        corners: pick(
            "corners",
            &profile.corners.made,
            Fallbacks::by_side(side, fallbacks.corners_home, fallbacks.corners_away),
        ),
        cards: pick("cards", &profile.cards.made, fallbacks.cards),
        fouls: pick("fouls", &profile.fouls.made, fallbacks.fouls),
        shots_on_target: pick(
            "shots on target",
            &profile.shots_on_target.made,
            Fallbacks::by_side(side, fallbacks.shots_on_target_home, fallbacks.shots_on_target_away),
        ),
        goals_for: pick(
            "goals scored",
            &profile.goals.made,
            Fallbacks::by_side(side, fallbacks.goals_for_home, fallbacks.goals_for_away),
        ),
        goals_against: pick(
            "goals conceded",
            &profile.goals.conceded,
            Fallbacks::by_side(side, fallbacks.goals_against_home, fallbacks.goals_against_away),
        ),
    };
    (inputs, warnings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::{MetricProfile, Moments};

    fn profile() -> TeamFeatureProfile {
        TeamFeatureProfile {
            team: "Arsenal".into(),
            competition: "E0".into(),
            window: 15,
            n_matches: 0,
            n_home: 0,
            n_away: 0,
            corners: MetricProfile::default(),
            cards: MetricProfile::default(),
            fouls: MetricProfile::default(),
            goals: MetricProfile::default(),
            shots_on_target: MetricProfile::default(),
        }
    }

    #[test]
    fn empty_profile_falls_back_everywhere() {
        let (home, warnings) = resolve(&profile(), Side::Home, &Fallbacks::default());
        assert_eq!(
            SideInputs {
                corners: 5.5,
                cards: 2.5,
                fouls: 12.0,
                shots_on_target: 4.5,
                goals_for: 1.5,
                goals_against: 1.3,
            },
            home
        );
        assert_eq!(6, warnings.len());
        assert_eq!("Arsenal: no corners data in E0; using 5.50", warnings[0].to_string());

        let (away, _) = resolve(&profile(), Side::Away, &Fallbacks::default());
        assert_eq!(4.5, away.corners);
        assert_eq!(4.0, away.shots_on_target);
        assert_eq!(1.3, away.goals_for);
        assert_eq!(1.5, away.goals_against);
    }

    #[test]
    fn venue_then_overall() {
        let mut profile = profile();
        profile.corners.made = Split {
            overall: Moments {
                mean: Some(5.0),
                std_dev: None,
            },
            home: Some(6.0),
            away: None,
        };
        let (home, warnings) = resolve(&profile, Side::Home, &Fallbacks::default());
        assert_eq!(6.0, home.corners);
        assert_eq!(5, warnings.len());
        let (away, _) = resolve(&profile, Side::Away, &Fallbacks::default());
        assert_eq!(5.0, away.corners);
    }

    #[test]
    fn floored() {
        let mut profile = profile();
        profile.cards.made.overall.mean = Some(0.0);
        let (inputs, _) = resolve(&profile, Side::Home, &Fallbacks::default());
        assert_eq!(0.05, inputs.cards);
    }

    #[test]
    fn calibrated_from_league() {
        let averages = LeagueAverages {
            matches: 380,
            corners_home: 5.9,
            corners_away: 4.7,
            cards_per_side: 2.1,
            fouls_per_side: None,
            shots_on_target_home: Some(5.1),
            shots_on_target_away: None,
            goals_home: Some(1.6),
            goals_away: Some(1.2),
        };
        let fallbacks = Fallbacks::default().calibrated(&averages);
        assert_eq!(5.9, fallbacks.corners_home);
        assert_eq!(2.1, fallbacks.cards);
        assert_eq!(12.0, fallbacks.fouls);
        assert_eq!(5.1, fallbacks.shots_on_target_home);
        assert_eq!(4.0, fallbacks.shots_on_target_away);
        assert_eq!(1.2, fallbacks.goals_against_home);
        assert_eq!(1.6, fallbacks.goals_against_away);
    }
}
