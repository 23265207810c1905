use std::ops::RangeInclusive;

use bincode::Encode;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumCount, EnumIter};

#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord, Encode, Serialize, Deserialize)]
pub enum Side {
    Home,
    Away,
}
impl Side {
    pub fn flip(self) -> Side {
        match self {
            Side::Home => Side::Away,
            Side::Away => Side::Home,
        }
    }
}

/// How red cards count towards a card tally.
#[derive(
    Clone, Copy, Debug, Default, Hash, PartialEq, Eq, Encode, Serialize, Deserialize, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CardWeighting {
    /// A red card counts as two yellow-card equivalents.
    #[default]
    RedDouble,
    Flat,
}
impl CardWeighting {
    pub fn red_weight(self) -> u16 {
        match self {
            CardWeighting::RedDouble => 2,
            CardWeighting::Flat => 1,
        }
    }
}

#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord, EnumIter, EnumCount, Display)]
pub enum Metric {
    Corners,
    Cards,
    Fouls,
    Goals,
    ShotsOnTarget,
}

/// The counting statistics of one side in one match. Optional fields are `None` when the source
/// does not carry them (or the cell is blank).
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct SideStats {
    pub corners: u16,
    pub yellow: u16,
    pub red: u16,
    pub fouls: Option<u16>,
    pub shots_on_target: Option<u16>,
    pub goals: Option<u16>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MatchRecord {
    pub competition: String,
    pub date: Option<NaiveDate>,
    pub home_team: String,
    pub away_team: String,
    pub home: SideStats,
    pub away: SideStats,
    pub referee: Option<String>,
}
impl MatchRecord {
    pub fn team(&self, side: Side) -> &str {
        match side {
            Side::Home => &self.home_team,
            Side::Away => &self.away_team,
        }
    }

    pub fn stats(&self, side: Side) -> &SideStats {
        match side {
            Side::Home => &self.home,
            Side::Away => &self.away,
        }
    }

    /// The side `team` played on, if it played in this match.
    pub fn side_of(&self, team: &str) -> Option<Side> {
        if self.home_team == team {
            Some(Side::Home)
        } else if self.away_team == team {
            Some(Side::Away)
        } else {
            None
        }
    }

    pub fn corners_total(&self) -> u16 {
        self.home.corners.saturating_add(self.away.corners)
    }

    pub fn cards(&self, side: Side, weighting: CardWeighting) -> u16 {
        let stats = self.stats(side);
        stats
            .yellow
            .saturating_add(stats.red.saturating_mul(weighting.red_weight()))
    }

    pub fn cards_total(&self, weighting: CardWeighting) -> u16 {
        self.cards(Side::Home, weighting)
            .saturating_add(self.cards(Side::Away, weighting))
    }

    /// The value of `metric` credited to `side`, if recorded.
    pub fn metric(&self, metric: Metric, side: Side, weighting: CardWeighting) -> Option<u16> {
        let stats = self.stats(side);
        match metric {
            Metric::Corners => Some(stats.corners),
            Metric::Cards => Some(self.cards(side, weighting)),
            Metric::Fouls => stats.fouls,
            Metric::Goals => stats.goals,
            Metric::ShotsOnTarget => stats.shots_on_target,
        }
    }
}

#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Over(pub u8);
impl Over {
    /// The half-integer line; `Over(9)` is "over 9.5".
    pub fn threshold(&self) -> f64 {
        self.0 as f64 + 0.5
    }
}

#[derive(
    Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, EnumIter, Display,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum MarketCategory {
    CornersTotal,
    CornersHome,
    CornersAway,
    CardsTotal,
    CardsHome,
    CardsAway,
    GoalsTotal,
}
impl MarketCategory {
    /// The enumerated lines offered in this category.
    pub fn lines(&self) -> impl Iterator<Item = Over> {
        self.line_range().map(Over)
    }

    fn line_range(&self) -> RangeInclusive<u8> {
        match self {
            MarketCategory::CornersTotal => 8..=13,
            MarketCategory::CornersHome | MarketCategory::CornersAway => 2..=5,
            MarketCategory::CardsTotal => 2..=6,
            MarketCategory::CardsHome | MarketCategory::CardsAway => 0..=2,
            MarketCategory::GoalsTotal => 0..=4,
        }
    }

    pub fn thresholds(&self) -> Vec<f64> {
        self.lines().map(|over| over.threshold()).collect()
    }
}
