//! Referee card-rate adjustments.
//!
//! A referee found in the [`RefereeTable`] scales card projections by their cards-per-game over
//! the league baseline. Failing that, a qualitative [`Severity`] may be given in place of a name.
//! With neither, the adjustment is neutral. Lookups never fail.

use std::io::Read;
use std::str::FromStr;

use bincode::Encode;
use csv::{ReaderBuilder, Trim};
use rustc_hash::FxHashMap;
use serde::Serialize;
use strum_macros::{Display, EnumIter};
use thiserror::Error;
use tracing::debug;

use crate::data::{self, LoadError, MatchTable, Warning};
use crate::domain::Side;

/// League-wide cards per game against which a referee's average is compared.
pub const BASELINE_CARDS_PER_GAME: f64 = 4.0;

/// Red-card rate assumed when a referee's record does not support one.
pub const BASELINE_RED_CARD_RATE: f64 = 0.08;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RefereeProfile {
    pub name: String,
    pub competition: String,
    pub cards_per_game: f64,
    pub games: u32,
    pub red_cards: Option<u32>,
}
impl RefereeProfile {
    pub fn red_card_rate(&self) -> f64 {
        match self.red_cards {
            Some(red_cards) if self.games > 0 => red_cards as f64 / self.games as f64,
            _ => BASELINE_RED_CARD_RATE,
        }
    }

    /// Cards per game over the league baseline; neutral when the average is not positive.
    pub fn multiplier(&self) -> f64 {
        if self.cards_per_game.is_finite() && self.cards_per_game > 0.0 {
            self.cards_per_game / BASELINE_CARDS_PER_GAME
        } else {
            1.0
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, Display, Serialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Strict,
    Normal,
    Lenient,
}
impl Severity {
    pub fn multiplier(self) -> f64 {
        match self {
            Severity::Strict => 1.15,
            Severity::Normal => 1.0,
            Severity::Lenient => 0.85,
        }
    }
}

#[derive(Debug, Error)]
#[error("unsupported severity {0:?}")]
pub struct SeverityParseError(String);

impl FromStr for Severity {
    type Err = SeverityParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "strict" | "rigoroso" => Ok(Severity::Strict),
            "normal" => Ok(Severity::Normal),
            "lenient" | "permissivo" => Ok(Severity::Lenient),
            _ => Err(SeverityParseError(s.to_string())),
        }
    }
}

/// Where a [`RefereeAdjustment`] came from.
#[derive(Clone, Debug, PartialEq, Encode, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AdjustmentSource {
    Referee(String),
    Profile(String),
    Neutral,
}

#[derive(Clone, Debug, PartialEq, Encode, Serialize)]
pub struct RefereeAdjustment {
    /// Multiplier on projected cards.
    pub multiplier: f64,
    /// Red cards per game; drives the strictness multiplier.
    pub red_card_rate: f64,
    pub source: AdjustmentSource,
}
impl RefereeAdjustment {
    pub fn neutral() -> Self {
        Self {
            multiplier: 1.0,
            red_card_rate: BASELINE_RED_CARD_RATE,
            source: AdjustmentSource::Neutral,
        }
    }

    pub fn from_severity(severity: Severity) -> Self {
        Self {
            multiplier: severity.multiplier(),
            red_card_rate: BASELINE_RED_CARD_RATE,
            source: AdjustmentSource::Profile(severity.to_string()),
        }
    }

    /// The referee whose record produced this adjustment, if any.
    pub fn used_referee(&self) -> Option<&str> {
        match &self.source {
            AdjustmentSource::Referee(name) => Some(name),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RefereeTable {
    profiles: FxHashMap<(String, String), RefereeProfile>,
}
impl RefereeTable {
    pub fn insert(&mut self, profile: RefereeProfile) {
        self.profiles
            .insert((profile.competition.clone(), profile.name.clone()), profile);
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    pub fn get(&self, competition: &str, name: &str) -> Option<&RefereeProfile> {
        self.profiles
            .get(&(competition.to_string(), name.to_string()))
    }

    /// Referee names known in `competition`, sorted.
    pub fn names(&self, competition: &str) -> Vec<&str> {
        let mut names = self
            .profiles
            .values()
            .filter(|profile| profile.competition == competition)
            .map(|profile| profile.name.as_str())
            .collect::<Vec<_>>();
        names.sort_unstable();
        names
    }

    /// Resolves a referee name or a severity profile into an adjustment.
    pub fn lookup(&self, competition: &str, referee: Option<&str>) -> RefereeAdjustment {
        let Some(referee) = referee.map(str::trim).filter(|referee| !referee.is_empty()) else {
            return RefereeAdjustment::neutral();
        };
        if let Some(profile) = self.get(competition, referee) {
            return RefereeAdjustment {
                multiplier: profile.multiplier(),
                red_card_rate: profile.red_card_rate(),
                source: AdjustmentSource::Referee(profile.name.clone()),
            };
        }
        match Severity::from_str(referee) {
            Ok(severity) => RefereeAdjustment::from_severity(severity),
            Err(_) => {
                debug!("no record of referee {referee:?} in {competition}; using neutral adjustment");
                RefereeAdjustment::neutral()
            }
        }
    }

    /// Reads a reference table of per-referee card statistics.
    pub fn read(scope: &str, reader: impl Read) -> Result<(Self, Vec<Warning>), LoadError> {
        let csv_error = |source| LoadError::Csv {
            scope: scope.to_string(),
            source,
        };
        let mut reader = ReaderBuilder::new()
            .flexible(true)
            .trim(Trim::All)
            .from_reader(reader);
        let headers = reader.headers().map_err(csv_error)?.clone();
        let competition = data::locate(&headers, &["Liga", "Competition", "League"]);
        let name = data::locate(&headers, &["Arbitro", "Referee", "Name"]);
        let cards = data::locate(&headers, &["Media_Cartoes_Por_Jogo", "AvgCards"]);
        let games = data::locate(&headers, &["Jogos_Apitados", "Games"]);
        let red_cards = data::locate(&headers, &["Cartoes_Vermelhos", "RedCards"]);

        let missing = [
            ("Liga", competition),
            ("Arbitro", name),
            ("Media_Cartoes_Por_Jogo", cards),
            ("Jogos_Apitados", games),
        ]
        .into_iter()
        .filter(|(_, index)| index.is_none())
        .map(|(column, _)| column)
        .collect::<Vec<_>>();
        if !missing.is_empty() {
            return Err(LoadError::MissingColumns {
                scope: scope.to_string(),
                columns: missing,
            });
        }

        let mut table = Self::default();
        let mut skipped = 0;
        let mut cardless = 0;
        for record in reader.records() {
            let record = record.map_err(csv_error)?;
            let parsed = (
                data::cell(&record, competition),
                data::cell(&record, name),
                data::cell(&record, cards).and_then(data::parse_decimal),
                data::cell(&record, games).and_then(data::parse_count),
            );
            let (Some(competition), Some(name), Some(cards_per_game), Some(games)) = parsed else {
                skipped += 1;
                continue;
            };
            if cards_per_game <= 0.0 {
                cardless += 1;
                continue;
            }
            table.insert(RefereeProfile {
                name: data::normalise_name(name),
                competition: competition.to_string(),
                cards_per_game,
                games: games as u32,
                red_cards: data::cell(&record, red_cards)
                    .and_then(data::parse_count)
                    .map(u32::from),
            });
        }

        let mut warnings = vec![];
        if skipped > 0 {
            warnings.push(Warning::new(
                scope,
                format!("skipped {skipped} incomplete referee rows"),
            ));
        }
        if cardless > 0 {
            warnings.push(Warning::new(
                scope,
                format!("skipped {cardless} referee rows without a positive card average"),
            ));
        }
        debug!("read {} referees from {scope}", table.len());
        Ok((table, warnings))
    }

    /// Derives referee profiles from the officiating records in a match table.
    pub fn from_matches(matches: &MatchTable) -> Self {
        #[derive(Default)]
        struct Tally {
            games: u32,
            cards: u32,
            red_cards: u32,
        }

        let mut tallies = FxHashMap::<(&str, &str), Tally>::default();
        for record in matches.all() {
            let Some(referee) = &record.referee else {
                continue;
            };
            let tally = tallies
                .entry((record.competition.as_str(), referee.as_str()))
                .or_default();
            tally.games += 1;
            tally.cards += u32::from(record.cards_total(matches.weighting()));
            tally.red_cards += u32::from(record.stats(Side::Home).red) + u32::from(record.stats(Side::Away).red);
        }

        let mut table = Self::default();
        for ((competition, name), tally) in tallies {
            table.insert(RefereeProfile {
                name: name.to_string(),
                competition: competition.to_string(),
                cards_per_game: tally.cards as f64 / tally.games as f64,
                games: tally.games,
                red_cards: Some(tally.red_cards),
            });
        }
        table
    }
}
