//! The match repository: ingests per-competition CSV match histories into a single in-memory
//! [`MatchTable`].
//!
//! Header names from different data providers are coerced onto a canonical column set via
//! [`Column::aliases`]. Count cells that cannot be parsed are filled with `0`; optional columns
//! that are absent leave the corresponding statistic as `None`. Data-quality problems never fail
//! the load; they are reported as [`Warning`]s. Only a source that lacks the required schema (or
//! cannot be read at all) is an error, and then only under [`Strictness::Strict`] or when the
//! source is marked `required`.

use std::fmt::{Display, Formatter};
use std::fs::File;
use std::io;
use std::io::Read;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord, Trim};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use strum::{EnumCount, IntoEnumIterator};
use strum_macros::{Display as StrumDisplay, EnumCount, EnumIter};
use thiserror::Error;
use tracing::{debug, info, warn};

use causa::stats::SliceExt;

use crate::domain::{CardWeighting, MatchRecord, Side, SideStats};


/// Fewer distinct home teams than this in a source suggests a truncated file.
const MIN_HOME_TEAMS: usize = 10;

/// A required column populated in fewer than this fraction of rows is reported.
const MIN_COVERAGE: f64 = 0.5;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("required source {path:?} for {competition} is missing")]
    MissingRequired { competition: String, path: PathBuf },

    #[error("cannot parse {scope}: {source}")]
    Csv {
        scope: String,
        #[source]
        source: csv::Error,
    },

    #[error("{scope} lacks required columns {columns:?}")]
    MissingColumns {
        scope: String,
        columns: Vec<&'static str>,
    },
}

/// What to do with a source that cannot be parsed.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, StrumDisplay, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Strictness {
    /// Skip the source with a warning.
    #[default]
    BestEffort,
    /// Fail the whole load.
    Strict,
}

/// A non-fatal data problem, attributed to the source or entity it concerns.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Warning {
    pub scope: String,
    pub message: String,
}
impl Warning {
    pub fn new(scope: impl Into<String>, message: impl Into<String>) -> Self {
        let warning = Self {
            scope: scope.into(),
            message: message.into(),
        };
        warn!("{warning}");
        warning
    }
}

impl Display for Warning {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.scope, self.message)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, EnumCount)]
pub enum Column {
    Date,
    HomeTeam,
    AwayTeam,
    HomeCorners,
    AwayCorners,
    HomeYellow,
    AwayYellow,
    HomeRed,
    AwayRed,
    HomeFouls,
    AwayFouls,
    HomeShotsOnTarget,
    AwayShotsOnTarget,
    HomeGoals,
    AwayGoals,
    Referee,
}
impl Column {
    /// Accepted header names; the first is canonical.
    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            Column::Date => &["Date", "Data"],
            Column::HomeTeam => &["HomeTeam", "Home", "Time_Casa"],
            Column::AwayTeam => &["AwayTeam", "Away", "Time_Visitante"],
            Column::HomeCorners => &["HC", "HomeCorners"],
            Column::AwayCorners => &["AC", "AwayCorners"],
            Column::HomeYellow => &["HY", "HomeYellow"],
            Column::AwayYellow => &["AY", "AwayYellow"],
            Column::HomeRed => &["HR", "HomeRed"],
            Column::AwayRed => &["AR", "AwayRed"],
            Column::HomeFouls => &["HF", "HomeFouls"],
            Column::AwayFouls => &["AF", "AwayFouls"],
            Column::HomeShotsOnTarget => &["HST", "HomeShotsOnTarget"],
            Column::AwayShotsOnTarget => &["AST", "AwayShotsOnTarget"],
            Column::HomeGoals => &["FTHG", "HG", "HomeGoals"],
            Column::AwayGoals => &["FTAG", "AG", "AwayGoals"],
            Column::Referee => &["Referee", "Arbitro"],
        }
    }

    pub fn canonical(self) -> &'static str {
        self.aliases()[0]
    }

    pub fn is_required(self) -> bool {
        matches!(
            self,
            Column::Date
                | Column::HomeTeam
                | Column::AwayTeam
                | Column::HomeCorners
                | Column::AwayCorners
                | Column::HomeYellow
                | Column::AwayYellow
        )
    }
}

/// Index of the first header matching any of `aliases`, ignoring case and surrounding whitespace.
pub(crate) fn locate(headers: &StringRecord, aliases: &[&str]) -> Option<usize> {
    headers.iter().position(|header| {
        let header = header.trim_start_matches('\u{feff}').trim();
        aliases.iter().any(|alias| header.eq_ignore_ascii_case(alias))
    })
}

/// The trimmed cell at `index`, or `None` if the column is absent or the cell is blank.
pub(crate) fn cell(record: &StringRecord, index: Option<usize>) -> Option<&str> {
    index
        .and_then(|index| record.get(index))
        .map(str::trim)
        .filter(|cell| !cell.is_empty())
}

/// Collapses runs of whitespace into single spaces and trims the ends.
pub fn normalise_name(name: &str) -> String {
    name.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub(crate) fn parse_date(cell: &str) -> Option<NaiveDate> {
    let date = cell.split_whitespace().next()?;
    let formats: &[&str] = if date.contains('/') {
        match date.rsplit('/').next().map(str::len) {
            Some(2) => &["%d/%m/%y"],
            _ => &["%d/%m/%Y"],
        }
    } else {
        &["%Y-%m-%d", "%d-%m-%Y"]
    };
    formats
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(date, format).ok())
}

/// Largest plausible corner, card, foul, shot or goal count for one side in one match.
pub const MAX_MATCH_COUNT: u16 = 100;

/// Parses a non-negative count, tolerating decimal renderings such as `"5.0"` or `"5,0"`.
pub(crate) fn parse_count(cell: &str) -> Option<u16> {
    let value = cell.replace(',', ".").parse::<f64>().ok()?;
    if value.is_finite() && value >= 0.0 && value <= u16::MAX as f64 {
        Some(value.round() as u16)
    } else {
        None
    }
}

/// Parses a count recorded for one side in one match. Values above [`MAX_MATCH_COUNT`] are
/// treated as unparseable.
pub(crate) fn parse_match_count(cell: &str) -> Option<u16> {
    parse_count(cell).filter(|&count| count <= MAX_MATCH_COUNT)
}

pub(crate) fn parse_decimal(cell: &str) -> Option<f64> {
    cell.replace(',', ".")
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}

struct ColumnMap([Option<usize>; Column::COUNT]);
impl ColumnMap {
    fn resolve(headers: &StringRecord) -> Self {
        let mut indexes = [None; Column::COUNT];
        for column in Column::iter() {
            indexes[column as usize] = locate(headers, column.aliases());
        }
        Self(indexes)
    }

    fn index(&self, column: Column) -> Option<usize> {
        self.0[column as usize]
    }

    fn cell<'a>(&self, record: &'a StringRecord, column: Column) -> Option<&'a str> {
        cell(record, self.index(column))
    }

    fn missing(&self, required: bool) -> Vec<&'static str> {
        Column::iter()
            .filter(|&column| column.is_required() == required && self.index(column).is_none())
            .map(Column::canonical)
            .collect()
    }
}

#[derive(Default)]
struct SourceAudit {
    rows: usize,
    filled_with_zero: usize,
    nameless: usize,
    duplicates: usize,
    undated: usize,
    populated: [usize; Column::COUNT],
}

/// Reads one competition's match history. The `scope` names the source in errors and warnings.
pub fn read_matches(
    competition: &str,
    scope: &str,
    reader: impl Read,
) -> Result<(Vec<MatchRecord>, Vec<Warning>), LoadError> {
    let csv_error = |source| LoadError::Csv {
        scope: scope.to_string(),
        source,
    };
    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);
    let columns = ColumnMap::resolve(reader.headers().map_err(csv_error)?);

    let missing_required = columns.missing(true);
    if !missing_required.is_empty() {
        return Err(LoadError::MissingColumns {
            scope: scope.to_string(),
            columns: missing_required,
        });
    }

    let mut warnings = vec![];
    let missing_optional = columns.missing(false);
    if !missing_optional.is_empty() {
        warnings.push(Warning::new(
            scope,
            format!("optional columns {missing_optional:?} are absent"),
        ));
    }

    let mut audit = SourceAudit::default();
    let mut keys = FxHashSet::default();
    let mut matches = vec![];
    for record in reader.records() {
        let record = record.map_err(csv_error)?;
        audit.rows += 1;
        for column in Column::iter() {
            let populated = match (column, columns.cell(&record, column)) {
                (_, None) => false,
                (Column::Date, Some(cell)) => parse_date(cell).is_some(),
                (Column::HomeTeam | Column::AwayTeam | Column::Referee, Some(_)) => true,
                (_, Some(cell)) => parse_match_count(cell).is_some(),
            };
            if populated {
                audit.populated[column as usize] += 1;
            }
        }

        let home_team = normalise_name(columns.cell(&record, Column::HomeTeam).unwrap_or_default());
        let away_team = normalise_name(columns.cell(&record, Column::AwayTeam).unwrap_or_default());
        if home_team.is_empty() || away_team.is_empty() {
            audit.nameless += 1;
            continue;
        }

        let date = columns.cell(&record, Column::Date).and_then(parse_date);
        if date.is_none() {
            audit.undated += 1;
        }
        if !keys.insert((date, home_team.clone(), away_team.clone())) {
            audit.duplicates += 1;
        }

        let mut count = |column: Column| match columns.cell(&record, column).and_then(parse_match_count) {
            Some(count) => count,
            None => {
                if columns.index(column).is_some() {
                    audit.filled_with_zero += 1;
                }
                0
            }
        };
        let home = SideStats {
            corners: count(Column::HomeCorners),
            yellow: count(Column::HomeYellow),
            red: count(Column::HomeRed),
            ..SideStats::default()
        };
        let away = SideStats {
            corners: count(Column::AwayCorners),
            yellow: count(Column::AwayYellow),
            red: count(Column::AwayRed),
            ..SideStats::default()
        };
        let optional = |column: Column| columns.cell(&record, column).and_then(parse_match_count);
        matches.push(MatchRecord {
            competition: competition.to_string(),
            date,
            home_team,
            away_team,
            home: SideStats {
                fouls: optional(Column::HomeFouls),
                shots_on_target: optional(Column::HomeShotsOnTarget),
                goals: optional(Column::HomeGoals),
                ..home
            },
            away: SideStats {
                fouls: optional(Column::AwayFouls),
                shots_on_target: optional(Column::AwayShotsOnTarget),
                goals: optional(Column::AwayGoals),
                ..away
            },
            referee: columns
                .cell(&record, Column::Referee)
                .map(normalise_name)
                .filter(|referee| !referee.is_empty()),
        });
    }

    audit.report(scope, &matches, &mut warnings);
    debug!("read {} matches from {scope}", matches.len());
    Ok((matches, warnings))
}

impl SourceAudit {
    fn report(&self, scope: &str, matches: &[MatchRecord], warnings: &mut Vec<Warning>) {
        if self.rows == 0 {
            warnings.push(Warning::new(scope, "source has no rows"));
            return;
        }
        for column in Column::iter().filter(|column| column.is_required()) {
            let coverage = self.populated[column as usize] as f64 / self.rows as f64;
            if coverage < MIN_COVERAGE {
                warnings.push(Warning::new(
                    scope,
                    format!(
                        "column {} is populated in only {:.0}% of rows",
                        column.canonical(),
                        coverage * 100.0
                    ),
                ));
            }
        }
        if self.filled_with_zero > 0 {
            warnings.push(Warning::new(
                scope,
                format!("{} unparseable count cells filled with 0", self.filled_with_zero),
            ));
        }
        if self.nameless > 0 {
            warnings.push(Warning::new(
                scope,
                format!("dropped {} rows without a team name", self.nameless),
            ));
        }
        if self.duplicates > 0 {
            warnings.push(Warning::new(
                scope,
                format!("{} duplicate (date, home, away) records", self.duplicates),
            ));
        }
        if !matches.is_empty() && self.undated == matches.len() {
            warnings.push(Warning::new(scope, "no parseable dates"));
        }
        let home_teams = matches
            .iter()
            .map(|record| record.home_team.as_str())
            .collect::<FxHashSet<_>>();
        if home_teams.len() < MIN_HOME_TEAMS {
            warnings.push(Warning::new(
                scope,
                format!("only {} distinct home teams", home_teams.len()),
            ));
        }
    }
}

/// Where to find one competition's match history, relative to the data directory.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CompetitionSource {
    pub competition: String,
    pub file: PathBuf,
    #[serde(default)]
    pub required: bool,
}

/// Per-match league averages, used to calibrate fallback constants for a competition.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LeagueAverages {
    pub matches: usize,
    pub corners_home: f64,
    pub corners_away: f64,
    pub cards_per_side: f64,
    pub fouls_per_side: Option<f64>,
    pub shots_on_target_home: Option<f64>,
    pub shots_on_target_away: Option<f64>,
    pub goals_home: Option<f64>,
    pub goals_away: Option<f64>,
}

#[derive(Clone, Debug, Default)]
pub struct MatchTable {
    matches: Vec<MatchRecord>,
    weighting: CardWeighting,
}
impl MatchTable {
    pub fn new(matches: Vec<MatchRecord>, weighting: CardWeighting) -> Self {
        Self { matches, weighting }
    }

    /// Loads every source under `data_dir`, concatenating them into one table.
    pub fn load(
        sources: &[CompetitionSource],
        data_dir: &Path,
        strictness: Strictness,
        weighting: CardWeighting,
    ) -> Result<(Self, Vec<Warning>), LoadError> {
        let mut matches = vec![];
        let mut warnings = vec![];
        for source in sources {
            let path = data_dir.join(&source.file);
            let scope = path.display().to_string();
            if !path.exists() {
                if source.required {
                    return Err(LoadError::MissingRequired {
                        competition: source.competition.clone(),
                        path,
                    });
                }
                warnings.push(Warning::new(&scope, "source not found; skipped"));
                continue;
            }
            let loaded = File::open(&path)
                .map_err(|source| LoadError::Io {
                    path: path.clone(),
                    source,
                })
                .and_then(|file| read_matches(&source.competition, &scope, file));
            match loaded {
                Ok((source_matches, source_warnings)) => {
                    info!(
                        "loaded {} matches for {} from {scope}",
                        source_matches.len(),
                        source.competition
                    );
                    matches.extend(source_matches);
                    warnings.extend(source_warnings);
                }
                Err(err) if strictness == Strictness::BestEffort => {
                    warnings.push(Warning::new(&scope, format!("skipped: {err}")));
                }
                Err(err) => return Err(err),
            }
        }
        Ok((Self::new(matches, weighting), warnings))
    }

    pub fn weighting(&self) -> CardWeighting {
        self.weighting
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    pub fn all(&self) -> &[MatchRecord] {
        &self.matches
    }

    /// Distinct competition identifiers, sorted.
    pub fn competitions(&self) -> Vec<&str> {
        let mut competitions = self
            .matches
            .iter()
            .map(|record| record.competition.as_str())
            .collect::<Vec<_>>();
        competitions.sort_unstable();
        competitions.dedup();
        competitions
    }

    /// Distinct team names appearing in `competition`, sorted.
    pub fn teams<'a>(&'a self, competition: &'a str) -> Vec<&'a str> {
        let mut teams = self
            .matches(competition)
            .flat_map(|record| [record.home_team.as_str(), record.away_team.as_str()])
            .collect::<Vec<_>>();
        teams.sort_unstable();
        teams.dedup();
        teams
    }

    pub fn matches<'a>(&'a self, competition: &'a str) -> impl Iterator<Item = &'a MatchRecord> + 'a {
        self.matches
            .iter()
            .filter(move |record| record.competition == competition)
    }

    pub fn league_averages(&self, competition: &str) -> Option<LeagueAverages> {
        let matches = self.matches(competition).collect::<Vec<_>>();
        if matches.is_empty() {
            return None;
        }
        let sides = || {
            matches
                .iter()
                .flat_map(|&record| [(record, Side::Home), (record, Side::Away)])
        };
        Some(LeagueAverages {
            matches: matches.len(),
            corners_home: mean_of(matches.iter().map(|record| record.home.corners))
                .unwrap_or_default(),
            corners_away: mean_of(matches.iter().map(|record| record.away.corners))
                .unwrap_or_default(),
            cards_per_side: mean_of(sides().map(|(record, side)| record.cards(side, self.weighting)))
                .unwrap_or_default(),
            fouls_per_side: mean_of(sides().filter_map(|(record, side)| record.stats(side).fouls)),
            shots_on_target_home: mean_of(
                matches.iter().filter_map(|record| record.home.shots_on_target),
            ),
            shots_on_target_away: mean_of(
                matches.iter().filter_map(|record| record.away.shots_on_target),
            ),
            goals_home: mean_of(matches.iter().filter_map(|record| record.home.goals)),
            goals_away: mean_of(matches.iter().filter_map(|record| record.away.goals)),
        })
    }
}

fn mean_of(values: impl Iterator<Item = u16>) -> Option<f64> {
    values.map(f64::from).collect::<Vec<_>>().mean()
}
