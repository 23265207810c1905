//! End-to-end analysis of a fixture: features, fallbacks, referee adjustment, projection,
//! market lines, simulation and confidence.

use std::fs::File;
use std::str::FromStr;

use serde::Serialize;
use strum::IntoEnumIterator;
use tracing::{debug, info};

use causa::mc::Seed;

use crate::cache::ProjectionCache;
use crate::confidence::Confidence;
use crate::config::Config;
use crate::data::{LoadError, MatchTable, Strictness, Warning};
use crate::domain::{MarketCategory, Side};
use crate::fallback::{resolve, SideInputs};
use crate::features::{compute_features, head_to_head, HeadToHead, TeamFeatureProfile};
use crate::fixtures::Fixture;
use crate::market::{generate_market_lines, MarketLine, Quantiles};
use crate::names::NameResolver;
use crate::projection::{project, MatchProjection, ModelConfig};
use crate::referee::{AdjustmentSource, RefereeAdjustment, RefereeTable, Severity};
use crate::simulation::{simulate, SimulationSummary};

/// Everything loaded from the data directory.
#[derive(Debug)]
pub struct Repository {
    pub matches: MatchTable,
    pub referees: RefereeTable,
    pub warnings: Vec<Warning>,
}
impl Repository {
    /// Loads the match histories and the referee table. Without a readable referee table,
    /// referee statistics are derived from the matches.
    pub fn load(config: &Config) -> Result<Self, LoadError> {
        let (matches, mut warnings) = MatchTable::load(
            &config.competitions,
            &config.data_dir,
            config.strictness,
            config.card_weighting,
        )?;
        let loaded = match config.referees_path() {
            None => None,
            Some(path) => {
                let scope = path.display().to_string();
                let read = File::open(&path)
                    .map_err(|source| LoadError::Io { path, source })
                    .and_then(|file| RefereeTable::read(&scope, file));
                match read {
                    Ok((referees, referee_warnings)) => {
                        warnings.extend(referee_warnings);
                        Some(referees)
                    }
                    Err(err) if config.strictness == Strictness::BestEffort => {
                        warnings.push(Warning::new(&scope, format!("{err}; deriving referees from matches")));
                        None
                    }
                    Err(err) => return Err(err),
                }
            }
        };
        let referees = loaded.unwrap_or_else(|| RefereeTable::from_matches(&matches));
        info!(
            "repository holds {} matches across {} competitions and {} referees",
            matches.len(),
            matches.competitions().len(),
            referees.len()
        );
        Ok(Self {
            matches,
            referees,
            warnings,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AnalysisRequest {
    pub competition: String,
    pub home: String,
    pub away: String,
    /// A referee name or a severity profile (`strict`, `normal`, `lenient`).
    pub referee: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FixtureAnalysis {
    pub request: AnalysisRequest,
    /// Team names as resolved against the match table.
    pub home: String,
    pub away: String,
    pub home_profile: TeamFeatureProfile,
    pub away_profile: TeamFeatureProfile,
    pub home_inputs: SideInputs,
    pub away_inputs: SideInputs,
    pub referee: RefereeAdjustment,
    pub head_to_head: Option<HeadToHead>,
    pub projection: MatchProjection,
    pub lines: Vec<MarketLine>,
    /// At most one selected line per category.
    pub smart_lines: Vec<MarketLine>,
    pub quantiles: Quantiles,
    /// Absent when the simulation count is zero.
    pub simulation: Option<SimulationSummary>,
    pub confidence: Confidence,
    pub warnings: Vec<Warning>,
}
impl FixtureAnalysis {
    pub fn smart_line(&self, category: MarketCategory) -> Option<&MarketLine> {
        self.smart_lines.iter().find(|line| line.category == category)
    }

    pub fn is_smart(&self, line: &MarketLine) -> bool {
        self.smart_lines.contains(line)
    }
}

fn resolve_team(table: &MatchTable, competition: &str, raw: &str) -> Option<String> {
    NameResolver::new(table.teams(competition))
        .resolve(raw)
        .map(ToString::to_string)
}

fn mean_cv(home: Option<f64>, away: Option<f64>) -> Option<f64> {
    match (home, away) {
        (Some(home), Some(away)) => Some((home + away) / 2.0),
        (cv, None) | (None, cv) => cv,
    }
}

/// Analyses one fixture. Unknown teams and referees degrade to fallback values, each with a
/// warning; the analysis itself never fails.
pub fn analyse(
    table: &MatchTable,
    referees: &RefereeTable,
    request: &AnalysisRequest,
    config: &Config,
) -> FixtureAnalysis {
    analyse_with(table, referees, request, config, &mut project)
}

/// As [`analyse`], memoising projections in `cache`.
pub fn analyse_cached(
    table: &MatchTable,
    referees: &RefereeTable,
    request: &AnalysisRequest,
    config: &Config,
    cache: &mut ProjectionCache,
) -> FixtureAnalysis {
    analyse_with(
        table,
        referees,
        request,
        config,
        &mut |home: &SideInputs, away: &SideInputs, referee: &RefereeAdjustment, model: &ModelConfig| {
            cache.project(home, away, referee, model)
        },
    )
}

fn analyse_with(
    table: &MatchTable,
    referees: &RefereeTable,
    request: &AnalysisRequest,
    config: &Config,
    projector: &mut dyn FnMut(&SideInputs, &SideInputs, &RefereeAdjustment, &ModelConfig) -> MatchProjection,
) -> FixtureAnalysis {
    let competition = request.competition.as_str();
    let mut warnings = vec![];
    if table.matches(competition).next().is_none() {
        warnings.push(Warning::new(competition, "no matches loaded for this competition"));
    }
    let mut team = |raw: &str| {
        resolve_team(table, competition, raw).unwrap_or_else(|| {
            warnings.push(Warning::new(
                competition,
                format!("team {raw:?} not found; using fallback values"),
            ));
            raw.to_string()
        })
    };
    let home = team(&request.home);
    let away = team(&request.away);

    let home_profile = compute_features(table, competition, &home, config.window);
    let away_profile = compute_features(table, competition, &away, config.window);
    let fallbacks = match table.league_averages(competition) {
        Some(averages) => config.fallbacks.calibrated(&averages),
        None => config.fallbacks.clone(),
    };
    let (home_inputs, home_warnings) = resolve(&home_profile, Side::Home, &fallbacks);
    let (away_inputs, away_warnings) = resolve(&away_profile, Side::Away, &fallbacks);
    warnings.extend(home_warnings);
    warnings.extend(away_warnings);

    let referee = match request.referee.as_deref() {
        None => RefereeAdjustment::neutral(),
        Some(raw) => {
            let adjustment = match Severity::from_str(raw) {
                Ok(severity) if referees.get(competition, raw.trim()).is_none() => {
                    RefereeAdjustment::from_severity(severity)
                }
                _ => {
                    let resolved = NameResolver::new(referees.names(competition)).resolve(raw);
                    referees.lookup(competition, Some(resolved.unwrap_or(raw)))
                }
            };
            if adjustment.source == AdjustmentSource::Neutral {
                warnings.push(Warning::new(
                    competition,
                    format!("referee {raw:?} not found; using neutral adjustment"),
                ));
            }
            adjustment
        }
    };

    let projection = projector(&home_inputs, &away_inputs, &referee, &config.model);
    let lines = generate_market_lines(&projection);
    let smart_lines = MarketCategory::iter()
        .filter_map(|category| {
            let in_category = lines
                .iter()
                .filter(|line| line.category == category)
                .cloned()
                .collect::<Vec<_>>();
            config.selection.select(&in_category).cloned()
        })
        .collect();
    let quantiles = Quantiles::of(&projection);
    let simulation = (config.simulation.sims > 0).then(|| {
        simulate(
            &projection,
            config.simulation.sims,
            Seed::from(config.simulation.seed),
        )
    });

    let head_to_head = head_to_head(table, competition, &home, &away, config.window);
    let confidence = config.confidence.score(
        home_profile.n_matches.min(away_profile.n_matches),
        mean_cv(home_profile.corners_cv(), away_profile.corners_cv()),
        head_to_head.as_ref().map(|h2h| h2h.consistency),
    );
    debug!(
        "{home} v {away}: corners {:.2}, cards {:.2}, confidence {}",
        projection.corners.total, projection.cards.total, confidence.score
    );

    FixtureAnalysis {
        request: request.clone(),
        home,
        away,
        home_profile,
        away_profile,
        home_inputs,
        away_inputs,
        referee,
        head_to_head,
        projection,
        lines,
        smart_lines,
        quantiles,
        simulation,
        confidence,
        warnings,
    }
}

/// Analyses each fixture independently, skipping those whose teams cannot be resolved.
pub fn analyse_slate(
    table: &MatchTable,
    referees: &RefereeTable,
    fixtures: &[Fixture],
    config: &Config,
) -> (Vec<FixtureAnalysis>, Vec<Warning>) {
    let mut cache = ProjectionCache::new(config.cache_ttl());
    let mut analyses = vec![];
    let mut warnings = vec![];
    for fixture in fixtures {
        let resolved = (
            resolve_team(table, &fixture.competition, &fixture.home),
            resolve_team(table, &fixture.competition, &fixture.away),
        );
        let (Some(home), Some(away)) = resolved else {
            warnings.push(Warning::new(
                &fixture.competition,
                format!("skipped {} v {}: unknown team", fixture.home, fixture.away),
            ));
            continue;
        };
        let request = AnalysisRequest {
            competition: fixture.competition.clone(),
            home,
            away,
            referee: None,
        };
        analyses.push(analyse_cached(table, referees, &request, config, &mut cache));
    }
    debug!(
        "analysed {} of {} fixtures; projection cache {:?}",
        analyses.len(),
        fixtures.len(),
        cache.stats
    );
    (analyses, warnings)
}
