//! Run configuration, read from JSON. Every section is optional and falls back to its defaults.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::confidence::ConfidenceRubric;
use crate::data::{CompetitionSource, Strictness};
use crate::domain::CardWeighting;
use crate::fallback::Fallbacks;
use crate::projection::ModelConfig;
use crate::selection::SelectionPolicy;
use crate::simulation::SimulationConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("malformed config {path:?}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Reads a JSON-encoded type from a given file `path`.
pub fn read_json<D: DeserializeOwned>(path: impl AsRef<Path>) -> Result<D, ConfigError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| ConfigError::Io {
        path: path.into(),
        source,
    })?;
    serde_json::from_reader(file).map_err(|source| ConfigError::Json {
        path: path.into(),
        source,
    })
}

pub trait ReadJsonFile<D> {
    fn read_json_file(path: impl AsRef<Path>) -> Result<D, ConfigError>;
}

impl<D: DeserializeOwned> ReadJsonFile<D> for D {
    fn read_json_file(path: impl AsRef<Path>) -> Result<D, ConfigError> {
        read_json(path)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub data_dir: PathBuf,
    pub competitions: Vec<CompetitionSource>,
    /// Referee reference table, relative to `data_dir`; derived from the matches when absent.
    pub referees: Option<PathBuf>,
    /// Fixture list, relative to `data_dir`.
    pub fixtures: Option<PathBuf>,
    pub strictness: Strictness,
    /// Matches per venue in a team's rolling window.
    pub window: usize,
    pub card_weighting: CardWeighting,
    pub model: ModelConfig,
    pub fallbacks: Fallbacks,
    pub simulation: SimulationConfig,
    pub selection: SelectionPolicy,
    pub confidence: ConfidenceRubric,
    pub cache_ttl_secs: u64,
}
impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            competitions: vec![],
            referees: None,
            fixtures: None,
            strictness: Strictness::default(),
            window: 15,
            card_weighting: CardWeighting::default(),
            model: ModelConfig::default(),
            fallbacks: Fallbacks::default(),
            simulation: SimulationConfig::default(),
            selection: SelectionPolicy::default(),
            confidence: ConfidenceRubric::default(),
            cache_ttl_secs: 3600,
        }
    }
}
impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let config = Self::read_json_file(path)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window == 0 {
            return Err(ConfigError::Invalid("window must be positive".into()));
        }
        let selection = &self.selection;
        if !(0.0 <= selection.floor
            && selection.floor <= selection.band_low
            && selection.band_low <= selection.band_high
            && selection.band_high <= 1.0)
        {
            return Err(ConfigError::Invalid(format!(
                "selection requires 0 <= floor <= band_low <= band_high <= 1, got {selection:?}"
            )));
        }
        if self.model.league_goals <= 0.0 {
            return Err(ConfigError::Invalid("league_goals must be positive".into()));
        }
        if self.fallbacks.floor <= 0.0 {
            return Err(ConfigError::Invalid("fallback floor must be positive".into()));
        }
        Ok(())
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn referees_path(&self) -> Option<PathBuf> {
        self.referees.as_ref().map(|file| self.data_dir.join(file))
    }

    pub fn fixtures_path(&self) -> Option<PathBuf> {
        self.fixtures.as_ref().map(|file| self.data_dir.join(file))
    }

    /// The config at `path` (or the defaults), with `overrides` applied and validated.
    pub fn resolve(path: Option<&Path>, overrides: &Overrides) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::read_json_file(path)?,
            None => Self::default(),
        };
        overrides.apply(&mut config);
        config.validate()?;
        Ok(config)
    }
}

fn parse_source(s: &str) -> Result<CompetitionSource, String> {
    let (competition, file) = s
        .split_once('=')
        .ok_or_else(|| format!("expected COMPETITION=FILE, got {s:?}"))?;
    Ok(CompetitionSource {
        competition: competition.trim().to_string(),
        file: PathBuf::from(file.trim()),
        required: false,
    })
}

/// Command-line overrides of config values, shared by the binaries.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct Overrides {
    /// directory holding the source files
    #[clap(long)]
    pub data_dir: Option<PathBuf>,

    /// additional match source, as COMPETITION=FILE
    #[clap(long = "source", value_parser = parse_source)]
    pub sources: Vec<CompetitionSource>,

    /// referee table, relative to the data directory
    #[clap(long)]
    pub referees: Option<PathBuf>,

    /// matches per venue in the rolling window
    #[clap(short, long)]
    pub window: Option<usize>,

    /// Monte Carlo simulations per fixture
    #[clap(long)]
    pub sims: Option<usize>,

    /// seed for the Monte Carlo simulation
    #[clap(long)]
    pub seed: Option<u64>,

    /// how to treat malformed sources
    #[clap(long, value_enum)]
    pub strictness: Option<Strictness>,
}
impl Overrides {
    pub fn apply(&self, config: &mut Config) {
        if let Some(data_dir) = &self.data_dir {
            config.data_dir = data_dir.clone();
        }
        config.competitions.extend(self.sources.iter().cloned());
        if let Some(referees) = &self.referees {
            config.referees = Some(referees.clone());
        }
        if let Some(window) = self.window {
            config.window = window;
        }
        if let Some(sims) = self.sims {
            config.simulation.sims = sims;
        }
        if self.seed.is_some() {
            config.simulation.seed = self.seed;
        }
        if let Some(strictness) = self.strictness {
            config.strictness = strictness;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(15, config.window);
        assert_eq!(3600, config.cache_ttl().as_secs());
        assert_eq!(10_000, config.simulation.sims);
        assert_eq!(CardWeighting::RedDouble, config.card_weighting);
        assert_eq!(Strictness::BestEffort, config.strictness);
        config.validate().unwrap();
    }

    #[test]
    fn partial_json() {
        let json = r#"{
            "data_dir": "/srv/causa",
            "competitions": [
                {"competition": "Premier League", "file": "E0.csv", "required": true},
                {"competition": "La Liga", "file": "SP1.csv"}
            ],
            "referees": "arbitros.csv",
            "strictness": "strict",
            "card_weighting": "flat",
            "model": {"home_corner_factor": 1.2},
            "simulation": {"seed": 42}
        }"#;
        let config: Config = serde_json::from_str(json).unwrap();
        config.validate().unwrap();
        assert_eq!(2, config.competitions.len());
        assert!(config.competitions[0].required);
        assert!(!config.competitions[1].required);
        assert_eq!(Strictness::Strict, config.strictness);
        assert_eq!(CardWeighting::Flat, config.card_weighting);
        assert_eq!(1.2, config.model.home_corner_factor);
        assert_eq!(0.9, config.model.away_corner_factor);
        assert_eq!(Some(42), config.simulation.seed);
        assert_eq!(10_000, config.simulation.sims);
        assert_eq!(Some(PathBuf::from("/srv/causa/arbitros.csv")), config.referees_path());
        assert_eq!(None, config.fixtures_path());
    }

    #[test]
    fn invalid_selection_band() {
        let config = Config {
            selection: SelectionPolicy {
                band_low: 0.8,
                band_high: 0.7,
                floor: 0.5,
            },
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn overrides() {
        let overrides = Overrides {
            data_dir: Some(PathBuf::from("/tmp/causa")),
            sources: vec![parse_source("Serie A = I1.csv").unwrap()],
            window: Some(8),
            seed: Some(7),
            strictness: Some(Strictness::Strict),
            ..Overrides::default()
        };
        let config = Config::resolve(None, &overrides).unwrap();
        assert_eq!(PathBuf::from("/tmp/causa"), config.data_dir);
        assert_eq!("Serie A", config.competitions[0].competition);
        assert_eq!(PathBuf::from("I1.csv"), config.competitions[0].file);
        assert_eq!(8, config.window);
        assert_eq!(Some(7), config.simulation.seed);
        assert_eq!(10_000, config.simulation.sims);
        assert_eq!(Strictness::Strict, config.strictness);

        let overrides = Overrides {
            window: Some(0),
            ..Overrides::default()
        };
        assert!(matches!(Config::resolve(None, &overrides), Err(ConfigError::Invalid(_))));
        assert!(parse_source("I1.csv").is_err());
    }

    #[test]
    fn missing_file() {
        let err = Config::load("/nonexistent/causa.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
        assert!(err.to_string().starts_with("cannot read \"/nonexistent/causa.json\""));
    }
}
