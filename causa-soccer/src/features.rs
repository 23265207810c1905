//! Rolling per-team statistical profiles over the most recent matches in a competition.
//!
//! Statistics of an empty sample are `None`, never zero; substituting a fallback is the caller's
//! decision (see [`crate::fallback`]).

use serde::Serialize;
use tracing::debug;

use causa::stats::SliceExt;

use crate::data::MatchTable;
use crate::domain::{CardWeighting, MatchRecord, Metric, Side};

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct Moments {
    pub mean: Option<f64>,
    /// Sample standard deviation; needs at least two observations.
    pub std_dev: Option<f64>,
}
impl Moments {
    pub fn of(values: &[f64]) -> Self {
        Self {
            mean: values.mean(),
            std_dev: values.sample_std_dev(),
        }
    }

    pub fn coefficient_of_variation(&self) -> Option<f64> {
        match (self.mean, self.std_dev) {
            (Some(mean), Some(std_dev)) if mean > 0.0 => Some(std_dev / mean),
            _ => None,
        }
    }
}

/// One direction of a metric (made or conceded), over all recent matches and by venue.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct Split {
    pub overall: Moments,
    pub home: Option<f64>,
    pub away: Option<f64>,
}
impl Split {
    pub fn venue(&self, side: Side) -> Option<f64> {
        match side {
            Side::Home => self.home,
            Side::Away => self.away,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct MetricProfile {
    pub made: Split,
    pub conceded: Split,
}

/// Per-match averages of a team's recent matches in one competition.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TeamFeatureProfile {
    pub team: String,
    pub competition: String,
    /// The requested lookback.
    pub window: usize,
    /// Matches actually available within the lookback; never more than `window`.
    pub n_matches: usize,
    pub n_home: usize,
    pub n_away: usize,
    pub corners: MetricProfile,
    pub cards: MetricProfile,
    pub fouls: MetricProfile,
    pub goals: MetricProfile,
    pub shots_on_target: MetricProfile,
}
impl TeamFeatureProfile {
    pub fn metric(&self, metric: Metric) -> &MetricProfile {
        match metric {
            Metric::Corners => &self.corners,
            Metric::Cards => &self.cards,
            Metric::Fouls => &self.fouls,
            Metric::Goals => &self.goals,
            Metric::ShotsOnTarget => &self.shots_on_target,
        }
    }

    /// Volatility of the team's own corner count.
    pub fn corners_cv(&self) -> Option<f64> {
        self.corners.made.overall.coefficient_of_variation()
    }
}

fn tail<T>(items: &[T], n: usize) -> &[T] {
    &items[items.len().saturating_sub(n)..]
}

/// Orders by date ascending; undated records sort last, keeping their relative order.
fn chronological(records: &mut [&MatchRecord]) {
    records.sort_by_key(|record| (record.date.is_none(), record.date));
}

fn split(
    at_home: &[&MatchRecord],
    away: &[&MatchRecord],
    metric: Metric,
    conceded: bool,
    weighting: CardWeighting,
) -> Split {
    let series = |records: &[&MatchRecord], venue: Side| {
        let side = if conceded { venue.flip() } else { venue };
        records
            .iter()
            .filter_map(|record| record.metric(metric, side, weighting))
            .map(f64::from)
            .collect::<Vec<_>>()
    };
    let home_values = series(at_home, Side::Home);
    let away_values = series(away, Side::Away);
    let mut combined = home_values.clone();
    combined.extend(&away_values);
    Split {
        overall: Moments::of(&combined),
        home: home_values.mean(),
        away: away_values.mean(),
    }
}

/// Profiles `team` over its last `window` home matches and last `window` away matches in
/// `competition`. A team with no matches yields a profile with `n_matches == 0` and every
/// statistic `None`.
pub fn compute_features(
    matches: &MatchTable,
    competition: &str,
    team: &str,
    window: usize,
) -> TeamFeatureProfile {
    let mut played = matches
        .matches(competition)
        .filter(|record| record.side_of(team).is_some())
        .collect::<Vec<_>>();
    chronological(&mut played);
    let on_side = |side: Side| {
        let records = played
            .iter()
            .copied()
            .filter(|record| record.side_of(team) == Some(side))
            .collect::<Vec<_>>();
        tail(&records, window).to_vec()
    };
    let at_home = on_side(Side::Home);
    let away = on_side(Side::Away);

    let weighting = matches.weighting();
    let metric_profile = |metric| MetricProfile {
        made: split(&at_home, &away, metric, false, weighting),
        conceded: split(&at_home, &away, metric, true, weighting),
    };
    let profile = TeamFeatureProfile {
        team: team.to_string(),
        competition: competition.to_string(),
        window,
        n_matches: played.len().min(window),
        n_home: at_home.len(),
        n_away: away.len(),
        corners: metric_profile(Metric::Corners),
        cards: metric_profile(Metric::Cards),
        fouls: metric_profile(Metric::Fouls),
        goals: metric_profile(Metric::Goals),
        shots_on_target: metric_profile(Metric::ShotsOnTarget),
    };
    debug!(
        "features for {team} in {competition}: {} matches ({} home, {} away)",
        profile.n_matches, profile.n_home, profile.n_away
    );
    profile
}

/// Recent meetings between two teams, in either venue order.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct HeadToHead {
    pub meetings: usize,
    pub mean_corners: f64,
    /// `1 − CV` of the total corners per meeting, clamped to `[0, 1]`.
    pub consistency: f64,
}

/// Summarises the last `window` meetings of `home` and `away`; `None` with fewer than two.
pub fn head_to_head(
    matches: &MatchTable,
    competition: &str,
    home: &str,
    away: &str,
    window: usize,
) -> Option<HeadToHead> {
    let mut meetings = matches
        .matches(competition)
        .filter(|record| {
            (record.home_team == home && record.away_team == away)
                || (record.home_team == away && record.away_team == home)
        })
        .collect::<Vec<_>>();
    chronological(&mut meetings);
    let corners = tail(&meetings, window)
        .iter()
        .map(|record| f64::from(record.corners_total()))
        .collect::<Vec<_>>();
    if corners.len() < 2 {
        return None;
    }
    // a zero mean can only come from identical (zero) totals
    let consistency = corners
        .coefficient_of_variation()
        .map(|cv| (1.0 - cv).clamp(0.0, 1.0))
        .unwrap_or(1.0);
    Some(HeadToHead {
        meetings: corners.len(),
        mean_corners: corners.mean().unwrap_or_default(),
        consistency,
    })
}
