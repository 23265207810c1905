//! A heuristic 0–100 confidence rubric over sample size, volatility and head-to-head
//! consistency. The score ranks projections against each other; it is not a probability.

use serde::{Deserialize, Serialize};
use strum_macros::Display;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Display)]
pub enum ConfidenceLabel {
    #[serde(rename = "alta")]
    #[strum(serialize = "alta")]
    High,
    #[serde(rename = "média")]
    #[strum(serialize = "média")]
    Medium,
    #[serde(rename = "baixa")]
    #[strum(serialize = "baixa")]
    Low,
}
impl ConfidenceLabel {
    pub fn colour(&self) -> &'static str {
        match self {
            ConfidenceLabel::High => "green",
            ConfidenceLabel::Medium => "yellow",
            ConfidenceLabel::Low => "red",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Confidence {
    pub score: u8,
    pub label: ConfidenceLabel,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfidenceRubric {
    /// `(minimum matches, points)`, most demanding first.
    pub sample_tiers: [(usize, u8); 3],
    pub sample_floor: u8,
    /// `(maximum coefficient of variation, points)`, most demanding first.
    pub volatility_tiers: [(f64, u8); 3],
    pub volatility_floor: u8,
    pub h2h_points: f64,
    /// Consistency assumed when there is no head-to-head record.
    pub h2h_neutral: f64,
    pub high_threshold: u8,
    pub medium_threshold: u8,
}
impl Default for ConfidenceRubric {
    fn default() -> Self {
        Self {
            sample_tiers: [(15, 40), (10, 30), (5, 20)],
            sample_floor: 10,
            volatility_tiers: [(0.20, 40), (0.30, 30), (0.40, 20)],
            volatility_floor: 10,
            h2h_points: 20.0,
            h2h_neutral: 0.5,
            high_threshold: 80,
            medium_threshold: 60,
        }
    }
}
impl ConfidenceRubric {
    pub fn score(&self, n_matches: usize, volatility_cv: Option<f64>, h2h_consistency: Option<f64>) -> Confidence {
        let sample = self
            .sample_tiers
            .iter()
            .find(|(min_matches, _)| n_matches >= *min_matches)
            .map_or(self.sample_floor, |(_, points)| *points);
        let volatility = volatility_cv
            .filter(|cv| cv.is_finite())
            .and_then(|cv| {
                self.volatility_tiers
                    .iter()
                    .find(|(max_cv, _)| cv <= *max_cv)
            })
            .map_or(self.volatility_floor, |(_, points)| *points);
        let consistency = h2h_consistency
            .filter(|consistency| consistency.is_finite())
            .unwrap_or(self.h2h_neutral)
            .clamp(0.0, 1.0);
        let h2h = (consistency * self.h2h_points).round() as u8;

        let score = sample.saturating_add(volatility).saturating_add(h2h).min(100);
        let label = if score >= self.high_threshold {
            ConfidenceLabel::High
        } else if score >= self.medium_threshold {
            ConfidenceLabel::Medium
        } else {
            ConfidenceLabel::Low
        };
        Confidence { score, label }
    }
}

/// Scores with the default rubric.
pub fn score(n_matches: usize, volatility_cv: Option<f64>, h2h_consistency: Option<f64>) -> Confidence {
    ConfidenceRubric::default().score(n_matches, volatility_cv, h2h_consistency)
}
