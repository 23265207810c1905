//! Automatic "smart line" selection, and parsing of operator-specified market lines.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use thiserror::Error;

use crate::domain::MarketCategory;
use crate::market::MarketLine;

/// Prefers lines whose probability lies in the sweet-spot band `[band_low, band_high]`, falling
/// back to the likeliest line at or above `floor`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionPolicy {
    pub band_low: f64,
    pub band_high: f64,
    pub floor: f64,
}
impl Default for SelectionPolicy {
    fn default() -> Self {
        Self {
            band_low: 0.60,
            band_high: 0.75,
            floor: 0.55,
        }
    }
}
impl SelectionPolicy {
    /// The likeliest in-band line, else the likeliest line at or above the floor, else nothing.
    /// Ties go to the earlier line.
    pub fn select<'a>(&self, lines: &'a [MarketLine]) -> Option<&'a MarketLine> {
        likeliest(
            lines
                .iter()
                .filter(|line| (self.band_low..=self.band_high).contains(&line.probability)),
        )
        .or_else(|| likeliest(lines.iter().filter(|line| line.probability >= self.floor)))
    }
}

fn likeliest<'a>(lines: impl Iterator<Item = &'a MarketLine>) -> Option<&'a MarketLine> {
    lines.fold(None, |best: Option<&MarketLine>, line| match best {
        Some(best) if best.probability >= line.probability => Some(best),
        _ => Some(line),
    })
}

/// A market category, optionally narrowed to one threshold, e.g. `corners-total` or
/// `corners-total@9.5`.
#[derive(Clone, Debug, PartialEq)]
pub struct MarketSelector {
    pub category: MarketCategory,
    pub threshold: Option<f64>,
}
impl MarketSelector {
    pub fn matches(&self, line: &MarketLine) -> bool {
        line.category == self.category
            && self
                .threshold
                .map_or(true, |threshold| threshold == line.threshold)
    }
}

impl Display for MarketSelector {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.threshold {
            None => write!(f, "{}", self.category),
            Some(threshold) => write!(f, "{}@{threshold}", self.category),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectionParseError {
    #[error("unknown market category {0:?}")]
    UnknownCategory(String),

    #[error("invalid threshold {0:?}")]
    InvalidThreshold(String),

    #[error("{threshold} is not offered in {category}")]
    ThresholdNotOffered { category: String, threshold: String },
}

impl FromStr for MarketSelector {
    type Err = SelectionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (category, threshold) = match s.split_once('@') {
            Some((category, threshold)) => (category.trim(), Some(threshold.trim())),
            None => (s.trim(), None),
        };
        let category = MarketCategory::iter()
            .find(|candidate| candidate.to_string().eq_ignore_ascii_case(category))
            .ok_or_else(|| SelectionParseError::UnknownCategory(category.to_string()))?;
        let threshold = match threshold {
            None => None,
            Some(threshold) => {
                let value = threshold
                    .parse::<f64>()
                    .map_err(|_| SelectionParseError::InvalidThreshold(threshold.to_string()))?;
                if !category.thresholds().contains(&value) {
                    return Err(SelectionParseError::ThresholdNotOffered {
                        category: category.to_string(),
                        threshold: threshold.to_string(),
                    });
                }
                Some(value)
            }
        };
        Ok(Self {
            category,
            threshold,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(probabilities: &[f64]) -> Vec<MarketLine> {
        probabilities
            .iter()
            .enumerate()
            .map(|(index, &probability)| MarketLine {
                category: MarketCategory::CornersTotal,
                threshold: 8.5 + index as f64,
                estimate: 10.5,
                probability,
            })
            .collect()
    }

    #[test]
    fn picks_from_sweet_spot() {
        let lines = lines(&[0.82, 0.68, 0.54, 0.40]);
        let selected = SelectionPolicy::default().select(&lines).unwrap();
        assert_eq!(0.68, selected.probability);
        assert_eq!(9.5, selected.threshold);
    }

    #[test]
    fn likeliest_in_band_wins() {
        let lines = lines(&[0.9, 0.74, 0.61, 0.74]);
        let selected = SelectionPolicy::default().select(&lines).unwrap();
        assert_eq!(9.5, selected.threshold);
    }

    #[test]
    fn falls_back_above_floor() {
        let offered = lines(&[0.91, 0.57, 0.30]);
        let selected = SelectionPolicy::default().select(&offered).unwrap();
        assert_eq!(0.91, selected.probability);

        let offered = lines(&[0.58, 0.56, 0.30]);
        let selected = SelectionPolicy::default().select(&offered).unwrap();
        assert_eq!(0.58, selected.probability);
    }

    #[test]
    fn no_selection_below_floor() {
        assert_eq!(None, SelectionPolicy::default().select(&lines(&[0.54, 0.40, 0.1])));
        assert_eq!(None, SelectionPolicy::default().select(&[]));
    }

    #[test]
    fn parse_selector() {
        assert_eq!(
            MarketSelector {
                category: MarketCategory::CardsTotal,
                threshold: None
            },
            MarketSelector::from_str("cards-total").unwrap()
        );
        let selector = MarketSelector::from_str(" Corners-Total @ 9.5").unwrap();
        assert_eq!(Some(9.5), selector.threshold);
        assert_eq!("corners-total@9.5", selector.to_string());
        let lines = lines(&[0.8, 0.6]);
        assert!(!selector.matches(&lines[0]));
        assert!(selector.matches(&lines[1]));
    }

    #[test]
    fn parse_selector_errors() {
        assert_eq!(
            SelectionParseError::UnknownCategory("throw-ins".into()),
            MarketSelector::from_str("throw-ins").unwrap_err()
        );
        assert_eq!(
            SelectionParseError::InvalidThreshold("nine".into()),
            MarketSelector::from_str("corners-total@nine").unwrap_err()
        );
        assert_eq!(
            "3.5 is not offered in cards-home",
            MarketSelector::from_str("cards-home@3.5").unwrap_err().to_string()
        );
    }
}
