//! Staking helpers for a modelled probability against an offered decimal price.

use serde::Serialize;
use strum_macros::Display;
use thiserror::Error;

/// The smallest decimal price accepted.
pub const MIN_PRICE: f64 = 1.01;

/// The largest share of the bankroll ever recommended.
pub const KELLY_CAP: f64 = 0.10;

#[derive(Debug, Error, PartialEq)]
pub enum BettingError {
    #[error("probability {0} is outside [0, 1]")]
    InvalidProbability(f64),

    #[error("price {0} is below {MIN_PRICE} or not finite")]
    InvalidPrice(f64),

    #[error("bankroll {0} is negative or not finite")]
    InvalidBankroll(f64),

    #[error("kelly fraction {0} is outside (0, 1]")]
    InvalidKellyFraction(f64),
}

fn check_probability(probability: f64) -> Result<f64, BettingError> {
    if (0.0..=1.0).contains(&probability) {
        Ok(probability)
    } else {
        Err(BettingError::InvalidProbability(probability))
    }
}

fn check_price(price: f64) -> Result<f64, BettingError> {
    if price.is_finite() && price >= MIN_PRICE {
        Ok(price)
    } else {
        Err(BettingError::InvalidPrice(price))
    }
}

pub fn implied_probability(price: f64) -> Result<f64, BettingError> {
    Ok(1.0 / check_price(price)?)
}

/// Expected profit per unit staked.
pub fn expected_value(probability: f64, price: f64) -> Result<f64, BettingError> {
    let probability = check_probability(probability)?;
    let price = check_price(price)?;
    Ok(probability * (price - 1.0) - (1.0 - probability))
}

/// `fraction` of the full Kelly stake, as a share of the bankroll in `[0, KELLY_CAP]`.
pub fn kelly_fraction(probability: f64, price: f64, fraction: f64) -> Result<f64, BettingError> {
    let probability = check_probability(probability)?;
    let price = check_price(price)?;
    if !(fraction > 0.0 && fraction <= 1.0) {
        return Err(BettingError::InvalidKellyFraction(fraction));
    }
    let odds = price - 1.0;
    let full = (odds * probability - (1.0 - probability)) / odds;
    Ok((full * fraction).clamp(0.0, KELLY_CAP))
}

pub fn stake(bankroll: f64, fraction: f64) -> Result<f64, BettingError> {
    if !bankroll.is_finite() || bankroll < 0.0 {
        return Err(BettingError::InvalidBankroll(bankroll));
    }
    if !(0.0..=1.0).contains(&fraction) {
        return Err(BettingError::InvalidKellyFraction(fraction));
    }
    Ok(bankroll * fraction)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum StakeTier {
    High,
    Medium,
    Low,
    NoBet,
}
impl StakeTier {
    pub fn of(kelly_fraction: f64) -> Self {
        if kelly_fraction >= 0.08 {
            StakeTier::High
        } else if kelly_fraction >= 0.05 {
            StakeTier::Medium
        } else if kelly_fraction > 0.0 {
            StakeTier::Low
        } else {
            StakeTier::NoBet
        }
    }
}

/// A priced bet evaluated against a modelled probability.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BetAssessment {
    pub price: f64,
    pub implied_probability: f64,
    pub expected_value: f64,
    pub kelly_fraction: f64,
    /// Absent when no bankroll was given.
    pub stake: Option<f64>,
    pub tier: StakeTier,
}
impl BetAssessment {
    pub fn new(
        probability: f64,
        price: f64,
        fraction: f64,
        bankroll: Option<f64>,
    ) -> Result<Self, BettingError> {
        let kelly_fraction = kelly_fraction(probability, price, fraction)?;
        let stake = bankroll
            .map(|bankroll| stake(bankroll, kelly_fraction))
            .transpose()?;
        Ok(Self {
            price,
            implied_probability: implied_probability(price)?,
            expected_value: expected_value(probability, price)?,
            kelly_fraction,
            stake,
            tier: StakeTier::of(kelly_fraction),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_float_eq::*;

    #[test]
    fn implied() {
        assert_float_absolute_eq!(0.4, implied_probability(2.5).unwrap());
        assert_eq!(Err(BettingError::InvalidPrice(1.0)), implied_probability(1.0));
        assert_eq!(
            Err(BettingError::InvalidPrice(f64::INFINITY)),
            implied_probability(f64::INFINITY)
        );
    }

    #[test]
    fn ev() {
        assert_float_absolute_eq!(0.2, expected_value(0.6, 2.0).unwrap());
        assert_float_absolute_eq!(-0.2, expected_value(0.4, 2.0).unwrap());
        assert_eq!(Err(BettingError::InvalidProbability(1.2)), expected_value(1.2, 2.0));
    }

    #[test]
    fn kelly() {
        assert_float_absolute_eq!(0.05, kelly_fraction(0.6, 2.0, 0.25).unwrap());
        assert_float_absolute_eq!(KELLY_CAP, kelly_fraction(0.6, 2.0, 1.0).unwrap());
        assert_eq!(0.0, kelly_fraction(0.4, 2.0, 0.25).unwrap());
        assert_eq!(
            Err(BettingError::InvalidKellyFraction(0.0)),
            kelly_fraction(0.6, 2.0, 0.0)
        );
        assert_eq!(
            Err(BettingError::InvalidKellyFraction(1.5)),
            kelly_fraction(0.6, 2.0, 1.5)
        );
    }

    #[test]
    fn stakes() {
        assert_float_absolute_eq!(50.0, stake(1000.0, 0.05).unwrap());
        assert_eq!(Err(BettingError::InvalidBankroll(-1.0)), stake(-1.0, 0.05));
        assert!(matches!(stake(f64::NAN, 0.05), Err(BettingError::InvalidBankroll(_))));
    }

    #[test]
    fn tiers() {
        assert_eq!(StakeTier::High, StakeTier::of(0.1));
        assert_eq!(StakeTier::Medium, StakeTier::of(0.05));
        assert_eq!(StakeTier::Low, StakeTier::of(0.01));
        assert_eq!(StakeTier::NoBet, StakeTier::of(0.0));
        assert_eq!("no_bet", StakeTier::NoBet.to_string());
    }

    #[test]
    fn assessment() {
        let assessment = BetAssessment::new(0.65, 2.0, 0.25, Some(1000.0)).unwrap();
        assert_float_absolute_eq!(0.5, assessment.implied_probability);
        assert_float_absolute_eq!(0.3, assessment.expected_value);
        assert_float_absolute_eq!(0.075, assessment.kelly_fraction);
        assert_float_absolute_eq!(75.0, assessment.stake.unwrap());
        assert_eq!(StakeTier::Medium, assessment.tier);
        assert_eq!(None, BetAssessment::new(0.6, 2.0, 0.25, None).unwrap().stake);
    }
}
