//! Sport-agnostic numerics for count-based match statistics: Poisson probabilities and quantiles,
//! Monte Carlo sampling of Poisson totals and descriptive statistics over observation slices.

pub mod mc;
pub mod poisson;
pub mod stats;

#[doc = include_str!("../../README.md")]
#[cfg(doc)]
fn readme() {}
