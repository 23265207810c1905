pub mod analysis;
pub mod betting;
pub mod cache;
pub mod confidence;
pub mod config;
pub mod data;
pub mod domain;
pub mod fallback;
pub mod features;
pub mod fixtures;
pub mod market;
pub mod names;
pub mod print;
pub mod projection;
pub mod referee;
pub mod selection;
pub mod simulation;

#[doc = include_str!("../../README.md")]
#[cfg(doc)]
fn readme() {}
