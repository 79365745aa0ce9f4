//! liftstats - aggregation engine for powerlifting competition charts.
//!
//! Loads OpenPowerlifting-style competition results, validates them into
//! [`models::LiftRecord`]s and computes the numbers behind a country
//! choropleth, cross-tabulated box plots, a two-group lift comparison and a
//! best-per-year trend line.

pub mod analysis;
pub mod cli;
pub mod config;
pub mod error;
pub mod filter;
pub mod loader;
pub mod models;
pub mod normalize;
pub mod report;
