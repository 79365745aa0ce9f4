//! Aggregation engine.
//!
//! Pure functions over an immutable record slice. Every view takes its
//! filters and selections as explicit parameters.

pub mod aggregator;
pub mod compare;
pub mod scale;
pub mod stats;
pub mod trend;

pub use aggregator::*;
pub use compare::{barbell_comparison, lift_maxima, ComparisonTags, TagConstraint};
pub use scale::{aggregate_domain, color_domain, legend_summary};
pub use stats::{box_stats, median, quantile_sorted};
pub use trend::{best_per_year, trend_series};
