//! Score aggregation and rating classification.
//!
//! Both halves are pure: [`aggregate`] folds a snapshot of submitted
//! evaluations into per-criterion and overall averages for one evaluatee,
//! and [`classify`] maps an overall average onto the cycle's configured
//! rating bands. Rounding to one decimal happens eagerly at each stage so
//! computed values match what the views display, compounding included.

mod aggregate;
mod classify;

pub use aggregate::{aggregate, ScoreSummary};
pub use classify::classify;

/// Round to one decimal place, half away from zero.
pub(crate) fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
