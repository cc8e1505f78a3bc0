//! Weight-curve estimation.
//!
//! Each day's readings are outlier-filtered with a kernel density estimate,
//! split into a sow-only and a sow-plus-litter weight, and the resulting
//! daily series are smoothed by a two-regime regression around farrowing.

pub mod density;
pub mod pipeline;
pub mod regression;
pub mod segment;
pub mod types;
pub mod utility;
