//! Join, aggregation and overlay stages of the dashboard pipeline.
//!
//! All stages are pure functions over in-memory records so a run can be
//! repeated for every selection change without touching the network.

pub mod aggregate;
pub mod join;
pub mod overlay;
pub mod resample;
pub mod utility;
