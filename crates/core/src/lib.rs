//! Testimony clip audit domain logic.
//!
//! Pure building blocks shared by the API server and the offline audit
//! script: clip time-range validation, batch aggregation, repair heuristics
//! and the normalization adapter for raw clip documents. Nothing in this
//! crate performs I/O.

pub mod clip_audit;
pub mod clip_normalize;
pub mod clip_repair;
pub mod clip_time;
pub mod error;
pub mod types;
