//! Document models and request DTOs for clips and their review stamps.

pub mod clip;
pub mod review;
