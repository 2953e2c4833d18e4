//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept the [`ClipStore`](crate::ClipStore) as the first argument.

pub mod clip_repo;

pub use clip_repo::ClipRepo;
