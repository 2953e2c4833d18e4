//! Offline clip time-range audit.
//!
//! Validates every stored clip, writes the report and repair proposals as
//! JSON artifacts, and optionally applies the proposals that are safe to
//! apply without review. The binary is a thin env-configured wrapper around
//! [`runner::run`].

pub mod config;
pub mod report;
pub mod runner;
