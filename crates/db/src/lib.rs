//! Clip document storage.
//!
//! The production clip collection lives in a document database; this crate
//! works against an exported JSON array of those documents. [`ClipStore`]
//! owns the loaded documents and persists them atomically, and
//! [`repositories::ClipRepo`] provides the reads and review write-backs the
//! admin tooling needs.

pub mod error;
pub mod models;
pub mod repositories;
pub mod store;

pub use error::DbError;
pub use store::ClipStore;
