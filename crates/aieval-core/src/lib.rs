//! aieval-core: Question segmentation, scoring and result aggregation.
//!
//! This crate defines the data model, the collaborator traits, and the
//! evaluation pipeline that turns a submission and an answer key into a
//! per-question, per-student evaluation record.

pub mod engine;
pub mod error;
pub mod examiner;
pub mod matcher;
pub mod model;
pub mod response;
pub mod scorer;
pub mod segment;
pub mod statistics;
pub mod table;
pub mod traits;
