//! PaperFlow API - record types for the four remote tables
//!
//! This crate provides:
//! - Row types as returned by the data store (sections, notes, pushes, acknowledgments)
//! - Insert payloads and partial-update patches, with the merge rules the local cache uses
//! - Drafts: the caller-facing inputs the workflows turn into insert payloads
//! - Input validation utilities

pub mod model;
pub mod validation;

// Re-export commonly used types
pub use model::*;
pub use validation::*;
