//! Error types and identifiers shared across the workspace

pub mod errors;
pub mod identifiers;
