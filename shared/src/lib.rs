//! Shared types and the catch-probability engine for Fishcast
//!
//! This crate holds everything that is free of I/O: label vocabularies,
//! preference and sensor records, the weight tables, and the engine that
//! turns one batch of sensor records into scored results.

pub mod engine;
pub mod models;
pub mod types;
pub mod validation;

pub use engine::*;
pub use models::*;
pub use types::*;
pub use validation::*;
