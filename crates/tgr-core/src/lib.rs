//! Core types for the reposter: configuration, errors, logging.
//!
//! The adapter crates (tdjson client, bot API client) map their failures into
//! [`Error`] so the rest of the application handles them uniformly.

pub mod config;
pub mod errors;
pub mod logging;

pub use errors::{Error, Result};
