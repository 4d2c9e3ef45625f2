//! Configuration module for culture-dependent conventions
//!
//! This module handles deserialization of culture settings from JSON.

mod culture;

pub use culture::*;

use crate::error::{FilterError, Result};

/// Deserialize culture settings from a JSON document
///
/// Missing fields fall back to [`Culture::default`].
pub fn load_culture(json: &str) -> Result<Culture> {
    serde_json::from_str(json).map_err(|e| FilterError::Deserialization(e.to_string()))
}
