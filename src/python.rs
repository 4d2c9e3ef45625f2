//! Python bindings for the text-level filter operations
//!
//! Filters cross the boundary as strings: the criteria grammar, compact
//! array JSON or operator-tree JSON. Parsing goes through the shared
//! parse cache.

use pyo3::prelude::*;

use crate::convert::{CompactArrayConverter, OperatorTreeConverter};
use crate::criteria::{get_or_parse, Criteria};
use crate::error::{FilterError, Result};

// ============================================================================
// Helper Functions
// ============================================================================

/// Parse a non-empty filter text
fn require_criteria(text: &str) -> Result<Criteria> {
    get_or_parse(text)?
        .ok_or_else(|| FilterError::InvalidOperand("filter text is empty".to_string()))
}

// ============================================================================
// Python Functions
// ============================================================================

/// Parse a filter and render it back in canonical form
///
/// # Returns
/// The canonical filter text, or None for an empty filter
///
/// # Raises
/// ValueError if the filter cannot be parsed
#[pyfunction]
fn normalize_filter(text: &str) -> PyResult<Option<String>> {
    Ok(get_or_parse(text)?.map(|criteria| criteria.to_string()))
}

/// Distinct property names referenced by a filter, in first-seen order
#[pyfunction]
fn filter_property_names(text: &str) -> PyResult<Vec<String>> {
    Ok(get_or_parse(text)?
        .map(|criteria| criteria.property_names())
        .unwrap_or_default())
}

/// Convert a compact array filter into filter text
///
/// # Arguments
/// * `json` - Compact array, e.g. `[["Age", ">", 18], "and", ["Name", "=", null]]`
#[pyfunction]
fn compact_to_filter(json: &str) -> PyResult<String> {
    let criteria = CompactArrayConverter::new().criteria_from_str(json)?;
    Ok(criteria.to_string())
}

/// Convert filter text into a compact array
///
/// # Raises
/// ValueError for an empty filter or one using Like, intervals, Any or CurrentUser
#[pyfunction]
fn filter_to_compact(text: &str) -> PyResult<String> {
    let criteria = require_criteria(text)?;
    Ok(CompactArrayConverter::new().criteria_to_string(&criteria)?)
}

/// Convert an operator-tree JSON document into filter text
#[pyfunction]
fn operator_tree_to_filter(json: &str) -> PyResult<String> {
    let criteria = OperatorTreeConverter::new().criteria_from_json(json)?;
    Ok(criteria.to_string())
}

/// Convert filter text into an operator-tree JSON document
#[pyfunction]
fn filter_to_operator_tree(text: &str) -> PyResult<String> {
    let criteria = require_criteria(text)?;
    Ok(OperatorTreeConverter::new().criteria_to_json(&criteria)?)
}

// ============================================================================
// Python Module Definition
// ============================================================================

/// Python module definition
#[pymodule]
fn criteria_core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(normalize_filter, m)?)?;
    m.add_function(wrap_pyfunction!(filter_property_names, m)?)?;
    m.add_function(wrap_pyfunction!(compact_to_filter, m)?)?;
    m.add_function(wrap_pyfunction!(filter_to_compact, m)?)?;
    m.add_function(wrap_pyfunction!(operator_tree_to_filter, m)?)?;
    m.add_function(wrap_pyfunction!(filter_to_operator_tree, m)?)?;
    Ok(())
}
