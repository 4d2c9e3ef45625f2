//! Predicate compiler
//!
//! Turns a criteria tree plus the member layout of a target type into a
//! reusable [`Predicate`] over instances of that type.

mod descriptor;
mod interval;
mod lower;
mod predicate;

#[cfg(test)]
mod property_tests;

pub use descriptor::*;
pub use interval::{interval_bounds, IntervalBounds};
pub use lower::{CompareOp, Compiler, Lowered, TextFunction, TextRendering};
pub use predicate::Predicate;

use crate::criteria::{validator, Criteria};
use crate::error::Result;
use tracing::debug;

/// Compile `criteria` against `descriptor` with default settings
pub fn compile(criteria: &Criteria, descriptor: &TypeDescriptor) -> Result<Predicate> {
    Compiler::new(descriptor).compile(criteria)
}

/// Check `criteria` on a single record
///
/// Never fails: invalid criteria, compilation errors and evaluation
/// errors all yield `false`.
pub fn is_satisfied(criteria: &Criteria, descriptor: &TypeDescriptor, record: &dyn Record) -> bool {
    if !validator::is_valid_on(criteria, descriptor) {
        debug!(type_name = descriptor.name(), criteria = %criteria, "criteria not valid on type");
        return false;
    }

    match compile(criteria, descriptor).and_then(|predicate| predicate.evaluate(record)) {
        Ok(result) => result,
        Err(err) => {
            debug!(type_name = descriptor.name(), error = %err, "criteria evaluation failed");
            false
        }
    }
}
