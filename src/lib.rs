//! Criteria Core - filter criteria language for business entities
//!
//! This crate parses filter texts such as `([Age > 18] AND [Name StartsWith 'A'])`
//! into a criteria tree, compiles criteria into predicates over typed
//! records, and converts criteria to and from the filter formats used by
//! grid components. Python bindings are available behind the `python`
//! feature.

pub mod compiler;
pub mod config;
pub mod convert;
pub mod criteria;
pub mod error;

#[cfg(feature = "python")]
mod python;

pub use compiler::{compile, is_satisfied, Compiler, Predicate, Record, TypeDescriptor};
pub use convert::{CompactArrayConverter, CriteriaConverter, OperatorTreeConverter};
pub use criteria::{parse, Criteria, Parser, Value};
pub use error::{FilterError, Result};
