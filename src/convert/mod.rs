//! Converters between criteria and external filter formats
//!
//! Two grid-facing formats are supported: a typed operator tree and a
//! compact nested JSON array.

pub mod compact_array;
pub mod operator_tree;

pub use compact_array::CompactArrayConverter;
pub use operator_tree::{
    BinaryOperatorType, CriteriaOperator, FunctionOperatorType, GroupOperatorType,
    OperatorTreeConverter, UnaryOperatorType,
};

use crate::criteria::Criteria;
use crate::error::Result;

/// Two-way translation between criteria and an external representation
pub trait CriteriaConverter {
    type External;

    fn to_criteria(&self, external: &Self::External) -> Result<Criteria>;

    fn from_criteria(&self, criteria: &Criteria) -> Result<Self::External>;
}
