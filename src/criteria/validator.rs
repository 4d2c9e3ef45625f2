//! Validation of property references against a target type

use crate::compiler::{MemberKind, MemberResolver, TypeDescriptor};
use crate::criteria::ast::Criteria;
use crate::criteria::visitor::CriteriaVisitor;

/// Whether every property referenced by `criteria` exists on `descriptor`
///
/// Only the first segment of a dotted name is checked. `Any` item
/// criteria are checked against the collection's item type.
pub fn is_valid_on(criteria: &Criteria, descriptor: &TypeDescriptor) -> bool {
    let mut validator = Validator {
        descriptor,
        valid: true,
    };
    criteria.accept(&mut validator);
    validator.valid
}

struct Validator<'d> {
    descriptor: &'d TypeDescriptor,
    valid: bool,
}

impl Validator<'_> {
    fn check(&self, criteria: &Criteria) -> bool {
        let Some(name) = criteria.property_name() else {
            return true;
        };
        let first = name.split('.').next().unwrap_or(name);
        if self.descriptor.find(first).is_none() {
            return false;
        }

        match criteria {
            Criteria::Any(any) => match self.descriptor.resolve(name) {
                Ok(resolved) => match resolved.kind() {
                    MemberKind::Collection(item_type) => is_valid_on(any.item_criteria(), item_type),
                    _ => false,
                },
                Err(_) => false,
            },
            _ => true,
        }
    }
}

impl<'c> CriteriaVisitor<'c> for Validator<'_> {
    fn visit(&mut self, criteria: &'c Criteria) {
        if self.valid && !self.check(criteria) {
            self.valid = false;
        }
    }
}
