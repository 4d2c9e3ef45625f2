//! Pre-order traversal over criteria trees

use crate::criteria::ast::{Criteria, PropertyCriteria};
use ahash::AHashSet;

/// Visitor invoked on each node of a criteria tree
pub trait CriteriaVisitor<'c> {
    fn visit(&mut self, criteria: &'c Criteria);
}

impl Criteria {
    /// Visit this node, then its children left to right
    ///
    /// The item criteria of an `Any` node belong to another type and are
    /// not traversed.
    pub fn accept<'c, V: CriteriaVisitor<'c> + ?Sized>(&'c self, visitor: &mut V) {
        visitor.visit(self);
        match self {
            Criteria::And(left, right) | Criteria::Or(left, right) => {
                left.accept(visitor);
                right.accept(visitor);
            }
            Criteria::Not(inner) => inner.accept(visitor),
            _ => {}
        }
    }

    /// Distinct property criteria in the tree, in visiting order
    ///
    /// Two criteria are the same when they render to the same text.
    pub fn property_criteria(&self) -> Vec<&dyn PropertyCriteria> {
        let mut extractor = PropertyCriteriaExtractor::default();
        self.accept(&mut extractor);
        extractor.found
    }

    /// Distinct property names referenced outside of `Any` item criteria
    pub fn property_names(&self) -> Vec<String> {
        let mut seen = AHashSet::new();
        self.property_criteria()
            .into_iter()
            .map(|c| c.property_name().to_string())
            .filter(|name| seen.insert(name.clone()))
            .collect()
    }
}

#[derive(Default)]
struct PropertyCriteriaExtractor<'c> {
    seen: AHashSet<String>,
    found: Vec<&'c dyn PropertyCriteria>,
}

impl<'c> CriteriaVisitor<'c> for PropertyCriteriaExtractor<'c> {
    fn visit(&mut self, criteria: &'c Criteria) {
        if let Some(property) = criteria.as_property_criteria() {
            if self.seen.insert(criteria.to_string()) {
                self.found.push(property);
            }
        }
    }
}
