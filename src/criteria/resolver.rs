//! Property name resolution
//!
//! Rewrites the property names of a criteria tree into their canonical
//! form. The input tree is left untouched; a renamed copy is returned.

use crate::compiler::{MemberKind, TypeDescriptor};
use crate::criteria::ast::Criteria;
use crate::error::{FilterError, Result};
use ahash::AHashMap;

/// Rename every property criteria through `lookup`
///
/// Properties inside `Any` item criteria belong to the item type and are
/// not renamed. A name `lookup` does not know is an error.
pub fn resolve<F>(criteria: &Criteria, lookup: F) -> Result<Criteria>
where
    F: Fn(&str) -> Option<String>,
{
    rewrite(criteria, &lookup)
}

fn rewrite<F>(criteria: &Criteria, lookup: &F) -> Result<Criteria>
where
    F: Fn(&str) -> Option<String>,
{
    match criteria {
        Criteria::And(left, right) => Ok(Criteria::and(
            rewrite(left, lookup)?,
            rewrite(right, lookup)?,
        )),
        Criteria::Or(left, right) => Ok(Criteria::or(
            rewrite(left, lookup)?,
            rewrite(right, lookup)?,
        )),
        Criteria::Not(inner) => Ok(Criteria::negate(rewrite(inner, lookup)?)),
        Criteria::CurrentUser => Ok(Criteria::CurrentUser),
        leaf => match leaf.property_name() {
            Some(name) => {
                let canonical =
                    lookup(name).ok_or_else(|| FilterError::UnresolvedProperty(name.to_string()))?;
                leaf.with_property_name(canonical)
            }
            None => Ok(leaf.clone()),
        },
    }
}

/// Case-insensitive table of canonical property names
#[derive(Debug, Clone, Default)]
pub struct PropertyNameTable {
    names: AHashMap<String, String>,
}

impl PropertyNameTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Table of every member path of `descriptor`, nested objects included
    pub fn from_descriptor(descriptor: &TypeDescriptor) -> Self {
        let mut table = Self::new();
        table.add_members(descriptor, "");
        table
    }

    fn add_members(&mut self, descriptor: &TypeDescriptor, prefix: &str) {
        for member in descriptor.members() {
            let path = if prefix.is_empty() {
                member.name().to_string()
            } else {
                format!("{}.{}", prefix, member.name())
            };
            if let MemberKind::Object(nested) = member.kind() {
                self.add_members(nested, &path);
            }
            self.insert(path.clone(), path);
        }
    }

    /// Register `alias` as a spelling of `canonical`
    pub fn insert(&mut self, alias: impl AsRef<str>, canonical: impl Into<String>) {
        self.names
            .insert(alias.as_ref().to_lowercase(), canonical.into());
    }

    pub fn lookup(&self, name: &str) -> Option<String> {
        self.names.get(&name.to_lowercase()).cloned()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn resolve(&self, criteria: &Criteria) -> Result<Criteria> {
        resolve(criteria, |name| self.lookup(name))
    }
}
