//! Member layout of target types and runtime access to their instances

use crate::error::{FilterError, Result};
use chrono::NaiveDateTime;
use smallvec::SmallVec;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

/// Kind of a member, as far as filtering is concerned
#[derive(Debug, Clone, PartialEq)]
pub enum MemberKind {
    String,
    Integer,
    Float,
    /// Exact numeric, compared as `f64`
    ///
    /// Exactness is lost: literals and record values both go through `f64`,
    /// so digits beyond its precision (about 15 significant) do not count.
    Decimal,
    Boolean,
    DateTime,
    /// Enumeration, compared through its integral representation
    Enum,
    Object(Arc<TypeDescriptor>),
    Collection(Arc<TypeDescriptor>),
}

impl MemberKind {
    pub fn name(&self) -> &'static str {
        match self {
            MemberKind::String => "string",
            MemberKind::Integer => "integer",
            MemberKind::Float => "float",
            MemberKind::Decimal => "decimal",
            MemberKind::Boolean => "boolean",
            MemberKind::DateTime => "date/time",
            MemberKind::Enum => "enum",
            MemberKind::Object(_) => "object",
            MemberKind::Collection(_) => "collection",
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            MemberKind::Integer | MemberKind::Float | MemberKind::Decimal
        )
    }

    /// Reference-like kinds can always hold null
    fn always_nullable(&self) -> bool {
        matches!(
            self,
            MemberKind::String | MemberKind::Object(_) | MemberKind::Collection(_)
        )
    }
}

/// A named member of a type
#[derive(Debug, Clone, PartialEq)]
pub struct MemberDescriptor {
    name: String,
    kind: MemberKind,
    nullable: bool,
}

impl MemberDescriptor {
    pub fn new(name: impl Into<String>, kind: MemberKind) -> Self {
        let nullable = kind.always_nullable();
        Self {
            name: name.into(),
            kind,
            nullable,
        }
    }

    pub fn nullable(name: impl Into<String>, kind: MemberKind) -> Self {
        Self {
            name: name.into(),
            kind,
            nullable: true,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &MemberKind {
        &self.kind
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }
}

/// Member layout of a filterable type
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDescriptor {
    name: String,
    members: Vec<MemberDescriptor>,
}

impl TypeDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            members: Vec::new(),
        }
    }

    pub fn with_member(self, name: impl Into<String>, kind: MemberKind) -> Self {
        self.with(MemberDescriptor::new(name, kind))
    }

    pub fn with_nullable_member(self, name: impl Into<String>, kind: MemberKind) -> Self {
        self.with(MemberDescriptor::nullable(name, kind))
    }

    pub fn with(mut self, member: MemberDescriptor) -> Self {
        self.members.retain(|m| m.name != member.name);
        self.members.push(member);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn members(&self) -> &[MemberDescriptor] {
        &self.members
    }

    pub fn find(&self, name: &str) -> Option<&MemberDescriptor> {
        self.members.iter().find(|m| m.name == name)
    }
}

/// Dotted member path, e.g. `Customer.Address.City`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MemberPath {
    segments: SmallVec<[String; 4]>,
}

impl MemberPath {
    pub fn parse(path: &str) -> Result<Self> {
        let segments: SmallVec<[String; 4]> = path.split('.').map(str::to_string).collect();
        if segments.iter().any(|s| s.trim().is_empty()) {
            return Err(FilterError::Construction(format!(
                "invalid member path '{}'",
                path
            )));
        }
        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn first(&self) -> &str {
        &self.segments[0]
    }
}

impl fmt::Display for MemberPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("."))
    }
}

/// A member path resolved against a type
#[derive(Debug, Clone)]
pub struct ResolvedMember {
    pub path: MemberPath,
    pub member: MemberDescriptor,
}

impl ResolvedMember {
    pub fn kind(&self) -> &MemberKind {
        self.member.kind()
    }
}

/// Resolves dotted member paths against type metadata
pub trait MemberResolver {
    fn resolve(&self, path: &str) -> Result<ResolvedMember>;
}

impl MemberResolver for TypeDescriptor {
    /// Resolve each segment against the previous segment's type
    fn resolve(&self, path: &str) -> Result<ResolvedMember> {
        let member_path = MemberPath::parse(path)?;
        let mut current = self;
        let mut member = lookup(current, member_path.first())?;

        for (i, segment) in member_path.segments().iter().enumerate().skip(1) {
            current = match member.kind() {
                MemberKind::Object(nested) => nested.as_ref(),
                other => {
                    return Err(FilterError::TypeMismatch(format!(
                        "member '{}' of '{}' is {}, cannot access '{}' on it",
                        member_path.segments()[i - 1],
                        current.name(),
                        other.name(),
                        segment
                    )))
                }
            };
            member = lookup(current, segment)?;
        }

        Ok(ResolvedMember {
            member: member.clone(),
            path: member_path,
        })
    }
}

fn lookup<'t>(owner: &'t TypeDescriptor, name: &str) -> Result<&'t MemberDescriptor> {
    owner.find(name).ok_or_else(|| FilterError::MemberNotFound {
        type_name: owner.name().to_string(),
        member: name.to_string(),
    })
}

/// Runtime value of a member on a concrete instance
#[derive(Clone)]
pub enum FieldValue<'a> {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(Cow<'a, str>),
    DateTime(NaiveDateTime),
    /// Integral representation of an enumeration value
    Enum(i64),
    Object(&'a dyn Record),
    Collection(Vec<&'a dyn Record>),
}

impl FieldValue<'_> {
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            FieldValue::Null => "null",
            FieldValue::Bool(_) => "boolean",
            FieldValue::Int(_) => "integer",
            FieldValue::Float(_) => "float",
            FieldValue::Text(_) => "string",
            FieldValue::DateTime(_) => "date/time",
            FieldValue::Enum(_) => "enum",
            FieldValue::Object(_) => "object",
            FieldValue::Collection(_) => "collection",
        }
    }
}

impl fmt::Debug for FieldValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Null => f.write_str("Null"),
            FieldValue::Bool(v) => write!(f, "Bool({})", v),
            FieldValue::Int(v) => write!(f, "Int({})", v),
            FieldValue::Float(v) => write!(f, "Float({})", v),
            FieldValue::Text(v) => write!(f, "Text({:?})", v),
            FieldValue::DateTime(v) => write!(f, "DateTime({})", v),
            FieldValue::Enum(v) => write!(f, "Enum({})", v),
            FieldValue::Object(_) => f.write_str("Object(..)"),
            FieldValue::Collection(items) => write!(f, "Collection(len={})", items.len()),
        }
    }
}

/// Instance of a filterable type
///
/// Returns `None` for members the instance does not have.
pub trait Record {
    fn member(&self, name: &str) -> Option<FieldValue<'_>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order_type() -> TypeDescriptor {
        let address = TypeDescriptor::new("Address").with_member("City", MemberKind::String);
        let customer = TypeDescriptor::new("Customer")
            .with_member("Name", MemberKind::String)
            .with_member("Address", MemberKind::Object(Arc::new(address)));
        TypeDescriptor::new("Order")
            .with_member("Total", MemberKind::Decimal)
            .with_nullable_member("Shipped", MemberKind::DateTime)
            .with_member("Customer", MemberKind::Object(Arc::new(customer)))
    }

    #[test]
    fn test_resolve_dotted_path() {
        let resolved = order_type().resolve("Customer.Address.City").unwrap();
        assert_eq!(resolved.path.to_string(), "Customer.Address.City");
        assert_eq!(resolved.kind(), &MemberKind::String);
        assert!(resolved.member.is_nullable());
    }

    #[test]
    fn test_nullability_defaults() {
        let order = order_type();
        assert!(!order.find("Total").unwrap().is_nullable());
        assert!(order.find("Shipped").unwrap().is_nullable());
        assert!(order.find("Customer").unwrap().is_nullable());
    }

    #[test]
    fn test_resolve_missing_segment() {
        let err = order_type().resolve("Customer.Phone").unwrap_err();
        assert_eq!(
            err,
            FilterError::MemberNotFound {
                type_name: "Customer".to_string(),
                member: "Phone".to_string(),
            }
        );
    }

    #[test]
    fn test_resolve_through_scalar() {
        let err = order_type().resolve("Total.Value").unwrap_err();
        assert!(matches!(err, FilterError::TypeMismatch(_)));
    }

    #[test]
    fn test_invalid_path() {
        assert!(MemberPath::parse("A..B").is_err());
        assert!(MemberPath::parse("").is_err());
        assert_eq!(MemberPath::parse("A.B").unwrap().first(), "A");
    }

    #[test]
    fn test_with_replaces_member() {
        let t = TypeDescriptor::new("T")
            .with_member("A", MemberKind::Integer)
            .with_member("A", MemberKind::String);
        assert_eq!(t.members().len(), 1);
        assert_eq!(t.find("A").unwrap().kind(), &MemberKind::String);
    }
}
