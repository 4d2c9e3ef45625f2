//! Lowering of criteria into a boolean expression graph
//!
//! Lowering resolves every member path against the target type, coerces
//! literal operands to the member kinds, rewrites `Like`, `Between` and
//! `In` into primitive comparisons and computes interval bounds. The
//! resulting [`Lowered`] graph no longer needs the type descriptor.

use crate::compiler::descriptor::{MemberKind, MemberPath, MemberResolver, ResolvedMember, TypeDescriptor};
use crate::compiler::interval::interval_bounds;
use crate::compiler::predicate::Predicate;
use crate::config::Culture;
use crate::criteria::{
    BetweenCriteria, ComparisonCriteria, ComparisonOperator, Criteria, FunctionCriteria,
    FunctionType, InCriteria, IntervalCriteria, PropertyCriteria, Value,
};
use crate::error::{FilterError, Result};
use chrono::NaiveDate;
use std::fmt;
use tracing::debug;

/// Primitive comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Equal,
    NotEqual,
    Greater,
    GreaterOrEqual,
    Less,
    LessOrEqual,
}

impl CompareOp {
    pub fn symbol(self) -> &'static str {
        match self {
            CompareOp::Equal => "==",
            CompareOp::NotEqual => "<>",
            CompareOp::Greater => ">",
            CompareOp::GreaterOrEqual => ">=",
            CompareOp::Less => "<",
            CompareOp::LessOrEqual => "<=",
        }
    }

    pub fn is_ordering(self) -> bool {
        !matches!(self, CompareOp::Equal | CompareOp::NotEqual)
    }

    fn from_operator(operator: ComparisonOperator) -> Option<Self> {
        match operator {
            ComparisonOperator::Equal => Some(CompareOp::Equal),
            ComparisonOperator::NotEqual => Some(CompareOp::NotEqual),
            ComparisonOperator::Greater => Some(CompareOp::Greater),
            ComparisonOperator::GreaterOrEqual => Some(CompareOp::GreaterOrEqual),
            ComparisonOperator::Less => Some(CompareOp::Less),
            ComparisonOperator::LessOrEqual => Some(CompareOp::LessOrEqual),
            ComparisonOperator::Like => None,
        }
    }
}

/// Text tests applied to a member
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextFunction {
    StartsWith,
    EndsWith,
    Contains,
}

impl TextFunction {
    pub fn name(self) -> &'static str {
        match self {
            TextFunction::StartsWith => "StartsWith",
            TextFunction::EndsWith => "EndsWith",
            TextFunction::Contains => "Contains",
        }
    }

    pub fn apply(self, haystack: &str, needle: &str) -> bool {
        match self {
            TextFunction::StartsWith => haystack.starts_with(needle),
            TextFunction::EndsWith => haystack.ends_with(needle),
            TextFunction::Contains => haystack.contains(needle),
        }
    }
}

/// How a member is turned into text before a [`TextFunction`] runs
#[derive(Debug, Clone, PartialEq)]
pub enum TextRendering {
    /// String member, used as is
    Plain,
    /// Date/time member, rendered as day/month/year without leading zeros
    Date(Culture),
}

/// Boolean expression graph over one implicit instance of the target type
#[derive(Debug, Clone, PartialEq)]
pub enum Lowered {
    Constant(bool),
    And(Box<Lowered>, Box<Lowered>),
    Or(Box<Lowered>, Box<Lowered>),
    Not(Box<Lowered>),
    Compare {
        path: MemberPath,
        op: CompareOp,
        operand: Value,
    },
    Text {
        path: MemberPath,
        function: TextFunction,
        needle: String,
        rendering: TextRendering,
    },
    /// Any element of the collection at `path` satisfies `item`
    Any {
        path: MemberPath,
        item: Box<Lowered>,
    },
}

impl Lowered {
    fn and(left: Lowered, right: Lowered) -> Lowered {
        Lowered::And(Box::new(left), Box::new(right))
    }

    fn or(left: Lowered, right: Lowered) -> Lowered {
        Lowered::Or(Box::new(left), Box::new(right))
    }

    fn compare(member: &ResolvedMember, op: CompareOp, operand: Value) -> Lowered {
        Lowered::Compare {
            path: member.path.clone(),
            op,
            operand,
        }
    }
}

impl fmt::Display for Lowered {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lowered::Constant(b) => f.write_str(if *b { "True" } else { "False" }),
            Lowered::And(l, r) => write!(f, "({} AND {})", l, r),
            Lowered::Or(l, r) => write!(f, "({} OR {})", l, r),
            Lowered::Not(inner) => write!(f, "not ({})", inner),
            Lowered::Compare { path, op, operand } => {
                write!(f, "[{} {} {}]", path, op.symbol(), operand)
            }
            Lowered::Text {
                path,
                function,
                needle,
                rendering,
            } => {
                let needle = Value::from(needle.as_str());
                match rendering {
                    TextRendering::Plain => write!(f, "[{} {} {}]", path, function.name(), needle),
                    TextRendering::Date(_) => {
                        write!(f, "[Date({}) {} {}]", path, function.name(), needle)
                    }
                }
            }
            Lowered::Any { path, item } => write!(f, "[{}.Any({})]", path, item),
        }
    }
}

/// Compiles criteria against a target type
///
/// Interval bounds are computed once, at lowering time, from the
/// reference date (the current local date unless overridden).
#[derive(Debug, Clone)]
pub struct Compiler<'d> {
    descriptor: &'d TypeDescriptor,
    culture: Culture,
    today: NaiveDate,
}

impl<'d> Compiler<'d> {
    pub fn new(descriptor: &'d TypeDescriptor) -> Self {
        Self {
            descriptor,
            culture: Culture::default(),
            today: chrono::Local::now().date_naive(),
        }
    }

    pub fn with_culture(mut self, culture: Culture) -> Self {
        self.culture = culture;
        self
    }

    pub fn with_reference_date(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    pub fn descriptor(&self) -> &'d TypeDescriptor {
        self.descriptor
    }

    /// Compile `criteria` into a reusable predicate
    pub fn compile(&self, criteria: &Criteria) -> Result<Predicate> {
        debug!(type_name = self.descriptor.name(), criteria = %criteria, "compiling filter");
        let lowered = self.lower(criteria)?;
        Ok(Predicate::new(self.descriptor.name(), lowered))
    }

    /// Lower `criteria` into a boolean expression graph
    pub fn lower(&self, criteria: &Criteria) -> Result<Lowered> {
        match criteria {
            Criteria::And(left, right) => Ok(Lowered::and(self.lower(left)?, self.lower(right)?)),
            Criteria::Or(left, right) => Ok(Lowered::or(self.lower(left)?, self.lower(right)?)),
            Criteria::Not(inner) => Ok(Lowered::Not(Box::new(self.lower(inner)?))),
            Criteria::Comparison(c) => self.lower_comparison(c),
            Criteria::Function(c) => self.lower_function(c),
            Criteria::Between(c) => self.lower_between(c),
            Criteria::In(c) => self.lower_in(c),
            Criteria::Null(c) => {
                let member = self.resolve(c)?;
                Ok(if member.member.is_nullable() {
                    Lowered::compare(&member, CompareOp::Equal, Value::Null)
                } else {
                    Lowered::Constant(false)
                })
            }
            Criteria::NotNull(c) => {
                let member = self.resolve(c)?;
                Ok(if member.member.is_nullable() {
                    Lowered::compare(&member, CompareOp::NotEqual, Value::Null)
                } else {
                    Lowered::Constant(true)
                })
            }
            Criteria::Interval(c) => self.lower_interval(c),
            Criteria::Any(c) => {
                let member = self.resolve(c)?;
                let item_type = match member.kind() {
                    MemberKind::Collection(item_type) => item_type,
                    other => {
                        return Err(FilterError::TypeMismatch(format!(
                            "Any requires a collection, '{}' is {}",
                            member.path,
                            other.name()
                        )))
                    }
                };
                let item_compiler = Compiler {
                    descriptor: item_type.as_ref(),
                    culture: self.culture.clone(),
                    today: self.today,
                };
                let item = item_compiler.lower(c.item_criteria())?;
                Ok(Lowered::Any {
                    path: member.path.clone(),
                    item: Box::new(item),
                })
            }
            Criteria::CurrentUser => Err(FilterError::UnsupportedOperator(
                "CurrentUser must be substituted before compilation".to_string(),
            )),
        }
    }

    fn resolve(&self, criteria: &dyn PropertyCriteria) -> Result<ResolvedMember> {
        self.descriptor.resolve(criteria.property_name())
    }

    fn lower_comparison(&self, c: &ComparisonCriteria) -> Result<Lowered> {
        let member = self.resolve(c)?;
        match CompareOp::from_operator(c.operator()) {
            Some(op) => self.lower_compare(&member, op, c.value()),
            None => self.lower_like(&member, c.value()),
        }
    }

    fn lower_compare(&self, member: &ResolvedMember, op: CompareOp, value: &Value) -> Result<Lowered> {
        let operand = self.coerce(member, value)?;
        if op.is_ordering() {
            match member.kind() {
                MemberKind::Boolean | MemberKind::Object(_) | MemberKind::Collection(_) => {
                    return Err(FilterError::TypeMismatch(format!(
                        "operator {} is not defined on {} member '{}'",
                        op.symbol(),
                        member.kind().name(),
                        member.path
                    )))
                }
                _ => {}
            }
        }
        Ok(Lowered::compare(member, op, operand))
    }

    /// `%x%` contains, `x%` starts with, `%x` ends with, otherwise equality
    fn lower_like(&self, member: &ResolvedMember, pattern: &Value) -> Result<Lowered> {
        let pattern = match (member.kind(), pattern.as_str()) {
            (MemberKind::String, Some(p)) if !p.is_empty() => p,
            _ => return Ok(Lowered::Constant(false)),
        };

        let (function, needle) = if pattern == "%" {
            (TextFunction::StartsWith, "")
        } else if pattern.len() >= 2 && pattern.starts_with('%') && pattern.ends_with('%') {
            (TextFunction::Contains, &pattern[1..pattern.len() - 1])
        } else if let Some(prefix) = pattern.strip_suffix('%') {
            (TextFunction::StartsWith, prefix)
        } else if let Some(suffix) = pattern.strip_prefix('%') {
            (TextFunction::EndsWith, suffix)
        } else {
            return self.lower_compare(member, CompareOp::Equal, &Value::from(pattern));
        };

        Ok(Lowered::Text {
            path: member.path.clone(),
            function,
            needle: needle.to_string(),
            rendering: TextRendering::Plain,
        })
    }

    fn lower_function(&self, c: &FunctionCriteria) -> Result<Lowered> {
        let member = self.resolve(c)?;
        let function = match c.function_type() {
            FunctionType::StartsWith => TextFunction::StartsWith,
            FunctionType::EndsWith => TextFunction::EndsWith,
            FunctionType::Contains => TextFunction::Contains,
            FunctionType::IsNullOrEmpty => return Ok(self.lower_is_null_or_empty(&member)),
        };

        let needle = match c.value().to_plain_string() {
            Some(needle) => needle,
            None => return Ok(Lowered::Constant(false)),
        };

        let (needle, rendering) = match member.kind() {
            MemberKind::String => (needle, TextRendering::Plain),
            MemberKind::DateTime => (
                self.culture.normalize_date_fragment(&needle),
                TextRendering::Date(self.culture.clone()),
            ),
            // no text rendering for other kinds
            _ => return Ok(Lowered::Constant(false)),
        };

        Ok(Lowered::Text {
            path: member.path,
            function,
            needle,
            rendering,
        })
    }

    fn lower_is_null_or_empty(&self, member: &ResolvedMember) -> Lowered {
        let is_null = || Lowered::compare(member, CompareOp::Equal, Value::Null);
        match member.kind() {
            MemberKind::String => Lowered::or(
                is_null(),
                Lowered::compare(member, CompareOp::Equal, Value::from("")),
            ),
            kind if kind.is_numeric() && member.member.is_nullable() => is_null(),
            _ => Lowered::Constant(false),
        }
    }

    fn lower_between(&self, c: &BetweenCriteria) -> Result<Lowered> {
        let member = self.resolve(c)?;
        Ok(Lowered::and(
            self.lower_compare(&member, CompareOp::GreaterOrEqual, c.begin())?,
            self.lower_compare(&member, CompareOp::LessOrEqual, c.end())?,
        ))
    }

    /// Left-associated disjunction of equalities, empty lists never match
    fn lower_in(&self, c: &InCriteria) -> Result<Lowered> {
        let member = self.resolve(c)?;
        let mut values = c.values().iter();
        let first = match values.next() {
            Some(first) => self.lower_compare(&member, CompareOp::Equal, first)?,
            None => return Ok(Lowered::Constant(false)),
        };
        values.try_fold(first, |acc, value| -> Result<Lowered> {
            Ok(Lowered::or(
                acc,
                self.lower_compare(&member, CompareOp::Equal, value)?,
            ))
        })
    }

    fn lower_interval(&self, c: &IntervalCriteria) -> Result<Lowered> {
        let member = self.resolve(c)?;
        if member.kind() != &MemberKind::DateTime {
            return Err(FilterError::TypeMismatch(format!(
                "{} requires a date/time member, '{}' is {}",
                c.interval_type().name(),
                member.path,
                member.kind().name()
            )));
        }

        let bounds = interval_bounds(c.interval_type(), self.today)?;
        let lower = bounds
            .lower
            .map(|b| Lowered::compare(&member, CompareOp::GreaterOrEqual, Value::DateTime(b)));
        let upper = bounds
            .upper
            .map(|b| Lowered::compare(&member, CompareOp::Less, Value::DateTime(b)));

        Ok(match (lower, upper) {
            (Some(l), Some(u)) => Lowered::and(l, u),
            (Some(bound), None) | (None, Some(bound)) => bound,
            (None, None) => Lowered::Constant(true),
        })
    }

    /// Convert a literal to the representation of the member kind
    fn coerce(&self, member: &ResolvedMember, value: &Value) -> Result<Value> {
        let coerced = match (member.kind(), value) {
            (_, Value::Null) if member.member.is_nullable() => Some(Value::Null),
            (MemberKind::String, Value::String(_))
            | (MemberKind::Integer, Value::Int(_))
            | (MemberKind::Enum, Value::Int(_))
            | (MemberKind::Boolean, Value::Bool(_))
            | (MemberKind::DateTime, Value::DateTime(_)) => Some(value.clone()),
            // Decimal members are approximated by f64
            (MemberKind::Float | MemberKind::Decimal, Value::Int(i)) => Some(Value::Float(*i as f64)),
            (MemberKind::Float | MemberKind::Decimal, Value::Float(f)) => Some(Value::Float(*f)),
            (MemberKind::DateTime, Value::String(s)) => {
                self.culture.parse_date_time(s).map(Value::DateTime)
            }
            _ => None,
        };

        coerced.ok_or_else(|| {
            FilterError::TypeMismatch(format!(
                "cannot compare {} member '{}' with {} value {}",
                member.kind().name(),
                member.path,
                value.kind_name(),
                value
            ))
        })
    }
}
