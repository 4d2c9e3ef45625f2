//! Compiled predicates
//!
//! A [`Lowered`] graph is finalized once into a tree of boxed closures
//! which is then evaluated against any number of records.

use crate::compiler::descriptor::{FieldValue, MemberPath, Record};
use crate::compiler::lower::{CompareOp, Lowered, TextRendering};
use crate::criteria::Value;
use crate::error::{FilterError, Result};
use std::cmp::Ordering;
use std::fmt;
use tracing::debug;

type Eval = Box<dyn Fn(&dyn Record) -> Result<bool> + Send + Sync>;

/// Reusable boolean function over records of one type
pub struct Predicate {
    type_name: String,
    lowered: Lowered,
    exec: Eval,
}

impl Predicate {
    pub(crate) fn new(type_name: &str, lowered: Lowered) -> Self {
        let exec = finalize(lowered.clone());
        Self {
            type_name: type_name.to_string(),
            lowered,
            exec,
        }
    }

    /// Evaluate against `record`, reporting member access failures
    pub fn evaluate(&self, record: &dyn Record) -> Result<bool> {
        (self.exec)(record)
    }

    /// Evaluate against `record`, treating failures as a mismatch
    pub fn matches(&self, record: &dyn Record) -> bool {
        match self.evaluate(record) {
            Ok(result) => result,
            Err(err) => {
                debug!(type_name = %self.type_name, error = %err, "predicate evaluation failed");
                false
            }
        }
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn lowered(&self) -> &Lowered {
        &self.lowered
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Predicate")
            .field("type_name", &self.type_name)
            .field("lowered", &self.lowered.to_string())
            .finish()
    }
}

fn finalize(node: Lowered) -> Eval {
    match node {
        Lowered::Constant(value) => Box::new(move |_: &dyn Record| Ok(value)),
        Lowered::And(left, right) => {
            let (left, right) = (finalize(*left), finalize(*right));
            Box::new(move |record: &dyn Record| Ok(left(record)? && right(record)?))
        }
        Lowered::Or(left, right) => {
            let (left, right) = (finalize(*left), finalize(*right));
            Box::new(move |record: &dyn Record| Ok(left(record)? || right(record)?))
        }
        Lowered::Not(inner) => {
            let inner = finalize(*inner);
            Box::new(move |record: &dyn Record| Ok(!inner(record)?))
        }
        Lowered::Compare { path, op, operand } => Box::new(move |record: &dyn Record| {
            let field = read_member(record, &path)?;
            compare(&field, op, &operand, &path)
        }),
        Lowered::Text {
            path,
            function,
            needle,
            rendering,
        } => Box::new(move |record: &dyn Record| {
            let field = read_member(record, &path)?;
            match (&field, &rendering) {
                (FieldValue::Null, _) => Ok(false),
                (FieldValue::Text(text), TextRendering::Plain) => Ok(function.apply(text, &needle)),
                (FieldValue::DateTime(dt), TextRendering::Date(culture)) => {
                    Ok(function.apply(&culture.format_date_parts(dt), &needle))
                }
                (other, _) => Err(kind_mismatch(&path, other)),
            }
        }),
        Lowered::Any { path, item } => {
            let item = finalize(*item);
            Box::new(move |record: &dyn Record| match read_member(record, &path)? {
                FieldValue::Collection(items) => {
                    for element in items {
                        if item(element)? {
                            return Ok(true);
                        }
                    }
                    Ok(false)
                }
                FieldValue::Null => Err(FilterError::Evaluation(format!(
                    "collection '{}' is null",
                    path
                ))),
                other => Err(kind_mismatch(&path, &other)),
            })
        }
    }
}

fn kind_mismatch(path: &MemberPath, field: &FieldValue<'_>) -> FilterError {
    FilterError::TypeMismatch(format!(
        "member '{}' holds an unexpected {} value",
        path,
        field.kind_name()
    ))
}

/// Follow `path` from `record` through nested objects
fn read_member<'r>(record: &'r dyn Record, path: &MemberPath) -> Result<FieldValue<'r>> {
    let segments = path.segments();
    let (last, init) = segments
        .split_last()
        .ok_or_else(|| FilterError::Evaluation("empty member path".to_string()))?;

    let mut current = record;
    for segment in init {
        current = match current.member(segment) {
            Some(FieldValue::Object(next)) => next,
            Some(FieldValue::Null) => {
                return Err(FilterError::Evaluation(format!(
                    "null reference at '{}' in '{}'",
                    segment, path
                )))
            }
            Some(other) => return Err(kind_mismatch(path, &other)),
            None => return Err(missing_member(segment)),
        };
    }

    current.member(last).ok_or_else(|| missing_member(last))
}

fn missing_member(name: &str) -> FilterError {
    FilterError::Evaluation(format!("record has no member '{}'", name))
}

fn compare(field: &FieldValue<'_>, op: CompareOp, operand: &Value, path: &MemberPath) -> Result<bool> {
    let ordering = match (field, operand) {
        (FieldValue::Null, Value::Null) => Some(Ordering::Equal),
        (FieldValue::Null, _) | (_, Value::Null) => {
            return Ok(op == CompareOp::NotEqual);
        }
        (FieldValue::Int(a) | FieldValue::Enum(a), Value::Int(b)) => Some(a.cmp(b)),
        (FieldValue::Int(a), Value::Float(b)) => (*a as f64).partial_cmp(b),
        (FieldValue::Float(a), Value::Float(b)) => a.partial_cmp(b),
        (FieldValue::Float(a), Value::Int(b)) => a.partial_cmp(&(*b as f64)),
        (FieldValue::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        (FieldValue::Text(a), Value::String(b)) => Some(str::cmp(a, b)),
        (FieldValue::DateTime(a), Value::DateTime(b)) => Some(a.cmp(b)),
        (other, _) => return Err(kind_mismatch(path, other)),
    };

    // NaN compares unequal to everything
    let Some(ordering) = ordering else {
        return Ok(op == CompareOp::NotEqual);
    };

    Ok(match op {
        CompareOp::Equal => ordering == Ordering::Equal,
        CompareOp::NotEqual => ordering != Ordering::Equal,
        CompareOp::Greater => ordering == Ordering::Greater,
        CompareOp::GreaterOrEqual => ordering != Ordering::Less,
        CompareOp::Less => ordering == Ordering::Less,
        CompareOp::LessOrEqual => ordering != Ordering::Greater,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::{Compiler, MemberKind, TypeDescriptor};
    use crate::criteria::{Criteria, IntervalType};
    use chrono::{NaiveDate, NaiveDateTime};
    use std::borrow::Cow;
    use std::sync::Arc;

    struct Line {
        sku: &'static str,
        quantity: i64,
    }

    impl Record for Line {
        fn member(&self, name: &str) -> Option<FieldValue<'_>> {
            match name {
                "Sku" => Some(FieldValue::Text(Cow::Borrowed(self.sku))),
                "Quantity" => Some(FieldValue::Int(self.quantity)),
                _ => None,
            }
        }
    }

    struct Customer {
        name: Option<String>,
    }

    impl Record for Customer {
        fn member(&self, name: &str) -> Option<FieldValue<'_>> {
            match name {
                "Name" => Some(
                    self.name
                        .as_deref()
                        .map_or(FieldValue::Null, |n| FieldValue::Text(Cow::Borrowed(n))),
                ),
                _ => None,
            }
        }
    }

    struct Order {
        name: Option<String>,
        total: f64,
        status: i64,
        created: NaiveDateTime,
        customer: Option<Customer>,
        lines: Option<Vec<Line>>,
    }

    impl Record for Order {
        fn member(&self, name: &str) -> Option<FieldValue<'_>> {
            Some(match name {
                "Name" => self
                    .name
                    .as_deref()
                    .map_or(FieldValue::Null, |n| FieldValue::Text(Cow::Borrowed(n))),
                "Total" => FieldValue::Float(self.total),
                "Status" => FieldValue::Enum(self.status),
                "Created" => FieldValue::DateTime(self.created),
                "Customer" => self
                    .customer
                    .as_ref()
                    .map_or(FieldValue::Null, |c| FieldValue::Object(c)),
                "Lines" => self.lines.as_ref().map_or(FieldValue::Null, |lines| {
                    FieldValue::Collection(lines.iter().map(|l| l as &dyn Record).collect())
                }),
                _ => return None,
            })
        }
    }

    fn order_type() -> TypeDescriptor {
        let line = TypeDescriptor::new("Line")
            .with_member("Sku", MemberKind::String)
            .with_member("Quantity", MemberKind::Integer);
        let customer = TypeDescriptor::new("Customer").with_member("Name", MemberKind::String);
        TypeDescriptor::new("Order")
            .with_member("Name", MemberKind::String)
            .with_member("Total", MemberKind::Decimal)
            .with_member("Status", MemberKind::Enum)
            .with_member("Created", MemberKind::DateTime)
            .with_member("Customer", MemberKind::Object(Arc::new(customer)))
            .with_member("Lines", MemberKind::Collection(Arc::new(line)))
            .with_member("Archived", MemberKind::Boolean)
    }

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    fn order() -> Order {
        Order {
            name: Some("Spring sale".to_string()),
            total: 99.5,
            status: 2,
            created: at(2024, 6, 12, 9, 30),
            customer: Some(Customer {
                name: Some("Ada".to_string()),
            }),
            lines: Some(vec![
                Line {
                    sku: "A-1",
                    quantity: 3,
                },
                Line {
                    sku: "B-2",
                    quantity: 12,
                },
            ]),
        }
    }

    fn eval(criteria: Criteria, record: &Order) -> Result<bool> {
        let descriptor = order_type();
        Compiler::new(&descriptor)
            .with_reference_date(NaiveDate::from_ymd_opt(2024, 6, 12).unwrap())
            .compile(&criteria)?
            .evaluate(record)
    }

    #[test]
    fn test_comparisons() {
        let o = order();
        assert!(eval(Criteria::greater("Total", 50).unwrap(), &o).unwrap());
        assert!(eval(Criteria::less_or_equal("Total", 99.5).unwrap(), &o).unwrap());
        assert!(!eval(Criteria::less("Total", 99.5).unwrap(), &o).unwrap());
        assert!(eval(Criteria::equal("Status", 2).unwrap(), &o).unwrap());
        assert!(eval(Criteria::not_equal("Status", 3).unwrap(), &o).unwrap());
    }

    #[test]
    fn test_string_ordering_is_ordinal() {
        let o = order();
        assert!(eval(Criteria::greater("Name", "Spring").unwrap(), &o).unwrap());
        assert!(eval(Criteria::less("Name", "spring").unwrap(), &o).unwrap());
    }

    #[test]
    fn test_text_functions() {
        let o = order();
        assert!(eval(Criteria::like("Name", "%sale").unwrap(), &o).unwrap());
        assert!(eval(Criteria::starts_with("Name", "Spr").unwrap(), &o).unwrap());
        assert!(!eval(Criteria::contains("Name", "winter").unwrap(), &o).unwrap());
        assert!(eval(Criteria::contains("Created", "12.06").unwrap(), &o).unwrap());
        assert!(eval(Criteria::ends_with("Created", "2024").unwrap(), &o).unwrap());
    }

    #[test]
    fn test_null_member() {
        let mut o = order();
        o.name = None;
        assert!(eval(Criteria::null("Name").unwrap(), &o).unwrap());
        assert!(eval(Criteria::is_null_or_empty("Name").unwrap(), &o).unwrap());
        assert!(!eval(Criteria::starts_with("Name", "S").unwrap(), &o).unwrap());
        assert!(!eval(Criteria::greater("Name", "A").unwrap(), &o).unwrap());
        assert!(eval(Criteria::not_equal("Name", "A").unwrap(), &o).unwrap());
    }

    #[test]
    fn test_nested_path() {
        let o = order();
        assert!(eval(Criteria::equal("Customer.Name", "Ada").unwrap(), &o).unwrap());

        let mut orphan = order();
        orphan.customer = None;
        let err = eval(Criteria::equal("Customer.Name", "Ada").unwrap(), &orphan).unwrap_err();
        assert!(matches!(err, FilterError::Evaluation(_)));
    }

    #[test]
    fn test_any() {
        let o = order();
        let big = Criteria::any("Lines", Criteria::greater("Quantity", 10).unwrap()).unwrap();
        assert!(eval(big, &o).unwrap());

        let huge = Criteria::any("Lines", Criteria::greater("Quantity", 100).unwrap()).unwrap();
        assert!(!eval(huge.clone(), &o).unwrap());

        let mut empty = order();
        empty.lines = None;
        assert!(matches!(
            eval(huge, &empty).unwrap_err(),
            FilterError::Evaluation(_)
        ));
    }

    #[test]
    fn test_interval() {
        let o = order();
        let today = Criteria::interval(IntervalType::IntervalToday, "Created").unwrap();
        let tomorrow = Criteria::interval(IntervalType::IntervalTomorrow, "Created").unwrap();
        assert!(eval(today, &o).unwrap());
        assert!(!eval(tomorrow, &o).unwrap());
    }

    #[test]
    fn test_missing_member_on_record() {
        let o = order();
        let err = eval(Criteria::equal("Archived", true).unwrap(), &o).unwrap_err();
        assert!(matches!(err, FilterError::Evaluation(_)));

        let descriptor = order_type();
        let predicate = Compiler::new(&descriptor)
            .compile(&Criteria::equal("Archived", true).unwrap())
            .unwrap();
        assert!(!predicate.matches(&o));
    }

    #[test]
    fn test_short_circuit() {
        let o = order();
        let criteria = Criteria::equal("Status", 9).unwrap() & Criteria::equal("Archived", true).unwrap();
        assert!(!eval(criteria, &o).unwrap());
    }

    #[test]
    fn test_predicate_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Predicate>();
    }
}
