//! Compact nested-array filter format
//!
//! Grid widgets send filters as JSON arrays such as
//! `[["Age", ">", 18], "and", ["Name", "startswith", "A"]]`. Arrays longer
//! than three elements are chains of filters joined by `"and"`/`"or"` or by
//! juxtaposition (an implicit `"and"`). An `"and"` pair is folded before
//! the `"or"` on its left, but not before a later connective.

use crate::convert::CriteriaConverter;
use crate::criteria::{ComparisonOperator, Criteria, FunctionType, PropertyCriteria, Value};
use crate::error::{FilterError, Result};
use serde_json::{json, Value as JsonValue};
use tracing::debug;

const AND: &str = "and";
const OR: &str = "or";
const NOT: &str = "!";

/// Date/time values are written as ISO-8601 strings
const ISO_DATE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Converter for the compact array format
#[derive(Debug, Clone, Copy, Default)]
pub struct CompactArrayConverter;

impl CompactArrayConverter {
    pub fn new() -> Self {
        Self
    }

    /// Parse compact array text into criteria
    pub fn criteria_from_str(&self, text: &str) -> Result<Criteria> {
        let external: JsonValue = serde_json::from_str(text)?;
        self.to_criteria(&external)
    }

    pub fn criteria_to_string(&self, criteria: &Criteria) -> Result<String> {
        Ok(serde_json::to_string(&self.from_criteria(criteria)?)?)
    }
}

impl CriteriaConverter for CompactArrayConverter {
    type External = JsonValue;

    fn to_criteria(&self, external: &JsonValue) -> Result<Criteria> {
        debug!(filter = %external, "converting compact array");
        match external {
            JsonValue::Array(items) => reduce(items),
            other => Err(FilterError::InvalidOperand(format!(
                "filter must be an array, found {}",
                other
            ))),
        }
    }

    fn from_criteria(&self, criteria: &Criteria) -> Result<JsonValue> {
        debug!(criteria = %criteria, "converting criteria to compact array");
        to_compact(criteria)
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Compact array -> criteria
// ═══════════════════════════════════════════════════════════════════════════

/// Element of an array being folded
enum Node<'a> {
    /// Scalar element: a connective, an operator word or a value
    Token(&'a JsonValue),
    /// Nested array not yet reduced
    Pending(&'a [JsonValue]),
    Filter(Criteria),
}

impl<'a> Node<'a> {
    fn from_json(value: &'a JsonValue) -> Self {
        match value {
            JsonValue::Array(items) => Node::Pending(items),
            other => Node::Token(other),
        }
    }

    fn is_filter(&self) -> bool {
        !matches!(self, Node::Token(_))
    }

    fn word(&self) -> Option<&'a str> {
        match self {
            Node::Token(value) => (*value).as_str(),
            _ => None,
        }
    }

    fn into_criteria(self) -> Result<Criteria> {
        match self {
            Node::Filter(criteria) => Ok(criteria),
            Node::Pending(items) => reduce(items),
            Node::Token(value) => Err(FilterError::InvalidOperand(format!(
                "expected a filter, found {}",
                value
            ))),
        }
    }
}

fn reduce(items: &[JsonValue]) -> Result<Criteria> {
    match items.len() {
        0 => Err(FilterError::InvalidOperand("empty filter array".to_string())),
        1..=3 => reduce_simple(items),
        _ => reduce_chain(items),
    }
}

fn reduce_simple(items: &[JsonValue]) -> Result<Criteria> {
    match items {
        [single] => Node::from_json(single).into_criteria(),
        [JsonValue::String(bang), operand] if bang == NOT => {
            Ok(Criteria::negate(Node::from_json(operand).into_criteria()?))
        }
        [JsonValue::String(property), value] => leaf(property, "=", value),
        [JsonValue::String(property), JsonValue::String(operator), value] => {
            leaf(property, operator, value)
        }
        [JsonValue::Array(left), right] => Ok(Criteria::and(
            reduce(left)?,
            Node::from_json(right).into_criteria()?,
        )),
        [JsonValue::Array(left), connective, right] => {
            let word = connective.as_str().ok_or_else(|| {
                FilterError::InvalidOperand(format!("expected a connective, found {}", connective))
            })?;
            combine(reduce(left)?, word, Node::from_json(right).into_criteria()?)
        }
        _ => Err(FilterError::InvalidOperand(format!(
            "cannot interpret {}",
            JsonValue::Array(items.to_vec())
        ))),
    }
}

/// Fold a chain in two passes
///
/// The first pass slides once over the chain and folds each `and` pair and
/// each juxtaposed pair it meets. The scan moves past a merged node, so a
/// connective right after it is left to the second pass, which folds the
/// remaining elements from left to right.
fn reduce_chain(items: &[JsonValue]) -> Result<Criteria> {
    let mut nodes: Vec<Node<'_>> = items.iter().map(Node::from_json).collect();

    let mut i = 1;
    while i < nodes.len() {
        if nodes[i].word() == Some(AND) {
            if i + 1 >= nodes.len() {
                return Err(dangling(AND));
            }
            let right = nodes.remove(i + 1).into_criteria()?;
            nodes.remove(i);
            let left = nodes.remove(i - 1).into_criteria()?;
            nodes.insert(i - 1, Node::Filter(Criteria::and(left, right)));
        } else if nodes[i - 1].is_filter() && nodes[i].is_filter() {
            let right = nodes.remove(i).into_criteria()?;
            let left = nodes.remove(i - 1).into_criteria()?;
            nodes.insert(i - 1, Node::Filter(Criteria::and(left, right)));
        }
        i += 1;
    }

    let mut remaining = nodes.into_iter();
    let mut folded = match remaining.next() {
        Some(node) => node.into_criteria()?,
        None => return Err(FilterError::InvalidOperand("empty filter array".to_string())),
    };
    while let Some(node) = remaining.next() {
        folded = match node.word() {
            Some(word) => {
                let right = remaining.next().ok_or_else(|| dangling(word))?;
                combine(folded, word, right.into_criteria()?)?
            }
            None => Criteria::and(folded, node.into_criteria()?),
        };
    }
    Ok(folded)
}

fn dangling(word: &str) -> FilterError {
    FilterError::InvalidOperand(format!("'{}' has no right operand", word))
}

fn combine(left: Criteria, word: &str, right: Criteria) -> Result<Criteria> {
    match word {
        AND => Ok(Criteria::and(left, right)),
        OR => Ok(Criteria::or(left, right)),
        other => Err(FilterError::UnsupportedOperator(format!(
            "compact connective '{}'",
            other
        ))),
    }
}

fn leaf(property: &str, operator: &str, value: &JsonValue) -> Result<Criteria> {
    if operator == "between" {
        return match value {
            JsonValue::Array(bounds) if bounds.len() == 2 => Criteria::between(
                property,
                scalar(&bounds[0])?,
                scalar(&bounds[1])?,
            ),
            other => Err(FilterError::InvalidOperand(format!(
                "between expects two bounds, found {}",
                other
            ))),
        };
    }

    let value = scalar(value)?;
    match operator {
        "=" if value.is_null() => Criteria::null(property),
        "<>" if value.is_null() => Criteria::not_null(property),
        "=" => Criteria::equal(property, value),
        "<>" => Criteria::not_equal(property, value),
        ">" => Criteria::greater(property, value),
        ">=" => Criteria::greater_or_equal(property, value),
        "<" => Criteria::less(property, value),
        "<=" => Criteria::less_or_equal(property, value),
        "startswith" => Criteria::starts_with(property, value),
        "endswith" => Criteria::ends_with(property, value),
        "contains" => Criteria::contains(property, value),
        "notcontains" => Ok(Criteria::negate(Criteria::contains(property, value)?)),
        other => Err(FilterError::UnsupportedOperator(format!(
            "compact operator '{}'",
            other
        ))),
    }
}

/// JSON scalars keep their JSON type
fn scalar(value: &JsonValue) -> Result<Value> {
    match value {
        JsonValue::Null => Ok(Value::Null),
        JsonValue::Bool(b) => Ok(Value::Bool(*b)),
        JsonValue::Number(n) => match n.as_i64() {
            Some(i) => Ok(Value::Int(i)),
            None => n.as_f64().map(Value::Float).ok_or_else(|| {
                FilterError::InvalidOperand(format!("number {} is out of range", n))
            }),
        },
        JsonValue::String(s) => Ok(Value::String(s.clone())),
        other => Err(FilterError::InvalidOperand(format!(
            "expected a scalar value, found {}",
            other
        ))),
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Criteria -> compact array
// ═══════════════════════════════════════════════════════════════════════════

fn to_compact(criteria: &Criteria) -> Result<JsonValue> {
    match criteria {
        Criteria::And(left, right) => Ok(json!([to_compact(left)?, AND, to_compact(right)?])),
        Criteria::Or(left, right) => Ok(json!([to_compact(left)?, OR, to_compact(right)?])),
        Criteria::Not(inner) => Ok(json!([NOT, to_compact(inner)?])),
        Criteria::Comparison(c) => {
            let operator = match c.operator() {
                ComparisonOperator::Equal => "=",
                ComparisonOperator::NotEqual => "<>",
                ComparisonOperator::Greater => ">",
                ComparisonOperator::GreaterOrEqual => ">=",
                ComparisonOperator::Less => "<",
                ComparisonOperator::LessOrEqual => "<=",
                ComparisonOperator::Like => return Err(unsupported(criteria)),
            };
            Ok(json!([c.property_name(), operator, to_json(c.value())?]))
        }
        Criteria::Function(c) => {
            let property = c.property_name();
            let operator = match c.function_type() {
                FunctionType::StartsWith => "startswith",
                FunctionType::EndsWith => "endswith",
                FunctionType::Contains => "contains",
                FunctionType::IsNullOrEmpty => {
                    return Ok(json!([[property, "=", null], OR, [property, "=", ""]]))
                }
            };
            Ok(json!([property, operator, to_json(c.value())?]))
        }
        Criteria::Between(c) => {
            let property = c.property_name();
            Ok(json!([
                [property, ">=", to_json(c.begin())?],
                AND,
                [property, "<=", to_json(c.end())?]
            ]))
        }
        Criteria::In(c) => {
            let property = c.property_name();
            let mut equalities = c
                .values()
                .iter()
                .map(|value| -> Result<JsonValue> { Ok(json!([property, "=", to_json(value)?])) });
            let first = equalities.next().ok_or_else(|| {
                FilterError::InvalidOperand(format!("{} has no values", criteria))
            })??;
            equalities.try_fold(first, |left, right| -> Result<JsonValue> {
                Ok(json!([left, OR, right?]))
            })
        }
        Criteria::Null(c) => Ok(json!([c.property_name(), "=", null])),
        Criteria::NotNull(c) => Ok(json!([NOT, [c.property_name(), "=", null]])),
        Criteria::Interval(_) | Criteria::Any(_) | Criteria::CurrentUser => {
            Err(unsupported(criteria))
        }
    }
}

fn unsupported(criteria: &Criteria) -> FilterError {
    FilterError::UnsupportedOperator(format!("{} has no compact array form", criteria))
}

fn to_json(value: &Value) -> Result<JsonValue> {
    Ok(match value {
        Value::Null => JsonValue::Null,
        Value::Bool(b) => JsonValue::Bool(*b),
        Value::Int(i) => JsonValue::from(*i),
        Value::Float(f) => serde_json::Number::from_f64(*f)
            .map(JsonValue::Number)
            .ok_or_else(|| FilterError::InvalidOperand(format!("{} has no JSON form", f)))?,
        Value::String(s) => JsonValue::String(s.clone()),
        Value::DateTime(dt) => JsonValue::String(dt.format(ISO_DATE_TIME_FORMAT).to_string()),
    })
}
