//! Operator-tree filter format
//!
//! Grid components describe filters as a typed tree of group, unary,
//! binary, in, between and function nodes over property and value leaves.
//! Operator type names are kept verbatim, including the ones that have no
//! criteria counterpart.

use crate::convert::CriteriaConverter;
use crate::criteria::{
    ComparisonOperator, Criteria, FunctionType, IntervalType, PropertyCriteria, Value,
};
use crate::error::{FilterError, Result};
use chrono::{Days, NaiveTime};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Argument of the custom function standing for the current user
const CURRENT_USER: &str = "CurrentUser";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GroupOperatorType {
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOperatorType {
    BitwiseNot,
    Plus,
    Minus,
    Not,
    IsNull,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOperatorType {
    Equal,
    NotEqual,
    Greater,
    Less,
    LessOrEqual,
    GreaterOrEqual,
    Like,
    BitwiseAnd,
    BitwiseOr,
    BitwiseXor,
    Divide,
    Modulo,
    Multiply,
    Plus,
    Minus,
}

impl BinaryOperatorType {
    /// Matching comparison operator; arithmetic and bitwise types have none
    pub fn comparison_operator(self) -> Option<ComparisonOperator> {
        match self {
            BinaryOperatorType::Equal => Some(ComparisonOperator::Equal),
            BinaryOperatorType::NotEqual => Some(ComparisonOperator::NotEqual),
            BinaryOperatorType::Greater => Some(ComparisonOperator::Greater),
            BinaryOperatorType::Less => Some(ComparisonOperator::Less),
            BinaryOperatorType::LessOrEqual => Some(ComparisonOperator::LessOrEqual),
            BinaryOperatorType::GreaterOrEqual => Some(ComparisonOperator::GreaterOrEqual),
            BinaryOperatorType::Like => Some(ComparisonOperator::Like),
            _ => None,
        }
    }
}

impl From<ComparisonOperator> for BinaryOperatorType {
    fn from(operator: ComparisonOperator) -> Self {
        match operator {
            ComparisonOperator::Equal => BinaryOperatorType::Equal,
            ComparisonOperator::NotEqual => BinaryOperatorType::NotEqual,
            ComparisonOperator::Greater => BinaryOperatorType::Greater,
            ComparisonOperator::Less => BinaryOperatorType::Less,
            ComparisonOperator::LessOrEqual => BinaryOperatorType::LessOrEqual,
            ComparisonOperator::GreaterOrEqual => BinaryOperatorType::GreaterOrEqual,
            ComparisonOperator::Like => BinaryOperatorType::Like,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FunctionOperatorType {
    Custom,
    Iif,
    IsNull,
    IsNullOrEmpty,
    Trim,
    Len,
    Substring,
    Upper,
    Lower,
    Concat,
    StartsWith,
    EndsWith,
    Contains,
    Now,
    Today,
    IsSameDay,
    IsOutlookIntervalBeyondThisYear,
    IsOutlookIntervalLaterThisYear,
    IsOutlookIntervalLaterThisMonth,
    IsOutlookIntervalNextWeek,
    IsOutlookIntervalLaterThisWeek,
    IsOutlookIntervalTomorrow,
    IsOutlookIntervalToday,
    IsOutlookIntervalYesterday,
    IsOutlookIntervalEarlierThisWeek,
    IsOutlookIntervalLastWeek,
    IsOutlookIntervalEarlierThisMonth,
    IsOutlookIntervalEarlierThisYear,
    IsOutlookIntervalPriorThisYear,
}

impl FunctionOperatorType {
    pub fn interval_type(self) -> Option<IntervalType> {
        match self {
            FunctionOperatorType::IsOutlookIntervalBeyondThisYear => Some(IntervalType::IntervalBeyondThisYear),
            FunctionOperatorType::IsOutlookIntervalLaterThisYear => Some(IntervalType::IntervalLaterThisYear),
            FunctionOperatorType::IsOutlookIntervalLaterThisMonth => Some(IntervalType::IntervalLaterThisMonth),
            FunctionOperatorType::IsOutlookIntervalNextWeek => Some(IntervalType::IntervalNextWeek),
            FunctionOperatorType::IsOutlookIntervalLaterThisWeek => Some(IntervalType::IntervalLaterThisWeek),
            FunctionOperatorType::IsOutlookIntervalTomorrow => Some(IntervalType::IntervalTomorrow),
            FunctionOperatorType::IsOutlookIntervalToday => Some(IntervalType::IntervalToday),
            FunctionOperatorType::IsOutlookIntervalYesterday => Some(IntervalType::IntervalYesterday),
            FunctionOperatorType::IsOutlookIntervalEarlierThisWeek => Some(IntervalType::IntervalEarlierThisWeek),
            FunctionOperatorType::IsOutlookIntervalLastWeek => Some(IntervalType::IntervalLastWeek),
            FunctionOperatorType::IsOutlookIntervalEarlierThisMonth => Some(IntervalType::IntervalEarlierThisMonth),
            FunctionOperatorType::IsOutlookIntervalEarlierThisYear => Some(IntervalType::IntervalEarlierThisYear),
            FunctionOperatorType::IsOutlookIntervalPriorThisYear => Some(IntervalType::IntervalPriorThisYear),
            _ => None,
        }
    }

    pub fn from_interval(interval: IntervalType) -> Self {
        match interval {
            IntervalType::IntervalBeyondThisYear => FunctionOperatorType::IsOutlookIntervalBeyondThisYear,
            IntervalType::IntervalLaterThisYear => FunctionOperatorType::IsOutlookIntervalLaterThisYear,
            IntervalType::IntervalLaterThisMonth => FunctionOperatorType::IsOutlookIntervalLaterThisMonth,
            IntervalType::IntervalNextWeek => FunctionOperatorType::IsOutlookIntervalNextWeek,
            IntervalType::IntervalLaterThisWeek => FunctionOperatorType::IsOutlookIntervalLaterThisWeek,
            IntervalType::IntervalTomorrow => FunctionOperatorType::IsOutlookIntervalTomorrow,
            IntervalType::IntervalToday => FunctionOperatorType::IsOutlookIntervalToday,
            IntervalType::IntervalYesterday => FunctionOperatorType::IsOutlookIntervalYesterday,
            IntervalType::IntervalEarlierThisWeek => FunctionOperatorType::IsOutlookIntervalEarlierThisWeek,
            IntervalType::IntervalLastWeek => FunctionOperatorType::IsOutlookIntervalLastWeek,
            IntervalType::IntervalEarlierThisMonth => FunctionOperatorType::IsOutlookIntervalEarlierThisMonth,
            IntervalType::IntervalEarlierThisYear => FunctionOperatorType::IsOutlookIntervalEarlierThisYear,
            IntervalType::IntervalPriorThisYear => FunctionOperatorType::IsOutlookIntervalPriorThisYear,
        }
    }

    pub fn function_type(self) -> Option<FunctionType> {
        match self {
            FunctionOperatorType::StartsWith => Some(FunctionType::StartsWith),
            FunctionOperatorType::EndsWith => Some(FunctionType::EndsWith),
            FunctionOperatorType::Contains => Some(FunctionType::Contains),
            FunctionOperatorType::IsNullOrEmpty => Some(FunctionType::IsNullOrEmpty),
            _ => None,
        }
    }
}

impl From<FunctionType> for FunctionOperatorType {
    fn from(function_type: FunctionType) -> Self {
        match function_type {
            FunctionType::StartsWith => FunctionOperatorType::StartsWith,
            FunctionType::EndsWith => FunctionOperatorType::EndsWith,
            FunctionType::Contains => FunctionOperatorType::Contains,
            FunctionType::IsNullOrEmpty => FunctionOperatorType::IsNullOrEmpty,
        }
    }
}

/// Node of the external operator tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "Type", rename_all_fields = "PascalCase")]
pub enum CriteriaOperator {
    Group {
        operator_type: GroupOperatorType,
        operands: Vec<CriteriaOperator>,
    },
    Unary {
        operator_type: UnaryOperatorType,
        operand: Box<CriteriaOperator>,
    },
    Binary {
        operator_type: BinaryOperatorType,
        left_operand: Box<CriteriaOperator>,
        right_operand: Box<CriteriaOperator>,
    },
    In {
        left_operand: Box<CriteriaOperator>,
        operands: Vec<CriteriaOperator>,
    },
    Between {
        test_expression: Box<CriteriaOperator>,
        begin_expression: Box<CriteriaOperator>,
        end_expression: Box<CriteriaOperator>,
    },
    Function {
        operator_type: FunctionOperatorType,
        operands: Vec<CriteriaOperator>,
    },
    Property {
        property_name: String,
    },
    Value {
        value: Value,
    },
}

impl CriteriaOperator {
    pub fn property(name: impl Into<String>) -> Self {
        CriteriaOperator::Property {
            property_name: name.into(),
        }
    }

    pub fn value(value: impl Into<Value>) -> Self {
        CriteriaOperator::Value {
            value: value.into(),
        }
    }

    pub fn group(
        operator_type: GroupOperatorType,
        operands: impl IntoIterator<Item = CriteriaOperator>,
    ) -> Self {
        CriteriaOperator::Group {
            operator_type,
            operands: operands.into_iter().collect(),
        }
    }

    pub fn unary(operator_type: UnaryOperatorType, operand: CriteriaOperator) -> Self {
        CriteriaOperator::Unary {
            operator_type,
            operand: Box::new(operand),
        }
    }

    pub fn binary(
        operator_type: BinaryOperatorType,
        left: CriteriaOperator,
        right: CriteriaOperator,
    ) -> Self {
        CriteriaOperator::Binary {
            operator_type,
            left_operand: Box::new(left),
            right_operand: Box::new(right),
        }
    }

    pub fn function(
        operator_type: FunctionOperatorType,
        operands: impl IntoIterator<Item = CriteriaOperator>,
    ) -> Self {
        CriteriaOperator::Function {
            operator_type,
            operands: operands.into_iter().collect(),
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            CriteriaOperator::Group { .. } => "Group",
            CriteriaOperator::Unary { .. } => "Unary",
            CriteriaOperator::Binary { .. } => "Binary",
            CriteriaOperator::In { .. } => "In",
            CriteriaOperator::Between { .. } => "Between",
            CriteriaOperator::Function { .. } => "Function",
            CriteriaOperator::Property { .. } => "Property",
            CriteriaOperator::Value { .. } => "Value",
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Converter for the operator-tree format
#[derive(Debug, Clone, Copy, Default)]
pub struct OperatorTreeConverter;

impl OperatorTreeConverter {
    pub fn new() -> Self {
        Self
    }

    /// Decode a JSON operator tree straight into criteria
    pub fn criteria_from_json(&self, json: &str) -> Result<Criteria> {
        self.to_criteria(&CriteriaOperator::from_json(json)?)
    }

    pub fn criteria_to_json(&self, criteria: &Criteria) -> Result<String> {
        self.from_criteria(criteria)?.to_json()
    }
}

impl CriteriaConverter for OperatorTreeConverter {
    type External = CriteriaOperator;

    fn to_criteria(&self, external: &CriteriaOperator) -> Result<Criteria> {
        debug!(kind = external.kind_name(), "converting operator tree");
        to_criteria(external)
    }

    fn from_criteria(&self, criteria: &Criteria) -> Result<CriteriaOperator> {
        debug!(criteria = %criteria, "converting criteria to operator tree");
        from_criteria(criteria)
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Operator tree -> criteria
// ═══════════════════════════════════════════════════════════════════════════

fn to_criteria(operator: &CriteriaOperator) -> Result<Criteria> {
    match operator {
        CriteriaOperator::Group {
            operator_type,
            operands,
        } => convert_group(*operator_type, operands),
        CriteriaOperator::Unary {
            operator_type,
            operand,
        } => convert_unary(*operator_type, operand),
        CriteriaOperator::Binary {
            operator_type,
            left_operand,
            right_operand,
        } => {
            let operator = operator_type.comparison_operator().ok_or_else(|| {
                FilterError::UnsupportedOperator(format!("binary operator {:?}", operator_type))
            })?;
            Criteria::comparison(
                property_name(left_operand)?,
                field_or_value(right_operand)?,
                operator,
            )
        }
        CriteriaOperator::In {
            left_operand,
            operands,
        } => {
            let values = operands
                .iter()
                .map(scalar_value)
                .collect::<Result<Vec<_>>>()?;
            Criteria::in_values(property_name(left_operand)?, values)
        }
        CriteriaOperator::Between {
            test_expression,
            begin_expression,
            end_expression,
        } => Criteria::between(
            property_name(test_expression)?,
            field_or_value(begin_expression)?,
            field_or_value(end_expression)?,
        ),
        CriteriaOperator::Function {
            operator_type,
            operands,
        } => convert_function(*operator_type, operands),
        CriteriaOperator::Property { .. } | CriteriaOperator::Value { .. } => {
            Err(FilterError::InvalidOperand(format!(
                "{} operand is not a criteria",
                operator.kind_name()
            )))
        }
    }
}

fn convert_group(operator_type: GroupOperatorType, operands: &[CriteriaOperator]) -> Result<Criteria> {
    let mut converted = operands.iter().map(to_criteria);
    let first = converted
        .next()
        .ok_or_else(|| FilterError::InvalidOperand("group without operands".to_string()))??;

    converted.try_fold(first, |left, right| -> Result<Criteria> {
        let right = right?;
        Ok(match operator_type {
            GroupOperatorType::And => Criteria::and(left, right),
            GroupOperatorType::Or => Criteria::or(left, right),
        })
    })
}

fn convert_unary(operator_type: UnaryOperatorType, operand: &CriteriaOperator) -> Result<Criteria> {
    match operator_type {
        UnaryOperatorType::IsNull => Criteria::null(property_name(operand)?),
        UnaryOperatorType::Not => match operand {
            CriteriaOperator::Unary {
                operator_type: UnaryOperatorType::IsNull,
                operand,
            } => Criteria::not_null(property_name(operand)?),
            other => Ok(Criteria::negate(to_criteria(other)?)),
        },
        other => Err(FilterError::UnsupportedOperator(format!(
            "unary operator {:?}",
            other
        ))),
    }
}

fn convert_function(
    operator_type: FunctionOperatorType,
    operands: &[CriteriaOperator],
) -> Result<Criteria> {
    if operator_type == FunctionOperatorType::Custom {
        return match operands {
            [CriteriaOperator::Value {
                value: Value::String(name),
            }] if name == CURRENT_USER => Ok(Criteria::current_user()),
            _ => Err(FilterError::UnsupportedOperator(
                "custom function".to_string(),
            )),
        };
    }

    let property = match operands.first() {
        Some(operand) => property_name(operand)?,
        None => {
            return Err(FilterError::InvalidOperand(format!(
                "{:?} requires a property operand",
                operator_type
            )))
        }
    };

    if let Some(interval) = operator_type.interval_type() {
        return Criteria::interval(interval, property);
    }

    match operator_type.function_type() {
        Some(FunctionType::IsNullOrEmpty) => Criteria::is_null_or_empty(property),
        Some(function_type) => {
            let argument = operands.get(1).ok_or_else(|| {
                FilterError::InvalidOperand(format!("{:?} requires an argument", operator_type))
            })?;
            Criteria::function(function_type, property, field_or_value(argument)?)
        }
        None if operator_type == FunctionOperatorType::IsSameDay => {
            same_day(property, &operands[1..])
        }
        None => Err(FilterError::UnsupportedOperator(format!(
            "function {:?}",
            operator_type
        ))),
    }
}

/// One half-open day range per date, joined by OR
fn same_day(property: &str, days: &[CriteriaOperator]) -> Result<Criteria> {
    let ranges = days
        .iter()
        .map(|operand| {
            let day = match scalar_value(operand)? {
                Value::DateTime(value) => value.date().and_time(NaiveTime::MIN),
                other => {
                    return Err(FilterError::InvalidOperand(format!(
                        "IsSameDay expects date/time arguments, got {}",
                        other.kind_name()
                    )))
                }
            };
            let next = day.checked_add_days(Days::new(1)).ok_or_else(|| {
                FilterError::InvalidOperand(format!("day after {} is out of range", day))
            })?;
            Ok(Criteria::and(
                Criteria::greater_or_equal(property, day)?,
                Criteria::less(property, next)?,
            ))
        })
        .collect::<Result<Vec<_>>>()?;

    ranges
        .into_iter()
        .reduce(Criteria::or)
        .ok_or_else(|| FilterError::InvalidOperand("IsSameDay requires a date".to_string()))
}

fn property_name(operand: &CriteriaOperator) -> Result<&str> {
    match operand {
        CriteriaOperator::Property { property_name } => Ok(property_name),
        other => Err(FilterError::InvalidOperand(format!(
            "expected a property operand, found {}",
            other.kind_name()
        ))),
    }
}

fn scalar_value(operand: &CriteriaOperator) -> Result<Value> {
    match operand {
        CriteriaOperator::Value { value } => Ok(value.clone()),
        other => Err(FilterError::InvalidOperand(format!(
            "expected a value operand, found {}",
            other.kind_name()
        ))),
    }
}

/// Right-hand operands may name another property; the name is kept as text
fn field_or_value(operand: &CriteriaOperator) -> Result<Value> {
    match operand {
        CriteriaOperator::Property { property_name } => Ok(Value::String(property_name.clone())),
        other => scalar_value(other),
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Criteria -> operator tree
// ═══════════════════════════════════════════════════════════════════════════

fn from_criteria(criteria: &Criteria) -> Result<CriteriaOperator> {
    let operator = match criteria {
        Criteria::And(left, right) => CriteriaOperator::group(
            GroupOperatorType::And,
            [from_criteria(left)?, from_criteria(right)?],
        ),
        Criteria::Or(left, right) => CriteriaOperator::group(
            GroupOperatorType::Or,
            [from_criteria(left)?, from_criteria(right)?],
        ),
        Criteria::Not(inner) => {
            CriteriaOperator::unary(UnaryOperatorType::Not, from_criteria(inner)?)
        }
        Criteria::Comparison(c) => CriteriaOperator::binary(
            c.operator().into(),
            CriteriaOperator::property(c.property_name()),
            CriteriaOperator::value(c.value().clone()),
        ),
        Criteria::Function(c) => {
            let mut operands = vec![CriteriaOperator::property(c.property_name())];
            if c.function_type() != FunctionType::IsNullOrEmpty {
                operands.push(CriteriaOperator::value(c.value().clone()));
            }
            CriteriaOperator::function(c.function_type().into(), operands)
        }
        Criteria::Between(c) => CriteriaOperator::Between {
            test_expression: Box::new(CriteriaOperator::property(c.property_name())),
            begin_expression: Box::new(CriteriaOperator::value(c.begin().clone())),
            end_expression: Box::new(CriteriaOperator::value(c.end().clone())),
        },
        Criteria::In(c) => CriteriaOperator::In {
            left_operand: Box::new(CriteriaOperator::property(c.property_name())),
            operands: c.values().iter().cloned().map(CriteriaOperator::value).collect(),
        },
        Criteria::Null(c) => CriteriaOperator::unary(
            UnaryOperatorType::IsNull,
            CriteriaOperator::property(c.property_name()),
        ),
        Criteria::NotNull(c) => CriteriaOperator::unary(
            UnaryOperatorType::Not,
            CriteriaOperator::unary(
                UnaryOperatorType::IsNull,
                CriteriaOperator::property(c.property_name()),
            ),
        ),
        Criteria::Interval(c) => CriteriaOperator::function(
            FunctionOperatorType::from_interval(c.interval_type()),
            [CriteriaOperator::property(c.property_name())],
        ),
        Criteria::Any(c) => {
            return Err(FilterError::UnsupportedOperator(format!(
                "{} has no operator-tree form",
                c
            )))
        }
        Criteria::CurrentUser => CriteriaOperator::function(
            FunctionOperatorType::Custom,
            [CriteriaOperator::value(CURRENT_USER)],
        ),
    };
    Ok(operator)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn convert(operator: &CriteriaOperator) -> Result<Criteria> {
        OperatorTreeConverter::new().to_criteria(operator)
    }

    fn age_greater(value: i64) -> CriteriaOperator {
        CriteriaOperator::binary(
            BinaryOperatorType::Greater,
            CriteriaOperator::property("Age"),
            CriteriaOperator::value(value),
        )
    }

    #[test]
    fn test_binary_comparison() {
        assert_eq!(
            convert(&age_greater(18)).unwrap(),
            Criteria::greater("Age", 18).unwrap()
        );
    }

    #[test]
    fn test_property_on_right_becomes_text() {
        let operator = CriteriaOperator::binary(
            BinaryOperatorType::Equal,
            CriteriaOperator::property("Owner"),
            CriteriaOperator::property("Creator"),
        );
        assert_eq!(
            convert(&operator).unwrap(),
            Criteria::equal("Owner", "Creator").unwrap()
        );
    }

    #[test]
    fn test_group_folds_left() {
        let group = CriteriaOperator::group(
            GroupOperatorType::Or,
            [age_greater(1), age_greater(2), age_greater(3)],
        );
        let expected = (Criteria::greater("Age", 1).unwrap() | Criteria::greater("Age", 2).unwrap())
            | Criteria::greater("Age", 3).unwrap();
        assert_eq!(convert(&group).unwrap(), expected);
    }

    #[test]
    fn test_single_and_empty_group() {
        let single = CriteriaOperator::group(GroupOperatorType::And, [age_greater(1)]);
        assert_eq!(
            convert(&single).unwrap(),
            Criteria::greater("Age", 1).unwrap()
        );

        let empty = CriteriaOperator::group(GroupOperatorType::And, Vec::<CriteriaOperator>::new());
        assert!(matches!(
            convert(&empty),
            Err(FilterError::InvalidOperand(_))
        ));
    }

    #[test]
    fn test_unsupported_operator_types() {
        let arithmetic = CriteriaOperator::binary(
            BinaryOperatorType::Plus,
            CriteriaOperator::property("Age"),
            CriteriaOperator::value(1),
        );
        let minus = CriteriaOperator::unary(UnaryOperatorType::Minus, CriteriaOperator::property("Age"));
        let upper = CriteriaOperator::function(
            FunctionOperatorType::Upper,
            [CriteriaOperator::property("Name")],
        );
        let custom = CriteriaOperator::function(
            FunctionOperatorType::Custom,
            [CriteriaOperator::value("Other")],
        );

        for operator in [arithmetic, minus, upper, custom] {
            assert!(matches!(
                convert(&operator),
                Err(FilterError::UnsupportedOperator(_))
            ));
        }
    }

    #[test]
    fn test_left_operand_must_be_property() {
        let operator = CriteriaOperator::binary(
            BinaryOperatorType::Equal,
            CriteriaOperator::value(1),
            CriteriaOperator::value(1),
        );
        assert!(matches!(
            convert(&operator),
            Err(FilterError::InvalidOperand(_))
        ));
        assert!(matches!(
            convert(&CriteriaOperator::property("Age")),
            Err(FilterError::InvalidOperand(_))
        ));
    }

    #[test]
    fn test_unary_forms() {
        let is_null = CriteriaOperator::unary(UnaryOperatorType::IsNull, CriteriaOperator::property("Name"));
        assert_eq!(convert(&is_null).unwrap(), Criteria::null("Name").unwrap());

        let not_null = CriteriaOperator::unary(UnaryOperatorType::Not, is_null);
        assert_eq!(convert(&not_null).unwrap(), Criteria::not_null("Name").unwrap());

        let not = CriteriaOperator::unary(UnaryOperatorType::Not, age_greater(5));
        assert_eq!(
            convert(&not).unwrap(),
            !Criteria::greater("Age", 5).unwrap()
        );
    }

    #[test]
    fn test_functions_and_intervals() {
        let starts = CriteriaOperator::function(
            FunctionOperatorType::StartsWith,
            [CriteriaOperator::property("Name"), CriteriaOperator::value("Ab")],
        );
        assert_eq!(
            convert(&starts).unwrap(),
            Criteria::starts_with("Name", "Ab").unwrap()
        );

        let empty = CriteriaOperator::function(
            FunctionOperatorType::IsNullOrEmpty,
            [CriteriaOperator::property("Name")],
        );
        assert_eq!(
            convert(&empty).unwrap(),
            Criteria::is_null_or_empty("Name").unwrap()
        );

        for interval in IntervalType::ALL {
            let operator = CriteriaOperator::function(
                FunctionOperatorType::from_interval(interval),
                [CriteriaOperator::property("Created")],
            );
            assert_eq!(
                convert(&operator).unwrap(),
                Criteria::interval(interval, "Created").unwrap()
            );
        }
    }

    #[test]
    fn test_same_day_expands_to_ranges() {
        let first = NaiveDate::from_ymd_opt(2024, 6, 12).unwrap();
        let second = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();
        let operator = CriteriaOperator::function(
            FunctionOperatorType::IsSameDay,
            [
                CriteriaOperator::property("Created"),
                CriteriaOperator::value(first.and_hms_opt(15, 30, 0).unwrap()),
                CriteriaOperator::value(second.and_hms_opt(0, 0, 0).unwrap()),
            ],
        );

        let range = |day: NaiveDate| {
            let start = day.and_hms_opt(0, 0, 0).unwrap();
            Criteria::greater_or_equal("Created", start).unwrap()
                & Criteria::less("Created", start + chrono::Duration::days(1)).unwrap()
        };
        assert_eq!(convert(&operator).unwrap(), range(first) | range(second));

        let without_dates = CriteriaOperator::function(
            FunctionOperatorType::IsSameDay,
            [CriteriaOperator::property("Created")],
        );
        assert!(matches!(
            convert(&without_dates),
            Err(FilterError::InvalidOperand(_))
        ));
    }

    #[test]
    fn test_current_user_round_trip() {
        let converter = OperatorTreeConverter::new();
        let external = converter.from_criteria(&Criteria::current_user()).unwrap();
        assert_eq!(
            external,
            CriteriaOperator::function(
                FunctionOperatorType::Custom,
                [CriteriaOperator::value("CurrentUser")]
            )
        );
        assert_eq!(
            converter.to_criteria(&external).unwrap(),
            Criteria::current_user()
        );
    }

    #[test]
    fn test_not_null_shape() {
        let external = OperatorTreeConverter::new()
            .from_criteria(&Criteria::not_null("Name").unwrap())
            .unwrap();
        assert_eq!(
            external,
            CriteriaOperator::unary(
                UnaryOperatorType::Not,
                CriteriaOperator::unary(UnaryOperatorType::IsNull, CriteriaOperator::property("Name"))
            )
        );
    }

    #[test]
    fn test_criteria_round_trip() {
        let converter = OperatorTreeConverter::new();
        let criteria = (Criteria::between("Age", 18, 65).unwrap()
            & Criteria::in_values("Status", vec![Value::Int(1), Value::Int(2)]).unwrap())
            | (!Criteria::contains("Name", "x").unwrap()
                & Criteria::interval(IntervalType::IntervalLastWeek, "Created").unwrap())
            | Criteria::is_null_or_empty("Note").unwrap()
            | Criteria::like("Name", "A%").unwrap()
            | Criteria::null("Owner").unwrap();

        let external = converter.from_criteria(&criteria).unwrap();
        assert_eq!(converter.to_criteria(&external).unwrap(), criteria);
    }

    #[test]
    fn test_any_has_no_tree_form() {
        let criteria = Criteria::any("Lines", Criteria::null("Sku").unwrap()).unwrap();
        assert!(matches!(
            OperatorTreeConverter::new().from_criteria(&criteria),
            Err(FilterError::UnsupportedOperator(_))
        ));
    }

    #[test]
    fn test_json_form() {
        let json = r#"{
            "Type": "Group",
            "OperatorType": "And",
            "Operands": [
                {
                    "Type": "Binary",
                    "OperatorType": "Greater",
                    "LeftOperand": { "Type": "Property", "PropertyName": "Age" },
                    "RightOperand": { "Type": "Value", "Value": 18 }
                },
                {
                    "Type": "Function",
                    "OperatorType": "Contains",
                    "Operands": [
                        { "Type": "Property", "PropertyName": "Name" },
                        { "Type": "Value", "Value": "an" }
                    ]
                }
            ]
        }"#;
        let converter = OperatorTreeConverter::new();
        let criteria = converter.criteria_from_json(json).unwrap();
        assert_eq!(
            criteria,
            Criteria::greater("Age", 18).unwrap() & Criteria::contains("Name", "an").unwrap()
        );

        let encoded = converter.criteria_to_json(&criteria).unwrap();
        assert_eq!(converter.criteria_from_json(&encoded).unwrap(), criteria);
    }

    #[test]
    fn test_malformed_json() {
        let err = OperatorTreeConverter::new()
            .criteria_from_json(r#"{"Type": "Nope"}"#)
            .unwrap_err();
        assert!(matches!(err, FilterError::Deserialization(_)));
    }
}
