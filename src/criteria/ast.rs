//! Abstract Syntax Tree for filter criteria
//!
//! Every node renders to the canonical text of the filter grammar through
//! [`std::fmt::Display`]. That rendering doubles as the identity of a node:
//! two criteria are equal exactly when they render to the same text.

use crate::criteria::value::Value;
use crate::error::{FilterError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Criteria that constrain exactly one property
pub trait PropertyCriteria: fmt::Display {
    fn property_name(&self) -> &str;
}

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComparisonOperator {
    /// Equal (==)
    Equal,
    /// Not equal (<>)
    NotEqual,
    /// Greater than (>)
    Greater,
    /// Less than (<)
    Less,
    /// Less than or equal (<=)
    LessOrEqual,
    /// Greater than or equal (>=)
    GreaterOrEqual,
    /// SQL-style pattern with `%` wildcards
    Like,
}

impl ComparisonOperator {
    pub const ALL: [ComparisonOperator; 7] = [
        ComparisonOperator::Equal,
        ComparisonOperator::NotEqual,
        ComparisonOperator::Greater,
        ComparisonOperator::Less,
        ComparisonOperator::LessOrEqual,
        ComparisonOperator::GreaterOrEqual,
        ComparisonOperator::Like,
    ];

    pub fn symbol(self) -> &'static str {
        match self {
            ComparisonOperator::Equal => "==",
            ComparisonOperator::NotEqual => "<>",
            ComparisonOperator::Greater => ">",
            ComparisonOperator::Less => "<",
            ComparisonOperator::LessOrEqual => "<=",
            ComparisonOperator::GreaterOrEqual => ">=",
            ComparisonOperator::Like => "Like",
        }
    }

    pub fn from_symbol(symbol: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.symbol() == symbol)
    }
}

/// Function criteria kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FunctionType {
    StartsWith,
    EndsWith,
    Contains,
    IsNullOrEmpty,
}

impl FunctionType {
    pub const ALL: [FunctionType; 4] = [
        FunctionType::StartsWith,
        FunctionType::EndsWith,
        FunctionType::Contains,
        FunctionType::IsNullOrEmpty,
    ];

    pub fn name(self) -> &'static str {
        match self {
            FunctionType::StartsWith => "StartsWith",
            FunctionType::EndsWith => "EndsWith",
            FunctionType::Contains => "Contains",
            FunctionType::IsNullOrEmpty => "IsNullOrEmpty",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.name() == name)
    }
}

/// Relative date ranges, evaluated against the current day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntervalType {
    /// date >= first day of next year
    IntervalBeyondThisYear,
    /// first day of next month <= date < first day of next year
    IntervalLaterThisYear,
    /// last day of next week < date < first day of next month
    IntervalLaterThisMonth,
    /// first day of next week <= date <= last day of next week
    IntervalNextWeek,
    /// day after tomorrow <= date < first day of next week
    IntervalLaterThisWeek,
    IntervalTomorrow,
    IntervalToday,
    IntervalYesterday,
    /// first day of this week <= date < today
    IntervalEarlierThisWeek,
    /// first day of last week <= date < first day of this week
    IntervalLastWeek,
    /// first day of this month <= date < first day of last week
    IntervalEarlierThisMonth,
    /// first day of this year <= date < first day of this month
    IntervalEarlierThisYear,
    /// date < first day of this year
    IntervalPriorThisYear,
}

impl IntervalType {
    pub const ALL: [IntervalType; 13] = [
        IntervalType::IntervalBeyondThisYear,
        IntervalType::IntervalLaterThisYear,
        IntervalType::IntervalLaterThisMonth,
        IntervalType::IntervalNextWeek,
        IntervalType::IntervalLaterThisWeek,
        IntervalType::IntervalTomorrow,
        IntervalType::IntervalToday,
        IntervalType::IntervalYesterday,
        IntervalType::IntervalEarlierThisWeek,
        IntervalType::IntervalLastWeek,
        IntervalType::IntervalEarlierThisMonth,
        IntervalType::IntervalEarlierThisYear,
        IntervalType::IntervalPriorThisYear,
    ];

    pub fn name(self) -> &'static str {
        match self {
            IntervalType::IntervalBeyondThisYear => "IntervalBeyondThisYear",
            IntervalType::IntervalLaterThisYear => "IntervalLaterThisYear",
            IntervalType::IntervalLaterThisMonth => "IntervalLaterThisMonth",
            IntervalType::IntervalNextWeek => "IntervalNextWeek",
            IntervalType::IntervalLaterThisWeek => "IntervalLaterThisWeek",
            IntervalType::IntervalTomorrow => "IntervalTomorrow",
            IntervalType::IntervalToday => "IntervalToday",
            IntervalType::IntervalYesterday => "IntervalYesterday",
            IntervalType::IntervalEarlierThisWeek => "IntervalEarlierThisWeek",
            IntervalType::IntervalLastWeek => "IntervalLastWeek",
            IntervalType::IntervalEarlierThisMonth => "IntervalEarlierThisMonth",
            IntervalType::IntervalEarlierThisYear => "IntervalEarlierThisYear",
            IntervalType::IntervalPriorThisYear => "IntervalPriorThisYear",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|i| i.name() == name)
    }
}

/// Word characters and dots, so a name stays one token inside `[..]`
static PROPERTY_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[\w.]+$").expect("valid pattern"));

fn require_name(property_name: impl Into<String>) -> Result<String> {
    let property_name = property_name.into();
    if property_name.trim().is_empty() {
        return Err(FilterError::Construction(
            "property name must not be empty".to_string(),
        ));
    }
    if !PROPERTY_NAME.is_match(&property_name) {
        return Err(FilterError::Construction(format!(
            "property name '{}' may only contain letters, digits, '_' and '.'",
            property_name
        )));
    }
    Ok(property_name)
}

macro_rules! property_criteria {
    ($($ty:ident),+ $(,)?) => {
        $(
            impl PropertyCriteria for $ty {
                fn property_name(&self) -> &str {
                    &self.property_name
                }
            }

            impl $ty {
                pub(crate) fn set_property_name(&mut self, property_name: String) -> Result<()> {
                    self.property_name = require_name(property_name)?;
                    Ok(())
                }
            }
        )+
    };
}

property_criteria!(
    ComparisonCriteria,
    FunctionCriteria,
    BetweenCriteria,
    InCriteria,
    NullCriteria,
    NotNullCriteria,
    IntervalCriteria,
    AnyCriteria,
);

/// `[Name op value]`
#[derive(Debug, Clone)]
pub struct ComparisonCriteria {
    property_name: String,
    value: Value,
    operator: ComparisonOperator,
}

impl ComparisonCriteria {
    pub fn new(
        property_name: impl Into<String>,
        value: impl Into<Value>,
        operator: ComparisonOperator,
    ) -> Result<Self> {
        Ok(Self {
            property_name: require_name(property_name)?,
            value: value.into(),
            operator,
        })
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn operator(&self) -> ComparisonOperator {
        self.operator
    }
}

impl fmt::Display for ComparisonCriteria {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{} {} {}]",
            self.property_name,
            self.operator.symbol(),
            self.value
        )
    }
}

/// `[Name StartsWith 'x']`, `[Name IsNullOrEmpty]`, ...
#[derive(Debug, Clone)]
pub struct FunctionCriteria {
    function_type: FunctionType,
    property_name: String,
    value: Value,
}

impl FunctionCriteria {
    /// The value is dropped for [`FunctionType::IsNullOrEmpty`]
    pub fn new(
        function_type: FunctionType,
        property_name: impl Into<String>,
        value: impl Into<Value>,
    ) -> Result<Self> {
        let value = match function_type {
            FunctionType::IsNullOrEmpty => Value::Null,
            _ => value.into(),
        };
        Ok(Self {
            function_type,
            property_name: require_name(property_name)?,
            value,
        })
    }

    pub fn function_type(&self) -> FunctionType {
        self.function_type
    }

    pub fn value(&self) -> &Value {
        &self.value
    }
}

impl fmt::Display for FunctionCriteria {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.function_type {
            FunctionType::IsNullOrEmpty => {
                write!(f, "[{} {}]", self.property_name, self.function_type.name())
            }
            _ => write!(
                f,
                "[{} {} {}]",
                self.property_name,
                self.function_type.name(),
                self.value
            ),
        }
    }
}

/// `[Name between begin and end]`, inclusive on both ends
#[derive(Debug, Clone)]
pub struct BetweenCriteria {
    property_name: String,
    begin: Value,
    end: Value,
}

impl BetweenCriteria {
    pub fn new(
        property_name: impl Into<String>,
        begin: impl Into<Value>,
        end: impl Into<Value>,
    ) -> Result<Self> {
        Ok(Self {
            property_name: require_name(property_name)?,
            begin: begin.into(),
            end: end.into(),
        })
    }

    pub fn begin(&self) -> &Value {
        &self.begin
    }

    pub fn end(&self) -> &Value {
        &self.end
    }
}

impl fmt::Display for BetweenCriteria {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{} between {} and {}]",
            self.property_name, self.begin, self.end
        )
    }
}

/// `[Name in (v1, v2, ...)]`
#[derive(Debug, Clone)]
pub struct InCriteria {
    property_name: String,
    values: Vec<Value>,
}

impl InCriteria {
    pub fn new(property_name: impl Into<String>, values: Vec<Value>) -> Result<Self> {
        Ok(Self {
            property_name: require_name(property_name)?,
            values,
        })
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }
}

impl fmt::Display for InCriteria {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{} in (", self.property_name)?;
        for (i, value) in self.values.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", value)?;
        }
        f.write_str(")]")
    }
}

/// `[Name is NULL]`
#[derive(Debug, Clone)]
pub struct NullCriteria {
    property_name: String,
}

impl NullCriteria {
    pub fn new(property_name: impl Into<String>) -> Result<Self> {
        Ok(Self {
            property_name: require_name(property_name)?,
        })
    }
}

impl fmt::Display for NullCriteria {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{} is NULL]", self.property_name)
    }
}

/// `[Name is not NULL]`
#[derive(Debug, Clone)]
pub struct NotNullCriteria {
    property_name: String,
}

impl NotNullCriteria {
    pub fn new(property_name: impl Into<String>) -> Result<Self> {
        Ok(Self {
            property_name: require_name(property_name)?,
        })
    }
}

impl fmt::Display for NotNullCriteria {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{} is not NULL]", self.property_name)
    }
}

/// `[Name IntervalToday]`, ...
#[derive(Debug, Clone)]
pub struct IntervalCriteria {
    interval_type: IntervalType,
    property_name: String,
}

impl IntervalCriteria {
    pub fn new(interval_type: IntervalType, property_name: impl Into<String>) -> Result<Self> {
        Ok(Self {
            interval_type,
            property_name: require_name(property_name)?,
        })
    }

    pub fn interval_type(&self) -> IntervalType {
        self.interval_type
    }
}

impl fmt::Display for IntervalCriteria {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{} {}]", self.property_name, self.interval_type.name())
    }
}

/// `[Items.Any(<item criteria>)]`
#[derive(Debug, Clone)]
pub struct AnyCriteria {
    property_name: String,
    item_criteria: Box<Criteria>,
}

impl AnyCriteria {
    pub fn new(property_name: impl Into<String>, item_criteria: Criteria) -> Result<Self> {
        Ok(Self {
            property_name: require_name(property_name)?,
            item_criteria: Box::new(item_criteria),
        })
    }

    pub fn item_criteria(&self) -> &Criteria {
        &self.item_criteria
    }
}

impl fmt::Display for AnyCriteria {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}.Any({})]", self.property_name, self.item_criteria)
    }
}

/// AST node for filter criteria
#[derive(Debug, Clone)]
pub enum Criteria {
    And(Box<Criteria>, Box<Criteria>),
    Or(Box<Criteria>, Box<Criteria>),
    Not(Box<Criteria>),
    Comparison(ComparisonCriteria),
    Function(FunctionCriteria),
    Between(BetweenCriteria),
    In(InCriteria),
    Null(NullCriteria),
    NotNull(NotNullCriteria),
    Interval(IntervalCriteria),
    Any(AnyCriteria),
    /// Resolved by the host, never evaluated in-process
    CurrentUser,
}

impl Criteria {
    pub fn and(left: Criteria, right: Criteria) -> Criteria {
        Criteria::And(Box::new(left), Box::new(right))
    }

    pub fn or(left: Criteria, right: Criteria) -> Criteria {
        Criteria::Or(Box::new(left), Box::new(right))
    }

    pub fn negate(criteria: Criteria) -> Criteria {
        Criteria::Not(Box::new(criteria))
    }

    pub fn comparison(
        property_name: impl Into<String>,
        value: impl Into<Value>,
        operator: ComparisonOperator,
    ) -> Result<Criteria> {
        ComparisonCriteria::new(property_name, value, operator).map(Criteria::Comparison)
    }

    pub fn equal(property_name: impl Into<String>, value: impl Into<Value>) -> Result<Criteria> {
        Self::comparison(property_name, value, ComparisonOperator::Equal)
    }

    pub fn not_equal(property_name: impl Into<String>, value: impl Into<Value>) -> Result<Criteria> {
        Self::comparison(property_name, value, ComparisonOperator::NotEqual)
    }

    pub fn greater(property_name: impl Into<String>, value: impl Into<Value>) -> Result<Criteria> {
        Self::comparison(property_name, value, ComparisonOperator::Greater)
    }

    pub fn less(property_name: impl Into<String>, value: impl Into<Value>) -> Result<Criteria> {
        Self::comparison(property_name, value, ComparisonOperator::Less)
    }

    pub fn greater_or_equal(
        property_name: impl Into<String>,
        value: impl Into<Value>,
    ) -> Result<Criteria> {
        Self::comparison(property_name, value, ComparisonOperator::GreaterOrEqual)
    }

    pub fn less_or_equal(
        property_name: impl Into<String>,
        value: impl Into<Value>,
    ) -> Result<Criteria> {
        Self::comparison(property_name, value, ComparisonOperator::LessOrEqual)
    }

    pub fn like(property_name: impl Into<String>, pattern: impl Into<Value>) -> Result<Criteria> {
        Self::comparison(property_name, pattern, ComparisonOperator::Like)
    }

    pub fn function(
        function_type: FunctionType,
        property_name: impl Into<String>,
        value: impl Into<Value>,
    ) -> Result<Criteria> {
        FunctionCriteria::new(function_type, property_name, value).map(Criteria::Function)
    }

    pub fn starts_with(property_name: impl Into<String>, value: impl Into<Value>) -> Result<Criteria> {
        Self::function(FunctionType::StartsWith, property_name, value)
    }

    pub fn ends_with(property_name: impl Into<String>, value: impl Into<Value>) -> Result<Criteria> {
        Self::function(FunctionType::EndsWith, property_name, value)
    }

    pub fn contains(property_name: impl Into<String>, value: impl Into<Value>) -> Result<Criteria> {
        Self::function(FunctionType::Contains, property_name, value)
    }

    pub fn is_null_or_empty(property_name: impl Into<String>) -> Result<Criteria> {
        Self::function(FunctionType::IsNullOrEmpty, property_name, Value::Null)
    }

    pub fn between(
        property_name: impl Into<String>,
        begin: impl Into<Value>,
        end: impl Into<Value>,
    ) -> Result<Criteria> {
        BetweenCriteria::new(property_name, begin, end).map(Criteria::Between)
    }

    pub fn in_values(property_name: impl Into<String>, values: Vec<Value>) -> Result<Criteria> {
        InCriteria::new(property_name, values).map(Criteria::In)
    }

    pub fn null(property_name: impl Into<String>) -> Result<Criteria> {
        NullCriteria::new(property_name).map(Criteria::Null)
    }

    pub fn not_null(property_name: impl Into<String>) -> Result<Criteria> {
        NotNullCriteria::new(property_name).map(Criteria::NotNull)
    }

    pub fn interval(
        interval_type: IntervalType,
        property_name: impl Into<String>,
    ) -> Result<Criteria> {
        IntervalCriteria::new(interval_type, property_name).map(Criteria::Interval)
    }

    pub fn any(property_name: impl Into<String>, item_criteria: Criteria) -> Result<Criteria> {
        AnyCriteria::new(property_name, item_criteria).map(Criteria::Any)
    }

    pub fn current_user() -> Criteria {
        Criteria::CurrentUser
    }

    /// Variant name, for diagnostics
    pub fn kind_name(&self) -> &'static str {
        match self {
            Criteria::And(..) => "And",
            Criteria::Or(..) => "Or",
            Criteria::Not(_) => "Not",
            Criteria::Comparison(_) => "Comparison",
            Criteria::Function(_) => "Function",
            Criteria::Between(_) => "Between",
            Criteria::In(_) => "In",
            Criteria::Null(_) => "Null",
            Criteria::NotNull(_) => "NotNull",
            Criteria::Interval(_) => "Interval",
            Criteria::Any(_) => "Any",
            Criteria::CurrentUser => "CurrentUser",
        }
    }

    /// View this node as a property criteria, if it constrains a single property
    pub fn as_property_criteria(&self) -> Option<&dyn PropertyCriteria> {
        match self {
            Criteria::Comparison(c) => Some(c),
            Criteria::Function(c) => Some(c),
            Criteria::Between(c) => Some(c),
            Criteria::In(c) => Some(c),
            Criteria::Null(c) => Some(c),
            Criteria::NotNull(c) => Some(c),
            Criteria::Interval(c) => Some(c),
            Criteria::Any(c) => Some(c),
            Criteria::And(..) | Criteria::Or(..) | Criteria::Not(_) | Criteria::CurrentUser => None,
        }
    }

    pub fn property_name(&self) -> Option<&str> {
        self.as_property_criteria().map(|c| c.property_name())
    }

    /// Copy of this node with its property renamed; nodes without a
    /// property are returned unchanged
    pub(crate) fn with_property_name(&self, property_name: String) -> Result<Criteria> {
        let mut renamed = self.clone();
        match &mut renamed {
            Criteria::Comparison(c) => c.set_property_name(property_name)?,
            Criteria::Function(c) => c.set_property_name(property_name)?,
            Criteria::Between(c) => c.set_property_name(property_name)?,
            Criteria::In(c) => c.set_property_name(property_name)?,
            Criteria::Null(c) => c.set_property_name(property_name)?,
            Criteria::NotNull(c) => c.set_property_name(property_name)?,
            Criteria::Interval(c) => c.set_property_name(property_name)?,
            Criteria::Any(c) => c.set_property_name(property_name)?,
            Criteria::And(..) | Criteria::Or(..) | Criteria::Not(_) | Criteria::CurrentUser => {}
        }
        Ok(renamed)
    }
}

impl fmt::Display for Criteria {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Criteria::And(left, right) => write!(f, "({} AND {})", left, right),
            Criteria::Or(left, right) => write!(f, "({} OR {})", left, right),
            Criteria::Not(inner) => write!(f, "not ({})", inner),
            Criteria::Comparison(c) => c.fmt(f),
            Criteria::Function(c) => c.fmt(f),
            Criteria::Between(c) => c.fmt(f),
            Criteria::In(c) => c.fmt(f),
            Criteria::Null(c) => c.fmt(f),
            Criteria::NotNull(c) => c.fmt(f),
            Criteria::Interval(c) => c.fmt(f),
            Criteria::Any(c) => c.fmt(f),
            Criteria::CurrentUser => f.write_str("CurrentUser"),
        }
    }
}

impl PartialEq for Criteria {
    fn eq(&self, other: &Self) -> bool {
        self.to_string() == other.to_string()
    }
}

impl Eq for Criteria {}

impl Hash for Criteria {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.to_string().hash(state);
    }
}

impl std::ops::BitAnd for Criteria {
    type Output = Criteria;

    fn bitand(self, rhs: Criteria) -> Criteria {
        Criteria::and(self, rhs)
    }
}

impl std::ops::BitOr for Criteria {
    type Output = Criteria;

    fn bitor(self, rhs: Criteria) -> Criteria {
        Criteria::or(self, rhs)
    }
}

impl std::ops::Not for Criteria {
    type Output = Criteria;

    fn not(self) -> Criteria {
        Criteria::negate(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_render_leaf_criteria() {
        let cases = [
            (Criteria::equal("Name", "abc").unwrap(), "[Name == 'abc']"),
            (Criteria::not_equal("Age", 5).unwrap(), "[Age <> 5]"),
            (Criteria::greater("Age", 5).unwrap(), "[Age > 5]"),
            (Criteria::less_or_equal("Age", 5).unwrap(), "[Age <= 5]"),
            (Criteria::like("Name", "%ab%").unwrap(), "[Name Like '%ab%']"),
            (Criteria::starts_with("Name", "ab").unwrap(), "[Name StartsWith 'ab']"),
            (Criteria::is_null_or_empty("Name").unwrap(), "[Name IsNullOrEmpty]"),
            (Criteria::between("Age", 5, 10).unwrap(), "[Age between 5 and 10]"),
            (
                Criteria::in_values("Age", vec![1.into(), 2.into(), 3.into()]).unwrap(),
                "[Age in (1, 2, 3)]",
            ),
            (Criteria::null("Name").unwrap(), "[Name is NULL]"),
            (Criteria::not_null("Name").unwrap(), "[Name is not NULL]"),
            (
                Criteria::interval(IntervalType::IntervalToday, "Created").unwrap(),
                "[Created IntervalToday]",
            ),
            (Criteria::current_user(), "CurrentUser"),
        ];

        for (criteria, expected) in cases {
            assert_eq!(criteria.to_string(), expected);
        }
    }

    #[test]
    fn test_render_logical_criteria() {
        let age = Criteria::greater("Age", 18).unwrap();
        let name = Criteria::equal("Name", "x").unwrap();

        assert_eq!(
            (age.clone() & name.clone()).to_string(),
            "([Age > 18] AND [Name == 'x'])"
        );
        assert_eq!(
            (age.clone() | name.clone()).to_string(),
            "([Age > 18] OR [Name == 'x'])"
        );
        assert_eq!((!age).to_string(), "not ([Age > 18])");
    }

    #[test]
    fn test_render_any() {
        let item = Criteria::greater("Quantity", 5).unwrap();
        let any = Criteria::any("Lines", item).unwrap();
        assert_eq!(any.to_string(), "[Lines.Any([Quantity > 5])]");
    }

    #[test]
    fn test_empty_property_name_rejected() {
        assert!(matches!(
            Criteria::equal("", 1),
            Err(FilterError::Construction(_))
        ));
        assert!(Criteria::null("   ").is_err());
        assert!(Criteria::in_values("", vec![]).is_err());
        assert!(Criteria::interval(IntervalType::IntervalToday, "").is_err());
        assert!(Criteria::any("", Criteria::current_user()).is_err());
    }

    #[test]
    fn test_property_name_with_delimiters_rejected() {
        for name in ["First Name", "A[0]", "Lines]", "Sum(x)", "O'Brien", "#Tag", "A\tB"] {
            assert!(
                matches!(Criteria::equal(name, 1), Err(FilterError::Construction(_))),
                "expected construction error for {:?}",
                name
            );
        }
        assert!(Criteria::any("Order Lines", Criteria::current_user()).is_err());

        assert!(Criteria::equal("Customer.First_Name", 1).is_ok());
        assert!(Criteria::equal("Größe", 1).is_ok());
    }

    #[test]
    fn test_is_null_or_empty_drops_value() {
        let criteria = Criteria::function(FunctionType::IsNullOrEmpty, "Name", "ignored").unwrap();
        assert_eq!(criteria.to_string(), "[Name IsNullOrEmpty]");
    }

    #[test]
    fn test_equality_via_rendering() {
        let a = Criteria::and(
            Criteria::equal("Age", 5).unwrap(),
            Criteria::null("Name").unwrap(),
        );
        let b = Criteria::equal("Age", 5).unwrap() & Criteria::null("Name").unwrap();
        assert_eq!(a, b);

        let c = Criteria::equal("Age", 5.0).unwrap();
        assert_ne!(Criteria::equal("Age", 5).unwrap(), c);

        let set: HashSet<Criteria> = [a, b].into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_property_criteria_view() {
        let criteria = Criteria::between("Age", 1, 2).unwrap();
        assert_eq!(criteria.property_name(), Some("Age"));
        assert_eq!(Criteria::current_user().property_name(), None);

        let renamed = criteria.with_property_name("Person.Age".to_string()).unwrap();
        assert_eq!(renamed.to_string(), "[Person.Age between 1 and 2]");
        assert!(criteria.with_property_name(String::new()).is_err());
    }

    #[test]
    fn test_operator_lookup() {
        assert_eq!(ComparisonOperator::from_symbol("<>"), Some(ComparisonOperator::NotEqual));
        assert_eq!(ComparisonOperator::from_symbol("!="), None);
        assert_eq!(FunctionType::from_name("Contains"), Some(FunctionType::Contains));
        assert_eq!(
            IntervalType::from_name("IntervalLastWeek"),
            Some(IntervalType::IntervalLastWeek)
        );
        assert_eq!(IntervalType::ALL.len(), 13);
    }
}
