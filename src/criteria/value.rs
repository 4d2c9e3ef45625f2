//! Scalar values and their token representation in the filter grammar

use crate::config::Culture;
use crate::error::{FilterError, Result};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Token used for the null value
pub const NULL_TOKEN: &str = "?";

/// Tokens of the non-finite floats
pub const NAN_TOKEN: &str = "NaN";
pub const INFINITY_TOKEN: &str = "Infinity";
pub const NEG_INFINITY_TOKEN: &str = "-Infinity";

/// Format used when rendering date/time literals between `#` delimiters
pub const DATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// Scalar operand of a criteria
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    DateTime(NaiveDateTime),
    String(String),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Plain text of a scalar, without grammar quoting
    pub fn to_plain_string(&self) -> Option<String> {
        match self {
            Value::Null => None,
            Value::Bool(b) => Some(if *b { "True" } else { "False" }.to_string()),
            Value::Int(i) => Some(i.to_string()),
            Value::Float(f) => Some(format_float(*f)),
            Value::DateTime(dt) => Some(dt.format(DATE_TIME_FORMAT).to_string()),
            Value::String(s) => Some(s.clone()),
        }
    }

    /// Name of the value kind, for diagnostics
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Int(_) => "integer",
            Value::Float(_) => "float",
            Value::DateTime(_) => "date/time",
            Value::String(_) => "string",
        }
    }
}

/// Floats always carry a fractional part so they read back as floats
fn format_float(value: f64) -> String {
    if value.is_nan() {
        NAN_TOKEN.to_string()
    } else if value.is_infinite() {
        let token = if value > 0.0 { INFINITY_TOKEN } else { NEG_INFINITY_TOKEN };
        token.to_string()
    } else {
        let text = value.to_string();
        if text.contains('.') {
            text
        } else {
            text + ".0"
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str(NULL_TOKEN),
            Value::Bool(true) => f.write_str("True"),
            Value::Bool(false) => f.write_str("False"),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(v) => f.write_str(&format_float(*v)),
            Value::DateTime(dt) => write!(f, "#{}#", dt.format(DATE_TIME_FORMAT)),
            Value::String(s) => write!(f, "'{}'", s.replace('\'', "''")),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Value::DateTime(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

/// Parse a value token of the filter grammar
///
/// `position` is the offset of the token in the surrounding filter text and
/// only serves error reporting.
pub fn parse_value(token: &str, culture: &Culture, position: usize) -> Result<Value> {
    if let Some(rest) = token.strip_prefix('\'') {
        let inner = rest.strip_suffix('\'').ok_or_else(|| {
            FilterError::parse("unterminated string literal", token, position)
        })?;
        return Ok(Value::String(inner.replace("''", "'")));
    }

    match token {
        "True" => return Ok(Value::Bool(true)),
        "False" => return Ok(Value::Bool(false)),
        NULL_TOKEN => return Ok(Value::Null),
        NAN_TOKEN => return Ok(Value::Float(f64::NAN)),
        INFINITY_TOKEN => return Ok(Value::Float(f64::INFINITY)),
        NEG_INFINITY_TOKEN => return Ok(Value::Float(f64::NEG_INFINITY)),
        _ => {}
    }

    if let Some(rest) = token.strip_prefix('#') {
        let inner = rest.trim_end_matches('#');
        return culture
            .parse_date_time(inner)
            .map(Value::DateTime)
            .ok_or_else(|| FilterError::parse("invalid date/time literal", token, position));
    }

    if looks_numeric(token) {
        let normalized = culture.normalize_number(token);
        if !culture.has_decimal_separator(token) {
            if let Ok(i) = normalized.parse::<i64>() {
                return Ok(Value::Int(i));
            }
        }
        if let Ok(f) = normalized.parse::<f64>() {
            return Ok(Value::Float(f));
        }
    }

    Err(FilterError::parse(
        "unknown type of value token",
        token,
        position,
    ))
}

fn looks_numeric(token: &str) -> bool {
    let digits = token.strip_prefix(['-', '+']).unwrap_or(token);
    digits
        .chars()
        .next()
        .map(|c| c.is_ascii_digit() || c == '.' || c == ',')
        .unwrap_or(false)
}
