//! Cell values and declared value types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Declared value type of a dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValueType {
    #[default]
    Text,
    LongText,
    Number,
    Integer,
    IntegerPositive,
    IntegerZeroOrPositive,
    Percentage,
    Boolean,
    TrueOnly,
    Date,
    Datetime,
    OrganisationUnit,
    Coordinate,
}

impl ValueType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueType::Text => "TEXT",
            ValueType::LongText => "LONG_TEXT",
            ValueType::Number => "NUMBER",
            ValueType::Integer => "INTEGER",
            ValueType::IntegerPositive => "INTEGER_POSITIVE",
            ValueType::IntegerZeroOrPositive => "INTEGER_ZERO_OR_POSITIVE",
            ValueType::Percentage => "PERCENTAGE",
            ValueType::Boolean => "BOOLEAN",
            ValueType::TrueOnly => "TRUE_ONLY",
            ValueType::Date => "DATE",
            ValueType::Datetime => "DATETIME",
            ValueType::OrganisationUnit => "ORGANISATION_UNIT",
            ValueType::Coordinate => "COORDINATE",
        }
    }

    /// Numeric types are emitted unquoted in query text.
    pub fn is_numeric(&self) -> bool {
        self.is_integer() || matches!(self, ValueType::Number | ValueType::Percentage)
    }

    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            ValueType::Integer | ValueType::IntegerPositive | ValueType::IntegerZeroOrPositive
        )
    }

    pub fn is_boolean(&self) -> bool {
        matches!(self, ValueType::Boolean | ValueType::TrueOnly)
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single grid cell or cursor value.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    #[default]
    Null,
    Boolean(bool),
    Integer(i64),
    Number(f64),
    Text(String),
}

impl Value {
    pub fn text(value: impl Into<String>) -> Self {
        Value::Text(value.into())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// String rendering of a non-null value.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Value::Null => None,
            Value::Boolean(value) => Some(value.to_string()),
            Value::Integer(value) => Some(value.to_string()),
            Value::Number(value) => Some(value.to_string()),
            Value::Text(value) => Some(value.clone()),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(value) => Some(*value as f64),
            Value::Number(value) => Some(*value),
            Value::Text(value) => value.trim().parse().ok(),
            Value::Null | Value::Boolean(_) => None,
        }
    }

    /// Truthiness of side-car flags; backends report booleans as 0/1 or text.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Boolean(value) => *value,
            Value::Integer(value) => *value != 0,
            Value::Number(value) => *value != 0.0,
            Value::Text(value) => matches!(value.as_str(), "true" | "t" | "1"),
        }
    }

    /// Parse a raw string into the cell representation of `value_type`.
    ///
    /// Strings that do not parse keep their text form.
    pub fn from_raw(raw: &str, value_type: ValueType) -> Value {
        if value_type.is_integer() {
            if let Ok(value) = raw.trim().parse::<i64>() {
                return Value::Integer(value);
            }
        }
        if value_type.is_numeric() {
            if let Ok(value) = raw.trim().parse::<f64>() {
                // Integral reals read as integers for integer types, as in `conform`.
                return Value::Number(value).conform(value_type);
            }
        }
        if value_type.is_boolean() {
            match raw {
                "true" => return Value::Boolean(true),
                "false" => return Value::Boolean(false),
                _ => {}
            }
        }
        Value::Text(raw.to_string())
    }

    /// Normalize a backend value to the representation `from_raw` would produce.
    pub fn conform(self, value_type: ValueType) -> Value {
        match self {
            Value::Null => Value::Null,
            Value::Text(raw) => Value::from_raw(&raw, value_type),
            Value::Number(value) if value_type.is_integer() && value.fract() == 0.0 => {
                Value::Integer(value as i64)
            }
            Value::Integer(value) if value_type.is_numeric() && !value_type.is_integer() => {
                Value::Number(value as f64)
            }
            Value::Integer(value) if value_type.is_boolean() => Value::Boolean(value != 0),
            Value::Integer(value) if !value_type.is_numeric() => Value::Text(value.to_string()),
            other => other,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_text() {
            Some(text) => f.write_str(&text),
            None => Ok(()),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_values_follow_value_type() {
        assert_eq!(Value::from_raw("12", ValueType::Integer), Value::Integer(12));
        assert_eq!(Value::from_raw("12.5", ValueType::Number), Value::Number(12.5));
        assert_eq!(Value::from_raw("true", ValueType::Boolean), Value::Boolean(true));
        assert_eq!(Value::from_raw("abc", ValueType::Number), Value::text("abc"));
        assert_eq!(Value::from_raw("12", ValueType::Text), Value::text("12"));
    }

    #[test]
    fn backend_values_conform_to_raw_representation() {
        assert_eq!(Value::Number(3.0).conform(ValueType::Integer), Value::Integer(3));
        assert_eq!(Value::Integer(3).conform(ValueType::Number), Value::Number(3.0));
        assert_eq!(Value::Integer(1).conform(ValueType::Boolean), Value::Boolean(true));
        assert_eq!(Value::text("7").conform(ValueType::Integer), Value::Integer(7));
        assert_eq!(Value::Integer(7).conform(ValueType::Text), Value::text("7"));
    }

    #[test]
    fn integral_text_matches_integral_backend_reals() {
        let from_text = Value::from_raw("12.0", ValueType::Integer);
        assert_eq!(from_text, Value::Integer(12));
        assert_eq!(from_text, Value::Number(12.0).conform(ValueType::Integer));
        assert_eq!(Value::from_raw("12.5", ValueType::Integer), Value::Number(12.5));
        assert_eq!(Value::from_raw("12.0", ValueType::Number), Value::Number(12.0));
    }

    #[test]
    fn truthiness_of_side_car_flags() {
        assert!(Value::Integer(1).is_truthy());
        assert!(Value::Boolean(true).is_truthy());
        assert!(Value::text("t").is_truthy());
        assert!(!Value::Null.is_truthy());
        assert!(!Value::Integer(0).is_truthy());
    }

    #[test]
    fn untagged_serialization() {
        let cells = vec![Value::Null, Value::Integer(2), Value::text("x")];
        let json = serde_json::to_string(&cells).expect("serialize cells");
        assert_eq!(json, r#"[null,2,"x"]"#);
    }
}
