// Copyright 2025 Wooby Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Value type for Wooby - runtime values and their operator contract
//!
//! Every operator is a single exhaustive match over the operand pair. Kind
//! combinations the engine does not define fail with
//! [`Error::TypeMismatch`] naming both operand kinds; nothing is coerced.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};

use super::error::{Error, Result};
use super::types::{DataType, Operator};

/// Date formats accepted by [`parse_date`], most specific first
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M:%S%:z",
    "%Y-%m-%dT%H:%M:%SZ",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y/%m/%d %H:%M:%S",
];

/// A runtime value
///
/// Text uses `Arc<str>` so rows can be cloned cheaply between the cursor,
/// the stack and the output accumulator.
#[derive(Debug, Clone, Default)]
pub enum Value {
    /// Absence of a value
    #[default]
    Null,

    /// 64-bit floating point number
    Number(f64),

    /// UTF-8 text string
    Text(Arc<str>),

    /// Boolean value
    Boolean(bool),

    /// Date and time (UTC)
    Date(DateTime<Utc>),
}

impl Value {
    // =========================================================================
    // Constructors
    // =========================================================================

    pub fn text(value: impl Into<Arc<str>>) -> Self {
        Value::Text(value.into())
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Kind of this value
    pub fn data_type(&self) -> DataType {
        match self {
            Value::Null => DataType::Null,
            Value::Number(_) => DataType::Number,
            Value::Text(_) => DataType::Text,
            Value::Boolean(_) => DataType::Boolean,
            Value::Date(_) => DataType::Date,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns true only for `Boolean(true)`
    pub fn is_true(&self) -> bool {
        matches!(self, Value::Boolean(true))
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<DateTime<Utc>> {
        match self {
            Value::Date(d) => Some(*d),
            _ => None,
        }
    }

    /// Check that this value may be stored in a column of `data_type`
    pub fn fits(&self, data_type: DataType) -> bool {
        self.is_null() || data_type.is_null() || self.data_type() == data_type
    }

    // =========================================================================
    // Operators
    // =========================================================================

    /// Apply a binary operator
    pub fn apply(&self, op: Operator, right: &Value) -> Result<Value> {
        match op {
            Operator::Plus => self.add(right),
            Operator::Minus => self.arithmetic(op, right, |a, b| Ok(a - b)),
            Operator::Multiply => self.arithmetic(op, right, |a, b| Ok(a * b)),
            Operator::Divide => self.arithmetic(op, right, |a, b| {
                if b == 0.0 {
                    Err(Error::DivisionByZero)
                } else {
                    Ok(a / b)
                }
            }),
            Operator::Power => self.arithmetic(op, right, |a, b| Ok(a.powf(b))),
            Operator::Remainder => self.arithmetic(op, right, |a, b| {
                if b == 0.0 {
                    Err(Error::DivisionByZero)
                } else {
                    Ok(a % b)
                }
            }),
            Operator::Concat => self.concat(right),
            Operator::Equal => self.equals(right).map(Value::Boolean),
            Operator::NotEqual => self.equals(right).map(|eq| Value::Boolean(!eq)),
            Operator::Less => self.order(op, right).map(|o| Value::Boolean(o.is_lt())),
            Operator::More => self.order(op, right).map(|o| Value::Boolean(o.is_gt())),
            Operator::LessEqual => self.order(op, right).map(|o| Value::Boolean(o.is_le())),
            Operator::MoreEqual => self.order(op, right).map(|o| Value::Boolean(o.is_ge())),
            Operator::And | Operator::Or => match (self, right) {
                (Value::Boolean(a), Value::Boolean(b)) => Ok(Value::Boolean(if op == Operator::And {
                    *a && *b
                } else {
                    *a || *b
                })),
                _ => Err(self.mismatch(op, right)),
            },
        }
    }

    /// `+`: numeric addition or text concatenation
    pub fn add(&self, right: &Value) -> Result<Value> {
        match (self, right) {
            (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
            (Value::Text(a), Value::Text(b)) => Ok(Value::text(format!("{}{}", a, b))),
            _ => Err(self.mismatch(Operator::Plus, right)),
        }
    }

    /// `||`: text concatenation only
    pub fn concat(&self, right: &Value) -> Result<Value> {
        match (self, right) {
            (Value::Text(a), Value::Text(b)) => Ok(Value::text(format!("{}{}", a, b))),
            _ => Err(self.mismatch(Operator::Concat, right)),
        }
    }

    fn arithmetic(
        &self,
        op: Operator,
        right: &Value,
        f: impl FnOnce(f64, f64) -> Result<f64>,
    ) -> Result<Value> {
        match (self, right) {
            (Value::Number(a), Value::Number(b)) => f(*a, *b).map(Value::Number),
            _ => Err(self.mismatch(op, right)),
        }
    }

    /// `=` semantics: same-kind equality, Null equal only to Null
    pub fn equals(&self, right: &Value) -> Result<bool> {
        match (self, right) {
            (Value::Null, Value::Null) => Ok(true),
            (Value::Null, _) | (_, Value::Null) => Ok(false),
            (Value::Number(a), Value::Number(b)) => Ok(a == b),
            (Value::Text(a), Value::Text(b)) => Ok(a == b),
            (Value::Boolean(a), Value::Boolean(b)) => Ok(a == b),
            (Value::Date(a), Value::Date(b)) => Ok(a == b),
            _ => Err(self.mismatch(Operator::Equal, right)),
        }
    }

    /// Ordering for `<,>,<=,>=`: numeric only, Null below everything
    fn order(&self, op: Operator, right: &Value) -> Result<Ordering> {
        match (self, right) {
            (Value::Null, Value::Null) => Ok(Ordering::Equal),
            (Value::Null, _) => Ok(Ordering::Less),
            (_, Value::Null) => Ok(Ordering::Greater),
            (Value::Number(a), Value::Number(b)) => Ok(compare_numbers(*a, *b)),
            _ => Err(self.mismatch(op, right)),
        }
    }

    fn mismatch(&self, op: Operator, right: &Value) -> Error {
        Error::type_mismatch(op.to_string(), self.data_type(), right.data_type())
    }

    /// Total order used by ORDER BY, MIN and MAX
    ///
    /// Kinds rank Null < Boolean < Number < Text < Date; within a kind the
    /// natural order applies.
    pub fn sort_cmp(&self, other: &Value) -> Ordering {
        fn rank(v: &Value) -> u8 {
            match v {
                Value::Null => 0,
                Value::Boolean(_) => 1,
                Value::Number(_) => 2,
                Value::Text(_) => 3,
                Value::Date(_) => 4,
            }
        }

        match (self, other) {
            (Value::Number(a), Value::Number(b)) => compare_numbers(*a, *b),
            (Value::Text(a), Value::Text(b)) => a.cmp(b),
            (Value::Boolean(a), Value::Boolean(b)) => a.cmp(b),
            (Value::Date(a), Value::Date(b)) => a.cmp(b),
            _ => rank(self).cmp(&rank(other)),
        }
    }
}

// =========================================================================
// Trait implementations
// =========================================================================

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Number(v) => write!(f, "{}", format_number(*v)),
            Value::Text(s) => write!(f, "{}", s),
            Value::Boolean(b) => write!(f, "{}", if *b { "true" } else { "false" }),
            Value::Date(d) => write!(f, "{}", d.format("%Y-%m-%d %H:%M:%S")),
        }
    }
}

/// Structural equality, used for DISTINCT and group keys
///
/// Unlike [`Value::equals`] this never fails: values of different kinds are
/// simply unequal, and NaN equals NaN.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Number(a), Value::Number(b)) => {
                (a.is_nan() && b.is_nan()) || a == b
            }
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Date(a), Value::Date(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Value::Null => 0u8.hash(state),
            Value::Number(v) => {
                1u8.hash(state);
                // -0.0 == 0.0, so both must hash alike
                let normalized = if *v == 0.0 { 0.0f64 } else { *v };
                normalized.to_bits().hash(state);
            }
            Value::Text(s) => {
                2u8.hash(state);
                s.hash(state);
            }
            Value::Boolean(b) => {
                3u8.hash(state);
                b.hash(state);
            }
            Value::Date(d) => {
                4u8.hash(state);
                d.timestamp_nanos_opt().hash(state);
            }
        }
    }
}

// =========================================================================
// From implementations for convenient construction
// =========================================================================

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Number(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Number(v as f64)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Number(v as f64)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(Arc::from(v))
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(Arc::from(v))
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::Date(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => Value::Null,
        }
    }
}

// =========================================================================
// Helper functions
// =========================================================================

/// Parse a date or date-time string into a UTC timestamp
pub fn parse_date(s: &str) -> Result<DateTime<Utc>> {
    let s = s.trim();

    for format in DATE_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(s, format) {
            return Ok(dt.with_timezone(&Utc));
        }
        if let Ok(ndt) = NaiveDateTime::parse_from_str(s, format) {
            return Ok(Utc.from_utc_datetime(&ndt));
        }
    }

    for format in ["%Y-%m-%d", "%Y/%m/%d"] {
        if let Ok(date) = NaiveDate::parse_from_str(s, format) {
            if let Some(datetime) = date.and_hms_opt(0, 0, 0) {
                return Ok(Utc.from_utc_datetime(&datetime));
            }
        }
    }

    Err(Error::InvalidArgument(format!("invalid date format: {}", s)))
}

/// Format a number without a trailing ".0" for integral values
fn format_number(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{:.0}", v)
    } else {
        format!("{}", v)
    }
}

fn compare_numbers(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    #[test]
    fn test_arithmetic() {
        let two = Value::from(2);
        let three = Value::from(3.0);
        assert_eq!(two.apply(Operator::Plus, &three).unwrap(), Value::from(5.0));
        assert_eq!(two.apply(Operator::Minus, &three).unwrap(), Value::from(-1.0));
        assert_eq!(two.apply(Operator::Multiply, &three).unwrap(), Value::from(6.0));
        assert_eq!(three.apply(Operator::Power, &two).unwrap(), Value::from(9.0));
        assert_eq!(three.apply(Operator::Remainder, &two).unwrap(), Value::from(1.0));
        assert_eq!(
            two.apply(Operator::Divide, &Value::from(0)),
            Err(Error::DivisionByZero)
        );
    }

    #[test]
    fn test_text_operators() {
        let a = Value::from("foo");
        let b = Value::from("bar");
        assert_eq!(a.apply(Operator::Plus, &b).unwrap(), Value::from("foobar"));
        assert_eq!(a.apply(Operator::Concat, &b).unwrap(), Value::from("foobar"));
        assert_eq!(a.apply(Operator::Equal, &b).unwrap(), Value::from(false));
        assert_eq!(a.apply(Operator::NotEqual, &b).unwrap(), Value::from(true));

        // No ordering and no arithmetic on text
        assert!(matches!(
            a.apply(Operator::Less, &b),
            Err(Error::TypeMismatch { .. })
        ));
        assert!(matches!(
            a.apply(Operator::Minus, &b),
            Err(Error::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_mismatch_names_both_kinds() {
        let err = Value::from(1).apply(Operator::Plus, &Value::from("x")).unwrap_err();
        assert_eq!(
            err,
            Error::type_mismatch("+", DataType::Number, DataType::Text)
        );

        let err = Value::from(true)
            .apply(Operator::Plus, &Value::from(false))
            .unwrap_err();
        assert_eq!(
            err,
            Error::type_mismatch("+", DataType::Boolean, DataType::Boolean)
        );
    }

    #[test]
    fn test_logical() {
        let t = Value::from(true);
        let f = Value::from(false);
        assert_eq!(t.apply(Operator::And, &f).unwrap(), f);
        assert_eq!(t.apply(Operator::Or, &f).unwrap(), t);
        assert!(Value::from(1).apply(Operator::And, &t).is_err());
    }

    #[test]
    fn test_null_comparisons() {
        let null = Value::Null;
        let one = Value::from(1);
        assert_eq!(null.apply(Operator::Equal, &one).unwrap(), Value::from(false));
        assert_eq!(null.apply(Operator::NotEqual, &one).unwrap(), Value::from(true));
        assert_eq!(null.apply(Operator::Equal, &null).unwrap(), Value::from(true));
        assert_eq!(null.apply(Operator::Less, &one).unwrap(), Value::from(true));
        assert_eq!(one.apply(Operator::Less, &null).unwrap(), Value::from(false));
        assert_eq!(
            Value::from("a").apply(Operator::Equal, &null).unwrap(),
            Value::from(false)
        );

        // Null is not an arithmetic operand
        assert!(null.apply(Operator::Plus, &one).is_err());
        assert!(null.apply(Operator::And, &Value::from(true)).is_err());
    }

    #[test]
    fn test_date_equality() {
        let d1 = Value::from(parse_date("2024-01-15").unwrap());
        let d2 = Value::from(parse_date("2024-01-15 00:00:00").unwrap());
        assert_eq!(d1.apply(Operator::Equal, &d2).unwrap(), Value::from(true));
        assert!(d1.apply(Operator::Less, &d2).is_err());
    }

    #[test]
    fn test_sort_cmp_total_order() {
        let mut values = vec![
            Value::from("b"),
            Value::from(2),
            Value::Null,
            Value::from("a"),
            Value::from(true),
            Value::from(-1),
        ];
        values.sort_by(|a, b| a.sort_cmp(b));
        assert_eq!(
            values,
            vec![
                Value::Null,
                Value::from(true),
                Value::from(-1),
                Value::from(2),
                Value::from("a"),
                Value::from("b"),
            ]
        );
    }

    #[test]
    fn test_parse_date() {
        let d = parse_date("2024-03-05T10:30:00Z").unwrap();
        assert_eq!(d.year(), 2024);
        assert_eq!(d.month(), 3);
        assert!(parse_date("2024-03-05").is_ok());
        assert!(matches!(parse_date("yesterday"), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::from(4.0).to_string(), "4");
        assert_eq!(Value::from(2.5).to_string(), "2.5");
        assert_eq!(Value::Null.to_string(), "NULL");
        assert_eq!(
            Value::from(parse_date("2024-01-15").unwrap()).to_string(),
            "2024-01-15 00:00:00"
        );
    }
}
