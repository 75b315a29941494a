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

//! Core type definitions: DataType and the binary operator set

use std::fmt;
use std::str::FromStr;

/// Scalar types known to the engine
///
/// `Null` doubles as the "not yet known" type of an unresolved expression
/// and of the NULL literal; it is compatible with every other type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum DataType {
    #[default]
    Null = 0,

    /// 64-bit floating point number
    Number = 1,

    /// UTF-8 text string
    Text = 2,

    /// Boolean true/false
    Boolean = 3,

    /// Date and time (stored as UTC)
    Date = 4,
}

impl DataType {
    /// Returns true if this type is the unknown/NULL type
    pub fn is_null(&self) -> bool {
        matches!(self, DataType::Null)
    }

    /// Two types are compatible when they are equal or either is NULL
    pub fn is_compatible(&self, other: DataType) -> bool {
        *self == other || self.is_null() || other.is_null()
    }

    /// The known type of the two, preferring the left one
    pub fn unify(self, other: DataType) -> DataType {
        if self.is_null() {
            other
        } else {
            self
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Null => write!(f, "NULL"),
            DataType::Number => write!(f, "NUMBER"),
            DataType::Text => write!(f, "TEXT"),
            DataType::Boolean => write!(f, "BOOLEAN"),
            DataType::Date => write!(f, "DATE"),
        }
    }
}

impl FromStr for DataType {
    type Err = String;

    /// Parse a column type keyword
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "TEXT" => Ok(DataType::Text),
            "INT" | "INTEGER" | "NUMBER" => Ok(DataType::Number),
            "DATE" | "DATETIME" => Ok(DataType::Date),
            "BOOL" | "BOOLEAN" => Ok(DataType::Boolean),
            _ => Err(format!("unknown column type '{}'", s)),
        }
    }
}

/// Binary operators available in expressions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Plus,
    Minus,
    Multiply,
    Divide,
    Power,
    Remainder,
    Concat,
    Equal,
    NotEqual,
    Less,
    More,
    LessEqual,
    MoreEqual,
    And,
    Or,
}

impl Operator {
    /// Map an operator token or keyword to an operator
    pub fn from_symbol(symbol: &str) -> Option<Operator> {
        let op = match symbol {
            "+" => Operator::Plus,
            "-" => Operator::Minus,
            "*" => Operator::Multiply,
            "/" => Operator::Divide,
            "^" => Operator::Power,
            "%" => Operator::Remainder,
            "||" => Operator::Concat,
            "=" => Operator::Equal,
            "<>" | "!=" => Operator::NotEqual,
            "<" => Operator::Less,
            ">" => Operator::More,
            "<=" => Operator::LessEqual,
            ">=" => Operator::MoreEqual,
            _ if symbol.eq_ignore_ascii_case("AND") => Operator::And,
            _ if symbol.eq_ignore_ascii_case("OR") => Operator::Or,
            _ => return None,
        };
        Some(op)
    }

    /// Operators reduced eagerly by the compiler
    pub fn is_multiplicative(&self) -> bool {
        matches!(
            self,
            Operator::Multiply | Operator::Divide | Operator::Power | Operator::Remainder
        )
    }

    /// Operators producing a boolean result
    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            Operator::Equal
                | Operator::NotEqual
                | Operator::Less
                | Operator::More
                | Operator::LessEqual
                | Operator::MoreEqual
        )
    }

    /// Logical connectives
    pub fn is_logical(&self) -> bool {
        matches!(self, Operator::And | Operator::Or)
    }

    /// Statically compute the result type of `left op right`
    ///
    /// Mirrors the runtime compatibility table of [`crate::core::Value`];
    /// `Null` operands are accepted everywhere the table allows a value.
    pub fn result_type(&self, left: DataType, right: DataType) -> Result<DataType, DataType> {
        use DataType::*;
        let operand = left.unify(right);
        if !left.is_compatible(right) {
            return Err(operand);
        }
        let ok = match self {
            Operator::Plus => matches!(operand, Null | Number | Text),
            Operator::Minus
            | Operator::Multiply
            | Operator::Divide
            | Operator::Power
            | Operator::Remainder => matches!(operand, Null | Number),
            Operator::Concat => matches!(operand, Null | Text),
            Operator::Equal | Operator::NotEqual => true,
            Operator::Less | Operator::More | Operator::LessEqual | Operator::MoreEqual => {
                matches!(operand, Null | Number) || left.is_null() || right.is_null()
            }
            Operator::And | Operator::Or => matches!(operand, Null | Boolean),
        };
        if !ok {
            return Err(operand);
        }
        Ok(if self.is_comparison() || self.is_logical() {
            Boolean
        } else if *self == Operator::Concat {
            Text
        } else {
            operand
        })
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Operator::Plus => "+",
            Operator::Minus => "-",
            Operator::Multiply => "*",
            Operator::Divide => "/",
            Operator::Power => "^",
            Operator::Remainder => "%",
            Operator::Concat => "||",
            Operator::Equal => "=",
            Operator::NotEqual => "<>",
            Operator::Less => "<",
            Operator::More => ">",
            Operator::LessEqual => "<=",
            Operator::MoreEqual => ">=",
            Operator::And => "AND",
            Operator::Or => "OR",
        };
        write!(f, "{}", s)
    }
}
