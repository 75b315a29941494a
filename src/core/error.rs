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

//! Error types for Wooby
//!
//! Every stage (lexing, parsing, resolution, compilation, execution) reports
//! failures through the single [`Error`] enum defined here.

use thiserror::Error;

use super::types::DataType;

/// Result type alias for Wooby operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for Wooby
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    // =========================================================================
    // Lexical and syntactic errors
    // =========================================================================
    /// Malformed literal (number with two decimal points, dangling exponent, ...)
    #[error("lex error at offset {offset}: {message}")]
    Lex { message: String, offset: usize },

    /// Unexpected token
    #[error("parse error at offset {offset} near '{near}': {message}")]
    Parse {
        message: String,
        offset: usize,
        near: String,
    },

    // =========================================================================
    // Resolution errors
    // =========================================================================
    /// Unknown table, column or function
    #[error("unresolved reference '{name}' at offset {offset}")]
    UnresolvedReference { name: String, offset: usize },

    /// Unqualified column found in more than one source
    #[error("ambiguous reference '{name}' at offset {offset}")]
    AmbiguousReference { name: String, offset: usize },

    /// Invalid join layout (duplicate aliases, missing ON condition)
    #[error("invalid join: {0}")]
    InvalidJoin(String),

    /// Aggregate used where it is not allowed, or GROUP BY violation
    #[error("aggregate misuse: {0}")]
    AggregateMisuse(String),

    /// No overload of a function accepts the given argument types
    #[error("no suitable variant of {function}({arguments})")]
    NoSuitableOverload { function: String, arguments: String },

    // =========================================================================
    // Catalog errors
    // =========================================================================
    /// Table already exists when trying to create
    #[error("table '{0}' already exists")]
    TableAlreadyExists(String),

    /// Duplicate column name in a table
    #[error("duplicate column '{column}' in table '{table}'")]
    DuplicateColumn { table: String, column: String },

    // =========================================================================
    // Evaluation errors
    // =========================================================================
    /// Operand kinds incompatible with an operator
    #[error("type mismatch: cannot apply '{op}' to {left} and {right}")]
    TypeMismatch {
        op: String,
        left: DataType,
        right: DataType,
    },

    /// Division by zero
    #[error("division by zero")]
    DivisionByZero,

    /// Invalid argument for function
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A sub-select used as a value produced more than one row
    #[error("sub-select used as a value returned {0} rows")]
    SubSelectCardinality(usize),

    /// Operation not supported by a provider or statement
    #[error("not supported: {0}")]
    NotSupported(String),

    // =========================================================================
    // Internal errors
    // =========================================================================
    /// Compiler/VM contract violation (stack underflow, bad operand)
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a new Lex error
    pub fn lex(message: impl Into<String>, offset: usize) -> Self {
        Error::Lex {
            message: message.into(),
            offset,
        }
    }

    /// Create a new Parse error
    pub fn parse(message: impl Into<String>, offset: usize, near: impl Into<String>) -> Self {
        Error::Parse {
            message: message.into(),
            offset,
            near: near.into(),
        }
    }

    /// Create a new UnresolvedReference error
    pub fn unresolved(name: impl Into<String>, offset: usize) -> Self {
        Error::UnresolvedReference {
            name: name.into(),
            offset,
        }
    }

    /// Create a new AmbiguousReference error
    pub fn ambiguous(name: impl Into<String>, offset: usize) -> Self {
        Error::AmbiguousReference {
            name: name.into(),
            offset,
        }
    }

    /// Create a new TypeMismatch error
    pub fn type_mismatch(op: impl Into<String>, left: DataType, right: DataType) -> Self {
        Error::TypeMismatch {
            op: op.into(),
            left,
            right,
        }
    }

    /// Create a new AggregateMisuse error
    pub fn aggregate_misuse(message: impl Into<String>) -> Self {
        Error::AggregateMisuse(message.into())
    }

    /// Create a new NoSuitableOverload error
    pub fn no_suitable_overload(function: impl Into<String>, arguments: &[DataType]) -> Self {
        let arguments = arguments
            .iter()
            .map(|t| t.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        Error::NoSuitableOverload {
            function: function.into(),
            arguments,
        }
    }

    /// Create a new Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Error::Internal(message.into())
    }

    /// Source offset the error points at, when known
    pub fn offset(&self) -> Option<usize> {
        match self {
            Error::Lex { offset, .. }
            | Error::Parse { offset, .. }
            | Error::UnresolvedReference { offset, .. }
            | Error::AmbiguousReference { offset, .. } => Some(*offset),
            _ => None,
        }
    }

    /// Check if this error was raised before execution started
    pub fn is_parse_error(&self) -> bool {
        matches!(
            self,
            Error::Lex { .. }
                | Error::Parse { .. }
                | Error::UnresolvedReference { .. }
                | Error::AmbiguousReference { .. }
                | Error::InvalidJoin(_)
                | Error::AggregateMisuse(_)
                | Error::NoSuitableOverload { .. }
        )
    }

    /// Check if this is a compiler/VM contract violation
    pub fn is_internal(&self) -> bool {
        matches!(self, Error::Internal(_))
    }
}
