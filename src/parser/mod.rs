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

//! SQL Parser
//!
//! This module turns statement text into a resolved [`Statement`]:
//!
//! - [`lexer`] - Tokenizer for SQL input
//! - [`Parser`] - Recursive-descent parser that builds the AST
//! - [`ast`] - Statement and flat expression types
//! - [`precedence`] - Operator precedence and postfix linearization
//! - [`resolver`] - Reference, type and overload resolution
//!
//! # Example
//!
//! ```
//! use wooby::catalog::Context;
//! use wooby::parser::{parse_and_resolve, ParserOptions, Statement};
//!
//! let ctx = Context::new("demo");
//! let statement = parse_and_resolve("SELECT 2 + 2", &ParserOptions::default(), &ctx).unwrap();
//! assert!(matches!(statement, Statement::Select(_)));
//! ```

pub mod ast;
pub mod lexer;
#[allow(clippy::module_inception)]
pub mod parser;
pub mod precedence;
pub mod resolver;
pub mod token;

// Expression and statement parsing are implemented as impl blocks on Parser
mod expressions;
mod statements;

pub use ast::{
    Assignment, ColumnBinding, ColumnDefinitionClause, ColumnReference, CreateStatement,
    DeleteStatement, Expression, FunctionCall, FunctionTarget, InsertStatement, JoinKind,
    Joining, Node, OrderBy, SelectStatement, Statement, StatementKind, TableSource,
    UpdateStatement,
};
pub use lexer::{next_token, Lexer};
pub use parser::{Parser, ParserOptions};
pub use precedence::{postfix, Postfix, Precedence};
pub use resolver::resolve;
pub use token::{Token, TokenType};

use crate::catalog::Context;
use crate::core::Result;

/// Parse one statement without resolving it
pub fn parse(text: &str, options: &ParserOptions) -> Result<Statement> {
    Parser::new(text, *options)?.parse_single()
}

/// Parse one statement and resolve it against `catalog`
pub fn parse_and_resolve(text: &str, options: &ParserOptions, catalog: &Context) -> Result<Statement> {
    let mut statement = parse(text, options)?;
    resolve(&mut statement, catalog)?;
    Ok(statement)
}
