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

//! # Wooby - embeddable SQL query engine
//!
//! Wooby turns SQL text into results over pluggable row sources. Statements
//! are lexed, parsed and resolved against an in-memory catalog, every
//! expression is compiled to a straight-line stack program, and a small VM
//! runs those programs against table cursors.
//!
//! ## Key Features
//!
//! - **Resolver** - Qualified, aliased and correlated column references, checked before execution
//! - **Typed overloads** - Function variants are picked once, at resolution time
//! - **Joins** - INNER, LEFT, RIGHT and FULL OUTER nested-loop joins
//! - **Grouping** - GROUP BY with COUNT, SUM, AVG, MIN and MAX
//! - **Sub-selects** - In FROM and in value position, correlated to any depth
//! - **Pluggable storage** - Anything implementing [`storage::TableDataProvider`]
//!
//! ## Quick Start
//!
//! ```rust
//! use wooby::{Database, Value};
//!
//! let mut db = Database::new();
//! db.execute("CREATE TABLE users (id INT, name TEXT, age INT)").unwrap();
//! db.execute("INSERT INTO users VALUES (1, 'Alice', 30), (2, 'Bob', 25)").unwrap();
//!
//! let output = db.query("SELECT COUNT() AS n, AVG(age) AS mean FROM users").unwrap();
//! assert_eq!(output.rows[0].values, vec![Value::from(2.0), Value::from(27.5)]);
//! ```
//!
//! ## Modules
//!
//! - [`api`] - Public database interface ([`Database`], [`Config`])
//! - [`core`] - Core types ([`DataType`], [`Value`], [`Row`], [`Error`])
//! - [`catalog`] - Tables, columns and functions ([`Context`])
//! - [`parser`] - Lexer, parser and resolver
//! - [`executor`] - Query plans, expression compiler and VM
//! - [`functions`] - Built-in scalar and aggregate functions
//! - [`storage`] - Row source contract, cursors and the in-memory table

pub mod api;
pub mod catalog;
pub mod core;
pub mod executor;
pub mod functions;
pub mod parser;
pub mod storage;

pub use api::{Config, Database};
pub use catalog::Context;
pub use core::{DataType, Error, Operator, Result, Row, Value};
pub use executor::{ColumnDefinition, Output, OutputRow};
pub use storage::{MemoryTable, TableDataProvider};

/// Parse, resolve and execute one statement against `context`
///
/// ```
/// use wooby::{parse_and_execute, Context, Value};
///
/// let mut context = Context::new("demo");
/// let output = parse_and_execute("SELECT 2 + 2", &mut context).unwrap();
/// assert_eq!(output.rows[0].values, vec![Value::from(4.0)]);
/// ```
pub fn parse_and_execute(text: &str, context: &mut Context) -> Result<Output> {
    let statement = parser::parse_and_resolve(text, &parser::ParserOptions::default(), context)?;
    executor::Executor::new().execute(&statement, context)
}
