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

//! SQL Executor
//!
//! This module executes resolved statements against a catalog.
//!
//! # Architecture
//!
//! ```text
//! Statement (resolved)
//!   ↓
//! QueryPlan::compile     one Program per expression
//!   ↓
//! Sources + joins        nested loops over TableCursors
//!   ↓
//! Filtering pass         WHERE over every row combination
//!   ↓
//! Projection             per row, or per group when aggregating
//!   ↓
//! DISTINCT / ORDER BY / LIMIT
//!   ↓
//! Output
//! ```
//!
//! # Components
//!
//! - [`Executor`] - Entry point dispatching on the statement kind
//! - [`QueryPlan`] - Compiled SELECT
//! - [`expression`] - Expression compiler and stack VM
//! - [`Output`] - Result of one statement

pub mod context;
pub mod expression;
pub mod plan;
pub mod result;

mod ddl;
mod dml;
mod query;

use chrono::{DateTime, Utc};

use crate::catalog::Context;
use crate::core::Result;
use crate::parser::ast::{SelectStatement, Statement};

pub use context::{ExecutionContext, OuterFrame};
pub use plan::QueryPlan;
pub use query::execute_plan;
pub use result::{ColumnDefinition, Output, OutputRow};

/// Executor settings
#[derive(Debug, Clone, Copy, Default)]
pub struct ExecutionOptions {
    /// Log the disassembly of every compiled program at trace level
    pub trace_programs: bool,
}

/// Statement executor
///
/// Every statement reads the clock once; NOW() returns the same instant for
/// all rows of a statement.
#[derive(Debug, Clone, Default)]
pub struct Executor {
    options: ExecutionOptions,
}

impl Executor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ExecutionOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> ExecutionOptions {
        self.options
    }

    /// Execute a resolved statement
    pub fn execute(&self, statement: &Statement, catalog: &mut Context) -> Result<Output> {
        self.execute_at(statement, catalog, Utc::now())
    }

    /// Execute a resolved statement with NOW() fixed to `now`
    pub fn execute_at(&self, statement: &Statement, catalog: &mut Context, now: DateTime<Utc>) -> Result<Output> {
        match statement {
            Statement::Select(select) => self.query_at(select, catalog, now),
            Statement::Insert(stmt) => self.execute_insert(stmt, catalog, now),
            Statement::Update(stmt) => self.execute_update(stmt, catalog, now),
            Statement::Delete(stmt) => self.execute_delete(stmt, catalog, now),
            Statement::Create(stmt) => self.execute_create_table(stmt, catalog),
        }
    }

    /// Execute a resolved SELECT without mutable access to the catalog
    pub fn query(&self, select: &SelectStatement, catalog: &Context) -> Result<Output> {
        self.query_at(select, catalog, Utc::now())
    }

    fn query_at(&self, select: &SelectStatement, catalog: &Context, now: DateTime<Utc>) -> Result<Output> {
        let plan = QueryPlan::compile(select, catalog)?;
        if self.options.trace_programs {
            plan.trace();
        }
        execute_plan(&plan, catalog, None, now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    use crate::core::{DataType, Error, Value};
    use crate::parser::{parse_and_resolve, ParserOptions};

    fn run(sql: &str, catalog: &mut Context) -> Result<Output> {
        let statement = parse_and_resolve(sql, &ParserOptions::default(), catalog)?;
        Executor::new().execute(&statement, catalog)
    }

    #[test]
    fn test_create_insert_update_delete() {
        let mut catalog = Context::new("test");
        run("CREATE TABLE t (a INT, b TEXT)", &mut catalog).unwrap();
        assert!(catalog.find_table("t").is_some());

        let output = run("INSERT INTO t VALUES (1, 'x'), (2, 'y'), (3, 'z')", &mut catalog).unwrap();
        assert_eq!(output.rows_affected, 3);

        let output = run("UPDATE t SET b = 'w' WHERE a >= 2", &mut catalog).unwrap();
        assert_eq!(output.rows_affected, 2);

        let output = run("DELETE FROM t WHERE a = 1", &mut catalog).unwrap();
        assert_eq!(output.rows_affected, 1);

        let output = run("SELECT a, b FROM t", &mut catalog).unwrap();
        assert_eq!(output.len(), 2);
        assert_eq!(output.rows[0].values, vec![Value::from(2.0), Value::from("w")]);
        assert_eq!(output.rows[1].values, vec![Value::from(3.0), Value::from("w")]);
    }

    #[test]
    fn test_statement_uses_one_instant() {
        let mut catalog = Context::new("test");
        run("CREATE TABLE t (at_time DATE)", &mut catalog).unwrap();
        let now = Utc.with_ymd_and_hms(2024, 5, 6, 7, 8, 9).unwrap();

        let insert = parse_and_resolve("INSERT INTO t VALUES (NOW())", &ParserOptions::default(), &catalog).unwrap();
        Executor::new().execute_at(&insert, &mut catalog, now).unwrap();

        let select = parse_and_resolve(
            "SELECT NOW(), at_time, (SELECT NOW()) FROM t",
            &ParserOptions::default(),
            &catalog,
        )
        .unwrap();
        let output = Executor::new().execute_at(&select, &mut catalog, now).unwrap();
        assert_eq!(output.rows[0].values, vec![Value::Date(now); 3]);
    }

    #[test]
    fn test_insert_checks_types() {
        let mut catalog = Context::new("test");
        catalog
            .create_memory_table("t", &[("a", DataType::Number)])
            .unwrap();
        // NULL fits every column
        run("INSERT INTO t VALUES (NULL)", &mut catalog).unwrap();
        let err = run("INSERT INTO t VALUES ('x')", &mut catalog).unwrap_err();
        assert!(matches!(err, Error::TypeMismatch { .. }));
    }

    #[test]
    fn test_insert_column_list() {
        let mut catalog = Context::new("test");
        run("CREATE TABLE t (a INT, b TEXT)", &mut catalog).unwrap();
        run("INSERT INTO t (b) VALUES ('only')", &mut catalog).unwrap();
        let output = run("SELECT * FROM t", &mut catalog).unwrap();
        assert_eq!(output.rows[0].values, vec![Value::Null, Value::from("only")]);
    }
}
