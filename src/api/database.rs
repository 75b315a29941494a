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

//! Database - the embedding entry point

use tracing::debug;

use crate::catalog::{Context, TableId};
use crate::core::{DataType, Error, Result};
use crate::executor::{Executor, Output};
use crate::parser::{parse_and_resolve, Statement, StatementKind};
use crate::storage::TableDataProvider;

use super::config::Config;

/// Database owns a catalog and runs statements against it
///
/// Every statement is parsed, resolved and compiled completely before it
/// touches storage; a statement that fails leaves the catalog and every
/// table as they were.
///
/// # Examples
///
/// ```
/// use wooby::Database;
///
/// let mut db = Database::new();
/// db.execute("CREATE TABLE users (id INT, name TEXT)").unwrap();
/// db.execute("INSERT INTO users VALUES (1, 'Alice'), (2, 'Bob')").unwrap();
///
/// let output = db.query("SELECT name FROM users WHERE id = 2").unwrap();
/// assert_eq!(output.rows[0].values[0].to_string(), "Bob");
/// ```
#[derive(Debug)]
pub struct Database {
    context: Context,
    config: Config,
    executor: Executor,
}

impl Database {
    /// Open an empty database with the default configuration
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        Self {
            context: Context::new(config.name.clone()),
            executor: Executor::with_options(config.execution_options()),
            config,
        }
    }

    /// Wrap an existing catalog
    pub fn from_context(context: Context, config: Config) -> Self {
        Self {
            context,
            executor: Executor::with_options(config.execution_options()),
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut Context {
        &mut self.context
    }

    /// Parse and resolve a statement without executing it
    pub fn prepare(&self, sql: &str) -> Result<Statement> {
        parse_and_resolve(sql, &self.config.parser_options(), &self.context)
    }

    /// Execute any statement
    pub fn execute(&mut self, sql: &str) -> Result<Output> {
        let statement = self.prepare(sql)?;
        let kind = statement.kind();
        debug!(%kind, "executing statement");
        let output = self.executor.execute(&statement, &mut self.context)?;
        log_output(kind, &output);
        Ok(output)
    }

    /// Execute a SELECT; mutating statements are rejected
    pub fn query(&self, sql: &str) -> Result<Output> {
        let statement = self.prepare(sql)?;
        let Statement::Select(select) = &statement else {
            return Err(Error::NotSupported(format!(
                "{} is not allowed in a read-only query",
                statement.kind()
            )));
        };
        debug!(kind = %StatementKind::Select, "executing query");
        let output = self.executor.query(select, &self.context)?;
        log_output(StatementKind::Select, &output);
        Ok(output)
    }

    /// Register a table backed by a custom provider
    pub fn register_table(
        &mut self,
        name: &str,
        columns: &[(&str, DataType)],
        provider: Box<dyn TableDataProvider>,
    ) -> Result<TableId> {
        let id = self.context.create_table(name, columns, provider)?;
        debug!(table = name, id, "registered table");
        Ok(id)
    }
}

impl Default for Database {
    fn default() -> Self {
        Self::new()
    }
}

fn log_output(kind: StatementKind, output: &Output) {
    match kind {
        StatementKind::Select => debug!(rows = output.len(), "query finished"),
        StatementKind::Create => debug!("table created"),
        _ => debug!(rows_affected = output.rows_affected, %kind, "statement finished"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Row, Value};
    use crate::storage::MemoryTable;

    #[test]
    fn test_query_rejects_mutation() {
        let mut db = Database::new();
        db.execute("CREATE TABLE t (a INT)").unwrap();
        let err = db.query("INSERT INTO t VALUES (1)").unwrap_err();
        assert!(matches!(err, Error::NotSupported(_)));
        assert!(db.query("SELECT a FROM t").unwrap().is_empty());
    }

    #[test]
    fn test_register_table() {
        let mut db = Database::with_config(Config::new().with_name("custom"));
        assert_eq!(db.context().name(), "custom");
        let rows = vec![Row::from_values(vec![Value::from("x")])];
        db.register_table(
            "letters",
            &[("l", DataType::Text)],
            Box::new(MemoryTable::from_rows(1, rows)),
        )
        .unwrap();
        let output = db.query("SELECT l FROM letters").unwrap();
        assert_eq!(output.rows[0].values, vec![Value::from("x")]);
    }

    #[test]
    fn test_failed_statement_leaves_table_untouched() {
        let mut db = Database::new();
        db.execute("CREATE TABLE t (a INT)").unwrap();
        db.execute("INSERT INTO t VALUES (1), (2)").unwrap();
        // Fails while evaluating the second row, before any insert
        assert!(db.execute("INSERT INTO t VALUES (3), (1 / 0)").is_err());
        assert_eq!(db.query("SELECT a FROM t").unwrap().len(), 2);
    }

    #[test]
    fn test_wrap_existing_catalog() {
        let mut context = Context::new("shared");
        context
            .create_memory_table("t", &[("a", DataType::Number)])
            .unwrap();
        let mut db = Database::from_context(context, Config::new());
        assert_eq!(db.context().name(), "shared");

        db.execute("INSERT INTO t VALUES (7)").unwrap();
        db.context_mut()
            .create_memory_table("u", &[("b", DataType::Text)])
            .unwrap();
        db.execute("INSERT INTO u VALUES ('x')").unwrap();
        let output = db.query("SELECT a, b FROM t JOIN u ON TRUE").unwrap();
        assert_eq!(output.rows[0].values, vec![Value::from(7), Value::from("x")]);
    }

    #[test]
    fn test_nesting_limit_from_config() {
        let db = Database::with_config(Config::new().with_max_nesting_depth(2));
        assert!(db.query("SELECT ((1))").is_ok());
        let err = db.query("SELECT (((1)))").unwrap_err();
        assert!(err.is_parse_error());
    }
}
