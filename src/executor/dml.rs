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

//! DML Statement Execution
//!
//! This module implements execution of Data Manipulation Language (DML) statements:
//! - INSERT
//! - UPDATE
//! - DELETE
//!
//! Each statement first evaluates everything it needs against a read-only
//! view of the catalog. Only then is the table's provider borrowed mutably,
//! so a statement that fails while evaluating leaves storage untouched.

use chrono::{DateTime, Utc};
use rustc_hash::FxHashMap;
use tracing::trace;

use crate::catalog::{ColumnMeta, Context, TableId, TableMeta};
use crate::core::{Error, Result, Value};
use crate::parser::ast::{DeleteStatement, Expression, InsertStatement, UpdateStatement};
use crate::storage::{RowId, TableCursor};

use super::context::ExecutionContext;
use super::expression::{evaluate, ExprCompiler, Program};
use super::query::{filter_combinations, Combination};
use super::result::Output;
use super::Executor;

impl Executor {
    /// Execute an INSERT statement
    pub(crate) fn execute_insert(
        &self,
        stmt: &InsertStatement,
        catalog: &mut Context,
        now: DateTime<Utc>,
    ) -> Result<Output> {
        let table = table_id(stmt.table_id, &stmt.table)?;

        let rows = {
            let catalog: &Context = catalog;
            let meta = table_meta(catalog, table)?;
            let mut compiler = ExprCompiler::plain(catalog);
            let mut ctx = ExecutionContext::new(catalog, None, now);

            let mut rows = Vec::with_capacity(stmt.rows.len());
            for values in &stmt.rows {
                let mut row = FxHashMap::default();
                for (expr, &position) in values.iter().zip(&stmt.positions) {
                    let program = compiler.compile(expr)?;
                    let value = evaluate(&program, &mut ctx)?;
                    row.insert(position, checked(column_meta(meta, position)?, value)?);
                }
                rows.push(row);
            }
            rows
        };

        let provider = catalog
            .provider_mut(table)
            .ok_or_else(|| Error::NotSupported(format!("table '{}' has no data provider", stmt.table)))?;
        let count = rows.len();
        for row in rows {
            let id = provider.insert(row)?;
            trace!(table = %stmt.table, id, "inserted");
        }
        Ok(Output::with_rows_affected(count))
    }

    /// Execute an UPDATE statement
    pub(crate) fn execute_update(
        &self,
        stmt: &UpdateStatement,
        catalog: &mut Context,
        now: DateTime<Utc>,
    ) -> Result<Output> {
        let table = table_id(stmt.table_id, &stmt.table)?;

        let changes = {
            let catalog: &Context = catalog;
            let meta = table_meta(catalog, table)?;
            let mut compiler = ExprCompiler::plain(catalog);
            let mut assignments: Vec<(&ColumnMeta, Program)> = Vec::with_capacity(stmt.assignments.len());
            for assignment in &stmt.assignments {
                assignments.push((
                    column_meta(meta, assignment.position)?,
                    compiler.compile(&assignment.value)?,
                ));
            }

            let (mut ctx, kept) = matching_rows(catalog, meta, stmt.filter.as_ref(), now)?;
            let mut changes: Vec<(RowId, FxHashMap<usize, Value>)> = Vec::with_capacity(kept.len());
            for combination in &kept {
                ctx.position(combination)?;
                let mut values = FxHashMap::default();
                for (column, program) in &assignments {
                    let value = evaluate(program, &mut ctx)?;
                    values.insert(column.id, checked(column, value)?);
                }
                changes.push((ctx.primary_row_id(), values));
            }
            changes
        };

        let provider = catalog
            .provider_mut(table)
            .ok_or_else(|| Error::NotSupported(format!("table '{}' has no data provider", stmt.table)))?;
        let count = changes.len();
        for (id, values) in changes {
            provider.update(id, values)?;
        }
        Ok(Output::with_rows_affected(count))
    }

    /// Execute a DELETE statement
    pub(crate) fn execute_delete(
        &self,
        stmt: &DeleteStatement,
        catalog: &mut Context,
        now: DateTime<Utc>,
    ) -> Result<Output> {
        let table = table_id(stmt.table_id, &stmt.table)?;

        let ids: Vec<RowId> = {
            let catalog: &Context = catalog;
            let meta = table_meta(catalog, table)?;
            let (_, kept) = matching_rows(catalog, meta, stmt.filter.as_ref(), now)?;
            kept.iter().filter_map(|c| c.first().copied().flatten()).collect()
        };

        let provider = catalog
            .provider_mut(table)
            .ok_or_else(|| Error::NotSupported(format!("table '{}' has no data provider", stmt.table)))?;
        for &id in &ids {
            provider.delete(id)?;
        }
        Ok(Output::with_rows_affected(ids.len()))
    }
}

fn table_id(id: Option<TableId>, name: &str) -> Result<TableId> {
    id.ok_or_else(|| Error::internal(format!("table '{}' reached the executor unresolved", name)))
}

fn table_meta(catalog: &Context, table: TableId) -> Result<&TableMeta> {
    catalog
        .table(table)
        .ok_or_else(|| Error::internal(format!("unknown table id {}", table)))
}

fn column_meta(meta: &TableMeta, position: usize) -> Result<&ColumnMeta> {
    meta.columns
        .get(position)
        .ok_or_else(|| Error::internal(format!("column {} out of range for '{}'", position, meta.name)))
}

/// A value must fit its column's type; NULL fits every column
fn checked(column: &ColumnMeta, value: Value) -> Result<Value> {
    if value.fits(column.data_type) {
        Ok(value)
    } else {
        Err(Error::type_mismatch("=", column.data_type, value.data_type()))
    }
}

/// Open a cursor on `meta` and run the filtering pass over its rows
fn matching_rows<'a>(
    catalog: &'a Context,
    meta: &TableMeta,
    filter: Option<&Expression>,
    now: DateTime<Utc>,
) -> Result<(ExecutionContext<'a>, Vec<Combination>)> {
    let provider = catalog
        .provider(meta.id)
        .ok_or_else(|| Error::NotSupported(format!("table '{}' has no data provider", meta.name)))?;
    let mut cursor = TableCursor::new(provider, meta.width());
    let combinations: Vec<Combination> = cursor.row_ids().into_iter().map(|id| vec![Some(id)]).collect();

    let mut ctx = ExecutionContext::new(catalog, None, now);
    ctx.cursors.push(cursor);
    let kept = match filter {
        Some(filter) => {
            let program = ExprCompiler::plain(catalog).compile(filter)?;
            filter_combinations(&mut ctx, combinations, &program)?
        }
        None => combinations,
    };
    Ok((ctx, kept))
}
