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

//! Execution Result Types
//!
//! Every statement produces an [`Output`]: named, typed columns and rows of
//! values for SELECT, a row count for INSERT/UPDATE/DELETE.

use std::fmt;

use crate::core::{DataType, Value};
use crate::storage::RowId;

/// A named, typed output column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDefinition {
    pub name: String,
    pub data_type: DataType,
}

impl ColumnDefinition {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }
}

/// One result row, tagged with the id of the primary source row it came from
#[derive(Debug, Clone, PartialEq)]
pub struct OutputRow {
    pub id: RowId,
    pub values: Vec<Value>,
}

impl OutputRow {
    pub fn new(id: RowId) -> Self {
        Self {
            id,
            values: Vec::new(),
        }
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }
}

/// Result of executing one statement
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Output {
    pub columns: Vec<ColumnDefinition>,
    pub rows: Vec<OutputRow>,
    /// Rows inserted, updated or deleted
    pub rows_affected: usize,
}

impl Output {
    pub fn with_rows_affected(rows_affected: usize) -> Self {
        Self {
            rows_affected,
            ..Default::default()
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a column by name (case-insensitive)
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.name.eq_ignore_ascii_case(name))
    }

    /// Value at (row, column)
    pub fn value(&self, row: usize, column: usize) -> Option<&Value> {
        self.rows.get(row).and_then(|r| r.get(column))
    }

    /// All values of one column, top to bottom
    pub fn column_values(&self, column: usize) -> Vec<Value> {
        self.rows
            .iter()
            .map(|r| r.get(column).cloned().unwrap_or_default())
            .collect()
    }
}

/// Tab-separated table: a header line, then one line per row
impl fmt::Display for Output {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let header: Vec<&str> = self.columns.iter().map(|c| c.name.as_str()).collect();
        writeln!(f, "{}", header.join("\t"))?;
        for row in &self.rows {
            let values: Vec<String> = row.values.iter().map(Value::to_string).collect();
            writeln!(f, "{}", values.join("\t"))?;
        }
        Ok(())
    }
}
