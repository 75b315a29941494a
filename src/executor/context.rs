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

//! Execution Context
//!
//! Per-execution state of one query: the rows being produced, the VM value
//! stack, one cursor per source, and the group state used while
//! aggregating. A context is created for each execution and dropped once the
//! output has been taken from it.

use chrono::{DateTime, Utc};
use smallvec::SmallVec;

use crate::catalog::Context;
use crate::core::{Result, Row, Value};
use crate::functions::FunctionContext;
use crate::storage::{RowId, TableCursor, BEFORE_FIRST};

use super::result::OutputRow;

/// Stack capacity for inline storage (avoids heap allocation for simple expressions)
pub const STACK_INLINE_CAPACITY: usize = 16;

/// Current rows of an enclosing statement, seen by correlated sub-selects
///
/// Frames chain outwards: `parent` is the frame one statement further out.
#[derive(Debug, Default)]
pub struct OuterFrame<'a> {
    /// Current row of each source, `None` for a source on its null row
    pub rows: Vec<Option<Row>>,
    pub parent: Option<&'a OuterFrame<'a>>,
}

impl<'a> OuterFrame<'a> {
    /// Frame `level` statements out from the one holding this frame
    /// (1 = this frame)
    pub fn at_level(&self, level: usize) -> Option<&OuterFrame<'a>> {
        let mut frame: &OuterFrame<'a> = self;
        for _ in 1..level {
            frame = frame.parent?;
        }
        Some(frame)
    }

    pub fn value(&self, source: usize, column: usize) -> Value {
        self.rows
            .get(source)
            .and_then(Option::as_ref)
            .and_then(|row| row.get(column))
            .cloned()
            .unwrap_or_default()
    }
}

/// Execution context for one query
pub struct ExecutionContext<'a> {
    pub catalog: &'a Context,
    /// Output rows; during filtering these are transient markers
    pub output: Vec<OutputRow>,
    pub stack: SmallVec<[Value; STACK_INLINE_CAPACITY]>,
    /// One cursor per source, in declaration order
    pub cursors: Vec<TableCursor<'a>>,
    /// Evaluated aggregate arguments of the current group, per slot
    pub temp_rows: Vec<Vec<Row>>,
    /// Group key of the group being projected
    pub variables: Vec<Value>,
    /// Aggregate results of the group being projected, per slot
    pub aggregate_results: Vec<Value>,
    /// Rows evaluated so far
    pub row_counter: usize,
    pub outer: Option<&'a OuterFrame<'a>>,
    /// Statement timestamp, shared by every NOW() call
    pub now: DateTime<Utc>,
}

impl<'a> ExecutionContext<'a> {
    pub fn new(catalog: &'a Context, outer: Option<&'a OuterFrame<'a>>, now: DateTime<Utc>) -> Self {
        Self {
            catalog,
            output: Vec::new(),
            stack: SmallVec::new(),
            cursors: Vec::new(),
            temp_rows: Vec::new(),
            variables: Vec::new(),
            aggregate_results: Vec::new(),
            row_counter: 0,
            outer,
            now,
        }
    }

    /// Position every cursor on one row combination; `None` entries put
    /// their cursor on the null row
    pub fn position(&mut self, combination: &[Option<RowId>]) -> Result<()> {
        for (cursor, id) in self.cursors.iter_mut().zip(combination) {
            if !cursor.seek(*id) {
                return Err(crate::core::Error::internal(format!(
                    "row {:?} vanished during execution",
                    id
                )));
            }
        }
        Ok(())
    }

    /// Put every cursor on its null row
    pub fn clear_cursors(&mut self) {
        for cursor in &mut self.cursors {
            cursor.clear();
        }
    }

    /// Id of the primary source's current row
    pub fn primary_row_id(&self) -> RowId {
        self.cursors
            .first()
            .map_or(BEFORE_FIRST, TableCursor::row_id)
    }

    /// Start a new output row tagged with the primary row id
    pub fn push_output_row(&mut self) {
        let id = self.primary_row_id();
        self.output.push(OutputRow::new(id));
    }

    /// Snapshot of the current rows for sub-selects evaluated here
    pub fn frame(&self) -> OuterFrame<'a> {
        OuterFrame {
            rows: self.cursors.iter().map(|c| c.row().cloned()).collect(),
            parent: self.outer,
        }
    }

    /// What ROWNUM(), ROWID() and NOW() observe
    pub fn function_context(&self) -> FunctionContext {
        FunctionContext {
            row_number: self.output.len(),
            row_id: self.output.last().map_or(BEFORE_FIRST, |r| r.id),
            now: self.now,
        }
    }
}
