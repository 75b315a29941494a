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

//! In-memory table provider
//!
//! Rows live in a `BTreeMap` keyed by row id, so `seek_next` walks them in
//! insertion order. Ids are never reused.

use std::collections::BTreeMap;
use std::ops::Bound;

use rustc_hash::FxHashMap;

use crate::catalog::{Context, TableMeta};
use crate::core::{Error, Result, Row, Value};

use super::traits::{RowId, TableDataProvider, BEFORE_FIRST};

/// Ordered in-memory row store
#[derive(Debug, Clone, Default)]
pub struct MemoryTable {
    rows: BTreeMap<RowId, Row>,
    width: usize,
    next_id: RowId,
}

impl MemoryTable {
    /// Create an empty table; the width is set by `initialize`
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a table holding `rows`, each `width` values wide
    pub fn from_rows(width: usize, rows: impl IntoIterator<Item = Row>) -> Self {
        let mut table = Self {
            rows: BTreeMap::new(),
            width,
            next_id: 0,
        };
        for row in rows {
            table.rows.insert(table.next_id, row);
            table.next_id += 1;
        }
        table
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn apply(&self, row: &mut Row, values: FxHashMap<usize, Value>) -> Result<()> {
        for (column, value) in values {
            if column >= self.width {
                return Err(Error::InvalidArgument(format!(
                    "column index {} out of range for table of {} columns",
                    column, self.width
                )));
            }
            row.set(column, value)?;
        }
        Ok(())
    }
}

impl TableDataProvider for MemoryTable {
    fn initialize(&mut self, _catalog: &Context, table: &TableMeta) -> Result<()> {
        self.width = table.columns.len();
        Ok(())
    }

    fn seek(&self, id: RowId) -> Option<Row> {
        self.rows.get(&id).cloned()
    }

    fn seek_next(&self, id: &mut RowId) -> Option<Row> {
        let (next, row) = self
            .rows
            .range((Bound::Excluded(*id), Bound::Unbounded))
            .next()?;
        *id = *next;
        Some(row.clone())
    }

    fn insert(&mut self, values: FxHashMap<usize, Value>) -> Result<RowId> {
        let mut row = Row::null_row(self.width);
        self.apply(&mut row, values)?;
        let id = self.next_id;
        self.rows.insert(id, row);
        self.next_id += 1;
        Ok(id)
    }

    fn update(&mut self, id: RowId, values: FxHashMap<usize, Value>) -> Result<()> {
        let mut row = self
            .rows
            .get(&id)
            .cloned()
            .ok_or_else(|| Error::InvalidArgument(format!("no row with id {}", id)))?;
        self.apply(&mut row, values)?;
        self.rows.insert(id, row);
        Ok(())
    }

    fn delete(&mut self, id: RowId) -> Result<RowId> {
        if self.rows.remove(&id).is_none() {
            return Err(Error::InvalidArgument(format!("no row with id {}", id)));
        }
        Ok(self
            .rows
            .range(..id)
            .next_back()
            .map(|(prev, _)| *prev)
            .unwrap_or(BEFORE_FIRST))
    }
}
