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

//! Table cursor: a position over one provider, owned by one execution

use crate::core::{Row, Value};

use super::traits::{RowId, TableDataProvider, BEFORE_FIRST};

/// Cursor the VM reads column values through
///
/// A cursor with no current row (before the first `next`, after the end,
/// or after `clear`) reads every column as NULL. Outer joins use that to
/// stand in for the missing side.
pub struct TableCursor<'a> {
    provider: &'a dyn TableDataProvider,
    width: usize,
    id: RowId,
    row: Option<Row>,
    exhausted: bool,
}

impl<'a> TableCursor<'a> {
    pub fn new(provider: &'a dyn TableDataProvider, width: usize) -> Self {
        Self {
            provider,
            width,
            id: BEFORE_FIRST,
            row: None,
            exhausted: false,
        }
    }

    /// Number of columns of the underlying table
    pub fn width(&self) -> usize {
        self.width
    }

    /// Move before the first row
    pub fn reset(&mut self) {
        self.id = BEFORE_FIRST;
        self.row = None;
        self.exhausted = false;
    }

    /// Advance to the next row; returns false at the end and keeps doing so
    /// until `reset`
    pub fn next(&mut self) -> bool {
        if self.exhausted {
            return false;
        }
        self.row = self.provider.seek_next(&mut self.id);
        self.exhausted = self.row.is_none();
        !self.exhausted
    }

    /// Position on `id`, or on the null row for `None`
    pub fn seek(&mut self, id: Option<RowId>) -> bool {
        match id {
            Some(id) => {
                self.row = self.provider.seek(id);
                self.id = if self.row.is_some() { id } else { BEFORE_FIRST };
                self.row.is_some()
            }
            None => {
                self.clear();
                true
            }
        }
    }

    /// Position on the null row
    pub fn clear(&mut self) {
        self.id = BEFORE_FIRST;
        self.row = None;
    }

    /// Id of the current row, `BEFORE_FIRST` when there is none
    pub fn row_id(&self) -> RowId {
        if self.row.is_some() {
            self.id
        } else {
            BEFORE_FIRST
        }
    }

    pub fn row(&self) -> Option<&Row> {
        self.row.as_ref()
    }

    /// Value of a column of the current row
    pub fn value(&self, column: usize) -> Value {
        self.row
            .as_ref()
            .and_then(|row| row.get(column))
            .cloned()
            .unwrap_or_default()
    }

    /// Every row id in scan order; leaves the cursor reset
    pub fn row_ids(&mut self) -> Vec<RowId> {
        self.reset();
        let mut ids = Vec::new();
        while self.next() {
            ids.push(self.row_id());
        }
        self.reset();
        ids
    }
}
