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

//! Table data provider trait

use rustc_hash::FxHashMap;

use crate::catalog::{Context, TableMeta};
use crate::core::{Error, Result, Row, Value};

/// Identifier of a row inside one provider
pub type RowId = i64;

/// Sentinel id positioned before the first row
///
/// Passing it to [`TableDataProvider::seek_next`] fetches the first row;
/// [`TableDataProvider::delete`] returns it when no row precedes the
/// deleted one.
pub const BEFORE_FIRST: RowId = -1;

/// The only interface the executor needs from storage
///
/// Rows are returned with one value per table column, in declared column
/// order. Value maps passed to `insert`/`update` are keyed by column
/// position. Providers that are read-only keep the default mutation
/// methods, which fail with [`Error::NotSupported`].
///
/// # Example
///
/// ```ignore
/// let mut id = BEFORE_FIRST;
/// while let Some(row) = provider.seek_next(&mut id) {
///     // `id` now names `row`
/// }
/// ```
pub trait TableDataProvider: Send {
    /// Bind the provider to its table shape; called once on attach
    fn initialize(&mut self, catalog: &Context, table: &TableMeta) -> Result<()>;

    /// Exact-match fetch
    fn seek(&self, id: RowId) -> Option<Row>;

    /// Advance `id` to the next row in a stable, provider-defined order and
    /// fetch it. Returns `None` (leaving `id` unspecified) at the end.
    fn seek_next(&self, id: &mut RowId) -> Option<Row>;

    /// Insert a row, columns missing from `values` are NULL
    fn insert(&mut self, _values: FxHashMap<usize, Value>) -> Result<RowId> {
        Err(Error::NotSupported("insert into read-only table".to_string()))
    }

    /// Overwrite the given columns of a row
    fn update(&mut self, _id: RowId, _values: FxHashMap<usize, Value>) -> Result<()> {
        Err(Error::NotSupported("update of read-only table".to_string()))
    }

    /// Delete a row and return the id of the row preceding it
    fn delete(&mut self, _id: RowId) -> Result<RowId> {
        Err(Error::NotSupported("delete from read-only table".to_string()))
    }
}
