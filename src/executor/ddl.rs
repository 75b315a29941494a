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

//! DDL Statement Execution
//!
//! CREATE TABLE is the only DDL statement. The new table is backed by a
//! [`MemoryTable`](crate::storage::MemoryTable).

use tracing::debug;

use crate::catalog::Context;
use crate::core::{DataType, Result};
use crate::parser::ast::CreateStatement;

use super::result::Output;
use super::Executor;

impl Executor {
    /// Execute a CREATE TABLE statement
    pub(crate) fn execute_create_table(&self, stmt: &CreateStatement, catalog: &mut Context) -> Result<Output> {
        let columns: Vec<(&str, DataType)> = stmt
            .columns
            .iter()
            .map(|c| (c.name.as_str(), c.data_type))
            .collect();
        let id = catalog.create_memory_table(&stmt.table, &columns)?;
        debug!(table = %stmt.table, id, columns = columns.len(), "created table");
        Ok(Output::default())
    }
}
