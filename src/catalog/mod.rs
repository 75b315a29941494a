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

//! Catalog: tables, columns, functions and table data providers
//!
//! A [`Context`] is built once per engine instance. Table and column ids are
//! assigned in creation order and never reused. Name lookups are
//! case-insensitive and never mutate the catalog.

use std::fmt;

use rustc_hash::FxHashMap;

use crate::core::{DataType, Error, Result};
use crate::functions::{builtin_functions, Function, FunctionId};
use crate::parser::ast::ColumnReference;
use crate::storage::{MemoryTable, TableDataProvider};

/// Identifier of a table within its catalog
pub type TableId = usize;

/// Identifier of a column within its table (its position)
pub type ColumnId = usize;

/// A column definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMeta {
    pub id: ColumnId,
    pub name: String,
    pub data_type: DataType,
    /// Owning table
    pub table: TableId,
}

/// A table definition with its ordered columns
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableMeta {
    pub id: TableId,
    pub name: String,
    pub columns: Vec<ColumnMeta>,
}

impl TableMeta {
    /// Position of a column by name (case-insensitive)
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.name.eq_ignore_ascii_case(name))
    }

    pub fn find_column(&self, name: &str) -> Option<&ColumnMeta> {
        self.column_index(name).map(|i| &self.columns[i])
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }
}

/// The catalog
pub struct Context {
    name: String,
    tables: Vec<TableMeta>,
    /// lower-cased table name -> id
    table_index: FxHashMap<String, TableId>,
    functions: Vec<Function>,
    /// upper-cased function name -> id
    function_index: FxHashMap<String, FunctionId>,
    providers: FxHashMap<TableId, Box<dyn TableDataProvider>>,
}

impl Context {
    /// Create a catalog with the built-in functions registered
    pub fn new(name: impl Into<String>) -> Self {
        let mut context = Self {
            name: name.into(),
            tables: Vec::new(),
            table_index: FxHashMap::default(),
            functions: Vec::new(),
            function_index: FxHashMap::default(),
            providers: FxHashMap::default(),
        };
        for function in builtin_functions() {
            context.add_function(function);
        }
        context
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    // =========================================================================
    // Tables and columns
    // =========================================================================

    /// Register an empty table
    pub fn add_table(&mut self, name: &str) -> Result<TableId> {
        let key = name.to_lowercase();
        if self.table_index.contains_key(&key) {
            return Err(Error::TableAlreadyExists(name.to_string()));
        }
        let id = self.tables.len();
        self.tables.push(TableMeta {
            id,
            name: name.to_string(),
            columns: Vec::new(),
        });
        self.table_index.insert(key, id);
        Ok(id)
    }

    /// Append a column to a table
    pub fn add_column(&mut self, table: TableId, name: &str, data_type: DataType) -> Result<ColumnId> {
        let meta = self
            .tables
            .get_mut(table)
            .ok_or_else(|| Error::internal(format!("unknown table id {}", table)))?;
        if meta.column_index(name).is_some() {
            return Err(Error::DuplicateColumn {
                table: meta.name.clone(),
                column: name.to_string(),
            });
        }
        let id = meta.columns.len();
        meta.columns.push(ColumnMeta {
            id,
            name: name.to_string(),
            data_type,
            table,
        });
        Ok(id)
    }

    pub fn find_table(&self, name: &str) -> Option<&TableMeta> {
        self.table_index
            .get(&name.to_lowercase())
            .map(|&id| &self.tables[id])
    }

    pub fn table(&self, id: TableId) -> Option<&TableMeta> {
        self.tables.get(id)
    }

    pub fn tables(&self) -> &[TableMeta] {
        &self.tables
    }

    /// Look up a qualified column reference by table name
    pub fn find_column(&self, reference: &ColumnReference) -> Option<&ColumnMeta> {
        let table = self.find_table(reference.table.as_deref()?)?;
        table.find_column(&reference.column)
    }

    /// Register a table, its columns and its provider in one step
    ///
    /// Validation happens before anything is registered, so a failed call
    /// leaves the catalog unchanged.
    pub fn create_table(
        &mut self,
        name: &str,
        columns: &[(&str, DataType)],
        provider: Box<dyn TableDataProvider>,
    ) -> Result<TableId> {
        if self.find_table(name).is_some() {
            return Err(Error::TableAlreadyExists(name.to_string()));
        }
        for (i, (column, _)) in columns.iter().enumerate() {
            if columns[..i].iter().any(|(c, _)| c.eq_ignore_ascii_case(column)) {
                return Err(Error::DuplicateColumn {
                    table: name.to_string(),
                    column: column.to_string(),
                });
            }
        }

        let id = self.add_table(name)?;
        for (column, data_type) in columns {
            self.add_column(id, column, *data_type)?;
        }
        if let Err(err) = self.attach_provider(id, provider) {
            self.tables.pop();
            self.table_index.remove(&name.to_lowercase());
            return Err(err);
        }
        Ok(id)
    }

    /// Register a table backed by a fresh [`MemoryTable`]
    pub fn create_memory_table(&mut self, name: &str, columns: &[(&str, DataType)]) -> Result<TableId> {
        self.create_table(name, columns, Box::new(MemoryTable::new()))
    }

    // =========================================================================
    // Providers
    // =========================================================================

    /// Bind a provider to a table; the provider is initialized first
    pub fn attach_provider(&mut self, table: TableId, mut provider: Box<dyn TableDataProvider>) -> Result<()> {
        let meta = self
            .tables
            .get(table)
            .ok_or_else(|| Error::internal(format!("unknown table id {}", table)))?;
        provider.initialize(self, meta)?;
        self.providers.insert(table, provider);
        Ok(())
    }

    pub fn provider(&self, table: TableId) -> Option<&dyn TableDataProvider> {
        self.providers.get(&table).map(|p| p.as_ref())
    }

    pub fn provider_mut(&mut self, table: TableId) -> Option<&mut (dyn TableDataProvider + 'static)> {
        self.providers.get_mut(&table).map(|p| p.as_mut())
    }

    // =========================================================================
    // Functions
    // =========================================================================

    /// Register a function; a later registration under the same name wins
    pub fn add_function(&mut self, function: Function) -> FunctionId {
        let id = self.functions.len();
        self.function_index.insert(function.name.clone(), id);
        self.functions.push(function);
        id
    }

    pub fn find_function(&self, name: &str) -> Option<(FunctionId, &Function)> {
        self.function_index
            .get(&name.to_uppercase())
            .map(|&id| (id, &self.functions[id]))
    }

    pub fn function(&self, id: FunctionId) -> Option<&Function> {
        self.functions.get(id)
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new("wooby")
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("name", &self.name)
            .field("tables", &self.tables)
            .field("functions", &self.functions.len())
            .field("providers", &self.providers.len())
            .finish()
    }
}
