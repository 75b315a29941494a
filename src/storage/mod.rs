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

//! Storage module for Wooby
//!
//! The executor never touches rows except through these pieces:
//! - [`TableDataProvider`] - seek / seek-next / insert / update / delete
//! - [`TableCursor`] - a per-execution position over a provider
//! - [`MemoryTable`] - the in-memory provider used by CREATE TABLE and for
//!   materialized sub-selects

pub mod cursor;
pub mod memory;
pub mod traits;

pub use cursor::TableCursor;
pub use memory::MemoryTable;
pub use traits::{RowId, TableDataProvider, BEFORE_FIRST};
