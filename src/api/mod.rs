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

//! Top-level Database API
//!
//! # Quick Start
//!
//! ```
//! use wooby::Database;
//!
//! let mut db = Database::new();
//! db.execute("CREATE TABLE users (id INT, name TEXT, age INT)").unwrap();
//! db.execute("INSERT INTO users VALUES (1, 'Alice', 30), (2, 'Bob', 25)").unwrap();
//!
//! let output = db
//!     .query("SELECT name, age FROM users WHERE age > 26 ORDER BY name")
//!     .unwrap();
//! assert_eq!(output.len(), 1);
//! ```
//!
//! # Custom storage
//!
//! Any [`TableDataProvider`](crate::storage::TableDataProvider) can back a
//! table; register it with [`Database::register_table`].

mod config;
mod database;

pub use config::Config;
pub use database::Database;
