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

//! Database configuration

use crate::executor::ExecutionOptions;
use crate::parser::ParserOptions;

/// Configuration options for a [`Database`](super::Database)
#[derive(Debug, Clone)]
pub struct Config {
    /// Catalog name
    /// Default: "wooby"
    pub name: String,

    /// Whether `(SELECT ...)` may appear where a value is expected
    /// Default: true
    pub allow_subselect_values: bool,

    /// Deepest parenthesis/sub-select nesting the parser accepts
    /// Default: 32
    pub max_nesting_depth: usize,

    /// Log compiled programs at trace level
    /// Default: false
    pub trace_programs: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            name: "wooby".to_string(),
            allow_subselect_values: true,
            max_nesting_depth: 32,
            trace_programs: false,
        }
    }
}

impl Config {
    /// Creates a new Config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set the catalog name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Builder method to allow/forbid sub-selects in value position
    pub fn with_subselect_values(mut self, allowed: bool) -> Self {
        self.allow_subselect_values = allowed;
        self
    }

    /// Builder method to set the nesting limit
    pub fn with_max_nesting_depth(mut self, depth: usize) -> Self {
        self.max_nesting_depth = depth;
        self
    }

    /// Builder method to enable/disable program tracing
    pub fn with_trace_programs(mut self, enabled: bool) -> Self {
        self.trace_programs = enabled;
        self
    }

    /// The parser settings this config implies
    pub fn parser_options(&self) -> ParserOptions {
        ParserOptions {
            allow_subselect_values: self.allow_subselect_values,
            max_nesting_depth: self.max_nesting_depth,
        }
    }

    /// The executor settings this config implies
    pub fn execution_options(&self) -> ExecutionOptions {
        ExecutionOptions {
            trace_programs: self.trace_programs,
        }
    }
}
