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

// Compiled Expression Program
//
// A Program is the compiled form of one expression:
// - A sequence of operations (the "bytecode")
// - The query plans of sub-selects it references by index
// - The maximum stack depth, for pre-allocation

use std::fmt;
use std::sync::Arc;

use super::ops::Op;
use crate::executor::plan::QueryPlan;

/// Compiled expression program
#[derive(Clone, Default)]
pub struct Program {
    ops: Vec<Op>,
    subqueries: Vec<Arc<QueryPlan>>,
    max_stack_depth: usize,
}

impl Program {
    pub fn new(ops: Vec<Op>, subqueries: Vec<Arc<QueryPlan>>) -> Self {
        let max_stack_depth = Self::compute_stack_depth(&ops);
        Self {
            ops,
            subqueries,
            max_stack_depth,
        }
    }

    #[inline]
    pub fn ops(&self) -> &[Op] {
        &self.ops
    }

    pub fn subquery(&self, index: usize) -> Option<&QueryPlan> {
        self.subqueries.get(index).map(Arc::as_ref)
    }

    #[inline]
    pub fn max_stack_depth(&self) -> usize {
        self.max_stack_depth
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Compute maximum stack depth needed
    fn compute_stack_depth(ops: &[Op]) -> usize {
        let mut depth: isize = 0;
        let mut max_depth: isize = 0;
        for op in ops {
            depth += op.stack_effect();
            max_depth = max_depth.max(depth);
        }
        max_depth.max(0) as usize
    }

    /// Disassemble program for debugging
    pub fn disassemble(&self) -> String {
        let mut result = String::new();
        for (i, op) in self.ops.iter().enumerate() {
            result.push_str(&format!("{:04}: {:?}\n", i, op));
        }
        result
    }
}

/// Programs compare by their instruction streams
impl PartialEq for Program {
    fn eq(&self, other: &Self) -> bool {
        self.ops == other.ops
    }
}

impl fmt::Debug for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Program")
            .field("ops", &self.ops)
            .field("subqueries", &self.subqueries.len())
            .field("max_stack_depth", &self.max_stack_depth)
            .finish()
    }
}
