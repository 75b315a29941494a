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

// Compiled Expression Operations
//
// These operations form the instruction set for the expression VM.
// Programs are straight-line: there are no jumps, every operation runs
// exactly once per execution, in order.

use std::sync::Arc;

use crate::core::Operator;
use crate::functions::FunctionId;

/// A single VM instruction
#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    // =========================================================================
    // LOAD OPERATIONS - Push values onto stack
    // =========================================================================
    /// Stack: [] -> [number]
    PushNumber(f64),
    /// Stack: [] -> [text]
    PushString(Arc<str>),
    /// Stack: [] -> [boolean]
    PushBoolean(bool),
    /// Stack: [] -> [null]
    PushNull,

    /// Column of the current row of a source cursor
    /// Stack: [] -> [value]
    PushColumn { source: usize, column: usize },

    /// Column of an enclosing statement's current row (correlated sub-select)
    /// Stack: [] -> [value]
    PushOuterColumn {
        level: usize,
        source: usize,
        column: usize,
    },

    /// Group key value of the group being projected
    /// Stack: [] -> [value]
    PushVariable(usize),

    // =========================================================================
    // BINARY OPERATIONS - Pop right, pop left, push result
    // =========================================================================
    Sum,
    Sub,
    Mul,
    Div,
    Pow,
    Rem,
    Concat,
    Eq,
    NEq,
    Less,
    More,
    LessEq,
    MoreEq,
    And,
    Or,

    // =========================================================================
    // CALLS
    // =========================================================================
    /// Scalar function call
    /// Stack: [arg0 .. argN-1] -> [result]
    CallFunction {
        function: FunctionId,
        variant: usize,
        arg_count: usize,
    },

    /// Result of an aggregate slot for the current group
    /// Stack: [] -> [value]
    CallAggregate { slot: usize },

    /// Run a nested query plan and push its single value
    /// Stack: [] -> [value]
    SubSelect(usize),

    // =========================================================================
    // OUTPUT
    // =========================================================================
    /// Append a column of the current row to the output row
    /// Stack: [] -> []
    PushColumnToOutput { source: usize, column: usize },

    /// Pop the stack top into the output row
    /// Stack: [value] -> []
    PushStackTopToOutput,
}

impl Op {
    /// The instruction for a binary operator
    pub fn binary(op: Operator) -> Op {
        match op {
            Operator::Plus => Op::Sum,
            Operator::Minus => Op::Sub,
            Operator::Multiply => Op::Mul,
            Operator::Divide => Op::Div,
            Operator::Power => Op::Pow,
            Operator::Remainder => Op::Rem,
            Operator::Concat => Op::Concat,
            Operator::Equal => Op::Eq,
            Operator::NotEqual => Op::NEq,
            Operator::Less => Op::Less,
            Operator::More => Op::More,
            Operator::LessEqual => Op::LessEq,
            Operator::MoreEqual => Op::MoreEq,
            Operator::And => Op::And,
            Operator::Or => Op::Or,
        }
    }

    /// The operator of a binary instruction
    pub fn operator(&self) -> Option<Operator> {
        Some(match self {
            Op::Sum => Operator::Plus,
            Op::Sub => Operator::Minus,
            Op::Mul => Operator::Multiply,
            Op::Div => Operator::Divide,
            Op::Pow => Operator::Power,
            Op::Rem => Operator::Remainder,
            Op::Concat => Operator::Concat,
            Op::Eq => Operator::Equal,
            Op::NEq => Operator::NotEqual,
            Op::Less => Operator::Less,
            Op::More => Operator::More,
            Op::LessEq => Operator::LessEqual,
            Op::MoreEq => Operator::MoreEqual,
            Op::And => Operator::And,
            Op::Or => Operator::Or,
            _ => return None,
        })
    }

    /// Net change in stack depth
    pub fn stack_effect(&self) -> isize {
        match self {
            Op::PushNumber(_)
            | Op::PushString(_)
            | Op::PushBoolean(_)
            | Op::PushNull
            | Op::PushColumn { .. }
            | Op::PushOuterColumn { .. }
            | Op::PushVariable(_)
            | Op::CallAggregate { .. }
            | Op::SubSelect(_) => 1,
            Op::CallFunction { arg_count, .. } => 1 - *arg_count as isize,
            Op::PushColumnToOutput { .. } => 0,
            Op::PushStackTopToOutput => -1,
            _ => -1,
        }
    }
}
