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

// Expression Compiler
//
// Transforms resolved Expressions into compiled Programs.
//
// Expressions are flat node lists. The compiler walks them in the postfix
// order produced by `parser::precedence::postfix`, which is the same order
// the resolver typed them in, and emits one instruction per step.
//
// Aggregate calls do not evaluate in place. Each one becomes an aggregate
// slot holding one program per argument; the executor runs those programs
// over the rows of a group and the call itself compiles to a read of the
// slot's result.

use std::sync::Arc;

use super::ops::Op;
use super::program::Program;
use crate::catalog::Context;
use crate::core::{Error, Result};
use crate::executor::plan::{AggregateSlot, QueryPlan};
use crate::parser::ast::{Expression, FunctionCall, Node};
use crate::parser::precedence::{postfix, Postfix};

/// Expression compiler for one statement
pub struct ExprCompiler<'a> {
    catalog: &'a Context,
    /// GROUP BY expressions; a compiled expression equal to one of them
    /// reads the group key instead
    group_by: &'a [Expression],
    /// None when aggregates are not allowed
    aggregates: Option<Vec<AggregateSlot>>,
}

impl<'a> ExprCompiler<'a> {
    /// Compiler for filters, join conditions, group keys and DML values
    pub fn plain(catalog: &'a Context) -> Self {
        Self {
            catalog,
            group_by: &[],
            aggregates: None,
        }
    }

    /// Compiler for the outputs and sort keys of an aggregating query
    pub fn grouped(catalog: &'a Context, group_by: &'a [Expression]) -> Self {
        Self {
            catalog,
            group_by,
            aggregates: Some(Vec::new()),
        }
    }

    /// Aggregate slots registered so far
    pub fn into_aggregates(self) -> Vec<AggregateSlot> {
        self.aggregates.unwrap_or_default()
    }

    /// Compile an expression that leaves its value on the stack
    pub fn compile(&mut self, expr: &Expression) -> Result<Program> {
        let mut ops = Vec::with_capacity(expr.nodes.len());
        let mut subqueries = Vec::new();
        self.emit_expression(expr, &mut ops, &mut subqueries)?;
        Ok(Program::new(ops, subqueries))
    }

    /// Compile an output expression that appends its value to the output row
    pub fn compile_output(&mut self, expr: &Expression) -> Result<Program> {
        if self.group_index(expr).is_none() {
            if let Some(reference) = expr.single_reference() {
                if reference.parent_level == 0 {
                    let binding = reference.binding.ok_or_else(|| {
                        Error::internal(format!("reference '{}' reached the compiler unresolved", reference))
                    })?;
                    return Ok(Program::new(
                        vec![Op::PushColumnToOutput {
                            source: binding.source,
                            column: binding.column,
                        }],
                        Vec::new(),
                    ));
                }
            }
        }

        let mut ops = Vec::with_capacity(expr.nodes.len() + 1);
        let mut subqueries = Vec::new();
        self.emit_expression(expr, &mut ops, &mut subqueries)?;
        ops.push(Op::PushStackTopToOutput);
        Ok(Program::new(ops, subqueries))
    }

    fn group_index(&self, expr: &Expression) -> Option<usize> {
        self.group_by.iter().position(|g| g == expr)
    }

    /// Index of the GROUP BY expression made of exactly `node`
    fn group_key(&self, node: &Node) -> Option<usize> {
        self.group_by
            .iter()
            .position(|g| matches!(g.nodes.as_slice(), [key] if key == node))
    }

    fn emit_expression(
        &mut self,
        expr: &Expression,
        ops: &mut Vec<Op>,
        subqueries: &mut Vec<Arc<QueryPlan>>,
    ) -> Result<()> {
        if let Some(i) = self.group_index(expr) {
            ops.push(Op::PushVariable(i));
            return Ok(());
        }
        self.emit_nodes(&expr.nodes, ops, subqueries)
    }

    fn emit_nodes(
        &mut self,
        nodes: &[Node],
        ops: &mut Vec<Op>,
        subqueries: &mut Vec<Arc<QueryPlan>>,
    ) -> Result<()> {
        for step in postfix(nodes)? {
            match step {
                Postfix::Operator(op) => ops.push(Op::binary(op)),
                Postfix::Operand(i) => match self.group_key(&nodes[i]) {
                    Some(key) => ops.push(Op::PushVariable(key)),
                    None => self.emit_operand(&nodes[i], ops, subqueries)?,
                },
            }
        }
        Ok(())
    }

    fn emit_operand(
        &mut self,
        node: &Node,
        ops: &mut Vec<Op>,
        subqueries: &mut Vec<Arc<QueryPlan>>,
    ) -> Result<()> {
        match node {
            Node::Number(n) => ops.push(Op::PushNumber(*n)),
            Node::String(s) => ops.push(Op::PushString(Arc::from(s.as_str()))),
            Node::Boolean(b) => ops.push(Op::PushBoolean(*b)),
            Node::Null => ops.push(Op::PushNull),
            Node::Reference(reference) => {
                let binding = reference.binding.ok_or_else(|| {
                    Error::internal(format!("reference '{}' reached the compiler unresolved", reference))
                })?;
                ops.push(if reference.parent_level == 0 {
                    Op::PushColumn {
                        source: binding.source,
                        column: binding.column,
                    }
                } else {
                    Op::PushOuterColumn {
                        level: reference.parent_level,
                        source: binding.source,
                        column: binding.column,
                    }
                });
            }
            Node::FunctionCall(call) if call.is_aggregate => {
                let slot = self.register_aggregate(call)?;
                ops.push(Op::CallAggregate { slot });
            }
            Node::FunctionCall(call) => {
                let target = call.target.ok_or_else(|| {
                    Error::internal(format!("call of {} reached the compiler unresolved", call.name))
                })?;
                for argument in &call.arguments {
                    self.emit_expression(argument, ops, subqueries)?;
                }
                ops.push(Op::CallFunction {
                    function: target.function,
                    variant: target.variant,
                    arg_count: call.arguments.len(),
                });
            }
            Node::SubSelect(select) => {
                let plan = QueryPlan::compile(select, self.catalog)?;
                subqueries.push(Arc::new(plan));
                ops.push(Op::SubSelect(subqueries.len() - 1));
            }
            Node::Operator(_) | Node::LeftParen | Node::RightParen => {
                return Err(Error::internal("operator node in operand position"));
            }
        }
        Ok(())
    }

    fn register_aggregate(&mut self, call: &FunctionCall) -> Result<usize> {
        let target = call.target.ok_or_else(|| {
            Error::internal(format!("call of {} reached the compiler unresolved", call.name))
        })?;

        let mut arguments = Vec::with_capacity(call.arguments.len());
        let mut plain = ExprCompiler::plain(self.catalog);
        for argument in &call.arguments {
            arguments.push(plain.compile(argument)?);
        }

        let aggregates = self.aggregates.as_mut().ok_or_else(|| {
            Error::internal(format!("aggregate {} compiled outside an aggregating query", call.name))
        })?;
        aggregates.push(AggregateSlot {
            function: target.function,
            variant: target.variant,
            arguments,
        });
        Ok(aggregates.len() - 1)
    }
}
