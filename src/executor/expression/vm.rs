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

// Expression Virtual Machine
//
// The VM executes compiled Programs against the cursors of an
// ExecutionContext. Binary operators pop right then left and defer to the
// Value operator contract. Stack underflow, a value left behind, or an
// operand naming something that does not exist is a compiler/VM contract
// violation and surfaces as Error::Internal.

use crate::core::{Error, Result, Value};
use crate::executor::context::ExecutionContext;
use crate::executor::query::execute_plan;
use crate::functions::Implementation;

use super::ops::Op;
use super::program::Program;

/// Run an output program: it appends to the current output row and must
/// leave the stack empty
pub fn execute(program: &Program, ctx: &mut ExecutionContext<'_>) -> Result<()> {
    run(program, ctx)?;
    if !ctx.stack.is_empty() {
        return Err(Error::internal(format!(
            "{} values left on the stack",
            ctx.stack.len()
        )));
    }
    Ok(())
}

/// Run a value program and return the single value it leaves
pub fn evaluate(program: &Program, ctx: &mut ExecutionContext<'_>) -> Result<Value> {
    run(program, ctx)?;
    let value = pop(ctx)?;
    if !ctx.stack.is_empty() {
        return Err(Error::internal(format!(
            "{} values left on the stack",
            ctx.stack.len()
        )));
    }
    Ok(value)
}

fn pop(ctx: &mut ExecutionContext<'_>) -> Result<Value> {
    ctx.stack
        .pop()
        .ok_or_else(|| Error::internal("stack underflow"))
}

fn output_row<'c>(ctx: &'c mut ExecutionContext<'_>) -> Result<&'c mut Vec<Value>> {
    ctx.output
        .last_mut()
        .map(|row| &mut row.values)
        .ok_or_else(|| Error::internal("no output row to write to"))
}

fn run(program: &Program, ctx: &mut ExecutionContext<'_>) -> Result<()> {
    ctx.stack.clear();
    if ctx.stack.capacity() < program.max_stack_depth() {
        ctx.stack.reserve(program.max_stack_depth());
    }

    for op in program.ops() {
        match op {
            // =================================================================
            // LOAD OPERATIONS
            // =================================================================
            Op::PushNumber(n) => ctx.stack.push(Value::Number(*n)),
            Op::PushString(s) => ctx.stack.push(Value::Text(s.clone())),
            Op::PushBoolean(b) => ctx.stack.push(Value::Boolean(*b)),
            Op::PushNull => ctx.stack.push(Value::Null),

            Op::PushColumn { source, column } => {
                let cursor = ctx
                    .cursors
                    .get(*source)
                    .ok_or_else(|| Error::internal(format!("no cursor for source {}", source)))?;
                let value = cursor.value(*column);
                ctx.stack.push(value);
            }

            Op::PushOuterColumn {
                level,
                source,
                column,
            } => {
                let frame = ctx
                    .outer
                    .and_then(|outer| outer.at_level(*level))
                    .ok_or_else(|| Error::internal(format!("no enclosing row at level {}", level)))?;
                let value = frame.value(*source, *column);
                ctx.stack.push(value);
            }

            Op::PushVariable(index) => {
                let value = ctx
                    .variables
                    .get(*index)
                    .cloned()
                    .ok_or_else(|| Error::internal(format!("no group variable {}", index)))?;
                ctx.stack.push(value);
            }

            // =================================================================
            // CALLS
            // =================================================================
            Op::CallFunction {
                function,
                variant,
                arg_count,
            } => {
                let implementation = ctx
                    .catalog
                    .function(*function)
                    .and_then(|f| f.variants.get(*variant))
                    .map(|v| &v.implementation)
                    .ok_or_else(|| Error::internal(format!("no function {}:{}", function, variant)))?;
                let Implementation::Scalar(scalar) = implementation else {
                    return Err(Error::internal("aggregate called as a scalar function"));
                };
                if ctx.stack.len() < *arg_count {
                    return Err(Error::internal("stack underflow"));
                }
                let start = ctx.stack.len() - arg_count;
                let args: Vec<Value> = ctx.stack.drain(start..).collect();
                let result = scalar.evaluate(&ctx.function_context(), &args)?;
                ctx.stack.push(result);
            }

            Op::CallAggregate { slot } => {
                let value = ctx
                    .aggregate_results
                    .get(*slot)
                    .cloned()
                    .ok_or_else(|| Error::internal(format!("no aggregate result {}", slot)))?;
                ctx.stack.push(value);
            }

            Op::SubSelect(index) => {
                let plan = program
                    .subquery(*index)
                    .ok_or_else(|| Error::internal(format!("no sub-select {}", index)))?;
                let frame = ctx.frame();
                let rows = execute_plan(plan, ctx.catalog, Some(&frame), ctx.now)?.rows;
                let value = match rows.len() {
                    0 => Value::Null,
                    1 => rows
                        .into_iter()
                        .next()
                        .and_then(|row| row.values.into_iter().next())
                        .unwrap_or_default(),
                    n => return Err(Error::SubSelectCardinality(n)),
                };
                ctx.stack.push(value);
            }

            // =================================================================
            // OUTPUT
            // =================================================================
            Op::PushColumnToOutput { source, column } => {
                let value = ctx
                    .cursors
                    .get(*source)
                    .map(|cursor| cursor.value(*column))
                    .ok_or_else(|| Error::internal(format!("no cursor for source {}", source)))?;
                output_row(ctx)?.push(value);
            }

            Op::PushStackTopToOutput => {
                let value = pop(ctx)?;
                output_row(ctx)?.push(value);
            }

            // =================================================================
            // BINARY OPERATIONS
            // =================================================================
            binary => {
                let operator = binary
                    .operator()
                    .ok_or_else(|| Error::internal(format!("unknown instruction {:?}", binary)))?;
                let right = pop(ctx)?;
                let left = pop(ctx)?;
                ctx.stack.push(left.apply(operator, &right)?);
            }
        }
    }
    Ok(())
}
