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

// Tests for the expression compiler and VM

use chrono::Utc;

use super::compiler::ExprCompiler;
use super::ops::Op;
use super::program::Program;
use super::vm::{evaluate, execute};
use crate::catalog::Context;
use crate::core::{DataType, Error, Row, Value};
use crate::executor::context::{ExecutionContext, OuterFrame};
use crate::parser::{parse_and_resolve, ParserOptions, SelectStatement, Statement};
use crate::storage::{MemoryTable, TableCursor};

fn select(sql: &str, catalog: &Context) -> SelectStatement {
    match parse_and_resolve(sql, &ParserOptions::default(), catalog).unwrap() {
        Statement::Select(select) => *select,
        other => panic!("expected SELECT, got {:?}", other.kind()),
    }
}

/// Evaluate the first output expression of a FROM-less SELECT
fn eval(sql: &str) -> crate::core::Result<Value> {
    let catalog = Context::new("test");
    let Statement::Select(select) = parse_and_resolve(sql, &ParserOptions::default(), &catalog)?
    else {
        panic!("expected SELECT");
    };
    let program = ExprCompiler::plain(&catalog).compile(&select.output[0])?;
    let mut ctx = ExecutionContext::new(&catalog, None, Utc::now());
    evaluate(&program, &mut ctx)
}

#[test]
fn test_literal_arithmetic() {
    let program = Program::new(
        vec![
            Op::PushNumber(1.0),
            Op::PushNumber(2.0),
            Op::Sum,
            Op::PushNumber(3.0),
            Op::Mul,
        ],
        Vec::new(),
    );
    let catalog = Context::new("test");
    let mut ctx = ExecutionContext::new(&catalog, None, Utc::now());
    assert_eq!(evaluate(&program, &mut ctx).unwrap(), Value::Number(9.0));
}

#[test]
fn test_precedence() {
    assert_eq!(eval("SELECT 1 + 2 * 3").unwrap(), Value::Number(7.0));
    assert_eq!(eval("SELECT (1 + 2) * 3").unwrap(), Value::Number(9.0));
    assert_eq!(eval("SELECT 10 - 4 - 3").unwrap(), Value::Number(3.0));
    assert_eq!(eval("SELECT 12 / 3 * 2").unwrap(), Value::Number(8.0));
    assert_eq!(eval("SELECT 1 + 1 = 2").unwrap(), Value::Boolean(true));
    assert_eq!(
        eval("SELECT 1 = 1 AND 2 = 3 OR 4 = 4").unwrap(),
        Value::Boolean(true)
    );
}

#[test]
fn test_text_operators() {
    assert_eq!(eval("SELECT 'ab' + 'cd'").unwrap(), Value::from("abcd"));
    assert_eq!(eval("SELECT 'ab' || 'cd'").unwrap(), Value::from("abcd"));
    assert_eq!(eval("SELECT 'a' = 'a'").unwrap(), Value::Boolean(true));
    // Rejected while typing the expression, before anything runs
    assert!(matches!(
        eval("SELECT 'a' < 'b'"),
        Err(Error::TypeMismatch { .. })
    ));

    let text = Program::new(
        vec![
            Op::PushString("a".into()),
            Op::PushNumber(1.0),
            Op::Sub,
        ],
        Vec::new(),
    );
    let catalog = Context::new("test");
    let mut ctx = ExecutionContext::new(&catalog, None, Utc::now());
    assert!(matches!(
        evaluate(&text, &mut ctx),
        Err(Error::TypeMismatch { .. })
    ));
}

#[test]
fn test_null_comparisons() {
    assert_eq!(eval("SELECT NULL = 1").unwrap(), Value::Boolean(false));
    assert_eq!(eval("SELECT NULL <> 1").unwrap(), Value::Boolean(true));
    assert_eq!(eval("SELECT NULL < 1").unwrap(), Value::Boolean(true));
    assert_eq!(eval("SELECT NULL = NULL").unwrap(), Value::Boolean(true));
}

#[test]
fn test_division_by_zero() {
    assert!(matches!(eval("SELECT 1 / 0"), Err(Error::DivisionByZero)));
}

#[test]
fn test_scalar_function_call() {
    assert_eq!(eval("SELECT UPPER('abc')").unwrap(), Value::from("ABC"));
    assert_eq!(eval("SELECT LENGTH('abc') + 1").unwrap(), Value::Number(4.0));
    assert_eq!(eval("SELECT ABS(-3)").unwrap(), Value::Number(3.0));
}

#[test]
fn test_compilation_is_deterministic() {
    let mut catalog = Context::new("test");
    catalog
        .create_memory_table("t", &[("a", DataType::Number), ("b", DataType::Text)])
        .unwrap();
    let select = select("SELECT a * 2 + LENGTH(b) FROM t WHERE a > 1", &catalog);

    let first = ExprCompiler::plain(&catalog).compile(&select.output[0]).unwrap();
    let second = ExprCompiler::plain(&catalog).compile(&select.output[0]).unwrap();
    assert_eq!(first.ops(), second.ops());
    assert_eq!(first.disassemble(), second.disassemble());

    let filter = select.filter.as_ref().unwrap();
    let first = ExprCompiler::plain(&catalog).compile(filter).unwrap();
    let second = ExprCompiler::plain(&catalog).compile(filter).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_single_reference_output_bypasses_stack() {
    let mut catalog = Context::new("test");
    catalog
        .create_memory_table("t", &[("a", DataType::Number)])
        .unwrap();
    let select = select("SELECT a, a + 1 FROM t", &catalog);
    let mut compiler = ExprCompiler::plain(&catalog);

    let direct = compiler.compile_output(&select.output[0]).unwrap();
    assert_eq!(direct.ops(), &[Op::PushColumnToOutput { source: 0, column: 0 }]);

    let computed = compiler.compile_output(&select.output[1]).unwrap();
    assert_eq!(
        computed.ops(),
        &[
            Op::PushColumn { source: 0, column: 0 },
            Op::PushNumber(1.0),
            Op::Sum,
            Op::PushStackTopToOutput,
        ]
    );
}

#[test]
fn test_aggregate_outside_grouping_is_internal() {
    let mut catalog = Context::new("test");
    catalog
        .create_memory_table("t", &[("a", DataType::Number)])
        .unwrap();
    let select = select("SELECT SUM(a) FROM t", &catalog);
    let err = ExprCompiler::plain(&catalog)
        .compile(&select.output[0])
        .unwrap_err();
    assert!(err.is_internal());

    let mut grouped = ExprCompiler::grouped(&catalog, &[]);
    let program = grouped.compile(&select.output[0]).unwrap();
    assert_eq!(program.ops(), &[Op::CallAggregate { slot: 0 }]);
    assert_eq!(grouped.into_aggregates().len(), 1);
}

#[test]
fn test_cursor_columns_and_output() {
    let catalog = Context::new("test");
    let table = MemoryTable::from_rows(
        2,
        vec![Row::from_values(vec![Value::from(5.0), Value::from("x")])],
    );
    let mut cursor = TableCursor::new(&table, 2);
    assert!(cursor.next());

    let mut ctx = ExecutionContext::new(&catalog, None, Utc::now());
    ctx.cursors.push(cursor);
    ctx.push_output_row();

    let filter = Program::new(
        vec![
            Op::PushColumn { source: 0, column: 0 },
            Op::PushNumber(3.0),
            Op::More,
        ],
        Vec::new(),
    );
    assert_eq!(evaluate(&filter, &mut ctx).unwrap(), Value::Boolean(true));

    let output = Program::new(
        vec![Op::PushColumnToOutput { source: 0, column: 1 }],
        Vec::new(),
    );
    execute(&output, &mut ctx).unwrap();
    assert_eq!(ctx.output[0].id, 0);
    assert_eq!(ctx.output[0].values, vec![Value::from("x")]);

    // A cleared cursor reads as NULL
    ctx.clear_cursors();
    let program = Program::new(vec![Op::PushColumn { source: 0, column: 0 }], Vec::new());
    assert_eq!(evaluate(&program, &mut ctx).unwrap(), Value::Null);
}

#[test]
fn test_group_state_reads() {
    let catalog = Context::new("test");
    let mut ctx = ExecutionContext::new(&catalog, None, Utc::now());
    ctx.variables = vec![Value::from("key")];
    ctx.aggregate_results = vec![Value::from(3.0)];

    let program = Program::new(vec![Op::PushVariable(0)], Vec::new());
    assert_eq!(evaluate(&program, &mut ctx).unwrap(), Value::from("key"));

    let program = Program::new(
        vec![Op::CallAggregate { slot: 0 }, Op::PushNumber(1.0), Op::Sum],
        Vec::new(),
    );
    assert_eq!(evaluate(&program, &mut ctx).unwrap(), Value::Number(4.0));
}

#[test]
fn test_outer_column() {
    let catalog = Context::new("test");
    let outer = OuterFrame {
        rows: vec![Some(Row::from_values(vec![Value::from(42.0)]))],
        parent: None,
    };
    let mut ctx = ExecutionContext::new(&catalog, Some(&outer), Utc::now());
    let program = Program::new(
        vec![Op::PushOuterColumn {
            level: 1,
            source: 0,
            column: 0,
        }],
        Vec::new(),
    );
    assert_eq!(evaluate(&program, &mut ctx).unwrap(), Value::from(42.0));

    let missing = Program::new(
        vec![Op::PushOuterColumn {
            level: 2,
            source: 0,
            column: 0,
        }],
        Vec::new(),
    );
    assert!(evaluate(&missing, &mut ctx).unwrap_err().is_internal());
}

#[test]
fn test_contract_violations_are_internal() {
    let catalog = Context::new("test");
    let mut ctx = ExecutionContext::new(&catalog, None, Utc::now());

    // Underflow
    let program = Program::new(vec![Op::PushNumber(1.0), Op::Sum], Vec::new());
    assert!(evaluate(&program, &mut ctx).unwrap_err().is_internal());

    // Values left behind
    let program = Program::new(vec![Op::PushNull, Op::PushNull], Vec::new());
    assert!(evaluate(&program, &mut ctx).unwrap_err().is_internal());

    // Output without an output row
    let program = Program::new(vec![Op::PushNull, Op::PushStackTopToOutput], Vec::new());
    assert!(execute(&program, &mut ctx).unwrap_err().is_internal());

    // Unknown sub-select
    let program = Program::new(vec![Op::SubSelect(0)], Vec::new());
    assert!(evaluate(&program, &mut ctx).unwrap_err().is_internal());
}
