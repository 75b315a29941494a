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

//! SELECT Query Execution
//!
//! This module runs a compiled [`QueryPlan`]:
//! - FROM-clause sub-selects are materialized into memory tables
//! - Sources are combined with nested-loop joins
//! - WHERE runs as a separate filtering pass over every combination
//! - Kept rows are projected, or folded into groups and projected per group
//! - DISTINCT, ORDER BY and LIMIT apply to the projected rows
//!
//! Filtering and projection are two passes on purpose: ROWNUM() in WHERE
//! counts the rows being filtered, ROWNUM() in the output list counts the
//! rows that passed.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{trace, warn};

use crate::catalog::Context;
use crate::core::{Error, Result, Row, Value};
use crate::functions::{AggregateFunction, Implementation};
use crate::storage::{MemoryTable, RowId, TableCursor, TableDataProvider};

use super::context::{ExecutionContext, OuterFrame};
use super::expression::{evaluate, execute, Program};
use super::plan::{AggregateSlot, PlanSource, QueryPlan};
use super::result::{Output, OutputRow};

/// Current row id of every source; `None` is the null row of an outer join
pub(crate) type Combination = Vec<Option<RowId>>;

/// Row evaluation states of one SELECT
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ExecutionState {
    Idle,
    Filtering,
    Collecting,
    Projecting,
    Done,
}

fn transition(state: &mut ExecutionState, next: ExecutionState, rows: usize) {
    trace!(from = ?*state, to = ?next, rows, "row evaluation");
    *state = next;
}

/// Execute a compiled SELECT
///
/// `outer` is the row frame of the enclosing statement when the plan is a
/// sub-select; correlated references read from it.
pub fn execute_plan(
    plan: &QueryPlan,
    catalog: &Context,
    outer: Option<&OuterFrame<'_>>,
    now: DateTime<Utc>,
) -> Result<Output> {
    let mut materialized: Vec<Option<MemoryTable>> = Vec::with_capacity(plan.sources.len());
    for source in &plan.sources {
        materialized.push(match source {
            PlanSource::SubSelect { plan: inner, width } => {
                let output = execute_plan(inner, catalog, outer, now)?;
                Some(MemoryTable::from_rows(
                    *width,
                    output
                        .rows
                        .into_iter()
                        .map(|row| Row::from_values(row.values)),
                ))
            }
            PlanSource::Table { .. } => None,
        });
    }

    let mut ctx = ExecutionContext::new(catalog, outer, now);
    for (source, table) in plan.sources.iter().zip(&materialized) {
        let provider: &dyn TableDataProvider = match (source, table) {
            (_, Some(table)) => table,
            (PlanSource::Table { table, .. }, None) => catalog.provider(*table).ok_or_else(|| {
                Error::NotSupported(format!("table {} has no data provider", table))
            })?,
            (PlanSource::SubSelect { .. }, None) => {
                return Err(Error::internal("sub-select source was not materialized"))
            }
        };
        ctx.cursors.push(TableCursor::new(provider, source.width()));
    }

    let mut state = ExecutionState::Idle;
    let combinations = combine_sources(plan, &mut ctx)?;

    let kept = match &plan.filter {
        Some(filter) => {
            transition(&mut state, ExecutionState::Filtering, combinations.len());
            filter_combinations(&mut ctx, combinations, filter)?
        }
        None => combinations,
    };

    transition(&mut state, ExecutionState::Collecting, kept.len());
    let mut sort_keys = Vec::new();
    if plan.aggregated {
        let groups = collect_groups(plan, &mut ctx, &kept)?;
        transition(&mut state, ExecutionState::Projecting, groups.len());
        let mut accumulators = plan
            .aggregates
            .iter()
            .map(|slot| accumulator(catalog, slot))
            .collect::<Result<Vec<_>>>()?;
        for (key, members) in groups {
            project_group(
                plan,
                &mut ctx,
                &kept,
                key,
                &members,
                &mut accumulators,
                &mut sort_keys,
            )?;
        }
    } else {
        transition(&mut state, ExecutionState::Projecting, kept.len());
        for combination in &kept {
            ctx.position(combination)?;
            project_row(plan, &mut ctx, &mut sort_keys)?;
        }
    }

    check_output_rows(&mut ctx.output, &mut sort_keys, kept.is_empty());
    let rows = finish_rows(plan, std::mem::take(&mut ctx.output), sort_keys);
    transition(&mut state, ExecutionState::Done, rows.len());

    Ok(Output {
        columns: plan.columns.clone(),
        rows,
        rows_affected: 0,
    })
}

// ============================================================================
// Joins and filtering
// ============================================================================

/// Every row combination of the plan's sources, joined in declaration order
fn combine_sources(plan: &QueryPlan, ctx: &mut ExecutionContext<'_>) -> Result<Vec<Combination>> {
    let Some(primary) = ctx.cursors.first_mut() else {
        // A FROM-less SELECT evaluates its outputs once
        return Ok(vec![Vec::new()]);
    };
    let mut combinations: Vec<Combination> = primary
        .row_ids()
        .into_iter()
        .map(|id| vec![Some(id)])
        .collect();

    for (k, join) in plan.joins.iter().enumerate() {
        let right = k + 1;
        let right_ids = ctx
            .cursors
            .get_mut(right)
            .map(TableCursor::row_ids)
            .ok_or_else(|| Error::internal(format!("no cursor for join source {}", right)))?;
        let mut right_matched = vec![false; right_ids.len()];
        let mut joined = Vec::with_capacity(combinations.len());

        for combination in combinations {
            let mut matched = false;
            for (j, id) in right_ids.iter().enumerate() {
                let mut candidate = combination.clone();
                candidate.push(Some(*id));
                if condition_holds(ctx, &candidate, join.condition.as_ref())? {
                    matched = true;
                    right_matched[j] = true;
                    joined.push(candidate);
                }
            }
            if !matched && join.kind.keeps_left() {
                let mut padded = combination;
                padded.push(None);
                joined.push(padded);
            }
        }

        if join.kind.keeps_right() {
            for (id, matched) in right_ids.iter().zip(&right_matched) {
                if !matched {
                    let mut padded = vec![None; right];
                    padded.push(Some(*id));
                    joined.push(padded);
                }
            }
        }

        trace!(join = k, kind = ?join.kind, rows = joined.len(), "joined");
        combinations = joined;
    }
    Ok(combinations)
}

fn condition_holds(
    ctx: &mut ExecutionContext<'_>,
    combination: &[Option<RowId>],
    condition: Option<&Program>,
) -> Result<bool> {
    let Some(condition) = condition else {
        return Ok(true);
    };
    ctx.position(combination)?;
    Ok(evaluate(condition, ctx)?.is_true())
}

/// The filtering pass: each combination gets a transient output row while
/// the filter runs, so row functions observe the filtering position
pub(crate) fn filter_combinations(
    ctx: &mut ExecutionContext<'_>,
    combinations: Vec<Combination>,
    filter: &Program,
) -> Result<Vec<Combination>> {
    let mut kept = Vec::new();
    for combination in combinations {
        ctx.position(&combination)?;
        ctx.push_output_row();
        ctx.row_counter += 1;
        if evaluate(filter, ctx)?.is_true() {
            kept.push(combination);
        }
    }
    ctx.output.clear();
    Ok(kept)
}

// ============================================================================
// Projection
// ============================================================================

fn project_row(
    plan: &QueryPlan,
    ctx: &mut ExecutionContext<'_>,
    sort_keys: &mut Vec<Vec<Value>>,
) -> Result<()> {
    ctx.push_output_row();
    ctx.row_counter += 1;
    for output in &plan.outputs {
        execute(output, ctx)?;
    }
    let mut keys = Vec::with_capacity(plan.order_by.len());
    for key in &plan.order_by {
        keys.push(evaluate(&key.program, ctx)?);
    }
    sort_keys.push(keys);
    Ok(())
}

/// Fold kept rows into groups keyed by the evaluated GROUP BY values, in
/// first-seen order
fn collect_groups(
    plan: &QueryPlan,
    ctx: &mut ExecutionContext<'_>,
    kept: &[Combination],
) -> Result<Vec<(Vec<Value>, Vec<usize>)>> {
    let mut groups: Vec<(Vec<Value>, Vec<usize>)> = Vec::new();
    let mut index: FxHashMap<Vec<Value>, usize> = FxHashMap::default();

    for (i, combination) in kept.iter().enumerate() {
        ctx.position(combination)?;
        let mut key = Vec::with_capacity(plan.group_by.len());
        for program in &plan.group_by {
            key.push(evaluate(program, ctx)?);
        }
        match index.get(&key) {
            Some(&group) => groups[group].1.push(i),
            None => {
                index.insert(key.clone(), groups.len());
                groups.push((key, vec![i]));
            }
        }
    }

    // Aggregating without GROUP BY always yields one row
    if groups.is_empty() && plan.group_by.is_empty() {
        groups.push((Vec::new(), Vec::new()));
    }
    Ok(groups)
}

fn project_group(
    plan: &QueryPlan,
    ctx: &mut ExecutionContext<'_>,
    kept: &[Combination],
    key: Vec<Value>,
    members: &[usize],
    accumulators: &mut [Box<dyn AggregateFunction>],
    sort_keys: &mut Vec<Vec<Value>>,
) -> Result<()> {
    ctx.temp_rows.clear();
    for slot in &plan.aggregates {
        let mut rows = Vec::with_capacity(members.len());
        for &member in members {
            ctx.position(&kept[member])?;
            let mut row = Row::with_capacity(slot.arguments.len());
            for argument in &slot.arguments {
                row.push(evaluate(argument, ctx)?);
            }
            rows.push(row);
        }
        ctx.temp_rows.push(rows);
    }

    let mut results = Vec::with_capacity(accumulators.len());
    for (accumulator, rows) in accumulators.iter_mut().zip(&ctx.temp_rows) {
        accumulator.reset();
        for row in rows {
            accumulator.accumulate(row.as_slice())?;
        }
        results.push(accumulator.result());
    }
    ctx.aggregate_results = results;
    ctx.variables = key;

    match members.first() {
        Some(&first) => ctx.position(&kept[first])?,
        None => ctx.clear_cursors(),
    }
    project_row(plan, ctx, sort_keys)
}

/// Accumulator for one aggregate slot, reset and reused for every group
fn accumulator(catalog: &Context, slot: &AggregateSlot) -> Result<Box<dyn AggregateFunction>> {
    let implementation = catalog
        .function(slot.function)
        .and_then(|f| f.variants.get(slot.variant))
        .map(|v| &v.implementation)
        .ok_or_else(|| Error::internal(format!("no function {}:{}", slot.function, slot.variant)))?;
    let Implementation::Aggregate(factory) = implementation else {
        return Err(Error::internal("scalar function registered as an aggregate slot"));
    };
    Ok(factory())
}

// ============================================================================
// Post-processing
// ============================================================================

/// Drop the single all-NULL row an aggregate over zero rows produces
fn check_output_rows(output: &mut Vec<OutputRow>, sort_keys: &mut Vec<Vec<Value>>, nothing_kept: bool) {
    if nothing_kept
        && output.len() == 1
        && output[0].values.iter().all(Value::is_null)
    {
        warn!("removing spurious all-null row produced from zero source rows");
        output.clear();
        sort_keys.clear();
    }
}

fn finish_rows(plan: &QueryPlan, rows: Vec<OutputRow>, sort_keys: Vec<Vec<Value>>) -> Vec<OutputRow> {
    let mut rows: Vec<(OutputRow, Vec<Value>)> = rows.into_iter().zip(sort_keys).collect();

    if plan.distinct {
        let mut seen: FxHashSet<Vec<Value>> = FxHashSet::default();
        rows.retain(|(row, _)| seen.insert(row.values.clone()));
    }

    if !plan.order_by.is_empty() {
        // Vec::sort_by is stable, ties keep scan order
        rows.sort_by(|(_, a), (_, b)| compare_keys(plan, a, b));
    }

    let mut rows: Vec<OutputRow> = rows.into_iter().map(|(row, _)| row).collect();
    if let Some(limit) = plan.limit {
        rows.truncate(limit);
    }
    rows
}

fn compare_keys(plan: &QueryPlan, a: &[Value], b: &[Value]) -> Ordering {
    for ((key, left), right) in plan.order_by.iter().zip(a).zip(b) {
        let ordering = left.sort_cmp(right);
        let ordering = if key.ascending {
            ordering
        } else {
            ordering.reverse()
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::DataType;
    use crate::parser::{parse_and_resolve, ParserOptions, Statement};

    fn catalog() -> Context {
        let mut catalog = Context::new("test");
        let rows = vec![
            Row::from_values(vec![Value::from(1.0), Value::from("x")]),
            Row::from_values(vec![Value::from(2.0), Value::from("y")]),
            Row::from_values(vec![Value::from(3.0), Value::from("x")]),
        ];
        catalog
            .create_table(
                "t",
                &[("a", DataType::Number), ("b", DataType::Text)],
                Box::new(MemoryTable::from_rows(2, rows)),
            )
            .unwrap();
        catalog
            .create_memory_table("empty", &[("a", DataType::Number)])
            .unwrap();
        catalog
    }

    fn run(sql: &str, catalog: &Context) -> Output {
        let Statement::Select(select) =
            parse_and_resolve(sql, &ParserOptions::default(), catalog).unwrap()
        else {
            panic!("expected SELECT");
        };
        let plan = QueryPlan::compile(&select, catalog).unwrap();
        execute_plan(&plan, catalog, None, Utc::now()).unwrap()
    }

    fn column(output: &Output, index: usize) -> Vec<Value> {
        output.rows.iter().map(|r| r.values[index].clone()).collect()
    }

    #[test]
    fn test_scan_keeps_storage_order() {
        let catalog = catalog();
        let output = run("SELECT a FROM t", &catalog);
        assert_eq!(
            column(&output, 0),
            vec![Value::from(1.0), Value::from(2.0), Value::from(3.0)]
        );
        assert_eq!(output.rows[2].id, 2);
    }

    #[test]
    fn test_rownum_in_filter_and_output() {
        let catalog = catalog();
        // The filter sees the filtering position, the output sees the
        // position among kept rows
        let output = run("SELECT a, ROWNUM() AS n FROM t WHERE ROWNUM() > 1", &catalog);
        assert_eq!(column(&output, 0), vec![Value::from(2.0), Value::from(3.0)]);
        assert_eq!(column(&output, 1), vec![Value::from(1.0), Value::from(2.0)]);
    }

    #[test]
    fn test_aggregate_over_empty_source() {
        let catalog = catalog();
        let output = run("SELECT COUNT() FROM empty", &catalog);
        assert_eq!(column(&output, 0), vec![Value::from(0.0)]);

        let output = run("SELECT MAX(a) FROM empty", &catalog);
        assert!(output.rows.is_empty());
    }

    #[test]
    fn test_group_order() {
        let catalog = catalog();
        let output = run("SELECT b, SUM(a) AS total FROM t GROUP BY b", &catalog);
        assert_eq!(column(&output, 0), vec![Value::from("x"), Value::from("y")]);
        assert_eq!(column(&output, 1), vec![Value::from(4.0), Value::from(2.0)]);
    }

    #[test]
    fn test_distinct_order_limit() {
        let catalog = catalog();
        let output = run("SELECT DISTINCT b FROM t ORDER BY b DESC LIMIT 1", &catalog);
        assert_eq!(column(&output, 0), vec![Value::from("y")]);
    }

    #[test]
    fn test_missing_provider() {
        let mut catalog = catalog();
        let id = catalog.add_table("bare").unwrap();
        catalog.add_column(id, "a", DataType::Number).unwrap();
        let Statement::Select(select) =
            parse_and_resolve("SELECT a FROM bare", &ParserOptions::default(), &catalog).unwrap()
        else {
            panic!("expected SELECT");
        };
        let plan = QueryPlan::compile(&select, &catalog).unwrap();
        assert!(matches!(
            execute_plan(&plan, &catalog, None, Utc::now()),
            Err(Error::NotSupported(_))
        ));
    }
}
