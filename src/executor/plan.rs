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

//! Query Plans
//!
//! A [`QueryPlan`] is the compiled form of a resolved SELECT: one program
//! per join condition, filter, group key, output column and sort key, plus
//! the aggregate slots the outputs read from. Compiling never touches
//! storage, so a plan can be built before anything is executed and reused
//! for every evaluation of a sub-select.

use std::sync::Arc;

use tracing::trace;

use crate::catalog::Context;
use crate::core::{Error, Result};
use crate::functions::FunctionId;
use crate::parser::ast::{JoinKind, SelectStatement, TableSource};

use super::expression::{ExprCompiler, Program};
use super::result::ColumnDefinition;

/// A row source of a plan
#[derive(Debug, Clone)]
pub enum PlanSource {
    /// Catalog table read through its provider
    Table { table: usize, width: usize },
    /// FROM-clause sub-select, materialized before the scan
    SubSelect { plan: Arc<QueryPlan>, width: usize },
}

impl PlanSource {
    pub fn width(&self) -> usize {
        match self {
            PlanSource::Table { width, .. } | PlanSource::SubSelect { width, .. } => *width,
        }
    }
}

/// Join of the source at the same position plus one
#[derive(Debug, Clone)]
pub struct PlanJoin {
    pub kind: JoinKind,
    /// None joins every row pair
    pub condition: Option<Program>,
}

/// One aggregate call of an aggregating query
///
/// The argument programs run once per row of a group; their values feed a
/// fresh accumulator built from the variant's factory.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateSlot {
    pub function: FunctionId,
    pub variant: usize,
    pub arguments: Vec<Program>,
}

#[derive(Debug, Clone)]
pub struct SortKey {
    pub program: Program,
    pub ascending: bool,
}

/// Compiled SELECT
#[derive(Debug, Clone)]
pub struct QueryPlan {
    pub sources: Vec<PlanSource>,
    pub joins: Vec<PlanJoin>,
    pub filter: Option<Program>,
    pub outputs: Vec<Program>,
    pub columns: Vec<ColumnDefinition>,
    pub group_by: Vec<Program>,
    pub aggregates: Vec<AggregateSlot>,
    pub order_by: Vec<SortKey>,
    pub distinct: bool,
    pub limit: Option<usize>,
    /// Rows are folded into groups before projection
    pub aggregated: bool,
}

impl QueryPlan {
    /// Compile a resolved SELECT
    pub fn compile(select: &SelectStatement, catalog: &Context) -> Result<QueryPlan> {
        let mut sources = Vec::new();
        for source in select.sources() {
            sources.push(Self::compile_source(source, catalog)?);
        }

        let mut plain = ExprCompiler::plain(catalog);

        let mut joins = Vec::with_capacity(select.joins.len());
        for joining in &select.joins {
            let condition = match &joining.condition {
                Some(condition) => Some(plain.compile(condition)?),
                None => None,
            };
            joins.push(PlanJoin {
                kind: joining.kind,
                condition,
            });
        }

        let filter = match &select.filter {
            Some(filter) => Some(plain.compile(filter)?),
            None => None,
        };

        let mut group_by = Vec::with_capacity(select.group_by.len());
        for key in &select.group_by {
            group_by.push(plain.compile(key)?);
        }

        let aggregated = select.is_aggregate();
        let mut projection = if aggregated {
            ExprCompiler::grouped(catalog, &select.group_by)
        } else {
            ExprCompiler::plain(catalog)
        };

        let mut outputs = Vec::with_capacity(select.output.len());
        let mut columns = Vec::with_capacity(select.output.len());
        for expr in &select.output {
            if expr.contains_wildcard() {
                return Err(Error::internal("wildcard reached the compiler unexpanded"));
            }
            outputs.push(projection.compile_output(expr)?);
            columns.push(ColumnDefinition::new(expr.name(), expr.data_type));
        }

        let mut order_by = Vec::with_capacity(select.order_by.len());
        for key in &select.order_by {
            order_by.push(SortKey {
                program: projection.compile(&key.expression)?,
                ascending: key.ascending,
            });
        }

        Ok(QueryPlan {
            sources,
            joins,
            filter,
            outputs,
            columns,
            group_by,
            aggregates: projection.into_aggregates(),
            order_by,
            distinct: select.distinct,
            limit: select.limit,
            aggregated,
        })
    }

    fn compile_source(source: &TableSource, catalog: &Context) -> Result<PlanSource> {
        match source {
            TableSource::Table { name, table, .. } => {
                let meta = table
                    .and_then(|id| catalog.table(id))
                    .ok_or_else(|| Error::internal(format!("table '{}' reached the compiler unresolved", name)))?;
                Ok(PlanSource::Table {
                    table: meta.id,
                    width: meta.width(),
                })
            }
            TableSource::SubSelect { select, .. } => {
                let plan = QueryPlan::compile(select, catalog)?;
                let width = plan.columns.len();
                Ok(PlanSource::SubSelect {
                    plan: Arc::new(plan),
                    width,
                })
            }
        }
    }

    /// Emit every program of the plan at trace level
    pub fn trace(&self) {
        if let Some(filter) = &self.filter {
            trace!(program = %filter.disassemble(), "filter");
        }
        for (i, join) in self.joins.iter().enumerate() {
            if let Some(condition) = &join.condition {
                trace!(join = i, program = %condition.disassemble(), "join condition");
            }
        }
        for (i, key) in self.group_by.iter().enumerate() {
            trace!(key = i, program = %key.disassemble(), "group key");
        }
        for (i, slot) in self.aggregates.iter().enumerate() {
            for argument in &slot.arguments {
                trace!(slot = i, program = %argument.disassemble(), "aggregate argument");
            }
        }
        for (column, output) in self.columns.iter().zip(&self.outputs) {
            trace!(column = %column.name, program = %output.disassemble(), "output");
        }
        for key in &self.order_by {
            trace!(ascending = key.ascending, program = %key.program.disassemble(), "sort key");
        }
    }
}
