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

//! Semantic resolution of parsed statements
//!
//! The resolver walks a statement once and fills in, in place:
//! - source table ids and reference bindings (with the scope level for
//!   correlated references)
//! - function overloads and return types
//! - expression types and the boolean/aggregate flags
//!
//! Enclosing statements are tracked on an explicit scope stack: a sub-select
//! in an expression sees every source of every statement around it. A
//! sub-select in FROM position is resolved before its own statement's scope
//! is pushed, so it only sees the statements enclosing that one.
//!
//! Join, grouping and aggregate-placement rules are checked here, and
//! wildcards are expanded into one reference per column, so nothing after
//! resolution ever sees `*`.

use std::mem;

use tracing::trace;

use crate::catalog::{Context, TableMeta};
use crate::core::{DataType, Error, Result};

use super::ast::*;
use super::precedence::infer_type;

/// Resolve every name in `statement` against `catalog`
pub fn resolve(statement: &mut Statement, catalog: &Context) -> Result<()> {
    let mut resolver = Resolver::new(catalog);
    match statement {
        Statement::Select(select) => resolver.resolve_select(select),
        Statement::Insert(insert) => resolver.resolve_insert(insert),
        Statement::Update(update) => resolver.resolve_update(update),
        Statement::Delete(delete) => resolver.resolve_delete(delete),
        Statement::Create(create) => resolver.resolve_create(create),
    }
}

/// One source as seen by references: its canonical name and columns
#[derive(Debug, Clone)]
struct ScopeSource {
    name: String,
    table_name: Option<String>,
    columns: Vec<(String, DataType)>,
}

impl ScopeSource {
    fn from_table(meta: &TableMeta, name: &str) -> Self {
        Self {
            name: name.to_string(),
            table_name: Some(meta.name.clone()),
            columns: meta
                .columns
                .iter()
                .map(|c| (c.name.clone(), c.data_type))
                .collect(),
        }
    }

    fn column(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|(c, _)| c.eq_ignore_ascii_case(name))
    }
}

/// The sources of one statement
#[derive(Debug, Default)]
struct Scope {
    sources: Vec<ScopeSource>,
    /// Sources visible to the clause being resolved; join conditions only
    /// see the sources declared up to their own join
    visible: usize,
}

impl Scope {
    fn visible(&self) -> &[ScopeSource] {
        &self.sources[..self.visible.min(self.sources.len())]
    }

    /// Indices of visible sources a qualifier names: the canonical name
    /// first, then a base table name when that is unique
    fn sources_named(&self, qualifier: &str) -> Vec<usize> {
        let visible = self.visible();
        if let Some(i) = visible
            .iter()
            .position(|s| s.name.eq_ignore_ascii_case(qualifier))
        {
            return vec![i];
        }
        visible
            .iter()
            .enumerate()
            .filter(|(_, s)| {
                s.table_name
                    .as_deref()
                    .is_some_and(|t| t.eq_ignore_ascii_case(qualifier))
            })
            .map(|(i, _)| i)
            .collect()
    }
}

struct Found {
    source: usize,
    column: usize,
    level: usize,
}

struct Resolver<'a> {
    catalog: &'a Context,
    scopes: Vec<Scope>,
}

impl<'a> Resolver<'a> {
    fn new(catalog: &'a Context) -> Self {
        Self {
            catalog,
            scopes: Vec::new(),
        }
    }

    fn scope_mut(&mut self) -> Result<&mut Scope> {
        self.scopes
            .last_mut()
            .ok_or_else(|| Error::internal("no open scope"))
    }

    // =========================================================================
    // SELECT
    // =========================================================================

    fn resolve_select(&mut self, stmt: &mut SelectStatement) -> Result<()> {
        let mut sources = Vec::new();
        if let Some(from) = &mut stmt.from {
            sources.push(self.resolve_source(from)?);
        }
        for join in &mut stmt.joins {
            sources.push(self.resolve_source(&mut join.source)?);
        }
        assert_joins_are_correct(stmt)?;

        self.scopes.push(Scope {
            sources,
            visible: 1,
        });
        let result = self.resolve_select_clauses(stmt);
        self.scopes.pop();
        result
    }

    fn resolve_source(&mut self, source: &mut TableSource) -> Result<ScopeSource> {
        match source {
            TableSource::Table {
                name,
                alias,
                table,
                offset,
            } => {
                let meta = self
                    .catalog
                    .find_table(name)
                    .ok_or_else(|| Error::unresolved(name.clone(), *offset))?;
                *table = Some(meta.id);
                Ok(ScopeSource::from_table(
                    meta,
                    alias.as_deref().unwrap_or(name.as_str()),
                ))
            }
            TableSource::SubSelect { select, alias, .. } => {
                self.resolve_select(select)?;
                Ok(ScopeSource {
                    name: alias.clone().unwrap_or_default(),
                    table_name: None,
                    columns: select
                        .output
                        .iter()
                        .map(|e| (e.name(), e.data_type))
                        .collect(),
                })
            }
        }
    }

    fn resolve_select_clauses(&mut self, stmt: &mut SelectStatement) -> Result<()> {
        for (k, join) in stmt.joins.iter_mut().enumerate() {
            self.scope_mut()?.visible = k + 2;
            let Some(condition) = join.condition.as_mut() else {
                return Err(Error::internal("join condition missing after validation"));
            };
            self.resolve_expression(condition, false)?;
            if !condition.is_boolean && !condition.data_type.is_null() {
                return Err(Error::InvalidJoin(format!(
                    "ON condition '{}' is not boolean",
                    condition.source
                )));
            }
        }
        let scope = self.scope_mut()?;
        scope.visible = scope.sources.len();

        for expr in &mut stmt.output {
            if !expr.is_wildcard() {
                self.resolve_expression(expr, true)?;
            }
        }

        if let Some(filter) = &mut stmt.filter {
            self.resolve_expression(filter, false)?;
            require_boolean(filter, "WHERE")?;
        }

        for expr in &mut stmt.group_by {
            self.resolve_expression(expr, false)?;
        }

        for order in &mut stmt.order_by {
            if let Some(output) = find_output_alias(&stmt.output, &order.expression) {
                order.expression = output;
            } else {
                self.resolve_expression(&mut order.expression, true)?;
            }
        }

        assert_grouping_is_correct(stmt)?;
        self.expand_wildcards(stmt)
    }

    /// Replace every wildcard output with one reference per column
    fn expand_wildcards(&mut self, stmt: &mut SelectStatement) -> Result<()> {
        if !stmt.output.iter().any(Expression::is_wildcard) {
            return Ok(());
        }
        let scope = self
            .scopes
            .last()
            .ok_or_else(|| Error::internal("no open scope"))?;

        let mut output = Vec::with_capacity(stmt.output.len());
        for expr in mem::take(&mut stmt.output) {
            let Some(wildcard) = expr.single_reference().filter(|r| r.is_wildcard()) else {
                output.push(expr);
                continue;
            };

            let sources: Vec<usize> = match &wildcard.table {
                None => (0..scope.sources.len()).collect(),
                Some(qualifier) => {
                    let named = scope.sources_named(qualifier);
                    if named.len() > 1 {
                        return Err(Error::ambiguous(wildcard.join.clone(), wildcard.offset));
                    }
                    named
                }
            };
            if sources.is_empty() {
                return Err(Error::unresolved(wildcard.join.clone(), wildcard.offset));
            }

            for source in sources {
                let scope_source = &scope.sources[source];
                for (column, (name, data_type)) in scope_source.columns.iter().enumerate() {
                    let mut reference =
                        ColumnReference::new(Some(scope_source.name.clone()), name.clone(), wildcard.offset);
                    reference.data_type = *data_type;
                    reference.binding = Some(ColumnBinding { source, column });
                    output.push(Expression::from_reference(reference));
                }
            }
        }
        stmt.output = output;
        Ok(())
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    fn resolve_expression(&mut self, expr: &mut Expression, allow_aggregates: bool) -> Result<()> {
        for node in &mut expr.nodes {
            match node {
                Node::Reference(reference) => {
                    if self.resolve_reference(reference)? {
                        continue;
                    }
                    let mut call = self.bare_call(reference)?;
                    self.resolve_call(&mut call, allow_aggregates)?;
                    *node = Node::FunctionCall(call);
                }
                Node::FunctionCall(call) => self.resolve_call(call, allow_aggregates)?,
                Node::SubSelect(select) => {
                    self.resolve_select(select)?;
                    if select.output.len() != 1 {
                        return Err(Error::parse(
                            "a sub-select used as a value must return exactly one column",
                            select.offset,
                            select.source.clone(),
                        ));
                    }
                }
                _ => {}
            }
        }

        expr.data_type = infer_type(&expr.nodes, node_type)?;
        expr.is_boolean = expr.data_type == DataType::Boolean;
        let mut has_aggregate = false;
        expr.for_each_call(&mut |call| has_aggregate |= call.is_aggregate);
        expr.has_aggregate = has_aggregate;
        Ok(())
    }

    /// Bind a column reference, innermost scope first; false if not found
    fn resolve_reference(&self, reference: &mut ColumnReference) -> Result<bool> {
        if reference.is_wildcard() {
            return Err(Error::parse(
                "a wildcard must stand alone in the output list",
                reference.offset,
                reference.join.clone(),
            ));
        }

        let mut found = None;
        for (level, scope) in self.scopes.iter().rev().enumerate() {
            if let Some((source, column)) = lookup(scope, reference)? {
                found = Some(Found {
                    source,
                    column,
                    level,
                });
                break;
            }
        }
        let Some(found) = found else {
            return Ok(false);
        };

        let scope = &self.scopes[self.scopes.len() - 1 - found.level];
        let source = &scope.sources[found.source];
        reference.data_type = source.columns[found.column].1;
        reference.parent_level = found.level;
        reference.binding = Some(ColumnBinding {
            source: found.source,
            column: found.column,
        });
        reference.qualify(source.name.clone());
        if found.level > 0 {
            trace!(reference = %reference, level = found.level, "bound correlated reference");
        }
        Ok(true)
    }

    /// An unknown bare identifier naming a function with a zero-argument
    /// variant is a call of that function (`ROWNUM` for `ROWNUM()`)
    fn bare_call(&self, reference: &ColumnReference) -> Result<FunctionCall> {
        if reference.table.is_none() {
            if let Some((_, function)) = self.catalog.find_function(&reference.column) {
                if function.variants.iter().any(|v| v.arguments.is_empty()) {
                    return Ok(FunctionCall::new(
                        reference.column.clone(),
                        Vec::new(),
                        reference.offset,
                    ));
                }
            }
        }
        Err(Error::unresolved(reference.join.clone(), reference.offset))
    }

    fn resolve_call(&mut self, call: &mut FunctionCall, allow_aggregates: bool) -> Result<()> {
        let catalog = self.catalog;
        let (id, function) = catalog
            .find_function(&call.name)
            .ok_or_else(|| Error::unresolved(call.name.clone(), call.offset))?;

        // Aggregates never nest
        let arguments_allow_aggregates = allow_aggregates && !function.has_aggregate();
        for argument in &mut call.arguments {
            self.resolve_expression(argument, arguments_allow_aggregates)?;
        }

        let types: Vec<DataType> = call.arguments.iter().map(|a| a.data_type).collect();
        let mut candidates = function
            .variants
            .iter()
            .enumerate()
            .filter(|(_, v)| v.arguments.len() == types.len());
        let chosen = if types.iter().any(DataType::is_null) {
            candidates.find(|(_, v)| v.accepts_loosely(&types))
        } else {
            candidates.find(|(_, v)| v.accepts(&types))
        };
        let Some((variant_index, variant)) = chosen else {
            return Err(Error::no_suitable_overload(&call.name, &types));
        };

        if variant.is_aggregate() && !allow_aggregates {
            return Err(Error::aggregate_misuse(format!(
                "{} is not allowed here",
                call.name
            )));
        }

        call.target = Some(FunctionTarget {
            function: id,
            variant: variant_index,
        });
        call.return_type = variant.return_type;
        call.is_aggregate = variant.is_aggregate();
        Ok(())
    }

    // =========================================================================
    // INSERT / UPDATE / DELETE / CREATE
    // =========================================================================

    /// Open a scope over a single target table
    fn push_table_scope(&mut self, name: &str, offset: usize) -> Result<&'a TableMeta> {
        let catalog = self.catalog;
        let meta = catalog
            .find_table(name)
            .ok_or_else(|| Error::unresolved(name.to_string(), offset))?;
        self.scopes.push(Scope {
            sources: vec![ScopeSource::from_table(meta, &meta.name)],
            visible: 1,
        });
        Ok(meta)
    }

    fn resolve_insert(&mut self, stmt: &mut InsertStatement) -> Result<()> {
        let catalog = self.catalog;
        let meta = catalog
            .find_table(&stmt.table)
            .ok_or_else(|| Error::unresolved(stmt.table.clone(), stmt.offset))?;
        stmt.table_id = Some(meta.id);

        stmt.positions = if stmt.columns.is_empty() {
            (0..meta.width()).collect()
        } else {
            let mut positions = Vec::with_capacity(stmt.columns.len());
            for column in &stmt.columns {
                let position = meta.column_index(column).ok_or_else(|| {
                    Error::unresolved(format!("{}.{}", meta.name, column), stmt.offset)
                })?;
                if positions.contains(&position) {
                    return Err(Error::DuplicateColumn {
                        table: meta.name.clone(),
                        column: column.clone(),
                    });
                }
                positions.push(position);
            }
            positions
        };

        // VALUES see no columns
        self.scopes.push(Scope::default());
        let result = (|| {
            for row in &mut stmt.rows {
                if row.len() != stmt.positions.len() {
                    let offset = row.first().map_or(stmt.offset, |e| e.offset);
                    return Err(Error::parse(
                        format!(
                            "expected {} values, found {}",
                            stmt.positions.len(),
                            row.len()
                        ),
                        offset,
                        stmt.table.clone(),
                    ));
                }
                for (expr, &position) in row.iter_mut().zip(&stmt.positions) {
                    self.resolve_expression(expr, false)?;
                    check_assignable(meta.columns[position].data_type, expr)?;
                }
            }
            Ok(())
        })();
        self.scopes.pop();
        result
    }

    fn resolve_update(&mut self, stmt: &mut UpdateStatement) -> Result<()> {
        let meta = self.push_table_scope(&stmt.table, stmt.offset)?;
        stmt.table_id = Some(meta.id);

        let result = (|| {
            for assignment in &mut stmt.assignments {
                assignment.position = meta.column_index(&assignment.column).ok_or_else(|| {
                    Error::unresolved(
                        format!("{}.{}", meta.name, assignment.column),
                        assignment.offset,
                    )
                })?;
                self.resolve_expression(&mut assignment.value, false)?;
                check_assignable(meta.columns[assignment.position].data_type, &assignment.value)?;
            }
            if let Some(filter) = &mut stmt.filter {
                self.resolve_expression(filter, false)?;
                require_boolean(filter, "WHERE")?;
            }
            Ok(())
        })();
        self.scopes.pop();
        result
    }

    fn resolve_delete(&mut self, stmt: &mut DeleteStatement) -> Result<()> {
        let meta = self.push_table_scope(&stmt.table, stmt.offset)?;
        stmt.table_id = Some(meta.id);

        let result = match &mut stmt.filter {
            Some(filter) => self
                .resolve_expression(filter, false)
                .and_then(|_| require_boolean(filter, "WHERE")),
            None => Ok(()),
        };
        self.scopes.pop();
        result
    }

    fn resolve_create(&mut self, stmt: &mut CreateStatement) -> Result<()> {
        if self.catalog.find_table(&stmt.table).is_some() {
            return Err(Error::TableAlreadyExists(stmt.table.clone()));
        }
        for (i, column) in stmt.columns.iter().enumerate() {
            if stmt.columns[..i]
                .iter()
                .any(|c| c.name.eq_ignore_ascii_case(&column.name))
            {
                return Err(Error::DuplicateColumn {
                    table: stmt.table.clone(),
                    column: column.name.clone(),
                });
            }
        }
        Ok(())
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Find a reference among the visible sources of one scope
fn lookup(scope: &Scope, reference: &ColumnReference) -> Result<Option<(usize, usize)>> {
    let visible = scope.visible();

    let candidates: Vec<usize> = match &reference.table {
        Some(qualifier) => {
            let named = scope.sources_named(qualifier);
            if named.len() > 1 {
                return Err(Error::ambiguous(reference.join.clone(), reference.offset));
            }
            named
        }
        None => (0..visible.len()).collect(),
    };

    let mut found = None;
    for source in candidates {
        if let Some(column) = visible[source].column(&reference.column) {
            if found.is_some() {
                return Err(Error::ambiguous(reference.join.clone(), reference.offset));
            }
            found = Some((source, column));
        }
    }
    Ok(found)
}

fn node_type(node: &Node) -> DataType {
    match node {
        Node::Number(_) => DataType::Number,
        Node::String(_) => DataType::Text,
        Node::Boolean(_) => DataType::Boolean,
        Node::Reference(r) => r.data_type,
        Node::FunctionCall(call) => call.return_type,
        Node::SubSelect(select) => select.output.first().map(|e| e.data_type).unwrap_or_default(),
        Node::Null | Node::Operator(_) | Node::LeftParen | Node::RightParen => DataType::Null,
    }
}

fn require_boolean(expr: &Expression, clause: &str) -> Result<()> {
    if expr.is_boolean || expr.data_type.is_null() {
        Ok(())
    } else {
        Err(Error::parse(
            format!("{} clause must be a boolean expression", clause),
            expr.offset,
            expr.source.clone(),
        ))
    }
}

fn check_assignable(column_type: DataType, expr: &Expression) -> Result<()> {
    if column_type.is_compatible(expr.data_type) {
        Ok(())
    } else {
        Err(Error::type_mismatch("=", column_type, expr.data_type))
    }
}

/// ORDER BY naming an output alias sorts by that output
fn find_output_alias(output: &[Expression], order: &Expression) -> Option<Expression> {
    let reference = order.single_reference()?;
    if reference.table.is_some() {
        return None;
    }
    output
        .iter()
        .find(|e| {
            e.alias
                .as_deref()
                .is_some_and(|a| a.eq_ignore_ascii_case(&reference.column))
        })
        .map(|e| {
            let mut expr = e.clone();
            expr.alias = None;
            expr
        })
}

/// Same base table twice needs distinct aliases, canonical names must be
/// unique, and every join needs an ON condition
fn assert_joins_are_correct(stmt: &SelectStatement) -> Result<()> {
    let sources: Vec<&TableSource> = stmt.sources().collect();
    for (i, source) in sources.iter().enumerate() {
        for prior in &sources[..i] {
            if let (Some(a), Some(b)) = (source.table_name(), prior.table_name()) {
                let aliased = |s: &TableSource| s.alias().is_some_and(|a| !a.is_empty());
                if a.eq_ignore_ascii_case(b) && !(aliased(source) && aliased(prior)) {
                    return Err(Error::InvalidJoin(format!(
                        "table '{}' is used more than once and needs distinct aliases",
                        a
                    )));
                }
            }
            if source
                .canonical_name()
                .eq_ignore_ascii_case(prior.canonical_name())
            {
                return Err(Error::InvalidJoin(format!(
                    "source name '{}' is used more than once",
                    source.canonical_name()
                )));
            }
        }
    }

    for join in &stmt.joins {
        if join.condition.as_ref().map_or(true, Expression::is_empty) {
            return Err(Error::InvalidJoin(format!(
                "join with '{}' has no ON condition",
                join.source.canonical_name()
            )));
        }
    }
    Ok(())
}

/// GROUP BY and aggregate placement rules
fn assert_grouping_is_correct(stmt: &SelectStatement) -> Result<()> {
    let checked = stmt
        .output
        .iter()
        .chain(stmt.order_by.iter().map(|o| &o.expression));

    if !stmt.group_by.is_empty() {
        for expr in checked {
            if expr.contains_wildcard() {
                return Err(Error::aggregate_misuse("a wildcard cannot be used with GROUP BY"));
            }
            if expr.has_aggregate {
                let mut misuse = None;
                expr.for_each_call(&mut |call| {
                    if call.is_aggregate && misuse.is_none() {
                        misuse = call
                            .arguments
                            .iter()
                            .find(|a| stmt.group_by.contains(a))
                            .map(|a| a.source.clone());
                    }
                });
                if let Some(argument) = misuse {
                    return Err(Error::aggregate_misuse(format!(
                        "aggregate argument '{}' is a GROUP BY expression",
                        argument
                    )));
                }
            }
            if let Some(reference) = expr.ungrouped_reference(&stmt.group_by) {
                return Err(Error::aggregate_misuse(format!(
                    "'{}' must appear in GROUP BY or be used in an aggregate",
                    reference
                )));
            }
        }
    } else if stmt.is_aggregate() {
        for expr in checked {
            if expr.contains_wildcard() {
                return Err(Error::aggregate_misuse(format!(
                    "'{}' must be used in an aggregate",
                    expr.source
                )));
            }
            if let Some(reference) = expr.ungrouped_reference(&[]) {
                return Err(Error::aggregate_misuse(format!(
                    "'{}' must be used in an aggregate",
                    reference
                )));
            }
        }
    }
    Ok(())
}
