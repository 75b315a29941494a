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

//! AST (Abstract Syntax Tree) definitions for SQL statements
//!
//! Expressions are not trees. An [`Expression`] is the flat, left-to-right
//! sequence of its [`Node`]s with explicit parenthesis markers; operator
//! precedence is applied later by [`super::precedence::postfix`].
//!
//! The parser fills in the syntactic parts. The resolver then fills in the
//! semantic parts in place: reference bindings and types, function
//! overloads, expression types and flags.

use std::fmt;

use crate::catalog::TableId;
use crate::core::{DataType, Operator};
use crate::functions::FunctionId;

// ============================================================================
// Column references
// ============================================================================

/// Where a resolved column lives: source index within its statement and
/// column position within that source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColumnBinding {
    pub source: usize,
    pub column: usize,
}

/// A possibly qualified column name
///
/// Identity is structural: two references are equal when their qualifier
/// and column name match case-insensitively. Resolution replaces the
/// qualifier with the canonical name of the source it found, so `a` and
/// `t.a` compare equal once both are resolved against the same source.
#[derive(Debug, Clone, Default)]
pub struct ColumnReference {
    /// Table qualifier (alias or table name)
    pub table: Option<String>,
    /// Column name, `*` for a wildcard
    pub column: String,
    pub alias: Option<String>,
    /// Resolved type
    pub data_type: DataType,
    /// Cached "table.column"
    pub join: String,
    /// How many statement scopes up the column was found (0 = own scope)
    pub parent_level: usize,
    pub binding: Option<ColumnBinding>,
    /// Byte offset in the statement text
    pub offset: usize,
}

impl ColumnReference {
    pub fn new(table: Option<String>, column: impl Into<String>, offset: usize) -> Self {
        let column = column.into();
        let join = join_name(table.as_deref(), &column);
        Self {
            table,
            column,
            join,
            offset,
            ..Default::default()
        }
    }

    pub fn is_wildcard(&self) -> bool {
        self.column == "*"
    }

    /// Set the qualifier and refresh the cached join string
    pub fn qualify(&mut self, table: impl Into<String>) {
        let table = table.into();
        self.join = join_name(Some(&table), &self.column);
        self.table = Some(table);
    }
}

fn join_name(table: Option<&str>, column: &str) -> String {
    match table {
        Some(table) if !table.is_empty() => format!("{}.{}", table, column),
        _ => column.to_string(),
    }
}

impl PartialEq for ColumnReference {
    fn eq(&self, other: &Self) -> bool {
        let same_table = match (&self.table, &other.table) {
            (Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
            (None, None) => true,
            _ => false,
        };
        same_table && self.column.eq_ignore_ascii_case(&other.column)
    }
}

impl fmt::Display for ColumnReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.join)
    }
}

// ============================================================================
// Function calls
// ============================================================================

/// Overload chosen during resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FunctionTarget {
    pub function: FunctionId,
    pub variant: usize,
}

#[derive(Debug, Clone)]
pub struct FunctionCall {
    /// Upper-cased function name
    pub name: String,
    pub arguments: Vec<Expression>,
    pub target: Option<FunctionTarget>,
    pub return_type: DataType,
    pub is_aggregate: bool,
    pub offset: usize,
}

impl FunctionCall {
    pub fn new(name: impl Into<String>, arguments: Vec<Expression>, offset: usize) -> Self {
        Self {
            name: name.into().to_uppercase(),
            arguments,
            target: None,
            return_type: DataType::Null,
            is_aggregate: false,
            offset,
        }
    }
}

impl PartialEq for FunctionCall {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.arguments == other.arguments
    }
}

// ============================================================================
// Expressions
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Operator(Operator),
    LeftParen,
    RightParen,
    Number(f64),
    String(String),
    Boolean(bool),
    Null,
    Reference(ColumnReference),
    FunctionCall(FunctionCall),
    SubSelect(Box<SelectStatement>),
}

impl Node {
    /// True for nodes that produce a value on their own
    pub fn is_value(&self) -> bool {
        !matches!(
            self,
            Node::Operator(_) | Node::LeftParen | Node::RightParen
        )
    }
}

/// A flat expression with its resolved type and flags
#[derive(Debug, Clone, Default)]
pub struct Expression {
    pub nodes: Vec<Node>,
    pub data_type: DataType,
    pub is_boolean: bool,
    pub has_aggregate: bool,
    /// Original source text
    pub source: String,
    /// Output alias (`AS name`)
    pub alias: Option<String>,
    pub offset: usize,
}

impl Expression {
    pub fn new(offset: usize) -> Self {
        Self {
            offset,
            ..Default::default()
        }
    }

    /// Expression made of one column reference
    pub fn from_reference(reference: ColumnReference) -> Self {
        let mut expr = Expression::new(reference.offset);
        expr.source = reference.join.clone();
        expr.data_type = reference.data_type;
        expr.is_boolean = reference.data_type == DataType::Boolean;
        expr.nodes.push(Node::Reference(reference));
        expr
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The reference, if the expression is exactly one column reference
    pub fn single_reference(&self) -> Option<&ColumnReference> {
        match self.nodes.as_slice() {
            [Node::Reference(r)] => Some(r),
            _ => None,
        }
    }

    /// True if the expression is `*` or `t.*`
    pub fn is_wildcard(&self) -> bool {
        self.single_reference().is_some_and(ColumnReference::is_wildcard)
    }

    /// True if any node (not counting sub-selects) is a wildcard
    pub fn contains_wildcard(&self) -> bool {
        self.nodes
            .iter()
            .any(|n| matches!(n, Node::Reference(r) if r.is_wildcard()))
    }

    /// Name used for the output column
    pub fn name(&self) -> String {
        if let Some(alias) = &self.alias {
            return alias.clone();
        }
        if let Some(reference) = self.single_reference() {
            return reference.column.clone();
        }
        self.source.clone()
    }

    /// Visit every function call, including ones nested in arguments
    pub fn for_each_call<'a>(&'a self, f: &mut impl FnMut(&'a FunctionCall)) {
        for node in &self.nodes {
            if let Node::FunctionCall(call) = node {
                f(call);
                for argument in &call.arguments {
                    argument.for_each_call(f);
                }
            }
        }
    }

    /// First column of its own statement read outside every aggregate call
    /// and every GROUP BY expression in `group_by`
    pub fn ungrouped_reference(&self, group_by: &[Expression]) -> Option<&ColumnReference> {
        if group_by.contains(self) {
            return None;
        }
        self.nodes.iter().find_map(|node| {
            if is_group_key(node, group_by) {
                return None;
            }
            match node {
                Node::Reference(r) if r.parent_level == 0 => Some(r),
                Node::FunctionCall(call) if !call.is_aggregate => call
                    .arguments
                    .iter()
                    .find_map(|argument| argument.ungrouped_reference(group_by)),
                _ => None,
            }
        })
    }
}

/// True if `node` alone makes up one of the GROUP BY expressions
fn is_group_key(node: &Node, group_by: &[Expression]) -> bool {
    group_by
        .iter()
        .any(|g| matches!(g.nodes.as_slice(), [key] if key == node))
}

/// Structural equality over the node sequence
impl PartialEq for Expression {
    fn eq(&self, other: &Self) -> bool {
        self.nodes == other.nodes
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.source)
    }
}

// ============================================================================
// Sources and joins
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum TableSource {
    Table {
        name: String,
        alias: Option<String>,
        /// Filled in by the resolver
        table: Option<TableId>,
        offset: usize,
    },
    SubSelect {
        select: Box<SelectStatement>,
        alias: Option<String>,
        offset: usize,
    },
}

impl TableSource {
    /// Alias if present, otherwise the intrinsic name
    pub fn canonical_name(&self) -> &str {
        match self {
            TableSource::Table { name, alias, .. } => alias.as_deref().unwrap_or(name),
            TableSource::SubSelect { alias, .. } => alias.as_deref().unwrap_or(""),
        }
    }

    pub fn alias(&self) -> Option<&str> {
        match self {
            TableSource::Table { alias, .. } | TableSource::SubSelect { alias, .. } => {
                alias.as_deref()
            }
        }
    }

    /// Base table name, `None` for sub-selects
    pub fn table_name(&self) -> Option<&str> {
        match self {
            TableSource::Table { name, .. } => Some(name),
            TableSource::SubSelect { .. } => None,
        }
    }

    pub fn offset(&self) -> usize {
        match self {
            TableSource::Table { offset, .. } | TableSource::SubSelect { offset, .. } => *offset,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
    Right,
    /// Full outer join
    Outer,
}

impl JoinKind {
    /// Keeps left rows without a match
    pub fn keeps_left(&self) -> bool {
        matches!(self, JoinKind::Left | JoinKind::Outer)
    }

    /// Keeps right rows without a match
    pub fn keeps_right(&self) -> bool {
        matches!(self, JoinKind::Right | JoinKind::Outer)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Joining {
    pub source: TableSource,
    pub kind: JoinKind,
    pub condition: Option<Expression>,
}

// ============================================================================
// Statements
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    pub expression: Expression,
    pub ascending: bool,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SelectStatement {
    pub source: String,
    pub distinct: bool,
    pub output: Vec<Expression>,
    pub from: Option<TableSource>,
    pub joins: Vec<Joining>,
    pub filter: Option<Expression>,
    pub group_by: Vec<Expression>,
    pub order_by: Vec<OrderBy>,
    pub limit: Option<usize>,
    pub offset: usize,
}

impl SelectStatement {
    /// All sources in declaration order: FROM first, then each join
    pub fn sources(&self) -> impl Iterator<Item = &TableSource> {
        self.from
            .iter()
            .chain(self.joins.iter().map(|j| &j.source))
    }

    /// True if the query aggregates rows into groups
    pub fn is_aggregate(&self) -> bool {
        !self.group_by.is_empty()
            || self.output.iter().any(|e| e.has_aggregate)
            || self.order_by.iter().any(|o| o.expression.has_aggregate)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InsertStatement {
    pub source: String,
    pub table: String,
    pub table_id: Option<TableId>,
    /// Column names as written; empty means all columns in order
    pub columns: Vec<String>,
    /// Resolved column positions
    pub positions: Vec<usize>,
    pub rows: Vec<Vec<Expression>>,
    pub offset: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub column: String,
    pub position: usize,
    pub value: Expression,
    pub offset: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpdateStatement {
    pub source: String,
    pub table: String,
    pub table_id: Option<TableId>,
    pub assignments: Vec<Assignment>,
    pub filter: Option<Expression>,
    pub offset: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeleteStatement {
    pub source: String,
    pub table: String,
    pub table_id: Option<TableId>,
    pub filter: Option<Expression>,
    pub offset: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDefinitionClause {
    pub name: String,
    pub data_type: DataType,
    pub offset: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateStatement {
    pub source: String,
    pub table: String,
    pub columns: Vec<ColumnDefinitionClause>,
    pub offset: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Select,
    Insert,
    Update,
    Delete,
    Create,
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StatementKind::Select => "SELECT",
            StatementKind::Insert => "INSERT",
            StatementKind::Update => "UPDATE",
            StatementKind::Delete => "DELETE",
            StatementKind::Create => "CREATE",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Select(Box<SelectStatement>),
    Insert(InsertStatement),
    Update(UpdateStatement),
    Delete(DeleteStatement),
    Create(CreateStatement),
}

impl Statement {
    pub fn kind(&self) -> StatementKind {
        match self {
            Statement::Select(_) => StatementKind::Select,
            Statement::Insert(_) => StatementKind::Insert,
            Statement::Update(_) => StatementKind::Update,
            Statement::Delete(_) => StatementKind::Delete,
            Statement::Create(_) => StatementKind::Create,
        }
    }

    /// Original statement text
    pub fn source(&self) -> &str {
        match self {
            Statement::Select(s) => &s.source,
            Statement::Insert(s) => &s.source,
            Statement::Update(s) => &s.source,
            Statement::Delete(s) => &s.source,
            Statement::Create(s) => &s.source,
        }
    }

    /// The statement's filter, if it has one
    pub fn filter(&self) -> Option<&Expression> {
        match self {
            Statement::Select(s) => s.filter.as_ref(),
            Statement::Update(s) => s.filter.as_ref(),
            Statement::Delete(s) => s.filter.as_ref(),
            Statement::Insert(_) | Statement::Create(_) => None,
        }
    }
}
