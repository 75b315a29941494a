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

//! Statement parsing methods for the SQL Parser

use std::str::FromStr;

use crate::core::{DataType, Result};

use super::ast::*;
use super::parser::Parser;
use super::token::TokenType;

impl Parser<'_> {
    /// Parse a statement
    pub fn parse_statement(&mut self) -> Result<Statement> {
        if self.cur.is(TokenType::Keyword) {
            match self.cur.literal.as_str() {
                "SELECT" => return Ok(Statement::Select(Box::new(self.parse_select()?))),
                "INSERT" => return self.parse_insert().map(Statement::Insert),
                "UPDATE" => return self.parse_update().map(Statement::Update),
                "DELETE" => return self.parse_delete().map(Statement::Delete),
                "CREATE" => return self.parse_create().map(Statement::Create),
                _ => {}
            }
        }
        Err(self.error_here("expected SELECT, INSERT, UPDATE, DELETE or CREATE"))
    }

    // =========================================================================
    // SELECT
    // =========================================================================

    /// Parse a SELECT statement
    pub fn parse_select(&mut self) -> Result<SelectStatement> {
        let offset = self.cur_offset;
        self.expect_keyword("SELECT")?;

        let mut stmt = SelectStatement {
            offset,
            ..Default::default()
        };
        stmt.distinct = self.consume_keyword("DISTINCT")?;
        stmt.output = self.parse_output_list()?;

        if self.consume_keyword("FROM")? {
            stmt.from = Some(self.parse_table_source()?);
            while let Some(kind) = self.parse_join_kind()? {
                let source = self.parse_table_source()?;
                let condition = if self.consume_keyword("ON")? {
                    Some(self.parse_expression(false)?)
                } else {
                    None
                };
                stmt.joins.push(Joining {
                    source,
                    kind,
                    condition,
                });
            }
        }

        if self.consume_keyword("WHERE")? {
            stmt.filter = Some(self.parse_expression(false)?);
        }

        if self.consume_keyword("GROUP")? {
            self.expect_keyword("BY")?;
            stmt.group_by = self.parse_expression_list()?;
        }

        if self.consume_keyword("ORDER")? {
            self.expect_keyword("BY")?;
            loop {
                let expression = self.parse_expression(false)?;
                let ascending = if self.consume_keyword("DESC")? {
                    false
                } else {
                    self.consume_keyword("ASC")?;
                    true
                };
                stmt.order_by.push(OrderBy {
                    expression,
                    ascending,
                });
                if !self.cur.is(TokenType::Comma) {
                    break;
                }
                self.advance()?;
            }
        }

        if self.consume_keyword("LIMIT")? {
            stmt.limit = Some(self.parse_limit()?);
        }

        stmt.source = self.text(offset, self.prev_end());
        Ok(stmt)
    }

    /// Output list: expressions with optional `AS alias`, or wildcards
    fn parse_output_list(&mut self) -> Result<Vec<Expression>> {
        let mut output = Vec::new();
        loop {
            let mut expr = if self.cur.is_operator("*") {
                let offset = self.cur_offset;
                self.advance()?;
                Expression::from_reference(ColumnReference::new(None, "*", offset))
            } else {
                self.parse_expression(true)?
            };

            if self.cur.is_keyword("AS") {
                if expr.is_wildcard() {
                    return Err(self.error_here("a wildcard cannot have an alias"));
                }
                self.advance()?;
                expr.alias = Some(self.expect_symbol()?.0);
            }
            output.push(expr);

            if !self.cur.is(TokenType::Comma) {
                return Ok(output);
            }
            self.advance()?;
        }
    }

    /// A table name or a parenthesized sub-select, with an optional alias
    fn parse_table_source(&mut self) -> Result<TableSource> {
        let offset = self.cur_offset;
        let source = if self.cur.is_operator("(") && self.peek.is_keyword("SELECT") {
            self.enter()?;
            self.advance()?;
            let select = self.parse_select()?;
            self.expect_operator(")")?;
            self.leave();
            TableSource::SubSelect {
                select: Box::new(select),
                alias: None,
                offset,
            }
        } else {
            let (name, _) = self.expect_symbol()?;
            TableSource::Table {
                name,
                alias: None,
                table: None,
                offset,
            }
        };

        let alias = if self.consume_keyword("AS")? {
            Some(self.expect_symbol()?.0)
        } else if self.cur.is(TokenType::Symbol) {
            Some(self.expect_symbol()?.0)
        } else {
            None
        };

        Ok(match source {
            TableSource::Table {
                name,
                table,
                offset,
                ..
            } => TableSource::Table {
                name,
                alias,
                table,
                offset,
            },
            TableSource::SubSelect { select, offset, .. } => TableSource::SubSelect {
                select,
                alias,
                offset,
            },
        })
    }

    /// `[INNER] JOIN`, `LEFT [OUTER] JOIN`, `RIGHT [OUTER] JOIN`,
    /// `FULL [OUTER] JOIN` or `OUTER JOIN`; `None` if no join follows
    fn parse_join_kind(&mut self) -> Result<Option<JoinKind>> {
        if self.cur.is(TokenType::Keyword) {
            let kind = match self.cur.literal.as_str() {
                "JOIN" => {
                    self.advance()?;
                    return Ok(Some(JoinKind::Inner));
                }
                "INNER" => JoinKind::Inner,
                "LEFT" => JoinKind::Left,
                "RIGHT" => JoinKind::Right,
                "FULL" | "OUTER" => JoinKind::Outer,
                _ => return Ok(None),
            };
            let outer_keyword = self.cur.is_keyword("OUTER");
            self.advance()?;
            if !outer_keyword && kind != JoinKind::Inner {
                self.consume_keyword("OUTER")?;
            }
            self.expect_keyword("JOIN")?;
            return Ok(Some(kind));
        }
        Ok(None)
    }

    fn parse_expression_list(&mut self) -> Result<Vec<Expression>> {
        let mut list = vec![self.parse_expression(false)?];
        while self.cur.is(TokenType::Comma) {
            self.advance()?;
            list.push(self.parse_expression(false)?);
        }
        Ok(list)
    }

    fn parse_limit(&mut self) -> Result<usize> {
        if !self.cur.is(TokenType::Number) {
            return Err(self.error_here("LIMIT expects a row count"));
        }
        let limit = self
            .cur
            .literal
            .parse::<usize>()
            .map_err(|_| self.error_here("LIMIT expects a non-negative integer"))?;
        self.advance()?;
        Ok(limit)
    }

    // =========================================================================
    // INSERT / UPDATE / DELETE
    // =========================================================================

    /// `INSERT INTO t [(c, ...)] VALUES (v, ...) [, (v, ...)]`
    pub fn parse_insert(&mut self) -> Result<InsertStatement> {
        let offset = self.cur_offset;
        self.expect_keyword("INSERT")?;
        self.expect_keyword("INTO")?;
        let (table, _) = self.expect_symbol()?;

        let mut columns = Vec::new();
        if self.cur.is_operator("(") {
            self.advance()?;
            loop {
                columns.push(self.expect_symbol()?.0);
                if !self.cur.is(TokenType::Comma) {
                    break;
                }
                self.advance()?;
            }
            self.expect_operator(")")?;
        }

        self.expect_keyword("VALUES")?;
        let mut rows = Vec::new();
        loop {
            self.expect_operator("(")?;
            let row = self.parse_expression_list()?;
            self.expect_operator(")")?;
            rows.push(row);
            if !self.cur.is(TokenType::Comma) {
                break;
            }
            self.advance()?;
        }

        Ok(InsertStatement {
            source: self.text(offset, self.prev_end()),
            table,
            table_id: None,
            columns,
            positions: Vec::new(),
            rows,
            offset,
        })
    }

    /// `UPDATE t SET c = v [, ...] [WHERE ...]`
    pub fn parse_update(&mut self) -> Result<UpdateStatement> {
        let offset = self.cur_offset;
        self.expect_keyword("UPDATE")?;
        let (table, _) = self.expect_symbol()?;
        self.expect_keyword("SET")?;

        let mut assignments = Vec::new();
        loop {
            let (column, column_offset) = self.expect_symbol()?;
            self.expect_operator("=")?;
            let value = self.parse_expression(false)?;
            assignments.push(Assignment {
                column,
                position: 0,
                value,
                offset: column_offset,
            });
            if !self.cur.is(TokenType::Comma) {
                break;
            }
            self.advance()?;
        }

        let filter = if self.consume_keyword("WHERE")? {
            Some(self.parse_expression(false)?)
        } else {
            None
        };

        Ok(UpdateStatement {
            source: self.text(offset, self.prev_end()),
            table,
            table_id: None,
            assignments,
            filter,
            offset,
        })
    }

    /// `DELETE FROM t [WHERE ...]`
    pub fn parse_delete(&mut self) -> Result<DeleteStatement> {
        let offset = self.cur_offset;
        self.expect_keyword("DELETE")?;
        self.expect_keyword("FROM")?;
        let (table, _) = self.expect_symbol()?;
        let filter = if self.consume_keyword("WHERE")? {
            Some(self.parse_expression(false)?)
        } else {
            None
        };

        Ok(DeleteStatement {
            source: self.text(offset, self.prev_end()),
            table,
            table_id: None,
            filter,
            offset,
        })
    }

    // =========================================================================
    // CREATE TABLE
    // =========================================================================

    /// `CREATE TABLE t (name TYPE [, ...])`
    pub fn parse_create(&mut self) -> Result<CreateStatement> {
        let offset = self.cur_offset;
        self.expect_keyword("CREATE")?;
        self.expect_keyword("TABLE")?;
        let (table, _) = self.expect_symbol()?;
        self.expect_operator("(")?;

        let mut columns = Vec::new();
        loop {
            let (name, column_offset) = self.expect_symbol()?;
            let data_type = self.parse_data_type()?;
            columns.push(ColumnDefinitionClause {
                name,
                data_type,
                offset: column_offset,
            });
            if !self.cur.is(TokenType::Comma) {
                break;
            }
            self.advance()?;
        }
        self.expect_operator(")")?;

        Ok(CreateStatement {
            source: self.text(offset, self.prev_end()),
            table,
            columns,
            offset,
        })
    }

    fn parse_data_type(&mut self) -> Result<DataType> {
        let data_type = match self.cur.token_type {
            TokenType::Keyword | TokenType::Symbol => DataType::from_str(&self.cur.literal).ok(),
            _ => None,
        };
        match data_type {
            Some(data_type) if !data_type.is_null() => {
                self.advance()?;
                Ok(data_type)
            }
            _ => Err(self.error_here("expected a column type")),
        }
    }
}
