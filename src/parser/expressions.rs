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

//! Expression parsing methods for the SQL Parser
//!
//! Expressions are collected as flat node lists. Values and operators must
//! alternate; parentheses become explicit markers and are checked for
//! balance here, so later stages can assume well-formed input.

use crate::core::{Error, Operator, Result};

use super::ast::*;
use super::parser::Parser;
use super::token::TokenType;

impl Parser<'_> {
    /// Parse one expression; `allow_wildcard` permits a lone `t.*`
    pub fn parse_expression(&mut self, allow_wildcard: bool) -> Result<Expression> {
        let offset = self.cur_offset;
        let mut expr = Expression::new(offset);
        self.parse_sub_expression(&mut expr.nodes, false)?;
        expr.source = self.text(offset, self.prev_end());

        if expr.contains_wildcard() && !(allow_wildcard && expr.is_wildcard()) {
            return Err(Error::parse(
                "a wildcard must stand alone in the output list",
                offset,
                expr.source.clone(),
            ));
        }
        Ok(expr)
    }

    /// Collect nodes until a terminator, or until the `)` closing this
    /// scope when `nested` (the `)` is consumed but not pushed)
    pub(crate) fn parse_sub_expression(&mut self, nodes: &mut Vec<Node>, nested: bool) -> Result<()> {
        let mut last_was_operator = true;

        loop {
            match self.cur.token_type {
                TokenType::Number => {
                    self.expect_operand(last_was_operator)?;
                    nodes.push(Node::Number(self.number_literal()?));
                    self.advance()?;
                }
                TokenType::String => {
                    self.expect_operand(last_was_operator)?;
                    nodes.push(Node::String(self.cur.literal.clone()));
                    self.advance()?;
                }
                TokenType::Symbol => {
                    self.expect_operand(last_was_operator)?;
                    nodes.push(Node::Reference(self.parse_reference()?));
                }
                TokenType::Keyword => match self.cur.literal.as_str() {
                    "NULL" | "TRUE" | "FALSE" => {
                        self.expect_operand(last_was_operator)?;
                        nodes.push(match self.cur.literal.as_str() {
                            "NULL" => Node::Null,
                            "TRUE" => Node::Boolean(true),
                            _ => Node::Boolean(false),
                        });
                        self.advance()?;
                    }
                    "AND" | "OR" => {
                        self.push_operator(nodes, last_was_operator)?;
                        last_was_operator = true;
                        continue;
                    }
                    "SELECT" => {
                        return Err(self.error_here("a sub-select must be parenthesized"));
                    }
                    // Keywords that double as function names: DATE(...)
                    _ if last_was_operator && self.peek.is_operator("(") => {
                        let name = self.cur.literal.clone();
                        nodes.push(Node::Reference(ColumnReference::new(None, name, self.cur_offset)));
                        self.advance()?;
                    }
                    // ... and names of columns or tables: `date`, `t.text`
                    _ if self.cur.is_identifier() => {
                        self.expect_operand(last_was_operator)?;
                        nodes.push(Node::Reference(self.parse_reference()?));
                    }
                    _ => break,
                },
                TokenType::Operator => match self.cur.literal.as_str() {
                    "(" => {
                        if !last_was_operator {
                            self.parse_call(nodes)?;
                        } else if self.peek.is_keyword("SELECT") {
                            self.parse_subselect_value(nodes)?;
                        } else {
                            self.enter()?;
                            self.advance()?;
                            nodes.push(Node::LeftParen);
                            self.parse_sub_expression(nodes, true)?;
                            nodes.push(Node::RightParen);
                            self.leave();
                        }
                    }
                    ")" => {
                        if !nested {
                            break;
                        }
                        if last_was_operator {
                            return Err(self.error_here("expected an expression before ')'"));
                        }
                        return self.advance();
                    }
                    "-" if last_was_operator && self.peek.is(TokenType::Number) => {
                        self.advance()?;
                        nodes.push(Node::Number(-self.number_literal()?));
                        self.advance()?;
                    }
                    "*" if last_was_operator => {
                        return Err(self.error_here("unexpected '*'"));
                    }
                    _ => {
                        self.push_operator(nodes, last_was_operator)?;
                        last_was_operator = true;
                        continue;
                    }
                },
                _ => break,
            }
            last_was_operator = false;
        }

        if nested {
            return Err(self.error_here("expected ')'"));
        }
        if last_was_operator {
            return Err(self.error_here("expected an expression"));
        }
        Ok(())
    }

    fn expect_operand(&self, last_was_operator: bool) -> Result<()> {
        if last_was_operator {
            Ok(())
        } else {
            Err(self.error_here("expected an operator"))
        }
    }

    fn push_operator(&mut self, nodes: &mut Vec<Node>, last_was_operator: bool) -> Result<()> {
        if last_was_operator {
            return Err(self.error_here("expected an expression"));
        }
        let op = Operator::from_symbol(&self.cur.literal)
            .ok_or_else(|| self.error_here("unknown operator"))?;
        nodes.push(Node::Operator(op));
        self.advance()
    }

    fn number_literal(&self) -> Result<f64> {
        self.cur
            .literal
            .parse::<f64>()
            .map_err(|_| Error::lex(format!("invalid number '{}'", self.cur.literal), self.cur_offset))
    }

    /// `column`, `table.column` or `table.*`
    fn parse_reference(&mut self) -> Result<ColumnReference> {
        let offset = self.cur_offset;
        let first = self.cur.identifier();
        self.advance()?;

        if !self.cur.is(TokenType::Dot) {
            return Ok(ColumnReference::new(None, first, offset));
        }
        self.advance()?;
        let column = if self.cur.is_operator("*") {
            self.advance()?;
            "*".to_string()
        } else {
            self.expect_symbol()?.0
        };
        Ok(ColumnReference::new(Some(first), column, offset))
    }

    /// `(` directly after a value: a call of the bare name before it
    fn parse_call(&mut self, nodes: &mut Vec<Node>) -> Result<()> {
        let (name, offset) = match nodes.last() {
            Some(Node::Reference(r)) if r.table.is_none() && !r.is_wildcard() => {
                (r.column.clone(), r.offset)
            }
            _ => return Err(self.error_here("unexpected '('")),
        };
        nodes.pop();

        self.enter()?;
        self.advance()?;
        let mut arguments = Vec::new();
        if self.cur.is_operator(")") {
            self.advance()?;
        } else if self.cur.is_operator("*") && self.peek.is_operator(")") {
            // COUNT(*) counts rows, like COUNT()
            self.advance()?;
            self.advance()?;
        } else {
            loop {
                arguments.push(self.parse_expression(false)?);
                if !self.cur.is(TokenType::Comma) {
                    break;
                }
                self.advance()?;
            }
            self.expect_operator(")")?;
        }
        self.leave();

        nodes.push(Node::FunctionCall(FunctionCall::new(name, arguments, offset)));
        Ok(())
    }

    /// `(SELECT ...)` in value position
    fn parse_subselect_value(&mut self, nodes: &mut Vec<Node>) -> Result<()> {
        if !self.options.allow_subselect_values {
            return Err(self.error_here("sub-selects are not allowed as values"));
        }
        self.enter()?;
        self.advance()?;
        let select = self.parse_select()?;
        self.expect_operator(")")?;
        self.leave();
        nodes.push(Node::SubSelect(Box::new(select)));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::parser::{parse, ParserOptions};

    use super::*;

    fn output(sql: &str) -> Expression {
        match parse(sql, &ParserOptions::default()).unwrap() {
            Statement::Select(mut s) => s.output.remove(0),
            _ => panic!("expected SELECT"),
        }
    }

    fn parse_err(sql: &str) -> Error {
        parse(sql, &ParserOptions::default()).unwrap_err()
    }

    #[test]
    fn test_flat_nodes() {
        let expr = output("SELECT (a + 2) * 3 FROM t");
        assert_eq!(expr.nodes.len(), 7);
        assert_eq!(expr.nodes[0], Node::LeftParen);
        assert_eq!(expr.nodes[4], Node::RightParen);
        assert_eq!(expr.nodes[5], Node::Operator(Operator::Multiply));
        assert_eq!(expr.source, "(a + 2) * 3");
    }

    #[test]
    fn test_negative_literal() {
        let expr = output("SELECT -2 - -3");
        assert_eq!(
            expr.nodes,
            vec![
                Node::Number(-2.0),
                Node::Operator(Operator::Minus),
                Node::Number(-3.0)
            ]
        );
    }

    #[test]
    fn test_function_calls() {
        let expr = output("SELECT round(price * 2, 1) FROM t");
        let Node::FunctionCall(call) = &expr.nodes[0] else {
            panic!("expected call");
        };
        assert_eq!(call.name, "ROUND");
        assert_eq!(call.arguments.len(), 2);
        assert_eq!(call.arguments[0].source, "price * 2");

        let expr = output("SELECT COUNT(*) FROM t");
        let Node::FunctionCall(call) = &expr.nodes[0] else {
            panic!("expected call");
        };
        assert!(call.arguments.is_empty());

        let expr = output("SELECT DATE('2024-01-01')");
        assert!(matches!(&expr.nodes[0], Node::FunctionCall(c) if c.name == "DATE"));
    }

    #[test]
    fn test_qualified_references() {
        let expr = output("SELECT t.a || 'x' FROM t");
        let Node::Reference(r) = &expr.nodes[0] else {
            panic!("expected reference");
        };
        assert_eq!(r.table.as_deref(), Some("t"));
        assert_eq!(r.column, "a");
        assert!(output("SELECT t.* FROM t").is_wildcard());
    }

    #[test]
    fn test_subselect_values() {
        let expr = output("SELECT (SELECT MAX(a) FROM t) + 1");
        assert!(matches!(expr.nodes[0], Node::SubSelect(_)));

        let options = ParserOptions {
            allow_subselect_values: false,
            ..Default::default()
        };
        assert!(parse("SELECT (SELECT 1)", &options).unwrap_err().is_parse_error());
    }

    #[test]
    fn test_malformed_expressions() {
        assert!(matches!(parse_err("SELECT 1 +"), Error::Parse { .. }));
        assert!(matches!(parse_err("SELECT (1 + 2"), Error::Parse { .. }));
        assert!(matches!(parse_err("SELECT 1 + 2)"), Error::Parse { .. }));
        assert!(matches!(parse_err("SELECT a b c"), Error::Parse { .. }));
        assert!(matches!(parse_err("SELECT 1 * * 2"), Error::Parse { .. }));
        assert!(matches!(parse_err("SELECT ()"), Error::Parse { .. }));
        assert!(matches!(parse_err("SELECT t.* + 1 FROM t"), Error::Parse { .. }));
        assert!(matches!(parse_err("SELECT a FROM t WHERE t.*"), Error::Parse { .. }));
        assert!(matches!(parse_err("SELECT 1.2.3"), Error::Lex { .. }));
    }

    #[test]
    fn test_nesting_limit() {
        let options = ParserOptions {
            max_nesting_depth: 3,
            ..Default::default()
        };
        assert!(parse("SELECT ((1))", &options).is_ok());
        assert!(parse("SELECT ((((1))))", &options).unwrap_err().is_parse_error());
    }
}
