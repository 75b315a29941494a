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

//! SQL Parser - Main Parser struct and token plumbing
//!
//! Statement and expression grammar live in `statements.rs` and
//! `expressions.rs` as further `impl Parser` blocks.

use crate::core::{Error, Result};

use super::ast::Statement;
use super::lexer::Lexer;
use super::token::{Token, TokenType};

/// Parser switches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserOptions {
    /// Permit `(SELECT ...)` in expression position
    pub allow_subselect_values: bool,
    /// Maximum depth of nested parentheses and sub-selects
    pub max_nesting_depth: usize,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            allow_subselect_values: true,
            max_nesting_depth: 32,
        }
    }
}

/// Recursive-descent SQL parser with one token of lookahead
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    /// Current token being examined
    pub(crate) cur: Token,
    /// Byte offset of the current token
    pub(crate) cur_offset: usize,
    /// Next token (peek)
    pub(crate) peek: Token,
    peek_offset: usize,
    /// End offset of the last consumed token
    prev_end: usize,
    pub(crate) options: ParserOptions,
    depth: usize,
}

impl<'a> Parser<'a> {
    /// Create a new parser for the given input
    pub fn new(input: &'a str, options: ParserOptions) -> Result<Self> {
        let mut lexer = Lexer::new(input);
        let (cur_offset, cur) = lexer.next_token()?;
        let (peek_offset, peek) = lexer.next_token()?;

        let parser = Parser {
            lexer,
            cur,
            cur_offset,
            peek,
            peek_offset,
            prev_end: 0,
            options,
            depth: 0,
        };
        parser.check_current()?;
        Ok(parser)
    }

    /// Parse exactly one statement, optionally followed by `;`
    pub fn parse_single(&mut self) -> Result<Statement> {
        let statement = self.parse_statement()?;
        if self.cur.is(TokenType::Semicolon) {
            self.advance()?;
        }
        if !self.cur.is_end() {
            return Err(self.error_here("expected end of statement"));
        }
        Ok(statement)
    }

    // =========================================================================
    // Token plumbing
    // =========================================================================

    /// Move to the next token
    pub(crate) fn advance(&mut self) -> Result<()> {
        self.prev_end = self.cur_offset + (self.cur.input_length - self.cur.leading);
        let (offset, token) = self.lexer.next_token()?;
        self.cur = std::mem::replace(&mut self.peek, token);
        self.cur_offset = std::mem::replace(&mut self.peek_offset, offset);
        self.check_current()
    }

    /// Report lexer problems deferred to the parser
    fn check_current(&self) -> Result<()> {
        if let Some(message) = &self.cur.error {
            return Err(Error::parse(message.clone(), self.cur_offset, self.cur.literal.clone()));
        }
        if self.cur.is(TokenType::None) {
            return Err(self.error_here("unexpected character"));
        }
        Ok(())
    }

    /// End offset of the last consumed token
    pub(crate) fn prev_end(&self) -> usize {
        self.prev_end
    }

    /// Source text between two offsets
    pub(crate) fn text(&self, start: usize, end: usize) -> String {
        self.lexer
            .input()
            .get(start..end)
            .unwrap_or("")
            .trim()
            .to_string()
    }

    pub(crate) fn error_here(&self, message: impl Into<String>) -> Error {
        Error::parse(message, self.cur_offset, self.cur.to_string())
    }

    /// Advance past `keyword` if it is the current token
    pub(crate) fn consume_keyword(&mut self, keyword: &str) -> Result<bool> {
        if self.cur.is_keyword(keyword) {
            self.advance()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    pub(crate) fn expect_keyword(&mut self, keyword: &str) -> Result<()> {
        if !self.consume_keyword(keyword)? {
            return Err(self.error_here(format!("expected {}", keyword)));
        }
        Ok(())
    }

    pub(crate) fn expect_operator(&mut self, op: &str) -> Result<()> {
        if !self.cur.is_operator(op) {
            return Err(self.error_here(format!("expected '{}'", op)));
        }
        self.advance()
    }

    /// Consume an identifier and return it with its offset
    pub(crate) fn expect_symbol(&mut self) -> Result<(String, usize)> {
        if !self.cur.is_identifier() {
            return Err(self.error_here("expected identifier"));
        }
        let symbol = (self.cur.identifier(), self.cur_offset);
        self.advance()?;
        Ok(symbol)
    }

    /// Enter one level of parenthesis or sub-select nesting
    pub(crate) fn enter(&mut self) -> Result<()> {
        self.depth += 1;
        if self.depth > self.options.max_nesting_depth {
            return Err(self.error_here(format!(
                "nesting deeper than {} levels",
                self.options.max_nesting_depth
            )));
        }
        Ok(())
    }

    pub(crate) fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }
}
