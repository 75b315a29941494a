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

//! Token types for SQL lexer
//!
//! Tokens do not carry absolute positions. Each one records how many bytes
//! of input it consumed, leading whitespace included, and callers add that
//! to their running offset.

use rustc_hash::FxHashSet;
use std::fmt;
use std::sync::LazyLock;

/// TokenType represents the type of a token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenType {
    /// Number literal (123, 4.5, 1e10)
    Number,
    /// String literal ('hello'), literal holds the unescaped content
    String,
    /// Identifier (table name, column name, function name)
    Symbol,
    /// SQL keyword, literal is upper-cased
    Keyword,
    /// Operator, including parentheses
    Operator,
    Comma,
    Semicolon,
    Dot,
    /// End of input
    End,
    /// Unknown character
    None,
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenType::Number => write!(f, "NUMBER"),
            TokenType::String => write!(f, "STRING"),
            TokenType::Symbol => write!(f, "SYMBOL"),
            TokenType::Keyword => write!(f, "KEYWORD"),
            TokenType::Operator => write!(f, "OPERATOR"),
            TokenType::Comma => write!(f, "COMMA"),
            TokenType::Semicolon => write!(f, "SEMICOLON"),
            TokenType::Dot => write!(f, "DOT"),
            TokenType::End => write!(f, "END"),
            TokenType::None => write!(f, "NONE"),
        }
    }
}

/// Token represents a lexical token
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// The type of the token
    pub token_type: TokenType,
    /// The literal value
    pub literal: String,
    /// Bytes consumed from the starting offset, including skipped whitespace
    pub input_length: usize,
    /// Bytes of whitespace skipped before the token
    pub leading: usize,
    /// Deferred error (unterminated string), reported by the parser
    pub error: Option<String>,
}

impl Token {
    /// Create a new token
    pub fn new(
        token_type: TokenType,
        literal: impl Into<String>,
        leading: usize,
        input_length: usize,
    ) -> Self {
        Self {
            token_type,
            literal: literal.into(),
            input_length,
            leading,
            error: None,
        }
    }

    /// Create an end-of-input token
    pub fn end(leading: usize) -> Self {
        Self::new(TokenType::End, "", leading, leading)
    }

    pub fn is_end(&self) -> bool {
        self.token_type == TokenType::End
    }

    /// Check if this is a keyword with the given value (case-insensitive)
    pub fn is_keyword(&self, keyword: &str) -> bool {
        self.token_type == TokenType::Keyword && self.literal.eq_ignore_ascii_case(keyword)
    }

    /// Check if this is an operator with the given value
    pub fn is_operator(&self, op: &str) -> bool {
        self.token_type == TokenType::Operator && self.literal == op
    }

    /// Check if this token can name a table, column or alias
    pub fn is_identifier(&self) -> bool {
        match self.token_type {
            TokenType::Symbol => true,
            TokenType::Keyword => TYPE_KEYWORDS.contains(&self.literal.as_str()),
            _ => false,
        }
    }

    /// Identifier text; keywords used as identifiers read in lower case
    pub fn identifier(&self) -> String {
        match self.token_type {
            TokenType::Keyword => self.literal.to_ascii_lowercase(),
            _ => self.literal.clone(),
        }
    }

    /// Check if this is one of the structural punctuation tokens
    pub fn is(&self, token_type: TokenType) -> bool {
        self.token_type == token_type
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.token_type {
            TokenType::End => write!(f, "end of input"),
            TokenType::String => write!(f, "'{}'", self.literal),
            _ => write!(f, "{}", self.literal),
        }
    }
}

/// SQL keywords (case-insensitive)
pub static KEYWORDS: &[&str] = &[
    "SELECT", "FROM", "WHERE", "INSERT", "INTO", "VALUES", "UPDATE", "SET", "DELETE", "CREATE",
    "TABLE", "JOIN", "INNER", "LEFT", "RIGHT", "OUTER", "FULL", "ON", "AND", "OR", "AS", "ORDER",
    "GROUP", "BY", "ASC", "DESC", "DISTINCT", "NULL", "TRUE", "FALSE", "LIMIT", "TEXT", "INT",
    "INTEGER", "NUMBER", "DATE", "DATETIME", "BOOL", "BOOLEAN",
];

static KEYWORD_SET: LazyLock<FxHashSet<&'static str>> =
    LazyLock::new(|| KEYWORDS.iter().copied().collect());

/// Check if an (upper-cased) word is a keyword
pub fn is_keyword(word: &str) -> bool {
    KEYWORD_SET.contains(word)
}

/// Column type keywords; unlike the other keywords they may also name
/// tables, columns and aliases
pub static TYPE_KEYWORDS: &[&str] = &[
    "TEXT", "INT", "INTEGER", "NUMBER", "DATE", "DATETIME", "BOOL", "BOOLEAN",
];

/// Operators the lexer recognizes, two-character forms first
pub static TWO_CHAR_OPERATORS: &[&str] = &["<=", ">=", "<>", "!=", "||"];

pub static ONE_CHAR_OPERATORS: &[char] = &['+', '-', '*', '/', '^', '%', '=', '<', '>', '(', ')'];
