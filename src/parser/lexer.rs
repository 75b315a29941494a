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

//! SQL Lexer
//!
//! [`next_token`] is stateless: it lexes one token starting at a byte offset.
//! [`Lexer`] wraps it and keeps the running offset for the parser.

use crate::core::{Error, Result};

use super::token::{is_keyword, Token, TokenType, ONE_CHAR_OPERATORS, TWO_CHAR_OPERATORS};

/// Lex the token starting at `offset`
///
/// Leading whitespace is skipped and counted in the token's `input_length`.
/// Malformed number literals are a hard [`Error::Lex`]; an unterminated
/// string is returned as a token with `error` set so the parser can report
/// it with context.
pub fn next_token(input: &str, offset: usize) -> Result<Token> {
    let rest = input.get(offset..).unwrap_or("");
    let trimmed = rest.trim_start();
    let leading = rest.len() - trimmed.len();
    let start = offset + leading;

    let Some(ch) = trimmed.chars().next() else {
        return Ok(Token::end(leading));
    };

    let mut token = match ch {
        '0'..='9' => read_number(trimmed, start)?,
        '\'' => read_string_literal(trimmed),
        '"' => read_quoted_symbol(trimmed),
        c if c.is_ascii_alphabetic() || c == '_' => read_symbol(trimmed),
        ',' => Token::new(TokenType::Comma, ",", 0, 1),
        ';' => Token::new(TokenType::Semicolon, ";", 0, 1),
        '.' => Token::new(TokenType::Dot, ".", 0, 1),
        _ => read_operator(trimmed, ch),
    };

    token.leading = leading;
    token.input_length += leading;
    Ok(token)
}

/// Read a number literal: digits, an optional fraction and one exponent
fn read_number(s: &str, start: usize) -> Result<Token> {
    let bytes = s.as_bytes();
    let mut i = 0;
    let mut seen_dot = false;
    let mut seen_exponent = false;

    while i < bytes.len() {
        match bytes[i] {
            b'0'..=b'9' => i += 1,
            b'.' => {
                if seen_dot || seen_exponent {
                    return Err(Error::lex(
                        "invalid number format: unexpected '.'",
                        start + i,
                    ));
                }
                seen_dot = true;
                i += 1;
            }
            b'e' | b'E' => {
                if seen_exponent {
                    return Err(Error::lex(
                        "invalid number format: second exponent marker",
                        start + i,
                    ));
                }
                seen_exponent = true;
                i += 1;
                if i < bytes.len() && (bytes[i] == b'+' || bytes[i] == b'-') {
                    i += 1;
                }
                if i >= bytes.len() || !bytes[i].is_ascii_digit() {
                    return Err(Error::lex(
                        "invalid number format: exponent has no digits",
                        start + i,
                    ));
                }
            }
            _ => break,
        }
    }

    Ok(Token::new(TokenType::Number, &s[..i], 0, i))
}

/// Read a single-quoted string literal, resolving backslash escapes
fn read_string_literal(s: &str) -> Token {
    let mut result = String::new();
    let mut chars = s.char_indices().skip(1);

    while let Some((i, ch)) = chars.next() {
        match ch {
            '\'' => return Token::new(TokenType::String, result, 0, i + 1),
            '\\' => match chars.next() {
                Some((_, escaped @ ('\'' | '\\'))) => result.push(escaped),
                Some((_, other)) => {
                    result.push('\\');
                    result.push(other);
                }
                None => result.push('\\'),
            },
            _ => result.push(ch),
        }
    }

    // Unterminated: consume to end of input
    let mut token = Token::new(TokenType::String, result, 0, s.len());
    token.error = Some("unterminated string literal".to_string());
    token
}

/// Read a double-quoted identifier
fn read_quoted_symbol(s: &str) -> Token {
    match s[1..].find('"') {
        Some(end) => Token::new(TokenType::Symbol, &s[1..1 + end], 0, end + 2),
        None => {
            let mut token = Token::new(TokenType::Symbol, &s[1..], 0, s.len());
            token.error = Some("unterminated quoted identifier".to_string());
            token
        }
    }
}

/// Read an identifier or keyword
fn read_symbol(s: &str) -> Token {
    let end = s
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(s.len());
    let word = &s[..end];
    let upper = word.to_ascii_uppercase();

    if is_keyword(&upper) {
        Token::new(TokenType::Keyword, upper, 0, end)
    } else {
        Token::new(TokenType::Symbol, word, 0, end)
    }
}

/// Read an operator, two-character forms first
fn read_operator(s: &str, first: char) -> Token {
    if let Some(two) = s.get(..2) {
        if TWO_CHAR_OPERATORS.contains(&two) {
            return Token::new(TokenType::Operator, two, 0, 2);
        }
    }

    if ONE_CHAR_OPERATORS.contains(&first) {
        return Token::new(TokenType::Operator, first.to_string(), 0, 1);
    }

    Token::new(TokenType::None, first.to_string(), 0, first.len_utf8())
}

/// Cursor over the tokens of one input string
#[derive(Debug, Clone)]
pub struct Lexer<'a> {
    input: &'a str,
    offset: usize,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer for the given input
    pub fn new(input: &'a str) -> Self {
        Self { input, offset: 0 }
    }

    pub fn input(&self) -> &'a str {
        self.input
    }

    /// Offset of the first byte not yet consumed
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Lex the next token and return it with its start offset
    pub fn next_token(&mut self) -> Result<(usize, Token)> {
        let token = next_token(self.input, self.offset)?;
        let start = self.offset + token.leading;
        self.offset += token.input_length;
        Ok((start, token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex_all(input: &str) -> Vec<Token> {
        let mut lexer = Lexer::new(input);
        let mut tokens = Vec::new();
        loop {
            let (_, token) = lexer.next_token().unwrap();
            if token.is_end() {
                break;
            }
            tokens.push(token);
        }
        tokens
    }

    #[test]
    fn test_simple_select() {
        let tokens = lex_all("SELECT * FROM users");
        let kinds: Vec<_> = tokens.iter().map(|t| t.token_type).collect();
        assert_eq!(
            kinds,
            vec![
                TokenType::Keyword,
                TokenType::Operator,
                TokenType::Keyword,
                TokenType::Symbol
            ]
        );
        assert_eq!(tokens[3].literal, "users");
    }

    #[test]
    fn test_input_length_includes_whitespace() {
        let token = next_token("   abc", 0).unwrap();
        assert_eq!(token.leading, 3);
        assert_eq!(token.input_length, 6);
        assert_eq!(token.literal, "abc");

        let token = next_token("a  , b", 1).unwrap();
        assert_eq!(token.token_type, TokenType::Comma);
        assert_eq!(token.input_length, 3);
    }

    #[test]
    fn test_numbers() {
        for (input, literal) in [("123", "123"), ("45.67", "45.67"), ("3.1e10", "3.1e10"), ("1E-3", "1E-3")] {
            let token = next_token(input, 0).unwrap();
            assert_eq!(token.token_type, TokenType::Number);
            assert_eq!(token.literal, literal);
        }
    }

    #[test]
    fn test_malformed_numbers() {
        assert!(matches!(next_token("1.2.3", 0), Err(Error::Lex { offset: 3, .. })));
        assert!(matches!(next_token("1e5e3", 0), Err(Error::Lex { .. })));
        assert!(matches!(next_token("1e", 0), Err(Error::Lex { .. })));
        assert!(matches!(next_token("  7e+", 0), Err(Error::Lex { offset: 5, .. })));
    }

    #[test]
    fn test_string_literals() {
        let token = next_token(r"'it\'s'", 0).unwrap();
        assert_eq!(token.token_type, TokenType::String);
        assert_eq!(token.literal, "it's");
        assert_eq!(token.input_length, 7);
        assert!(token.error.is_none());

        let token = next_token("'open", 0).unwrap();
        assert_eq!(token.token_type, TokenType::String);
        assert_eq!(token.input_length, 5);
        assert!(token.error.is_some());
    }

    #[test]
    fn test_keywords_case_insensitive() {
        let token = next_token("select", 0).unwrap();
        assert_eq!(token.token_type, TokenType::Keyword);
        assert_eq!(token.literal, "SELECT");

        let token = next_token("\"select\"", 0).unwrap();
        assert_eq!(token.token_type, TokenType::Symbol);
        assert_eq!(token.literal, "select");
    }

    #[test]
    fn test_operators() {
        let tokens = lex_all("<= >= <> != || < > = + - * / ^ % ( )");
        let literals: Vec<_> = tokens.iter().map(|t| t.literal.as_str()).collect();
        assert_eq!(
            literals,
            vec!["<=", ">=", "<>", "!=", "||", "<", ">", "=", "+", "-", "*", "/", "^", "%", "(", ")"]
        );
        assert!(tokens.iter().all(|t| t.token_type == TokenType::Operator));
    }

    #[test]
    fn test_punctuation_and_unknown() {
        let tokens = lex_all("t.a, b; #");
        let kinds: Vec<_> = tokens.iter().map(|t| t.token_type).collect();
        assert_eq!(
            kinds,
            vec![
                TokenType::Symbol,
                TokenType::Dot,
                TokenType::Symbol,
                TokenType::Comma,
                TokenType::Symbol,
                TokenType::Semicolon,
                TokenType::None
            ]
        );
    }

    #[test]
    fn test_offsets_are_monotonic() {
        let mut lexer = Lexer::new("SELECT a FROM  t");
        let mut starts = Vec::new();
        loop {
            let (start, token) = lexer.next_token().unwrap();
            if token.is_end() {
                break;
            }
            starts.push(start);
        }
        assert_eq!(starts, vec![0, 7, 9, 15]);
    }
}
