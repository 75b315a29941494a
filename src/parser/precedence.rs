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

//! Operator precedence and linearization of flat expressions
//!
//! [`postfix`] turns an expression's node list into postfix order. Both the
//! resolver (static typing) and the compiler (instruction emission) walk
//! that order, so they always agree on how an expression groups.
//!
//! Multiplicative operators (`* / % ^`) reduce eagerly: the operand that
//! follows is emitted immediately, then the operator. Every other operator
//! waits on a stack and is emitted once an operator of lower or equal
//! precedence arrives, or when the scope ends (LIFO).

use smallvec::SmallVec;

use crate::core::{DataType, Error, Operator, Result};

use super::ast::Node;

/// Precedence levels (higher number = higher precedence)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
#[repr(u8)]
pub enum Precedence {
    #[default]
    Lowest = 1,
    /// OR
    Or = 2,
    /// AND
    And = 3,
    /// =, <>, <, >, <=, >=
    Comparison = 4,
    /// +, -, ||
    Sum = 5,
    /// *, /, %, ^
    Product = 6,
}

impl Precedence {
    pub fn for_operator(op: Operator) -> Precedence {
        match op {
            Operator::Or => Precedence::Or,
            Operator::And => Precedence::And,
            Operator::Equal
            | Operator::NotEqual
            | Operator::Less
            | Operator::More
            | Operator::LessEqual
            | Operator::MoreEqual => Precedence::Comparison,
            Operator::Plus | Operator::Minus | Operator::Concat => Precedence::Sum,
            Operator::Multiply | Operator::Divide | Operator::Remainder | Operator::Power => {
                Precedence::Product
            }
        }
    }
}

/// One step of a linearized expression
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Postfix {
    /// Index of a value node
    Operand(usize),
    Operator(Operator),
}

/// Linearize `nodes` into postfix order
pub fn postfix(nodes: &[Node]) -> Result<Vec<Postfix>> {
    let mut out = Vec::with_capacity(nodes.len());
    let end = linearize(nodes, 0, false, &mut out)?;
    debug_assert_eq!(end, nodes.len());
    Ok(out)
}

/// Linearize one scope starting at `i`; returns the index after the scope
/// (after its `)` when `nested`)
fn linearize(nodes: &[Node], mut i: usize, nested: bool, out: &mut Vec<Postfix>) -> Result<usize> {
    let mut operators: SmallVec<[Operator; 8]> = SmallVec::new();
    let mut last_was_value = false;
    let mut closed = false;

    while i < nodes.len() {
        match &nodes[i] {
            Node::RightParen => {
                if !nested {
                    return Err(Error::internal("unbalanced ')' in expression"));
                }
                i += 1;
                closed = true;
                break;
            }
            Node::Operator(op) => {
                if !last_was_value {
                    return Err(Error::internal(format!("operator '{}' has no left operand", op)));
                }
                if op.is_multiplicative() {
                    i = operand(nodes, i + 1, out)?;
                    out.push(Postfix::Operator(*op));
                    continue;
                }
                let incoming = Precedence::for_operator(*op);
                while let Some(top) = operators.last().copied() {
                    if Precedence::for_operator(top) < incoming {
                        break;
                    }
                    operators.pop();
                    out.push(Postfix::Operator(top));
                }
                operators.push(*op);
                last_was_value = false;
                i += 1;
            }
            _ => {
                if last_was_value {
                    return Err(Error::internal("two operands without an operator"));
                }
                i = operand(nodes, i, out)?;
                last_was_value = true;
            }
        }
    }

    if nested && !closed {
        return Err(Error::internal("unclosed '(' in expression"));
    }
    if !last_was_value {
        return Err(Error::internal("expression ends without an operand"));
    }
    while let Some(op) = operators.pop() {
        out.push(Postfix::Operator(op));
    }
    Ok(i)
}

/// Emit one operand: a value node or a parenthesized scope
fn operand(nodes: &[Node], i: usize, out: &mut Vec<Postfix>) -> Result<usize> {
    match nodes.get(i) {
        Some(Node::LeftParen) => linearize(nodes, i + 1, true, out),
        Some(node) if node.is_value() => {
            out.push(Postfix::Operand(i));
            Ok(i + 1)
        }
        _ => Err(Error::internal("expected an operand")),
    }
}

/// Fold the static type of `nodes`, given the type of each value node
///
/// Operands of incompatible kinds fail with [`Error::TypeMismatch`];
/// `Null` is compatible with everything.
pub fn infer_type(nodes: &[Node], mut operand_type: impl FnMut(&Node) -> DataType) -> Result<DataType> {
    let mut stack: SmallVec<[DataType; 8]> = SmallVec::new();
    for step in postfix(nodes)? {
        match step {
            Postfix::Operand(i) => stack.push(operand_type(&nodes[i])),
            Postfix::Operator(op) => {
                let (Some(right), Some(left)) = (stack.pop(), stack.pop()) else {
                    return Err(Error::internal("type stack underflow"));
                };
                let result = op
                    .result_type(left, right)
                    .map_err(|_| Error::type_mismatch(op.to_string(), left, right))?;
                stack.push(result);
            }
        }
    }
    match (stack.pop(), stack.is_empty()) {
        (Some(data_type), true) => Ok(data_type),
        _ => Err(Error::internal("type stack not balanced")),
    }
}
