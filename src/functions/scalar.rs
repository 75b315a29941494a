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

//! Built-in scalar functions
//!
//! Arguments arrive already type-checked by overload resolution, except
//! that any of them may be NULL. A NULL argument yields NULL.

use crate::core::{parse_date, Error, Result, Value};

use super::{FunctionContext, ScalarFunction};

macro_rules! null_in_null_out {
    ($args:expr) => {
        if $args.iter().any(Value::is_null) {
            return Ok(Value::Null);
        }
    };
}

fn text_arg<'a>(name: &str, args: &'a [Value], index: usize) -> Result<&'a str> {
    args.get(index).and_then(Value::as_str).ok_or_else(|| {
        Error::InvalidArgument(format!("{} expects TEXT as argument {}", name, index + 1))
    })
}

fn number_arg(name: &str, args: &[Value], index: usize) -> Result<f64> {
    args.get(index).and_then(Value::as_number).ok_or_else(|| {
        Error::InvalidArgument(format!("{} expects NUMBER as argument {}", name, index + 1))
    })
}

// ============================================================================
// Row position
// ============================================================================

/// ROWNUM() - 1-based position of the row in the output being built
pub struct RowNumFunction;

impl ScalarFunction for RowNumFunction {
    fn name(&self) -> &str {
        "ROWNUM"
    }

    fn evaluate(&self, ctx: &FunctionContext, _args: &[Value]) -> Result<Value> {
        Ok(Value::Number(ctx.row_number as f64))
    }
}

/// ROWID() - storage id of the current primary row
pub struct RowIdFunction;

impl ScalarFunction for RowIdFunction {
    fn name(&self) -> &str {
        "ROWID"
    }

    fn evaluate(&self, ctx: &FunctionContext, _args: &[Value]) -> Result<Value> {
        Ok(Value::Number(ctx.row_id as f64))
    }
}

// ============================================================================
// Date
// ============================================================================

pub struct NowFunction;

impl ScalarFunction for NowFunction {
    fn name(&self) -> &str {
        "NOW"
    }

    fn evaluate(&self, ctx: &FunctionContext, _args: &[Value]) -> Result<Value> {
        Ok(Value::Date(ctx.now))
    }
}

/// DATE(text) - parse a date or date-time literal
pub struct DateFunction;

impl ScalarFunction for DateFunction {
    fn name(&self) -> &str {
        "DATE"
    }

    fn evaluate(&self, _ctx: &FunctionContext, args: &[Value]) -> Result<Value> {
        null_in_null_out!(args);
        let text = text_arg("DATE", args, 0)?;
        parse_date(text).map(Value::Date)
    }
}

// ============================================================================
// Text
// ============================================================================

pub struct LowerFunction;

impl ScalarFunction for LowerFunction {
    fn name(&self) -> &str {
        "LOWER"
    }

    fn evaluate(&self, _ctx: &FunctionContext, args: &[Value]) -> Result<Value> {
        null_in_null_out!(args);
        Ok(Value::text(text_arg("LOWER", args, 0)?.to_lowercase()))
    }
}

pub struct UpperFunction;

impl ScalarFunction for UpperFunction {
    fn name(&self) -> &str {
        "UPPER"
    }

    fn evaluate(&self, _ctx: &FunctionContext, args: &[Value]) -> Result<Value> {
        null_in_null_out!(args);
        Ok(Value::text(text_arg("UPPER", args, 0)?.to_uppercase()))
    }
}

/// LENGTH(text) - number of characters
pub struct LengthFunction;

impl ScalarFunction for LengthFunction {
    fn name(&self) -> &str {
        "LENGTH"
    }

    fn evaluate(&self, _ctx: &FunctionContext, args: &[Value]) -> Result<Value> {
        null_in_null_out!(args);
        let text = text_arg("LENGTH", args, 0)?;
        Ok(Value::Number(text.chars().count() as f64))
    }
}

// ============================================================================
// Math
// ============================================================================

pub struct AbsFunction;

impl ScalarFunction for AbsFunction {
    fn name(&self) -> &str {
        "ABS"
    }

    fn evaluate(&self, _ctx: &FunctionContext, args: &[Value]) -> Result<Value> {
        null_in_null_out!(args);
        Ok(Value::Number(number_arg("ABS", args, 0)?.abs()))
    }
}

/// ROUND(n) or ROUND(n, places)
pub struct RoundFunction;

impl ScalarFunction for RoundFunction {
    fn name(&self) -> &str {
        "ROUND"
    }

    fn evaluate(&self, _ctx: &FunctionContext, args: &[Value]) -> Result<Value> {
        null_in_null_out!(args);
        let value = number_arg("ROUND", args, 0)?;
        if args.len() < 2 {
            return Ok(Value::Number(value.round()));
        }

        let places = number_arg("ROUND", args, 1)?;
        if places.fract() != 0.0 {
            return Err(Error::InvalidArgument(
                "ROUND expects a whole number of decimal places".to_string(),
            ));
        }
        let factor = 10f64.powi(places as i32);
        Ok(Value::Number((value * factor).round() / factor))
    }
}
