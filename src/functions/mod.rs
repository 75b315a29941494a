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

//! SQL Function System
//!
//! Functions are catalog entries with one or more typed overloads
//! ([`FunctionVariant`]). Overload selection happens once, during
//! resolution; the chosen variant index is carried on the AST node and in
//! the compiled program, so nothing is looked up by name at run time.
//!
//! - [`ScalarFunction`] - evaluated once per row (UPPER, ROUND, ROWNUM, ...)
//! - [`AggregateFunction`] - accumulates over a group (COUNT, SUM, ...)

pub mod aggregate;
pub mod scalar;

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::core::{DataType, Result, Value};
use crate::storage::RowId;

pub use aggregate::{AvgFunction, CountFunction, MaxFunction, MinFunction, SumFunction};
pub use scalar::{
    AbsFunction, DateFunction, LengthFunction, LowerFunction, NowFunction, RoundFunction,
    RowIdFunction, RowNumFunction, UpperFunction,
};

/// Index of a function in the catalog
pub type FunctionId = usize;

/// Execution state a scalar function may observe
#[derive(Debug, Clone, Copy)]
pub struct FunctionContext {
    /// Number of output rows accumulated so far, the current row included
    pub row_number: usize,
    /// Storage id of the current primary row
    pub row_id: RowId,
    /// Wall clock, fixed for the whole statement
    pub now: DateTime<Utc>,
}

/// Trait for scalar functions
pub trait ScalarFunction: Send + Sync {
    /// Get the function name
    fn name(&self) -> &str;

    /// Evaluate the function with the given arguments
    fn evaluate(&self, ctx: &FunctionContext, args: &[Value]) -> Result<Value>;
}

/// Trait for aggregate functions
///
/// One instance is created per aggregate slot from the variant's factory
/// and reset before each group.
pub trait AggregateFunction: Send + Sync {
    /// Get the function name
    fn name(&self) -> &str;

    /// Accumulate one row's evaluated arguments
    fn accumulate(&mut self, args: &[Value]) -> Result<()>;

    /// Get the final result
    fn result(&self) -> Value;

    /// Return to the empty state, as if no row had been accumulated
    fn reset(&mut self);
}

/// Constructor for a fresh aggregate accumulator
pub type AggregateFactory = fn() -> Box<dyn AggregateFunction>;

/// How a variant is evaluated
#[derive(Clone)]
pub enum Implementation {
    Scalar(Arc<dyn ScalarFunction>),
    Aggregate(AggregateFactory),
}

impl fmt::Debug for Implementation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Implementation::Scalar(s) => write!(f, "Scalar({})", s.name()),
            Implementation::Aggregate(_) => write!(f, "Aggregate"),
        }
    }
}

/// One typed overload of a function
#[derive(Debug, Clone)]
pub struct FunctionVariant {
    pub arguments: Vec<DataType>,
    pub return_type: DataType,
    pub implementation: Implementation,
}

impl FunctionVariant {
    pub fn scalar(
        arguments: Vec<DataType>,
        return_type: DataType,
        function: Arc<dyn ScalarFunction>,
    ) -> Self {
        Self {
            arguments,
            return_type,
            implementation: Implementation::Scalar(function),
        }
    }

    pub fn aggregate(
        arguments: Vec<DataType>,
        return_type: DataType,
        factory: AggregateFactory,
    ) -> Self {
        Self {
            arguments,
            return_type,
            implementation: Implementation::Aggregate(factory),
        }
    }

    pub fn is_aggregate(&self) -> bool {
        matches!(self.implementation, Implementation::Aggregate(_))
    }

    /// Exact match of the argument type sequence
    pub fn accepts(&self, arguments: &[DataType]) -> bool {
        self.arguments.as_slice() == arguments
    }

    /// Match where NULL (unknown) argument types match anything
    pub fn accepts_loosely(&self, arguments: &[DataType]) -> bool {
        self.arguments.len() == arguments.len()
            && self
                .arguments
                .iter()
                .zip(arguments)
                .all(|(expected, actual)| expected.is_compatible(*actual))
    }
}

/// Function metadata: a name and its overloads in declaration order
#[derive(Debug, Clone)]
pub struct Function {
    pub name: String,
    pub variants: Vec<FunctionVariant>,
}

impl Function {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into().to_uppercase(),
            variants: Vec::new(),
        }
    }

    /// Builder-style overload registration
    pub fn variant(mut self, variant: FunctionVariant) -> Self {
        self.variants.push(variant);
        self
    }

    /// Returns true if any overload is an aggregate
    pub fn has_aggregate(&self) -> bool {
        self.variants.iter().any(FunctionVariant::is_aggregate)
    }
}

/// The functions every new catalog starts with
pub fn builtin_functions() -> Vec<Function> {
    use DataType::*;

    let rownum: Arc<dyn ScalarFunction> = Arc::new(RowNumFunction);
    let rowid: Arc<dyn ScalarFunction> = Arc::new(RowIdFunction);
    let now: Arc<dyn ScalarFunction> = Arc::new(NowFunction);
    let date: Arc<dyn ScalarFunction> = Arc::new(DateFunction);
    let lower: Arc<dyn ScalarFunction> = Arc::new(LowerFunction);
    let upper: Arc<dyn ScalarFunction> = Arc::new(UpperFunction);
    let length: Arc<dyn ScalarFunction> = Arc::new(LengthFunction);
    let abs: Arc<dyn ScalarFunction> = Arc::new(AbsFunction);
    let round: Arc<dyn ScalarFunction> = Arc::new(RoundFunction);

    let mut count = Function::new("COUNT").variant(FunctionVariant::aggregate(
        vec![],
        Number,
        CountFunction::boxed,
    ));
    for kind in [Number, Text, Boolean, Date] {
        count = count.variant(FunctionVariant::aggregate(
            vec![kind],
            Number,
            CountFunction::boxed,
        ));
    }

    let mut min = Function::new("MIN");
    let mut max = Function::new("MAX");
    for kind in [Number, Text, Date] {
        min = min.variant(FunctionVariant::aggregate(vec![kind], kind, MinFunction::boxed));
        max = max.variant(FunctionVariant::aggregate(vec![kind], kind, MaxFunction::boxed));
    }

    vec![
        Function::new("ROWNUM").variant(FunctionVariant::scalar(vec![], Number, rownum)),
        Function::new("ROWID").variant(FunctionVariant::scalar(vec![], Number, rowid)),
        Function::new("NOW").variant(FunctionVariant::scalar(vec![], Date, now)),
        Function::new("DATE").variant(FunctionVariant::scalar(vec![Text], Date, date)),
        Function::new("LOWER").variant(FunctionVariant::scalar(vec![Text], Text, lower)),
        Function::new("UPPER").variant(FunctionVariant::scalar(vec![Text], Text, upper)),
        Function::new("LENGTH").variant(FunctionVariant::scalar(vec![Text], Number, length)),
        Function::new("ABS").variant(FunctionVariant::scalar(vec![Number], Number, abs)),
        Function::new("ROUND")
            .variant(FunctionVariant::scalar(vec![Number], Number, round.clone()))
            .variant(FunctionVariant::scalar(vec![Number, Number], Number, round)),
        count,
        Function::new("SUM").variant(FunctionVariant::aggregate(
            vec![Number],
            Number,
            SumFunction::boxed,
        )),
        Function::new("AVG").variant(FunctionVariant::aggregate(
            vec![Number],
            Number,
            AvgFunction::boxed,
        )),
        min,
        max,
    ]
}
