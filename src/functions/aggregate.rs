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

//! Built-in aggregate functions
//!
//! All of them skip NULL inputs. Over an empty group SUM, AVG, MIN and MAX
//! return NULL while COUNT returns 0.

use std::cmp::Ordering;

use crate::core::{Error, Result, Value};

use super::AggregateFunction;

fn first_number(name: &str, args: &[Value]) -> Result<Option<f64>> {
    match args.first() {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => Ok(Some(*n)),
        Some(other) => Err(Error::InvalidArgument(format!(
            "{} expects NUMBER, got {}",
            name,
            other.data_type()
        ))),
    }
}

// ============================================================================
// COUNT
// ============================================================================

/// COUNT() counts rows, COUNT(x) counts non-NULL values of x
#[derive(Default)]
pub struct CountFunction {
    count: u64,
}

impl CountFunction {
    pub fn boxed() -> Box<dyn AggregateFunction> {
        Box::<Self>::default()
    }
}

impl AggregateFunction for CountFunction {
    fn name(&self) -> &str {
        "COUNT"
    }

    fn accumulate(&mut self, args: &[Value]) -> Result<()> {
        match args.first() {
            Some(Value::Null) => {}
            _ => self.count += 1,
        }
        Ok(())
    }

    fn result(&self) -> Value {
        Value::Number(self.count as f64)
    }

    fn reset(&mut self) {
        self.count = 0;
    }
}

// ============================================================================
// SUM / AVG
// ============================================================================

#[derive(Default)]
pub struct SumFunction {
    sum: Option<f64>,
}

impl SumFunction {
    pub fn boxed() -> Box<dyn AggregateFunction> {
        Box::<Self>::default()
    }
}

impl AggregateFunction for SumFunction {
    fn name(&self) -> &str {
        "SUM"
    }

    fn accumulate(&mut self, args: &[Value]) -> Result<()> {
        if let Some(n) = first_number("SUM", args)? {
            self.sum = Some(self.sum.unwrap_or(0.0) + n);
        }
        Ok(())
    }

    fn result(&self) -> Value {
        self.sum.into()
    }

    fn reset(&mut self) {
        self.sum = None;
    }
}

#[derive(Default)]
pub struct AvgFunction {
    sum: f64,
    count: u64,
}

impl AvgFunction {
    pub fn boxed() -> Box<dyn AggregateFunction> {
        Box::<Self>::default()
    }
}

impl AggregateFunction for AvgFunction {
    fn name(&self) -> &str {
        "AVG"
    }

    fn accumulate(&mut self, args: &[Value]) -> Result<()> {
        if let Some(n) = first_number("AVG", args)? {
            self.sum += n;
            self.count += 1;
        }
        Ok(())
    }

    fn result(&self) -> Value {
        if self.count == 0 {
            Value::Null
        } else {
            Value::Number(self.sum / self.count as f64)
        }
    }

    fn reset(&mut self) {
        self.sum = 0.0;
        self.count = 0;
    }
}

// ============================================================================
// MIN / MAX
// ============================================================================

/// Shared state for MIN and MAX: keeps the value that wins `keep`
#[derive(Default)]
struct Extremum {
    value: Option<Value>,
}

impl Extremum {
    fn offer(&mut self, args: &[Value], keep: Ordering) {
        let Some(candidate) = args.first().filter(|v| !v.is_null()) else {
            return;
        };
        let replace = match &self.value {
            None => true,
            Some(current) => candidate.sort_cmp(current) == keep,
        };
        if replace {
            self.value = Some(candidate.clone());
        }
    }

    fn result(&self) -> Value {
        self.value.clone().unwrap_or_default()
    }
}

#[derive(Default)]
pub struct MinFunction {
    state: Extremum,
}

impl MinFunction {
    pub fn boxed() -> Box<dyn AggregateFunction> {
        Box::<Self>::default()
    }
}

impl AggregateFunction for MinFunction {
    fn name(&self) -> &str {
        "MIN"
    }

    fn accumulate(&mut self, args: &[Value]) -> Result<()> {
        self.state.offer(args, Ordering::Less);
        Ok(())
    }

    fn result(&self) -> Value {
        self.state.result()
    }

    fn reset(&mut self) {
        self.state = Extremum::default();
    }
}

#[derive(Default)]
pub struct MaxFunction {
    state: Extremum,
}

impl MaxFunction {
    pub fn boxed() -> Box<dyn AggregateFunction> {
        Box::<Self>::default()
    }
}

impl AggregateFunction for MaxFunction {
    fn name(&self) -> &str {
        "MAX"
    }

    fn accumulate(&mut self, args: &[Value]) -> Result<()> {
        self.state.offer(args, Ordering::Greater);
        Ok(())
    }

    fn result(&self) -> Value {
        self.state.result()
    }

    fn reset(&mut self) {
        self.state = Extremum::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(agg: &mut dyn AggregateFunction, values: &[Value]) {
        for v in values {
            agg.accumulate(std::slice::from_ref(v)).unwrap();
        }
    }

    #[test]
    fn test_count_rows_and_values() {
        let mut rows = CountFunction::default();
        rows.accumulate(&[]).unwrap();
        rows.accumulate(&[]).unwrap();
        assert_eq!(rows.result(), Value::from(2));

        let mut values = CountFunction::default();
        feed(&mut values, &[Value::from(1), Value::Null, Value::from(3)]);
        assert_eq!(values.result(), Value::from(2));

        values.reset();
        assert_eq!(values.result(), Value::from(0));
    }

    #[test]
    fn test_sum_avg() {
        let mut sum = SumFunction::default();
        assert_eq!(sum.result(), Value::Null);
        feed(&mut sum, &[Value::from(1), Value::from(2.5), Value::Null]);
        assert_eq!(sum.result(), Value::from(3.5));

        let mut avg = AvgFunction::default();
        feed(&mut avg, &[Value::from(1), Value::from(3)]);
        assert_eq!(avg.result(), Value::from(2));

        assert!(sum.accumulate(&[Value::from("x")]).is_err());
    }

    #[test]
    fn test_min_max() {
        let mut min = MinFunction::default();
        let mut max = MaxFunction::default();
        let values = [Value::from("pear"), Value::from("apple"), Value::Null, Value::from("zoo")];
        feed(&mut min, &values);
        feed(&mut max, &values);
        assert_eq!(min.result(), Value::from("apple"));
        assert_eq!(max.result(), Value::from("zoo"));

        let empty = MinFunction::default();
        assert_eq!(empty.result(), Value::Null);
    }
}
