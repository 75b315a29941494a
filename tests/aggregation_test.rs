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
//! Aggregation Tests
//!
//! Aggregates with and without GROUP BY, and the grouping rules

use wooby::{DataType, Database, Error, Output, Value};

fn setup() -> Database {
    let mut db = Database::new();
    db.execute("CREATE TABLE sales (region TEXT, amount NUMBER, rep TEXT)")
        .expect("Failed to create sales table");
    db.execute(
        "INSERT INTO sales VALUES \
         ('north', 10, 'ann'), ('south', 20, 'bo'), ('north', 30, 'cy'), \
         ('east', 5, 'ann'), ('south', NULL, 'di')",
    )
    .expect("Failed to insert sales");
    db.execute("CREATE TABLE nothing (amount NUMBER)")
        .expect("Failed to create empty table");
    db
}

fn column(output: &Output, index: usize) -> Vec<Value> {
    output.rows.iter().map(|r| r.values[index].clone()).collect()
}

#[test]
fn test_aggregates_without_grouping() {
    let db = setup();
    let output = db
        .query("SELECT COUNT(), COUNT(amount), SUM(amount), AVG(amount), MIN(amount), MAX(rep) FROM sales")
        .unwrap();
    assert_eq!(output.len(), 1);
    assert_eq!(
        output.rows[0].values,
        vec![
            Value::from(5),
            Value::from(4),
            Value::from(65),
            Value::from(16.25),
            Value::from(5),
            Value::from("di"),
        ]
    );
    assert_eq!(output.columns[5].data_type, DataType::Text);
}

#[test]
fn test_group_by_first_seen_order() {
    let db = setup();
    let output = db
        .query("SELECT region, COUNT() AS n, SUM(amount) AS total FROM sales GROUP BY region")
        .unwrap();
    assert_eq!(
        column(&output, 0),
        vec![Value::from("north"), Value::from("south"), Value::from("east")]
    );
    assert_eq!(column(&output, 1), vec![Value::from(2), Value::from(2), Value::from(1)]);
    assert_eq!(column(&output, 2), vec![Value::from(40), Value::from(20), Value::from(5)]);
}

#[test]
fn test_group_by_with_filter_and_order() {
    let db = setup();
    let output = db
        .query(
            "SELECT region, SUM(amount) AS total FROM sales WHERE amount > 5 \
             GROUP BY region ORDER BY total DESC",
        )
        .unwrap();
    assert_eq!(
        output.rows.iter().map(|r| r.values.clone()).collect::<Vec<_>>(),
        vec![
            vec![Value::from("north"), Value::from(40)],
            vec![Value::from("south"), Value::from(20)],
        ]
    );
}

#[test]
fn test_expressions_over_groups() {
    let db = setup();
    let output = db
        .query("SELECT UPPER(region) AS r, ROUND(AVG(amount)) + 1 AS a FROM sales GROUP BY region")
        .unwrap();
    assert_eq!(output.rows[0].values, vec![Value::from("NORTH"), Value::from(21)]);
}

#[test]
fn test_group_by_multiple_keys() {
    let db = setup();
    let output = db
        .query("SELECT rep, region, COUNT() FROM sales GROUP BY rep, region")
        .unwrap();
    assert_eq!(output.len(), 5);
    let output = db
        .query("SELECT rep, COUNT() FROM sales GROUP BY rep")
        .unwrap();
    assert_eq!(output.rows[0].values, vec![Value::from("ann"), Value::from(2)]);
}

#[test]
fn test_non_grouped_column_is_rejected() {
    let db = setup();
    let err = db
        .query("SELECT region, rep FROM sales GROUP BY region")
        .unwrap_err();
    assert!(matches!(err, Error::AggregateMisuse(_)));

    let err = db.query("SELECT region, COUNT() FROM sales").unwrap_err();
    assert!(matches!(err, Error::AggregateMisuse(_)));

    let err = db
        .query("SELECT region FROM sales WHERE SUM(amount) > 1 GROUP BY region")
        .unwrap_err();
    assert!(matches!(err, Error::AggregateMisuse(_)));

    let err = db.query("SELECT SUM(MAX(amount)) FROM sales").unwrap_err();
    assert!(matches!(err, Error::AggregateMisuse(_)));

    // Sharing an expression with an aggregate does not group a column
    let err = db.query("SELECT amount + COUNT() FROM sales").unwrap_err();
    assert!(matches!(err, Error::AggregateMisuse(_)));
    let err = db
        .query("SELECT amount + COUNT() FROM sales GROUP BY region")
        .unwrap_err();
    assert!(matches!(err, Error::AggregateMisuse(_)));
    let err = db
        .query("SELECT region FROM sales GROUP BY region ORDER BY LENGTH(rep) + COUNT()")
        .unwrap_err();
    assert!(matches!(err, Error::AggregateMisuse(_)));
}

#[test]
fn test_group_key_beside_aggregate() {
    let db = setup();
    let output = db
        .query("SELECT region || '/' || rep, COUNT() * 10 + LENGTH(rep) FROM sales GROUP BY region, rep")
        .unwrap();
    assert_eq!(output.len(), 5);
    assert_eq!(
        output.rows[0].values,
        vec![Value::from("north/ann"), Value::from(13)]
    );
}

#[test]
fn test_aggregates_over_no_rows() {
    let db = setup();

    let output = db.query("SELECT COUNT() FROM nothing").unwrap();
    assert_eq!(output.rows[0].values, vec![Value::from(0)]);

    let output = db.query("SELECT COUNT() FROM sales WHERE amount > 100").unwrap();
    assert_eq!(output.rows[0].values, vec![Value::from(0)]);

    // The single all-NULL row of an empty aggregate is dropped
    let output = db.query("SELECT MAX(amount) FROM nothing").unwrap();
    assert!(output.is_empty());
    let output = db.query("SELECT SUM(amount), AVG(amount) FROM nothing").unwrap();
    assert!(output.is_empty());

    let output = db
        .query("SELECT amount, COUNT() FROM nothing GROUP BY amount")
        .unwrap();
    assert!(output.is_empty());
}
