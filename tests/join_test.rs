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
//! JOIN Tests
//!
//! INNER, LEFT, RIGHT and FULL OUTER joins plus the name checks joins need

use wooby::{Database, Error, Output, Value};

fn setup() -> Database {
    let mut db = Database::new();
    db.execute("CREATE TABLE departments (id INTEGER, name TEXT)")
        .expect("Failed to create departments table");
    db.execute("CREATE TABLE employees (id INTEGER, name TEXT, dept_id INTEGER)")
        .expect("Failed to create employees table");
    db.execute("INSERT INTO departments VALUES (1, 'Engineering'), (2, 'Sales'), (3, 'Marketing')")
        .expect("Failed to insert departments");
    db.execute(
        "INSERT INTO employees VALUES (101, 'John', 1), (102, 'Jane', 1), (103, 'Bob', 2), (104, 'Alice', NULL)",
    )
    .expect("Failed to insert employees");
    db
}

fn pairs(output: &Output) -> Vec<(Value, Value)> {
    output
        .rows
        .iter()
        .map(|r| (r.values[0].clone(), r.values[1].clone()))
        .collect()
}

fn pair(a: &str, b: &str) -> (Value, Value) {
    let value = |s: &str| if s.is_empty() { Value::Null } else { Value::from(s) };
    (value(a), value(b))
}

#[test]
fn test_inner_join() {
    let db = setup();
    let output = db
        .query("SELECT e.name, d.name FROM employees e JOIN departments d ON e.dept_id = d.id")
        .unwrap();
    assert_eq!(
        pairs(&output),
        vec![
            pair("John", "Engineering"),
            pair("Jane", "Engineering"),
            pair("Bob", "Sales"),
        ]
    );

    let explicit = db
        .query("SELECT e.name, d.name FROM employees e INNER JOIN departments d ON e.dept_id = d.id")
        .unwrap();
    assert_eq!(output.rows, explicit.rows);
}

#[test]
fn test_left_join() {
    let db = setup();
    let output = db
        .query("SELECT e.name, d.name FROM employees e LEFT JOIN departments d ON e.dept_id = d.id")
        .unwrap();
    assert_eq!(
        pairs(&output),
        vec![
            pair("John", "Engineering"),
            pair("Jane", "Engineering"),
            pair("Bob", "Sales"),
            pair("Alice", ""),
        ]
    );
}

#[test]
fn test_right_join() {
    let db = setup();
    let output = db
        .query(
            "SELECT e.name, d.name FROM employees e RIGHT OUTER JOIN departments d ON e.dept_id = d.id",
        )
        .unwrap();
    assert_eq!(
        pairs(&output),
        vec![
            pair("John", "Engineering"),
            pair("Jane", "Engineering"),
            pair("Bob", "Sales"),
            pair("", "Marketing"),
        ]
    );
}

#[test]
fn test_full_outer_join() {
    let db = setup();
    let expected = vec![
        pair("John", "Engineering"),
        pair("Jane", "Engineering"),
        pair("Bob", "Sales"),
        pair("Alice", ""),
        pair("", "Marketing"),
    ];
    for sql in [
        "SELECT e.name, d.name FROM employees e OUTER JOIN departments d ON e.dept_id = d.id",
        "SELECT e.name, d.name FROM employees e FULL JOIN departments d ON e.dept_id = d.id",
        "SELECT e.name, d.name FROM employees e FULL OUTER JOIN departments d ON e.dept_id = d.id",
    ] {
        let output = db.query(sql).unwrap();
        assert_eq!(pairs(&output), expected, "{}", sql);
    }
}

#[test]
fn test_filter_after_join() {
    let db = setup();
    let output = db
        .query(
            "SELECT e.name, d.name FROM employees e LEFT JOIN departments d ON e.dept_id = d.id \
             WHERE d.name = NULL",
        )
        .unwrap();
    assert_eq!(pairs(&output), vec![pair("Alice", "")]);
}

#[test]
fn test_count_over_filtered_join() {
    let db = setup();
    for outputs in ["COUNT()", "COUNT(), MAX(e.id)", "COUNT(*), MIN(d.name)"] {
        let sql = format!(
            "SELECT {} FROM employees e JOIN departments d ON e.dept_id = d.id \
             WHERE d.name = 'Engineering'",
            outputs
        );
        let output = db.query(&sql).unwrap();
        assert_eq!(output.rows[0].values[0], Value::from(2), "{}", sql);
    }
}

#[test]
fn test_three_way_join() {
    let mut db = setup();
    db.execute("CREATE TABLE floors (dept_id INTEGER, level INTEGER)")
        .unwrap();
    db.execute("INSERT INTO floors VALUES (1, 4), (2, 7)").unwrap();
    let output = db
        .query(
            "SELECT e.name, f.level FROM employees e \
             JOIN departments d ON e.dept_id = d.id \
             JOIN floors f ON f.dept_id = d.id \
             ORDER BY f.level DESC",
        )
        .unwrap();
    assert_eq!(output.rows[0].values, vec![Value::from("Bob"), Value::from(7)]);
    assert_eq!(output.len(), 3);
}

#[test]
fn test_self_join_with_aliases() {
    let db = setup();
    let output = db
        .query(
            "SELECT a.name, b.name FROM employees a JOIN employees b \
             ON a.dept_id = b.dept_id AND a.id < b.id",
        )
        .unwrap();
    assert_eq!(pairs(&output), vec![pair("John", "Jane")]);
}

#[test]
fn test_ambiguous_reference() {
    let db = setup();
    let err = db
        .query("SELECT name FROM employees JOIN departments ON employees.dept_id = departments.id")
        .unwrap_err();
    assert!(matches!(err, Error::AmbiguousReference { .. }));

    let output = db
        .query("SELECT e.name FROM employees e JOIN departments d ON e.dept_id = d.id")
        .unwrap();
    assert_eq!(output.len(), 3);
}

#[test]
fn test_duplicate_sources_rejected_before_execution() {
    let db = setup();
    let err = db
        .query("SELECT * FROM employees JOIN employees ON 1 = 1")
        .unwrap_err();
    assert!(matches!(err, Error::InvalidJoin(_)));
    assert!(err.is_parse_error());

    let err = db
        .query("SELECT * FROM employees x JOIN departments x ON 1 = 1")
        .unwrap_err();
    assert!(matches!(err, Error::InvalidJoin(_)));

    let err = db
        .query("SELECT * FROM employees e JOIN departments d ON e.name")
        .unwrap_err();
    assert!(matches!(err, Error::InvalidJoin(_)));
}
