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

//! Table Provider Tests
//!
//! Tables backed by a provider other than the in-memory table

use wooby::catalog::TableMeta;
use wooby::storage::RowId;
use wooby::{Context, DataType, Database, Error, MemoryTable, Result, Row, TableDataProvider, Value};

/// Read-only table of `k, k * k` for k in 1..=limit, stored under id 10 * k
struct Squares {
    limit: i64,
}

impl Squares {
    fn new(limit: i64) -> Self {
        Self { limit }
    }

    fn row(&self, k: i64) -> Row {
        Row::from_values(vec![Value::from(k as f64), Value::from((k * k) as f64)])
    }
}

impl TableDataProvider for Squares {
    fn initialize(&mut self, _catalog: &Context, table: &TableMeta) -> Result<()> {
        if table.width() != 2 {
            return Err(Error::InvalidArgument(format!(
                "squares needs 2 columns, '{}' has {}",
                table.name,
                table.width()
            )));
        }
        Ok(())
    }

    fn seek(&self, id: RowId) -> Option<Row> {
        let k = id / 10;
        (id % 10 == 0 && (1..=self.limit).contains(&k)).then(|| self.row(k))
    }

    fn seek_next(&self, id: &mut RowId) -> Option<Row> {
        let k = (*id).max(0) / 10 + 1;
        if k > self.limit {
            return None;
        }
        *id = k * 10;
        Some(self.row(k))
    }
}

fn setup() -> Database {
    let mut db = Database::new();
    db.register_table(
        "squares",
        &[("k", DataType::Number), ("sq", DataType::Number)],
        Box::new(Squares::new(4)),
    )
    .expect("Failed to register squares");
    db
}

#[test]
fn test_scan_follows_provider_order() {
    let db = setup();
    let output = db.query("SELECT k, sq, ROWID() FROM squares").unwrap();
    assert_eq!(output.len(), 4);
    assert_eq!(
        output.column_values(1),
        vec![
            Value::from(1.0),
            Value::from(4.0),
            Value::from(9.0),
            Value::from(16.0)
        ]
    );
    assert_eq!(
        output.column_values(2),
        vec![
            Value::from(10.0),
            Value::from(20.0),
            Value::from(30.0),
            Value::from(40.0)
        ]
    );
    let ids: Vec<RowId> = output.rows.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![10, 20, 30, 40]);
}

#[test]
fn test_filter_and_aggregate_over_provider() {
    let db = setup();
    let output = db.query("SELECT k FROM squares WHERE sq > 5").unwrap();
    assert_eq!(output.column_values(0), vec![Value::from(3.0), Value::from(4.0)]);

    let output = db.query("SELECT SUM(sq), MAX(k) FROM squares").unwrap();
    assert_eq!(output.rows[0].values, vec![Value::from(30.0), Value::from(4.0)]);
}

#[test]
fn test_read_only_provider_rejects_mutation() {
    let mut db = setup();
    let err = db.execute("INSERT INTO squares VALUES (5, 25)").unwrap_err();
    assert!(matches!(err, Error::NotSupported(_)));

    let err = db.execute("UPDATE squares SET sq = 0 WHERE k = 1").unwrap_err();
    assert!(matches!(err, Error::NotSupported(_)));

    let err = db.execute("DELETE FROM squares WHERE k = 2").unwrap_err();
    assert!(matches!(err, Error::NotSupported(_)));

    assert_eq!(db.query("SELECT k FROM squares").unwrap().len(), 4);
}

#[test]
fn test_join_with_memory_table() {
    let mut db = setup();
    db.execute("CREATE TABLE words (k INT, word TEXT)")
        .expect("Failed to create words table");
    db.execute("INSERT INTO words VALUES (2, 'two'), (3, 'three'), (7, 'seven')")
        .expect("Failed to insert words");

    let output = db
        .query("SELECT s.sq, w.word FROM squares s JOIN words w ON w.k = s.k")
        .unwrap();
    assert_eq!(
        output.rows.iter().map(|r| r.values.clone()).collect::<Vec<_>>(),
        vec![
            vec![Value::from(4.0), Value::from("two")],
            vec![Value::from(9.0), Value::from("three")],
        ]
    );
}

#[test]
fn test_provider_can_refuse_table_shape() {
    let mut db = Database::new();
    let err = db
        .register_table("squares", &[("k", DataType::Number)], Box::new(Squares::new(3)))
        .unwrap_err();
    assert!(matches!(err, Error::InvalidArgument(_)));
    assert!(db.context().find_table("squares").is_none());
}

#[test]
fn test_register_memory_table() {
    let mut db = Database::new();
    let table = MemoryTable::from_rows(
        2,
        vec![
            Row::from_values(vec![Value::from("a"), Value::from(1.0)]),
            Row::from_values(vec![Value::from("b"), Value::from(2.0)]),
        ],
    );
    db.register_table(
        "letters",
        &[("letter", DataType::Text), ("pos", DataType::Number)],
        Box::new(table),
    )
    .expect("Failed to register letters");

    db.execute("INSERT INTO letters VALUES ('c', 3)").unwrap();
    let output = db.query("SELECT letter FROM letters ORDER BY pos DESC").unwrap();
    assert_eq!(
        output.column_values(0),
        vec![Value::from("c"), Value::from("b"), Value::from("a")]
    );

    let err = db
        .register_table("letters", &[("x", DataType::Text)], Box::new(MemoryTable::new()))
        .unwrap_err();
    assert!(matches!(err, Error::TableAlreadyExists(_)));
}
