use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use serde_json::Value;
use uuid::Uuid;

use super::{Direction, Filter, Order, RecordStore, Row, StoreError, Table};

/// Column on `businesses` that may hold each suggestion id at most once.
const UNIQUE_BUSINESS_COLUMN: &str = "source_suggestion_id";

/// In-process tables, used for local runs and tests.
#[derive(Default)]
pub struct MemoryRecordStore {
    tables: RwLock<HashMap<Table, Vec<Row>>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn poisoned() -> StoreError {
        StoreError::Unavailable("memory store lock poisoned".to_string())
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn query(
        &self,
        table: Table,
        filters: &[Filter],
        order: &[Order],
    ) -> Result<Vec<Row>, StoreError> {
        let tables = self.tables.read().map_err(|_| Self::poisoned())?;
        let mut rows: Vec<Row> = tables
            .get(&table)
            .map(|rows| {
                rows.iter()
                    .filter(|row| row_matches(row, filters))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        rows.sort_by(|left, right| compare_rows(left, right, order));
        Ok(rows)
    }

    async fn insert(&self, table: Table, mut row: Row) -> Result<Row, StoreError> {
        let mut tables = self.tables.write().map_err(|_| Self::poisoned())?;
        let rows = tables.entry(table).or_default();

        if table == Table::Businesses {
            if let Some(source) = row.get(UNIQUE_BUSINESS_COLUMN).filter(|v| !v.is_null()) {
                let taken = rows
                    .iter()
                    .any(|existing| existing.get(UNIQUE_BUSINESS_COLUMN) == Some(source));
                if taken {
                    return Err(StoreError::Rejected {
                        status: 409,
                        code: None,
                        message: format!(
                            "duplicate key value violates unique constraint on {UNIQUE_BUSINESS_COLUMN}"
                        ),
                    });
                }
            }
        }

        if row.get("id").map_or(true, Value::is_null) {
            row.insert("id".to_string(), Value::String(Uuid::new_v4().to_string()));
        }
        if row.get("created_at").map_or(true, Value::is_null) {
            row.insert(
                "created_at".to_string(),
                Value::String(Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)),
            );
        }

        rows.push(row.clone());
        Ok(row)
    }

    async fn delete(&self, table: Table, filters: &[Filter]) -> Result<u64, StoreError> {
        if filters.is_empty() {
            return Err(StoreError::Unavailable(format!(
                "refusing to delete from {table} without a filter"
            )));
        }

        let mut tables = self.tables.write().map_err(|_| Self::poisoned())?;
        let Some(rows) = tables.get_mut(&table) else {
            return Ok(0);
        };

        let before = rows.len();
        rows.retain(|row| !row_matches(row, filters));
        Ok((before - rows.len()) as u64)
    }
}

fn row_matches(row: &Row, filters: &[Filter]) -> bool {
    filters.iter().all(|filter| match filter {
        Filter::Eq(column, expected) => match row.get(*column) {
            Some(actual) => actual == expected,
            None => expected.is_null(),
        },
        Filter::ContainsAny(columns, needle) => {
            let needle = needle.to_lowercase();
            columns.iter().any(|column| {
                row.get(*column)
                    .and_then(Value::as_str)
                    .is_some_and(|value| value.to_lowercase().contains(&needle))
            })
        }
    })
}

fn compare_rows(left: &Row, right: &Row, order: &[Order]) -> Ordering {
    for key in order {
        let ordering = compare_values(
            left.get(key.column).unwrap_or(&Value::Null),
            right.get(key.column).unwrap_or(&Value::Null),
        );
        let ordering = match key.direction {
            Direction::Ascending => ordering,
            Direction::Descending => ordering.reverse(),
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

fn compare_values(left: &Value, right: &Value) -> Ordering {
    fn rank(value: &Value) -> u8 {
        match value {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::String(_) => 3,
            Value::Array(_) => 4,
            Value::Object(_) => 5,
        }
    }

    match (left, right) {
        (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
        (Value::Number(a), Value::Number(b)) => {
            let a = a.as_f64().unwrap_or_default();
            let b = b.as_f64().unwrap_or_default();
            a.partial_cmp(&b).unwrap_or(Ordering::Equal)
        }
        (Value::String(a), Value::String(b)) => a.cmp(b),
        _ => rank(left).cmp(&rank(right)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> Row {
        value.as_object().cloned().expect("object literal")
    }

    #[actix_rt::test]
    async fn insert_assigns_id_and_created_at() {
        let store = MemoryRecordStore::new();
        let stored = store
            .insert(Table::Suggestions, row(json!({ "name": "Soul Kitchen" })))
            .await
            .expect("insert succeeds");

        assert!(stored.get("id").and_then(Value::as_str).is_some());
        assert!(stored.get("created_at").and_then(Value::as_str).is_some());
    }

    #[actix_rt::test]
    async fn contains_any_is_case_insensitive_across_columns() {
        let store = MemoryRecordStore::new();
        store
            .insert(
                Table::Businesses,
                row(json!({ "name": "Harbor Deli", "city": "Jacksonville", "zip": "32202" })),
            )
            .await
            .expect("insert succeeds");

        let columns: &'static [&'static str] = &["name", "city", "zip"];
        let hits = store
            .query(
                Table::Businesses,
                &[Filter::ContainsAny(columns, "JACK".to_string())],
                &[],
            )
            .await
            .expect("query succeeds");
        assert_eq!(hits.len(), 1);

        let hits = store
            .query(
                Table::Businesses,
                &[Filter::ContainsAny(columns, "322".to_string())],
                &[],
            )
            .await
            .expect("query succeeds");
        assert_eq!(hits.len(), 1);

        let misses = store
            .query(
                Table::Businesses,
                &[Filter::ContainsAny(columns, "miami".to_string())],
                &[],
            )
            .await
            .expect("query succeeds");
        assert!(misses.is_empty());
    }

    #[actix_rt::test]
    async fn orders_by_each_key_in_turn() {
        let store = MemoryRecordStore::new();
        for (name, verified) in [("Zeta", false), ("Beta", true), ("Alpha", true)] {
            store
                .insert(Table::Businesses, row(json!({ "name": name, "verified": verified })))
                .await
                .expect("insert succeeds");
        }

        let rows = store
            .query(
                Table::Businesses,
                &[],
                &[Order::desc("verified"), Order::asc("name")],
            )
            .await
            .expect("query succeeds");
        let names: Vec<_> = rows
            .iter()
            .filter_map(|row| row.get("name").and_then(Value::as_str))
            .collect();
        assert_eq!(names, vec!["Alpha", "Beta", "Zeta"]);
    }

    #[actix_rt::test]
    async fn delete_of_missing_row_is_a_no_op() {
        let store = MemoryRecordStore::new();
        let removed = store
            .delete(Table::Suggestions, &[Filter::eq("id", "missing")])
            .await
            .expect("delete succeeds");
        assert_eq!(removed, 0);
    }

    #[actix_rt::test]
    async fn rejects_second_business_for_same_suggestion() {
        let store = MemoryRecordStore::new();
        let business = row(json!({ "name": "Soul Kitchen", "source_suggestion_id": "s-1" }));
        store
            .insert(Table::Businesses, business.clone())
            .await
            .expect("first insert succeeds");

        let err = store
            .insert(Table::Businesses, business)
            .await
            .expect_err("duplicate is rejected");
        assert!(matches!(err, StoreError::Rejected { status: 409, .. }));
    }
}
