use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Value};

use super::{Filter, MemoryRecordStore, Order, RecordStore, Row, StoreError, Table};

/// Memory store wrapper that fails chosen operations and counts attempted writes.
#[derive(Default)]
pub struct FlakyStore {
    pub inner: MemoryRecordStore,
    failing_queries: Mutex<HashSet<Table>>,
    failing_inserts: Mutex<HashSet<Table>>,
    failing_deletes: Mutex<HashSet<Table>>,
    inserts: AtomicUsize,
    deletes: AtomicUsize,
}

impl FlakyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_queries_on(&self, table: Table) {
        self.failing_queries.lock().unwrap().insert(table);
    }

    pub fn fail_inserts_on(&self, table: Table) {
        self.failing_inserts.lock().unwrap().insert(table);
    }

    pub fn fail_deletes_on(&self, table: Table) {
        self.failing_deletes.lock().unwrap().insert(table);
    }

    pub fn writes(&self) -> usize {
        self.inserts.load(Ordering::SeqCst) + self.deletes.load(Ordering::SeqCst)
    }

    pub async fn rows(&self, table: Table) -> Vec<Row> {
        self.inner.query(table, &[], &[]).await.unwrap()
    }

    /// Inserts directly, bypassing failure injection and write counting.
    pub async fn seed(&self, table: Table, value: Value) -> Row {
        let row = value.as_object().cloned().expect("seed rows are objects");
        self.inner.insert(table, row).await.unwrap()
    }

    pub async fn seed_suggestion(&self, name: &str, notes: Option<&str>) -> String {
        let row = self
            .seed(
                Table::Suggestions,
                json!({ "name": name, "city": "Jacksonville", "state": "FL", "website": null, "notes": notes }),
            )
            .await;
        row["id"].as_str().unwrap().to_string()
    }

    fn injected(table: Table, op: &str) -> StoreError {
        StoreError::Unavailable(format!("injected {op} failure on {table}"))
    }
}

#[async_trait]
impl RecordStore for FlakyStore {
    async fn query(
        &self,
        table: Table,
        filters: &[Filter],
        order: &[Order],
    ) -> Result<Vec<Row>, StoreError> {
        if self.failing_queries.lock().unwrap().contains(&table) {
            return Err(Self::injected(table, "query"));
        }
        self.inner.query(table, filters, order).await
    }

    async fn insert(&self, table: Table, row: Row) -> Result<Row, StoreError> {
        self.inserts.fetch_add(1, Ordering::SeqCst);
        if self.failing_inserts.lock().unwrap().contains(&table) {
            return Err(Self::injected(table, "insert"));
        }
        self.inner.insert(table, row).await
    }

    async fn delete(&self, table: Table, filters: &[Filter]) -> Result<u64, StoreError> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        if self.failing_deletes.lock().unwrap().contains(&table) {
            return Err(Self::injected(table, "delete"));
        }
        self.inner.delete(table, filters).await
    }
}
