//! Record store adapter.
//!
//! The workflows only ever talk to a [`RecordStore`]: a handful of named tables
//! reachable through query/insert/delete with simple filter predicates. Rows travel
//! as JSON objects so the same workflow code runs against Postgres, a PostgREST
//! endpoint, or the in-memory tables used in development and tests.

mod memory;
mod postgres;
mod rest;

#[cfg(test)]
pub(crate) mod testing;

use std::fmt;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

pub use memory::MemoryRecordStore;
pub use postgres::PgRecordStore;
pub use rest::RestRecordStore;

pub type Row = Map<String, Value>;

/// Tables the directory touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Businesses,
    Suggestions,
    SearchEvents,
}

impl Table {
    pub fn name(&self) -> &'static str {
        match self {
            Table::Businesses => "businesses",
            Table::Suggestions => "business_suggestions",
            Table::SearchEvents => "search_events",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Row predicate. Multiple filters in one call are AND-ed together.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Eq(&'static str, Value),
    /// Case-insensitive substring match; a hit on any listed column qualifies.
    ContainsAny(&'static [&'static str], String),
}

impl Filter {
    pub fn eq(column: &'static str, value: impl Into<Value>) -> Self {
        Filter::Eq(column, value.into())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Order {
    pub column: &'static str,
    pub direction: Direction,
}

impl Order {
    pub fn asc(column: &'static str) -> Self {
        Self {
            column,
            direction: Direction::Ascending,
        }
    }

    pub fn desc(column: &'static str) -> Self {
        Self {
            column,
            direction: Direction::Descending,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{0}")]
    Database(#[from] sqlx::Error),
    #[error("record store request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("{message}")]
    Rejected {
        status: u16,
        /// SQLSTATE or store-specific error code, when the store reports one.
        code: Option<String>,
        message: String,
    },
    #[error("malformed row: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("{0}")]
    Unavailable(String),
}

impl StoreError {
    /// True when the store refused a write because it would duplicate a unique key.
    pub fn is_conflict(&self) -> bool {
        match self {
            StoreError::Rejected { status, .. } => *status == 409,
            StoreError::Database(sqlx::Error::Database(err)) => err.is_unique_violation(),
            _ => false,
        }
    }
}

/// Generic table access used by every workflow.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn query(
        &self,
        table: Table,
        filters: &[Filter],
        order: &[Order],
    ) -> Result<Vec<Row>, StoreError>;

    async fn insert(&self, table: Table, row: Row) -> Result<Row, StoreError>;

    /// Deletes every matching row and reports how many went away; zero is not an error.
    async fn delete(&self, table: Table, filters: &[Filter]) -> Result<u64, StoreError>;
}

/// Escapes LIKE metacharacters so a needle only ever matches literally.
fn escape_like(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len());
    for c in needle.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Serializes a typed record into a store row.
pub fn to_row<T: Serialize>(record: &T) -> Result<Row, StoreError> {
    match serde_json::to_value(record)? {
        Value::Object(row) => Ok(row),
        other => Err(StoreError::Unavailable(format!(
            "expected an object row, got {other}"
        ))),
    }
}

pub fn from_row<T: DeserializeOwned>(row: Row) -> Result<T, StoreError> {
    Ok(serde_json::from_value(Value::Object(row))?)
}

pub fn from_rows<T: DeserializeOwned>(rows: Vec<Row>) -> Result<Vec<T>, StoreError> {
    rows.into_iter().map(from_row).collect()
}
