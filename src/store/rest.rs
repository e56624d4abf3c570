use async_trait::async_trait;
use reqwest::{RequestBuilder, Response};
use serde_json::Value;

use super::{escape_like, Direction, Filter, Order, RecordStore, Row, StoreError, Table};

/// Record store reached over a PostgREST-compatible HTTP API.
#[derive(Clone)]
pub struct RestRecordStore {
    client: reqwest::Client,
    base_url: String,
    service_key: String,
}

impl RestRecordStore {
    pub fn new(base_url: &str, service_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: normalize_base_url(base_url),
            service_key,
        }
    }

    fn request(&self, method: reqwest::Method, table: Table) -> RequestBuilder {
        let url = format!("{}/{}", self.base_url, table.name());
        self.client
            .request(method, url)
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
    }

    async fn rows(response: Response) -> Result<Vec<Row>, StoreError> {
        let response = check_status(response).await?;
        let values: Vec<Value> = response.json().await?;
        values
            .into_iter()
            .map(|value| match value {
                Value::Object(row) => Ok(row),
                other => Err(StoreError::Unavailable(format!(
                    "expected an object row, got {other}"
                ))),
            })
            .collect()
    }
}

#[async_trait]
impl RecordStore for RestRecordStore {
    async fn query(
        &self,
        table: Table,
        filters: &[Filter],
        order: &[Order],
    ) -> Result<Vec<Row>, StoreError> {
        let mut params = vec![("select".to_string(), "*".to_string())];
        params.extend(filter_params(filters));
        if let Some(order) = order_param(order) {
            params.push(("order".to_string(), order));
        }

        let response = self
            .request(reqwest::Method::GET, table)
            .query(&params)
            .send()
            .await?;
        match Self::rows(response).await {
            Err(err) if is_invalid_key(&err) => Ok(Vec::new()),
            result => result,
        }
    }

    async fn insert(&self, table: Table, row: Row) -> Result<Row, StoreError> {
        let response = self
            .request(reqwest::Method::POST, table)
            .header("Prefer", "return=representation")
            .json(&Value::Object(row))
            .send()
            .await?;

        Self::rows(response)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::Unavailable(format!("insert into {table} returned no row")))
    }

    async fn delete(&self, table: Table, filters: &[Filter]) -> Result<u64, StoreError> {
        if filters.is_empty() {
            return Err(StoreError::Unavailable(format!(
                "refusing to delete from {table} without a filter"
            )));
        }

        let response = self
            .request(reqwest::Method::DELETE, table)
            .header("Prefer", "return=representation")
            .query(&filter_params(filters))
            .send()
            .await?;
        match Self::rows(response).await {
            Ok(rows) => Ok(rows.len() as u64),
            Err(err) if is_invalid_key(&err) => Ok(0),
            Err(err) => Err(err),
        }
    }
}

async fn check_status(response: Response) -> Result<Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    Err(rejection(status.as_u16(), text))
}

/// Builds the error for a failed PostgREST call from its JSON error body.
fn rejection(status: u16, text: String) -> StoreError {
    let body = serde_json::from_str::<Value>(&text).ok();
    let field = |name: &str| {
        body.as_ref()
            .and_then(|body| body.get(name))
            .and_then(Value::as_str)
            .map(str::to_string)
    };

    StoreError::Rejected {
        status,
        code: field("code"),
        message: field("message").unwrap_or(text),
    }
}

/// An id filter that the column type cannot parse (e.g. a non-UUID against a uuid
/// column) matches nothing, same as the text comparison the Postgres store uses.
fn is_invalid_key(err: &StoreError) -> bool {
    matches!(
        err,
        StoreError::Rejected { status: 400, code: Some(code), .. } if code == INVALID_TEXT_REPRESENTATION
    )
}

const INVALID_TEXT_REPRESENTATION: &str = "22P02";

fn filter_params(filters: &[Filter]) -> Vec<(String, String)> {
    filters
        .iter()
        .map(|filter| match filter {
            Filter::Eq(column, Value::Null) => (column.to_string(), "is.null".to_string()),
            Filter::Eq(column, Value::String(text)) => (column.to_string(), format!("eq.{text}")),
            Filter::Eq(column, other) => (column.to_string(), format!("eq.{other}")),
            Filter::ContainsAny(columns, needle) => {
                let quoted = quote_value(&format!("*{}*", ilike_literal(needle)));
                let clauses: Vec<String> = columns
                    .iter()
                    .map(|column| format!("{column}.ilike.{quoted}"))
                    .collect();
                ("or".to_string(), format!("({})", clauses.join(",")))
            }
        })
        .collect()
}

fn order_param(order: &[Order]) -> Option<String> {
    if order.is_empty() {
        return None;
    }
    let keys: Vec<String> = order
        .iter()
        .map(|key| {
            let direction = match key.direction {
                Direction::Ascending => "asc",
                Direction::Descending => "desc",
            };
            format!("{}.{direction}", key.column)
        })
        .collect();
    Some(keys.join(","))
}

/// PostgREST turns every `*` into `%`, so a literal asterisk can only be matched
/// through the single-character wildcard.
fn ilike_literal(needle: &str) -> String {
    escape_like(needle).replace('*', "_")
}

/// Double-quotes a value for use inside a logical `or=(...)` group.
fn quote_value(value: &str) -> String {
    let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{escaped}\"")
}

fn normalize_base_url(value: &str) -> String {
    let trimmed = value.trim_end_matches('/');
    if trimmed.ends_with("/rest/v1") {
        trimmed.to_string()
    } else {
        format!("{}/rest/v1", trimmed)
    }
}
