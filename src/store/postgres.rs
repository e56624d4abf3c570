use std::{borrow::Cow, time::Duration};

use async_trait::async_trait;
use serde_json::Value;
use sqlx::{
    postgres::{PgConnectOptions, PgPoolOptions},
    types::Json,
    Connection, Executor, PgPool, Postgres, QueryBuilder,
};

use super::{escape_like, Direction, Filter, Order, RecordStore, Row, StoreError, Table};

/// Postgres-backed record store.
#[derive(Clone)]
pub struct PgRecordStore {
    pool: PgPool,
}

impl PgRecordStore {
    pub async fn connect(database_url: &str) -> Result<Self, sqlx::Error> {
        let pool = match Self::pool_options().connect(database_url).await {
            Ok(pool) => pool,
            Err(sqlx::Error::Database(db_err)) if db_err.code() == Some(Cow::Borrowed("3D000")) => {
                log::info!("Database missing, attempting to create it");
                create_database_if_missing(database_url).await?;
                Self::pool_options().connect(database_url).await?
            }
            Err(err) => return Err(err),
        };

        sqlx::migrate!("./migrations").run(&pool).await?;

        log::info!("Database connection established");
        Ok(Self { pool })
    }

    fn pool_options() -> PgPoolOptions {
        PgPoolOptions::new()
            .max_connections(10)
            .min_connections(2)
            .acquire_timeout(Duration::from_secs(5))
            .idle_timeout(Some(Duration::from_secs(600)))
            .test_before_acquire(true)
    }
}

#[async_trait]
impl RecordStore for PgRecordStore {
    async fn query(
        &self,
        table: Table,
        filters: &[Filter],
        order: &[Order],
    ) -> Result<Vec<Row>, StoreError> {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT to_jsonb(t) FROM ");
        builder.push(table.name()).push(" AS t");
        push_filters(&mut builder, filters);

        if !order.is_empty() {
            builder.push(" ORDER BY ");
            let mut keys = builder.separated(", ");
            for key in order {
                let direction = match key.direction {
                    Direction::Ascending => "ASC",
                    Direction::Descending => "DESC",
                };
                keys.push(format!("{} {direction}", quote_ident(key.column)?));
            }
        }

        let values: Vec<Value> = builder
            .build_query_scalar()
            .fetch_all(&self.pool)
            .await?;

        values.into_iter().map(into_row).collect()
    }

    async fn insert(&self, table: Table, row: Row) -> Result<Row, StoreError> {
        let columns = row
            .keys()
            .map(|column| quote_ident(column))
            .collect::<Result<Vec<_>, _>>()?
            .join(", ");

        let mut builder = QueryBuilder::<Postgres>::new("INSERT INTO ");
        builder.push(table.name()).push(" AS t ");
        if columns.is_empty() {
            builder.push("DEFAULT VALUES");
        } else {
            builder
                .push(format!("({columns}) SELECT {columns} FROM jsonb_populate_record(NULL::"))
                .push(table.name())
                .push(", ")
                .push_bind(Json(Value::Object(row)))
                .push(")");
        }
        builder.push(" RETURNING to_jsonb(t)");

        let stored: Value = builder
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;

        into_row(stored)
    }

    async fn delete(&self, table: Table, filters: &[Filter]) -> Result<u64, StoreError> {
        if filters.is_empty() {
            return Err(StoreError::Unavailable(format!(
                "refusing to delete from {table} without a filter"
            )));
        }

        let mut builder = QueryBuilder::<Postgres>::new("DELETE FROM ");
        builder.push(table.name());
        push_filters(&mut builder, filters);

        let result = builder.build().execute(&self.pool).await?;
        Ok(result.rows_affected())
    }
}

fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, filters: &[Filter]) {
    for (index, filter) in filters.iter().enumerate() {
        builder.push(if index == 0 { " WHERE " } else { " AND " });
        match filter {
            Filter::Eq(column, Value::Null) => {
                builder.push(format!("{} IS NULL", quoted(column)));
            }
            Filter::Eq(column, Value::Bool(flag)) => {
                builder.push(format!("{} = ", quoted(column))).push_bind(*flag);
            }
            Filter::Eq(column, Value::Number(number)) if number.is_i64() => {
                builder
                    .push(format!("{} = ", quoted(column)))
                    .push_bind(number.as_i64().unwrap_or_default());
            }
            Filter::Eq(column, value) => {
                let text = match value {
                    Value::String(text) => text.clone(),
                    other => other.to_string(),
                };
                // Cast so uuid and enum columns compare against the textual form.
                builder
                    .push(format!("{}::text = ", quoted(column)))
                    .push_bind(text);
            }
            Filter::ContainsAny(columns, needle) => {
                let pattern = format!("%{}%", escape_like(needle));
                builder.push("(");
                for (position, column) in columns.iter().enumerate() {
                    if position > 0 {
                        builder.push(" OR ");
                    }
                    builder
                        .push(format!("{}::text ILIKE ", quoted(column)))
                        .push_bind(pattern.clone());
                }
                builder.push(")");
            }
        }
    }
}

/// Filter and order columns are compile-time constants, so they are always valid.
fn quoted(column: &str) -> String {
    format!("\"{column}\"")
}

fn quote_ident(column: &str) -> Result<String, StoreError> {
    let valid = !column.is_empty()
        && column
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
    if valid {
        Ok(quoted(column))
    } else {
        Err(StoreError::Unavailable(format!(
            "invalid column name '{column}'"
        )))
    }
}

fn into_row(value: Value) -> Result<Row, StoreError> {
    match value {
        Value::Object(row) => Ok(row),
        other => Err(StoreError::Unavailable(format!(
            "expected an object row, got {other}"
        ))),
    }
}

/// `CREATE DATABASE` for the directory's target, or `None` when the URL already
/// names the maintenance database.
fn create_database_statement(options: &PgConnectOptions) -> Option<String> {
    let target = options.get_database().unwrap_or(MAINTENANCE_DATABASE);
    if target.eq_ignore_ascii_case(MAINTENANCE_DATABASE) {
        return None;
    }
    Some(format!("CREATE DATABASE {}", quote_any_ident(target)))
}

fn quote_any_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

const MAINTENANCE_DATABASE: &str = "postgres";

async fn create_database_if_missing(database_url: &str) -> Result<(), sqlx::Error> {
    let options: PgConnectOptions = database_url.parse()?;
    let Some(statement) = create_database_statement(&options) else {
        return Ok(());
    };

    let mut admin =
        sqlx::postgres::PgConnection::connect_with(&options.clone().database(MAINTENANCE_DATABASE))
            .await?;
    match admin.execute(statement.as_str()).await {
        Ok(_) => log::info!("{statement} succeeded"),
        // 42P04: another instance created it first.
        Err(sqlx::Error::Database(db_err)) if db_err.code() == Some(Cow::Borrowed("42P04")) => {
            log::info!("Directory database already exists");
        }
        Err(err) => return Err(err),
    }
    Ok(())
}
