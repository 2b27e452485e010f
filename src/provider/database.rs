//! DuckDB-backed page provider
//!
//! Pages are cut with `ORDER BY … LIMIT … OFFSET …`. DuckDB can also attach
//! PostgreSQL, MySQL and SQLite databases, so the same provider reads any table
//! reachable from the connection.
//!
//! A dotted sort field such as `owner.name` addresses a STRUCT column and is
//! rendered as `"owner"['name']`, matching the nested lookup the in-memory
//! provider does for JSON objects. Dotted table names are schema qualified.

use super::types::{Page, PageProvider, PageRequest};
use crate::error::{Error, Result};
use crate::sort::is_valid_field_name;
use async_trait::async_trait;
use duckdb::types::Value as DuckValue;
use duckdb::Connection;
use serde_json::{Map, Number, Value};
use std::path::Path;
use std::sync::Mutex;

/// Table source queried through DuckDB
pub struct DuckDbProvider {
    /// DuckDB connection (not `Sync`, hence the mutex)
    conn: Mutex<Connection>,
    /// Validated table name, possibly schema qualified
    table: String,
    /// Provider name (for logging and errors)
    name: String,
}

impl std::fmt::Debug for DuckDbProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DuckDbProvider")
            .field("table", &self.table)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl DuckDbProvider {
    /// Open a DuckDB database file (or `:memory:`) and read from `table`
    pub fn open(database: impl AsRef<Path>, table: impl Into<String>) -> Result<Self> {
        let database = database.as_ref();
        let conn = if database.as_os_str() == ":memory:" {
            Connection::open_in_memory()
        } else {
            Connection::open(database)
        }
        .map_err(|e| {
            Error::config(format!(
                "Failed to open DuckDB database '{}': {e}",
                database.display()
            ))
        })?;

        Self::from_connection(conn, table)
    }

    /// Read from `table` using an existing connection
    pub fn from_connection(conn: Connection, table: impl Into<String>) -> Result<Self> {
        let table = table.into();
        if !is_valid_field_name(&table) {
            return Err(Error::invalid_value(
                "table",
                format!("invalid table name '{table}'"),
            ));
        }

        Ok(Self {
            conn: Mutex::new(conn),
            name: table.clone(),
            table,
        })
    }

    /// Override the provider name
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Table this provider reads from
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Run setup SQL on the underlying connection
    pub fn execute_batch(&self, sql: &str) -> Result<()> {
        let conn = self.lock()?;
        conn.execute_batch(sql)
            .map_err(|e| Error::source_unavailable(&self.name, e.to_string()))
    }

    /// Render the page query for a request
    pub fn build_query(&self, request: &PageRequest<'_>) -> String {
        let order_by = request
            .sort
            .iter()
            .map(|o| format!("{} {}", field_expression(&o.field), o.direction.as_sql()))
            .collect::<Vec<_>>()
            .join(", ");

        format!(
            "SELECT * FROM {} ORDER BY {} LIMIT {} OFFSET {}",
            quote_identifier(&self.table),
            order_by,
            request.page_size,
            request.offset()
        )
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| Error::source_unavailable(&self.name, "connection lock poisoned"))
    }

    /// Execute the page query and convert every row to a JSON object
    fn query_page(&self, request: &PageRequest<'_>) -> Result<Vec<Value>> {
        let query = self.build_query(request);
        tracing::debug!(provider = %self.name, "Executing page query: {}", query);

        let unavailable = |e: duckdb::Error| Error::source_unavailable(&self.name, e.to_string());

        let conn = self.lock()?;
        let mut stmt = conn.prepare(&query).map_err(unavailable)?;
        let mut rows = stmt.query([]).map_err(unavailable)?;
        let columns: Vec<String> = rows
            .as_ref()
            .map(|stmt| stmt.column_names())
            .unwrap_or_default();

        let mut records = Vec::new();
        while let Some(row) = rows.next().map_err(unavailable)? {
            let mut record = Map::with_capacity(columns.len());
            for (i, column) in columns.iter().enumerate() {
                let value: DuckValue = row.get(i).map_err(unavailable)?;
                record.insert(column.clone(), duck_to_json(value));
            }
            records.push(Value::Object(record));
        }

        Ok(records)
    }
}

#[async_trait]
impl PageProvider<Value> for DuckDbProvider {
    async fn fetch_page(&self, request: &PageRequest<'_>) -> Result<Page<Value>> {
        let records = self.query_page(request)?;
        if records.len() < request.limit() {
            Ok(Page::last(records))
        } else {
            Ok(Page::new(records))
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Quote a (possibly dotted) identifier: `main.users` -> `"main"."users"`
fn quote_identifier(identifier: &str) -> String {
    identifier
        .split('.')
        .map(|part| format!("\"{}\"", part.replace('"', "\"\"")))
        .collect::<Vec<_>>()
        .join(".")
}

/// Render a sort field: `owner.name` -> `"owner"['name']`
fn field_expression(field: &str) -> String {
    let mut parts = field.split('.');
    let mut expression = quote_identifier(parts.next().unwrap_or_default());
    for key in parts {
        expression.push_str(&format!("['{}']", key.replace('\'', "''")));
    }
    expression
}

/// Convert a DuckDB value to JSON
fn duck_to_json(value: DuckValue) -> Value {
    match value {
        DuckValue::Null => Value::Null,
        DuckValue::Boolean(b) => Value::Bool(b),
        DuckValue::TinyInt(n) => Value::from(n),
        DuckValue::SmallInt(n) => Value::from(n),
        DuckValue::Int(n) => Value::from(n),
        DuckValue::BigInt(n) => Value::from(n),
        DuckValue::HugeInt(n) => i64::try_from(n)
            .map(Value::from)
            .unwrap_or_else(|_| Value::String(n.to_string())),
        DuckValue::UTinyInt(n) => Value::from(n),
        DuckValue::USmallInt(n) => Value::from(n),
        DuckValue::UInt(n) => Value::from(n),
        DuckValue::UBigInt(n) => Value::from(n),
        DuckValue::Float(f) => Number::from_f64(f64::from(f)).map_or(Value::Null, Value::Number),
        DuckValue::Double(f) => Number::from_f64(f).map_or(Value::Null, Value::Number),
        DuckValue::Text(s) => Value::String(s),
        DuckValue::Blob(bytes) => Value::String(hex::encode(bytes)),
        DuckValue::List(items) => Value::Array(items.into_iter().map(duck_to_json).collect()),
        DuckValue::Struct(fields) => Value::Object(
            fields
                .iter()
                .map(|(key, value)| (key.clone(), duck_to_json(value.clone())))
                .collect(),
        ),
        other => Value::String(format!("{other:?}")),
    }
}
