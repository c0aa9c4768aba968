//! Interfaces to the hosted backend.
//!
//! Every collaborator the core talks to is one of these traits, injected as
//! `Arc<dyn ...>` so the same resolver runs against Postgres, a PostgREST
//! endpoint, the in-memory backend, or a test fake. The traits go through
//! `async-trait` rather than `impl Future` returns because they are used as
//! trait objects.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

use crate::error::BackendError;
use crate::message::Message;

/// A row as exchanged with the backend: column name to JSON value.
pub type Row = serde_json::Map<String, serde_json::Value>;

/// A value bound to a statement or procedure parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Uuid(Uuid),
    Text(String),
    Bool(bool),
}

impl SqlValue {
    /// JSON form used by HTTP backends and the memory backend.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            SqlValue::Uuid(u) => serde_json::Value::String(u.to_string()),
            SqlValue::Text(s) => serde_json::Value::String(s.clone()),
            SqlValue::Bool(b) => serde_json::Value::Bool(*b),
        }
    }
}

/// Table-scoped create operation.
#[async_trait]
pub trait StructuredDataApi: Send + Sync + 'static {
    /// Inserts `row` into `table` and returns the stored row, including any
    /// columns the backend filled in.
    async fn insert(&self, table: &str, row: Row) -> Result<Row, BackendError>;
}

/// Named server-side procedure invocation.
#[async_trait]
pub trait ProceduralApi: Send + Sync + 'static {
    /// Calls `name` with named arguments and returns its result rows.
    async fn call_procedure(
        &self,
        name: &str,
        args: &[(&str, SqlValue)],
    ) -> Result<Vec<Row>, BackendError>;
}

/// Parameterized statement execution.
#[async_trait]
pub trait RawStatementApi: Send + Sync + 'static {
    /// Executes `sql` with positional parameters `$1..$n` bound from `params`.
    async fn execute(&self, sql: &str, params: &[SqlValue]) -> Result<Vec<Row>, BackendError>;
}

/// Batched identity-to-label resolution.
#[async_trait]
pub trait UserDirectory: Send + Sync + 'static {
    /// Returns display names for whichever of `ids` have a directory entry.
    async fn display_names(&self, ids: &[Uuid]) -> Result<HashMap<Uuid, String>, BackendError>;
}

/// Read side of the message table.
#[async_trait]
pub trait MessageLog: Send + Sync + 'static {
    /// All messages of a session in storage order.
    async fn session_messages(&self, session_id: Uuid) -> Result<Vec<Message>, BackendError>;

    /// Sets `is_read` on `message_id` if `reader_id` is its recipient.
    /// Returns `None` when no such message exists.
    async fn mark_read(
        &self,
        message_id: Uuid,
        reader_id: Uuid,
    ) -> Result<Option<Message>, BackendError>;
}

/// Returns `true` for names safe to splice into statement text: ASCII letters,
/// digits and underscores, not starting with a digit, at most 63 bytes.
pub fn is_sql_identifier(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= 63
        && name
            .bytes()
            .next()
            .is_some_and(|b| b.is_ascii_alphabetic() || b == b'_')
        && name.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_')
}

/// Fails with [`BackendError::InvalidIdentifier`] unless `name` passes
/// [`is_sql_identifier`].
pub fn ensure_sql_identifier(name: &str) -> Result<(), BackendError> {
    if is_sql_identifier(name) {
        Ok(())
    } else {
        Err(BackendError::InvalidIdentifier(name.to_owned()))
    }
}

pub fn decode_row<T: DeserializeOwned>(row: Row) -> Result<T, BackendError> {
    Ok(serde_json::from_value(serde_json::Value::Object(row))?)
}

pub fn encode_row<T: Serialize>(value: &T) -> Result<Row, BackendError> {
    match serde_json::to_value(value)? {
        serde_json::Value::Object(map) => Ok(map),
        other => Err(BackendError::Unavailable(format!(
            "expected a JSON object row, got {other}"
        ))),
    }
}
