//! Postgres implementation of every backend port.
//!
//! Uses [`sqlx`] with the `postgres` feature. Migrations under
//! `crates/solace-core/migrations` are embedded at compile time and run by
//! [`PgBackend::connect`].
//!
//! # Queries
//!
//! The runtime-checked `sqlx::query` form is used so no `DATABASE_URL` is
//! needed at compile time. Identifiers spliced into statement text (table,
//! procedure, argument and column names) are checked with
//! [`ensure_sql_identifier`]; every value is a bound parameter.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgArguments, PgPoolOptions};
use sqlx::query::QueryAs;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres};
use tracing::debug;
use uuid::Uuid;

use crate::error::BackendError;
use crate::message::{Message, MESSAGES_TABLE};
use crate::ports::{
    ensure_sql_identifier, MessageLog, ProceduralApi, RawStatementApi, Row, SqlValue,
    StructuredDataApi, UserDirectory,
};

type MessageTuple = (Uuid, Uuid, Uuid, Uuid, String, bool, DateTime<Utc>, DateTime<Utc>);

const MESSAGE_COLUMNS: &str =
    "id, session_id, sender_id, recipient_id, body, is_read, created_at, updated_at";

#[derive(Clone, Debug)]
pub struct PgBackend {
    pool: PgPool,
}

impl PgBackend {
    /// Connects to `url` and runs pending migrations.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, BackendError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await?;
        // Path is resolved relative to CARGO_MANIFEST_DIR at compile time.
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(sqlx::Error::from)?;
        Ok(Self { pool })
    }

    async fn fetch_json_rows(
        &self,
        sql: &str,
        params: &[SqlValue],
    ) -> Result<Vec<Row>, BackendError> {
        let query = params
            .iter()
            .fold(sqlx::query_as::<_, (Json<Row>,)>(sql), bind_value);
        let rows = query.fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(|(Json(row),)| row).collect())
    }
}

fn bind_value<'q>(
    query: QueryAs<'q, Postgres, (Json<Row>,), PgArguments>,
    value: &SqlValue,
) -> QueryAs<'q, Postgres, (Json<Row>,), PgArguments> {
    match value {
        SqlValue::Uuid(u) => query.bind(*u),
        SqlValue::Text(s) => query.bind(s.clone()),
        SqlValue::Bool(b) => query.bind(*b),
    }
}

fn message_from_tuple(
    (id, session_id, sender_id, recipient_id, body, is_read, created_at, updated_at): MessageTuple,
) -> Message {
    Message {
        id,
        session_id,
        sender_id,
        recipient_id,
        body,
        is_read,
        created_at,
        updated_at,
    }
}

#[async_trait]
impl StructuredDataApi for PgBackend {
    async fn insert(&self, table: &str, row: Row) -> Result<Row, BackendError> {
        ensure_sql_identifier(table)?;
        for column in row.keys() {
            ensure_sql_identifier(column)?;
        }
        let columns = row.keys().cloned().collect::<Vec<_>>().join(", ");
        // Only the supplied columns are inserted so omitted ones take their
        // column defaults.
        let sql = format!(
            "WITH inserted AS ( \
                 INSERT INTO {table} ({columns}) \
                 SELECT {columns} FROM jsonb_populate_record(NULL::{table}, $1) \
                 RETURNING * \
             ) SELECT to_jsonb(inserted) FROM inserted"
        );
        debug!(%table, "structured insert");
        let (Json(stored),): (Json<Row>,) = sqlx::query_as(&sql)
            .bind(Json(row))
            .fetch_one(&self.pool)
            .await?;
        Ok(stored)
    }
}

#[async_trait]
impl ProceduralApi for PgBackend {
    async fn call_procedure(
        &self,
        name: &str,
        args: &[(&str, SqlValue)],
    ) -> Result<Vec<Row>, BackendError> {
        ensure_sql_identifier(name)?;
        let mut named = Vec::with_capacity(args.len());
        for (i, (arg, _)) in args.iter().enumerate() {
            ensure_sql_identifier(arg)?;
            named.push(format!("{arg} => ${}", i + 1));
        }
        let sql = format!(
            "SELECT to_jsonb(result) FROM {name}({}) AS result",
            named.join(", ")
        );
        debug!(procedure = %name, "procedure call");
        let values: Vec<SqlValue> = args.iter().map(|(_, v)| v.clone()).collect();
        self.fetch_json_rows(&sql, &values).await
    }
}

#[async_trait]
impl RawStatementApi for PgBackend {
    async fn execute(&self, sql: &str, params: &[SqlValue]) -> Result<Vec<Row>, BackendError> {
        // A data-modifying CTE lets INSERT ... RETURNING come back as JSON rows.
        let wrapped = format!("WITH result AS ({sql}) SELECT to_jsonb(result) FROM result");
        self.fetch_json_rows(&wrapped, params).await
    }
}

#[async_trait]
impl MessageLog for PgBackend {
    async fn session_messages(&self, session_id: Uuid) -> Result<Vec<Message>, BackendError> {
        let rows: Vec<MessageTuple> = sqlx::query_as(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM {MESSAGES_TABLE} \
             WHERE session_id = $1 ORDER BY created_at ASC, seq ASC"
        ))
        .bind(session_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(message_from_tuple).collect())
    }

    async fn mark_read(
        &self,
        message_id: Uuid,
        reader_id: Uuid,
    ) -> Result<Option<Message>, BackendError> {
        let row: Option<MessageTuple> = sqlx::query_as(&format!(
            "UPDATE {MESSAGES_TABLE} \
             SET is_read = TRUE, updated_at = CASE WHEN is_read THEN updated_at ELSE now() END \
             WHERE id = $1 AND recipient_id = $2 \
             RETURNING {MESSAGE_COLUMNS}"
        ))
        .bind(message_id)
        .bind(reader_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(message_from_tuple))
    }
}

#[async_trait]
impl UserDirectory for PgBackend {
    async fn display_names(&self, ids: &[Uuid]) -> Result<HashMap<Uuid, String>, BackendError> {
        let rows: Vec<(Uuid, String)> = sqlx::query_as(
            "SELECT id, display_name FROM profiles \
             WHERE id = ANY($1) AND display_name IS NOT NULL",
        )
        .bind(ids.to_vec())
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().collect())
    }
}
