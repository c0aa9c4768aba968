//! In-process backend for development and tests.
//!
//! Holds messages and display names in memory. It understands the message
//! table and the `send_session_message` procedure; it cannot run SQL text, so
//! the raw statement port always fails.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::BackendError;
use crate::message::{Message, MESSAGES_TABLE, SEND_MESSAGE_PROCEDURE};
use crate::ports::{
    decode_row, encode_row, MessageLog, ProceduralApi, RawStatementApi, Row, SqlValue,
    StructuredDataApi, UserDirectory,
};

const BACKEND: &str = "memory backend";

#[derive(Debug, Default)]
pub struct MemoryBackend {
    messages: Mutex<Vec<Message>>,
    profiles: Mutex<HashMap<Uuid, String>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_display_name(&self, id: Uuid, name: impl Into<String>) -> Result<(), BackendError> {
        self.profiles()?.insert(id, name.into());
        Ok(())
    }

    fn messages(&self) -> Result<MutexGuard<'_, Vec<Message>>, BackendError> {
        self.messages
            .lock()
            .map_err(|_| BackendError::Unavailable("message store lock poisoned".into()))
    }

    fn profiles(&self) -> Result<MutexGuard<'_, HashMap<Uuid, String>>, BackendError> {
        self.profiles
            .lock()
            .map_err(|_| BackendError::Unavailable("profile store lock poisoned".into()))
    }

    /// Fills in the columns the database would default, then stores the row.
    fn store(&self, mut row: Row) -> Result<Row, BackendError> {
        let now = Utc::now().to_rfc3339();
        row.entry("id").or_insert_with(|| json!(Uuid::new_v4()));
        row.entry("is_read").or_insert(Value::Bool(false));
        row.insert("created_at".into(), json!(now));
        row.insert("updated_at".into(), json!(now));

        let message: Message = decode_row(row)?;
        if message.body.trim().is_empty() {
            return Err(BackendError::Unavailable(
                "check constraint violated: body must not be blank".into(),
            ));
        }
        let mut messages = self.messages()?;
        if messages.iter().any(|m| m.id == message.id) {
            return Err(BackendError::Unavailable(format!(
                "duplicate key value violates unique constraint: id {}",
                message.id
            )));
        }
        let stored = encode_row(&message)?;
        messages.push(message);
        Ok(stored)
    }
}

#[async_trait]
impl StructuredDataApi for MemoryBackend {
    async fn insert(&self, table: &str, row: Row) -> Result<Row, BackendError> {
        if table != MESSAGES_TABLE {
            return Err(BackendError::Unsupported {
                backend: BACKEND,
                operation: format!("insert into {table}"),
            });
        }
        self.store(row)
    }
}

#[async_trait]
impl ProceduralApi for MemoryBackend {
    async fn call_procedure(
        &self,
        name: &str,
        args: &[(&str, SqlValue)],
    ) -> Result<Vec<Row>, BackendError> {
        if name != SEND_MESSAGE_PROCEDURE {
            return Err(BackendError::Unsupported {
                backend: BACKEND,
                operation: format!("procedure {name}"),
            });
        }
        let row = args
            .iter()
            .map(|(arg, value)| (arg.trim_start_matches("p_").to_owned(), value.to_json()))
            .collect();
        Ok(vec![self.store(row)?])
    }
}

#[async_trait]
impl RawStatementApi for MemoryBackend {
    async fn execute(&self, _sql: &str, _params: &[SqlValue]) -> Result<Vec<Row>, BackendError> {
        Err(BackendError::Unsupported {
            backend: BACKEND,
            operation: "raw statements".into(),
        })
    }
}

#[async_trait]
impl MessageLog for MemoryBackend {
    async fn session_messages(&self, session_id: Uuid) -> Result<Vec<Message>, BackendError> {
        Ok(self
            .messages()?
            .iter()
            .filter(|m| m.session_id == session_id)
            .cloned()
            .collect())
    }

    async fn mark_read(
        &self,
        message_id: Uuid,
        reader_id: Uuid,
    ) -> Result<Option<Message>, BackendError> {
        let mut messages = self.messages()?;
        Ok(messages
            .iter_mut()
            .find(|m| m.id == message_id && m.recipient_id == reader_id)
            .map(|m| {
                if !m.is_read {
                    m.is_read = true;
                    m.updated_at = Utc::now();
                }
                m.clone()
            }))
    }
}

#[async_trait]
impl UserDirectory for MemoryBackend {
    async fn display_names(&self, ids: &[Uuid]) -> Result<HashMap<Uuid, String>, BackendError> {
        let profiles = self.profiles()?;
        Ok(ids
            .iter()
            .filter_map(|id| profiles.get(id).map(|name| (*id, name.clone())))
            .collect())
    }
}
