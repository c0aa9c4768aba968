//! Fakes shared by the unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use serde_json::json;
use uuid::Uuid;

use crate::error::{BackendError, WriteFailure};
use crate::message::{Message, ValidatedMessage};
use crate::ports::{
    encode_row, MessageLog, ProceduralApi, RawStatementApi, Row, SqlValue, StructuredDataApi,
    UserDirectory,
};
use crate::strategy::WriteStrategy;

pub const SESSION: &str = "11111111-1111-1111-1111-111111111111";
pub const SENDER: &str = "22222222-2222-2222-2222-222222222222";
pub const RECIPIENT: &str = "33333333-3333-3333-3333-333333333333";

pub fn uuid(s: &str) -> Uuid {
    Uuid::parse_str(s).unwrap()
}

pub fn validated(body: &str) -> ValidatedMessage {
    ValidatedMessage {
        session_id: uuid(SESSION),
        sender_id: uuid(SENDER),
        recipient_id: uuid(RECIPIENT),
        body: body.into(),
    }
}

pub fn stored(message: &ValidatedMessage) -> Message {
    let now = Utc::now();
    Message {
        id: Uuid::new_v4(),
        session_id: message.session_id,
        sender_id: message.sender_id,
        recipient_id: message.recipient_id,
        body: message.body.clone(),
        is_read: false,
        created_at: now,
        updated_at: now,
    }
}

pub fn message_row(message: &ValidatedMessage) -> Row {
    encode_row(&stored(message)).unwrap()
}

/// A message created `offset_secs` after a fixed epoch.
pub fn message_at(offset_secs: i64, sender: Uuid, recipient: Uuid, body: &str) -> Message {
    let base = Utc.with_ymd_and_hms(2026, 1, 1, 9, 0, 0).unwrap();
    let at = base + Duration::seconds(offset_secs);
    Message {
        id: Uuid::new_v4(),
        session_id: uuid(SESSION),
        sender_id: sender,
        recipient_id: recipient,
        body: body.into(),
        is_read: false,
        created_at: at,
        updated_at: at,
    }
}

// ── Recording backend ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Insert { table: String, row: Row },
    Procedure { name: String, args: Vec<(String, SqlValue)> },
    Execute { sql: String, params: Vec<SqlValue> },
}

#[derive(Debug, Default)]
enum Mode {
    #[default]
    Echo,
    Fail(String),
    Empty,
}

/// Backend that records every call and either echoes the written values
/// back as a stored row, fails, or returns no rows.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    mode: Mode,
    calls: Mutex<Vec<Call>>,
}

impl RecordingBackend {
    pub fn failing(reason: &str) -> Self {
        Self {
            mode: Mode::Fail(reason.into()),
            ..Default::default()
        }
    }

    pub fn returning_nothing() -> Self {
        Self {
            mode: Mode::Empty,
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: Call) -> Result<(), BackendError> {
        self.calls.lock().unwrap().push(call);
        match &self.mode {
            Mode::Fail(reason) => Err(BackendError::Unavailable(reason.clone())),
            _ => Ok(()),
        }
    }

    fn complete(&self, mut row: Row) -> Vec<Row> {
        if matches!(self.mode, Mode::Empty) {
            return Vec::new();
        }
        let now = Utc::now().to_rfc3339();
        row.insert("id".into(), json!(Uuid::new_v4()));
        row.entry("is_read").or_insert(json!(false));
        row.insert("created_at".into(), json!(now));
        row.insert("updated_at".into(), json!(now));
        vec![row]
    }
}

#[async_trait]
impl StructuredDataApi for RecordingBackend {
    async fn insert(&self, table: &str, row: Row) -> Result<Row, BackendError> {
        self.record(Call::Insert {
            table: table.into(),
            row: row.clone(),
        })?;
        self.complete(row)
            .pop()
            .ok_or_else(|| BackendError::Unavailable("no row".into()))
    }
}

#[async_trait]
impl ProceduralApi for RecordingBackend {
    async fn call_procedure(
        &self,
        name: &str,
        args: &[(&str, SqlValue)],
    ) -> Result<Vec<Row>, BackendError> {
        self.record(Call::Procedure {
            name: name.into(),
            args: args.iter().map(|(n, v)| ((*n).to_owned(), v.clone())).collect(),
        })?;
        let row = args
            .iter()
            .map(|(n, v)| (n.trim_start_matches("p_").to_owned(), v.to_json()))
            .collect();
        Ok(self.complete(row))
    }
}

#[async_trait]
impl RawStatementApi for RecordingBackend {
    async fn execute(&self, sql: &str, params: &[SqlValue]) -> Result<Vec<Row>, BackendError> {
        self.record(Call::Execute {
            sql: sql.into(),
            params: params.to_vec(),
        })?;
        let columns = ["session_id", "sender_id", "recipient_id", "body", "is_read"];
        let row = columns
            .iter()
            .zip(params)
            .map(|(c, v)| ((*c).to_owned(), v.to_json()))
            .collect();
        Ok(self.complete(row))
    }
}

// ── Scripted strategies ──────────────────────────────────────────────────────

/// Strategy with a fixed outcome and an invocation counter.
pub struct ScriptedStrategy {
    name: &'static str,
    succeed: bool,
    calls: AtomicUsize,
}

impl ScriptedStrategy {
    pub fn ok(name: &'static str) -> Arc<Self> {
        Arc::new(Self {
            name,
            succeed: true,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn err(name: &'static str) -> Arc<Self> {
        Arc::new(Self {
            name,
            succeed: false,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WriteStrategy for ScriptedStrategy {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn attempt(&self, message: &ValidatedMessage) -> Result<Message, WriteFailure> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.succeed {
            Ok(stored(message))
        } else {
            Err(WriteFailure::new(self.name, format!("{} refused", self.name)))
        }
    }
}

// ── Read-side fakes ──────────────────────────────────────────────────────────

#[derive(Default)]
pub struct FakeDirectory {
    names: HashMap<Uuid, String>,
    fail: bool,
    calls: AtomicUsize,
    requested: Mutex<Vec<Vec<Uuid>>>,
}

impl FakeDirectory {
    pub fn with(entries: &[(Uuid, &str)]) -> Arc<Self> {
        Arc::new(Self {
            names: entries.iter().map(|(id, n)| (*id, (*n).to_owned())).collect(),
            ..Default::default()
        })
    }

    pub fn broken() -> Arc<Self> {
        Arc::new(Self {
            fail: true,
            ..Default::default()
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requested(&self) -> Vec<Vec<Uuid>> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl UserDirectory for FakeDirectory {
    async fn display_names(&self, ids: &[Uuid]) -> Result<HashMap<Uuid, String>, BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requested.lock().unwrap().push(ids.to_vec());
        if self.fail {
            return Err(BackendError::Unavailable("directory offline".into()));
        }
        Ok(ids
            .iter()
            .filter_map(|id| self.names.get(id).map(|n| (*id, n.clone())))
            .collect())
    }
}

/// Message log returning a fixed list in the given (storage) order.
pub struct FakeLog {
    messages: Mutex<Vec<Message>>,
}

impl FakeLog {
    pub fn new(messages: Vec<Message>) -> Arc<Self> {
        Arc::new(Self {
            messages: Mutex::new(messages),
        })
    }
}

#[async_trait]
impl MessageLog for FakeLog {
    async fn session_messages(&self, session_id: Uuid) -> Result<Vec<Message>, BackendError> {
        Ok(self
            .messages
            .lock()
            .unwrap()
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
        let mut messages = self.messages.lock().unwrap();
        Ok(messages
            .iter_mut()
            .find(|m| m.id == message_id && m.recipient_id == reader_id)
            .map(|m| {
                m.is_read = true;
                m.clone()
            }))
    }
}
