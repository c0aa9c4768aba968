use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Table holding persisted session messages.
pub const MESSAGES_TABLE: &str = "session_messages";

/// Server-side function used by the procedural strategy.
pub const SEND_MESSAGE_PROCEDURE: &str = "send_session_message";

/// A row in the `session_messages` table.
///
/// Field names match the column names so rows returned by any backend decode
/// directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub session_id: Uuid,
    pub sender_id: Uuid,
    pub recipient_id: Uuid,
    pub body: String,
    #[serde(default)]
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Unvalidated send request, exactly as a caller supplied it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendMessage {
    pub session_id: String,
    pub sender_id: String,
    pub recipient_id: String,
    pub body: String,
}

/// A send request that passed validation. `body` is already trimmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedMessage {
    pub session_id: Uuid,
    pub sender_id: Uuid,
    pub recipient_id: Uuid,
    pub body: String,
}

/// A message with display names for both participants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnrichedMessage {
    #[serde(flatten)]
    pub message: Message,
    pub sender_name: String,
    pub recipient_name: String,
}

/// Display order for a conversation listing.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SortOrder {
    /// Oldest first, for chat replay.
    #[default]
    Asc,
    /// Most recent first.
    Desc,
}
