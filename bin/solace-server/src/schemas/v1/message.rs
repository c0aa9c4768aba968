use serde::{Deserialize, Deserializer, Serialize};
use solace_core::validate::MAX_BODY_CHARS;
use solace_core::{EnrichedMessage, Message, SendMessage, ValidationFailure};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Hard cap on the raw body field before it reaches the core, which applies
/// its own, stricter character limit after trimming.
pub const MAX_BODY_PAYLOAD: u64 = 16_384;
/// Canonical identifiers are 36 characters; anything far longer is refused
/// before parsing.
pub const MAX_ID_PAYLOAD: u64 = 64;

/// Missing or `null` fields deserialize to `""` so they are reported by
/// identifier validation rather than by the JSON extractor.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    #[serde(default, deserialize_with = "null_as_empty")]
    #[validate(length(max = MAX_ID_PAYLOAD))]
    pub session_id: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    #[validate(length(max = MAX_ID_PAYLOAD))]
    pub sender_id: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    #[validate(length(max = MAX_ID_PAYLOAD))]
    pub recipient_id: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    #[validate(length(max = MAX_BODY_PAYLOAD))]
    pub body: String,
}

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Identifier fields in the order the core reports them, with wire names.
const IDENTIFIER_FIELDS: [(&str, &str); 4] = [
    ("session_id", "sessionId"),
    ("sender_id", "senderId"),
    ("recipient_id", "recipientId"),
    ("reader_id", "readerId"),
];

/// Runs the payload limits and reports a violation in the same terms as
/// the core validator, using the wire field name.
pub fn check_payload<T: Validate>(payload: &T) -> Result<(), ValidationFailure> {
    let Err(errors) = payload.validate() else {
        return Ok(());
    };
    let fields = errors.field_errors();
    let failure = IDENTIFIER_FIELDS
        .iter()
        .find(|(rust, _)| fields.contains_key(*rust))
        .map(|(_, wire)| ValidationFailure::InvalidIdentifier {
            field: *wire,
            value: String::new(),
        })
        .unwrap_or(ValidationFailure::BodyTooLong { max: MAX_BODY_CHARS });
    Err(failure)
}

impl From<SendMessageRequest> for SendMessage {
    fn from(req: SendMessageRequest) -> Self {
        SendMessage {
            session_id: req.session_id,
            sender_id: req.sender_id,
            recipient_id: req.recipient_id,
            body: req.body,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct MarkReadRequest {
    #[serde(default, deserialize_with = "null_as_empty")]
    #[validate(length(max = MAX_ID_PAYLOAD))]
    pub reader_id: String,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListMessagesQuery {
    /// `asc` (oldest first, default) or `desc`.
    pub order: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MessageResponse {
    pub id: String,
    pub session_id: String,
    pub sender_id: String,
    pub recipient_id: String,
    pub body: String,
    pub is_read: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Message> for MessageResponse {
    fn from(m: Message) -> Self {
        MessageResponse {
            id: m.id.to_string(),
            session_id: m.session_id.to_string(),
            sender_id: m.sender_id.to_string(),
            recipient_id: m.recipient_id.to_string(),
            body: m.body,
            is_read: m.is_read,
            created_at: m.created_at.to_rfc3339(),
            updated_at: m.updated_at.to_rfc3339(),
        }
    }
}

/// `{ "success": true, "message": {...} }`
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MessageEnvelope {
    pub success: bool,
    pub message: MessageResponse,
}

impl MessageEnvelope {
    pub fn ok(message: Message) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedMessageResponse {
    #[serde(flatten)]
    pub message: MessageResponse,
    pub sender_name: String,
    pub recipient_name: String,
}

impl From<EnrichedMessage> for EnrichedMessageResponse {
    fn from(e: EnrichedMessage) -> Self {
        EnrichedMessageResponse {
            message: e.message.into(),
            sender_name: e.sender_name,
            recipient_name: e.recipient_name,
        }
    }
}
