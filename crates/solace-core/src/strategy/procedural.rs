use std::sync::Arc;

use async_trait::async_trait;

use super::{backend_failure, first_message, WriteStrategy};
use crate::error::WriteFailure;
use crate::message::{Message, ValidatedMessage, SEND_MESSAGE_PROCEDURE};
use crate::ports::{ProceduralApi, SqlValue};

/// Calls the `send_session_message` procedure, which performs the insert in
/// its own exception block and returns the new row. Used when the structured
/// path is rejected by policy or capability.
pub struct ProceduralInsert {
    api: Arc<dyn ProceduralApi>,
}

impl ProceduralInsert {
    pub const NAME: &'static str = "procedural_insert";

    pub fn new(api: Arc<dyn ProceduralApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl WriteStrategy for ProceduralInsert {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    async fn attempt(&self, message: &ValidatedMessage) -> Result<Message, WriteFailure> {
        let args = [
            ("p_session_id", SqlValue::Uuid(message.session_id)),
            ("p_sender_id", SqlValue::Uuid(message.sender_id)),
            ("p_recipient_id", SqlValue::Uuid(message.recipient_id)),
            ("p_body", SqlValue::Text(message.body.clone())),
        ];
        let rows = self
            .api
            .call_procedure(SEND_MESSAGE_PROCEDURE, &args)
            .await
            .map_err(backend_failure(Self::NAME))?;
        first_message(Self::NAME, rows)
    }
}
