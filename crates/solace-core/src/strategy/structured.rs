use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use super::{backend_failure, WriteStrategy};
use crate::error::WriteFailure;
use crate::message::{Message, ValidatedMessage, MESSAGES_TABLE};
use crate::ports::{decode_row, Row, StructuredDataApi};

/// Preferred path: a table-scoped insert through the structured data API,
/// which honours the backend's access policy. Identifier and timestamps are
/// left to the backend.
pub struct StructuredInsert {
    api: Arc<dyn StructuredDataApi>,
    table: &'static str,
}

impl StructuredInsert {
    pub const NAME: &'static str = "structured_insert";

    pub fn new(api: Arc<dyn StructuredDataApi>) -> Self {
        Self {
            api,
            table: MESSAGES_TABLE,
        }
    }
}

#[async_trait]
impl WriteStrategy for StructuredInsert {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    async fn attempt(&self, message: &ValidatedMessage) -> Result<Message, WriteFailure> {
        let mut row = Row::new();
        row.insert("session_id".into(), json!(message.session_id));
        row.insert("sender_id".into(), json!(message.sender_id));
        row.insert("recipient_id".into(), json!(message.recipient_id));
        row.insert("body".into(), json!(message.body));
        row.insert("is_read".into(), json!(false));

        let stored = self
            .api
            .insert(self.table, row)
            .await
            .map_err(backend_failure(Self::NAME))?;
        decode_row(stored).map_err(backend_failure(Self::NAME))
    }
}
