use std::sync::Arc;

use async_trait::async_trait;

use super::{backend_failure, first_message, WriteStrategy};
use crate::error::WriteFailure;
use crate::message::{Message, ValidatedMessage};
use crate::ports::{RawStatementApi, SqlValue};

/// Every value is a bound parameter; message content never reaches the
/// statement text.
pub(crate) const INSERT_MESSAGE_SQL: &str = "INSERT INTO session_messages \
     (session_id, sender_id, recipient_id, body, is_read) \
     VALUES ($1, $2, $3, $4, $5) \
     RETURNING id, session_id, sender_id, recipient_id, body, is_read, created_at, updated_at";

/// Last resort: a literal insert statement. It bypasses the structured
/// layer's validation, so it only runs after the other strategies failed.
pub struct RawStatementInsert {
    api: Arc<dyn RawStatementApi>,
}

impl RawStatementInsert {
    pub const NAME: &'static str = "raw_statement_insert";

    pub fn new(api: Arc<dyn RawStatementApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl WriteStrategy for RawStatementInsert {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    async fn attempt(&self, message: &ValidatedMessage) -> Result<Message, WriteFailure> {
        let params = [
            SqlValue::Uuid(message.session_id),
            SqlValue::Uuid(message.sender_id),
            SqlValue::Uuid(message.recipient_id),
            SqlValue::Text(message.body.clone()),
            SqlValue::Bool(false),
        ];
        let rows = self
            .api
            .execute(INSERT_MESSAGE_SQL, &params)
            .await
            .map_err(backend_failure(Self::NAME))?;
        first_message(Self::NAME, rows)
    }
}
