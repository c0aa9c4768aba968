use std::sync::Arc;

use tracing::info;

use crate::error::ReadError;
use crate::message::Message;
use crate::ports::MessageLog;
use crate::validate::parse_identifier;

/// The recipient's "mark as read" action, the only mutation a persisted
/// message allows.
pub struct ReadReceipts {
    log: Arc<dyn MessageLog>,
}

impl std::fmt::Debug for ReadReceipts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadReceipts").finish_non_exhaustive()
    }
}

impl ReadReceipts {
    pub fn new(log: Arc<dyn MessageLog>) -> Self {
        Self { log }
    }

    /// Returns `Ok(None)` when the message does not exist or is not addressed
    /// to `reader_id`. Marking an already-read message is a no-op success.
    pub async fn mark_read(
        &self,
        message_id: &str,
        reader_id: &str,
    ) -> Result<Option<Message>, ReadError> {
        let message_id = parse_identifier("messageId", message_id)?;
        let reader_id = parse_identifier("readerId", reader_id)?;
        let updated = self.log.mark_read(message_id, reader_id).await?;
        if updated.is_some() {
            info!(%message_id, %reader_id, "message marked read");
        }
        Ok(updated)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::testing::{message_at, uuid, FakeLog, RECIPIENT, SENDER};

    #[tokio::test]
    async fn only_the_recipient_can_mark_read() {
        let msg = message_at(0, uuid(SENDER), uuid(RECIPIENT), "hi");
        let id = msg.id.to_string();
        let receipts = ReadReceipts::new(FakeLog::new(vec![msg]));

        assert!(receipts.mark_read(&id, SENDER).await.unwrap().is_none());

        let first = receipts.mark_read(&id, RECIPIENT).await.unwrap().unwrap();
        assert!(first.is_read);
        let again = receipts.mark_read(&id, RECIPIENT).await.unwrap().unwrap();
        assert!(again.is_read);
    }

    #[tokio::test]
    async fn malformed_ids_are_validation_errors() {
        let receipts = ReadReceipts::new(FakeLog::new(Vec::new()));
        assert!(matches!(
            receipts.mark_read("x", RECIPIENT).await,
            Err(ReadError::Validation(_))
        ));
        assert!(matches!(
            receipts.mark_read(RECIPIENT, "").await,
            Err(ReadError::Validation(_))
        ));
    }
}
