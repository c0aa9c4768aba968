//! Conversation read model: chronological listing with participant names.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::ReadError;
use crate::message::{EnrichedMessage, SortOrder};
use crate::ports::{MessageLog, UserDirectory};
use crate::validate::parse_identifier;

/// Label used when a participant has no directory entry.
pub const UNKNOWN_PARTICIPANT: &str = "Unknown user";

pub struct ConversationReader {
    log: Arc<dyn MessageLog>,
    directory: Arc<dyn UserDirectory>,
}

impl std::fmt::Debug for ConversationReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversationReader").finish_non_exhaustive()
    }
}

impl ConversationReader {
    pub fn new(log: Arc<dyn MessageLog>, directory: Arc<dyn UserDirectory>) -> Self {
        Self { log, directory }
    }

    /// Lists a session's messages ordered by `created_at`.
    ///
    /// Ties keep storage insertion order for [`SortOrder::Asc`]; `Desc` is the
    /// exact reverse. Display names come from a single batched directory
    /// lookup. If the directory is unavailable every participant gets
    /// [`UNKNOWN_PARTICIPANT`] rather than failing the listing.
    pub async fn list_messages(
        &self,
        session_id: &str,
        order: SortOrder,
    ) -> Result<Vec<EnrichedMessage>, ReadError> {
        let session_id = parse_identifier("sessionId", session_id)?;
        let mut messages = self.log.session_messages(session_id).await?;

        // Stable, so equal timestamps stay in storage order.
        messages.sort_by_key(|m| m.created_at);
        if order == SortOrder::Desc {
            messages.reverse();
        }

        let participants: BTreeSet<Uuid> = messages
            .iter()
            .flat_map(|m| [m.sender_id, m.recipient_id])
            .collect();
        let names = self.resolve_names(participants).await;

        debug!(%session_id, count = messages.len(), %order, "conversation listed");
        Ok(messages
            .into_iter()
            .map(|message| {
                let label = |id: &Uuid| {
                    names
                        .get(id)
                        .cloned()
                        .unwrap_or_else(|| UNKNOWN_PARTICIPANT.to_owned())
                };
                EnrichedMessage {
                    sender_name: label(&message.sender_id),
                    recipient_name: label(&message.recipient_id),
                    message,
                }
            })
            .collect())
    }

    async fn resolve_names(&self, ids: BTreeSet<Uuid>) -> HashMap<Uuid, String> {
        if ids.is_empty() {
            return HashMap::new();
        }
        let ids: Vec<Uuid> = ids.into_iter().collect();
        match self.directory.display_names(&ids).await {
            Ok(names) => names,
            Err(e) => {
                warn!(
                    error = %e,
                    participants = ids.len(),
                    "user directory lookup failed; using placeholders"
                );
                HashMap::new()
            }
        }
    }
}
