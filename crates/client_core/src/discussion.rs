use std::sync::Arc;

use shared::{domain::CaseId, protocol::MessageRecord};

use crate::gateway::{ApiGateway, GatewayError};

/// Discussion-thread operations scoped to a case. Threads are append-only
/// and always re-fetched from the server; there is no optimistic append,
/// so what the caller holds after a post matches server state.
pub struct DiscussionClient {
    gateway: Arc<ApiGateway>,
}

impl DiscussionClient {
    pub fn new(gateway: Arc<ApiGateway>) -> Self {
        Self { gateway }
    }

    /// Fresh fetch of the thread, sorted by timestamp ascending.
    pub async fn thread(&self, case_id: CaseId) -> Result<Vec<MessageRecord>, GatewayError> {
        let mut messages = self.gateway.list_messages(case_id).await?;
        messages.sort_by_key(|message| message.timestamp);
        Ok(messages)
    }

    /// Appends a message, then returns the re-fetched thread.
    pub async fn post_and_refresh(
        &self,
        case_id: CaseId,
        content: &str,
    ) -> Result<Vec<MessageRecord>, GatewayError> {
        self.gateway.post_message(case_id, content).await?;
        self.thread(case_id).await
    }
}
