// File: src/ingest/router.rs
//
// Filters raw message batches and funnels live messages, in arrival order,
// through the normalizer into the ticket resolution pipeline. One bad
// message must not block the rest of its batch.

use std::sync::Arc;

use tracing::{debug, error};

use crate::ingest::normalizer::normalize;
use crate::services::ticket_service::TicketService;
use crate::sessions::{BROADCAST_ADDRESS, BatchKind, MessageBatch};

pub struct InboundRouter {
    ticket_service: Arc<TicketService>,
}

impl InboundRouter {
    pub fn new(ticket_service: Arc<TicketService>) -> Self {
        Self { ticket_service }
    }

    /// Processes one raw batch for the given account. Messages are handled
    /// sequentially in array order; per-message failures are logged and the
    /// loop continues.
    pub async fn route_batch(&self, account_id: i32, batch: MessageBatch) {
        if batch.kind == BatchKind::HistorySync {
            debug!(
                "account {}: ignoring history-sync batch of {} message(s)",
                account_id,
                batch.messages.len()
            );
            return;
        }

        for raw in &batch.messages {
            if raw.remote_address == BROADCAST_ADDRESS {
                debug!("account {}: skipping broadcast/status message", account_id);
                continue;
            }

            let envelope = normalize(raw);
            if let Err(e) = self
                .ticket_service
                .ingest_message(account_id, &envelope)
                .await
            {
                // The adapter will not re-deliver this event, so a failure
                // here is a potential message loss. Log it loudly.
                error!(
                    "account {}: failed to ingest message {}: {:?}",
                    account_id, envelope.external_id, e
                );
            }
        }
    }
}
