// File: src/services/ticket_service.rs
//
// The ticket resolution pipeline: given a normalized envelope, resolves or
// creates the contact and the open ticket, persists the message, updates
// the ticket preview/unread counters, and hands an auto-reply job to the
// dispatch queue.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{debug, error};
use uuid::Uuid;

use chatdesk_common::models::{
    Contact, JobOptions, JobPayload, Message, MessageEnvelope, ReplyJob, Ticket,
};
use chatdesk_common::traits::repository_traits::{
    AccountRepo, ContactRepo, MessageRepo, QueueRepo, TicketRepo,
};

use crate::Error;
use crate::eventbus::{DeskEvent, EventBus};
use crate::jobs::JobQueue;

/// Ticket preview shown when a message carries no text body.
pub const MEDIA_PLACEHOLDER: &str = "(media message)";
/// Maximum preview length stored on the ticket.
const PREVIEW_MAX_CHARS: usize = 255;

pub struct TicketService {
    contact_repo: Arc<dyn ContactRepo>,
    ticket_repo: Arc<dyn TicketRepo>,
    message_repo: Arc<dyn MessageRepo>,
    account_repo: Arc<dyn AccountRepo>,
    queue_repo: Arc<dyn QueueRepo>,
    event_bus: Arc<EventBus>,
    job_queue: Arc<JobQueue>,
    /// Per-(contact, account) critical sections. Two messages racing for
    /// the same ticket are serialized here; messages for different
    /// contacts never contend.
    ticket_locks: DashMap<(Uuid, i32), Arc<Mutex<()>>>,
}

impl TicketService {
    pub fn new(
        contact_repo: Arc<dyn ContactRepo>,
        ticket_repo: Arc<dyn TicketRepo>,
        message_repo: Arc<dyn MessageRepo>,
        account_repo: Arc<dyn AccountRepo>,
        queue_repo: Arc<dyn QueueRepo>,
        event_bus: Arc<EventBus>,
        job_queue: Arc<JobQueue>,
    ) -> Self {
        Self {
            contact_repo,
            ticket_repo,
            message_repo,
            account_repo,
            queue_repo,
            event_bus,
            job_queue,
            ticket_locks: DashMap::new(),
        }
    }

    /// Runs one envelope through the pipeline:
    ///  1. Resolves (or creates) the contact by canonical number.
    ///  2. Resolves (or creates) the open ticket for (contact, account).
    ///  3. Persists the message (idempotent on message id).
    ///  4. Updates unread counter and last-message preview.
    ///  5. Enqueues an auto-reply job when an automation prompt applies.
    ///
    /// Failures in steps 1-4 propagate; step 5 failures are logged and
    /// swallowed so ingestion never fails because dispatch failed.
    pub async fn ingest_message(
        &self,
        account_id: i32,
        envelope: &MessageEnvelope,
    ) -> Result<(), Error> {
        // 1) Contact resolution
        let contact = self.resolve_contact(envelope).await?;

        // Serialize per (contact, account) so racing messages cannot break
        // the unread-count or one-open-ticket invariants.
        let lock = self
            .ticket_locks
            .entry((contact.contact_id, account_id))
            .or_default()
            .clone();
        let _guard = lock.lock().await;

        // A replayed external id must not mint a fresh ticket (the original
        // one may have been closed since); bail before ticket resolution.
        if !envelope.external_id.is_empty()
            && self
                .message_repo
                .get(&envelope.external_id)
                .await?
                .is_some()
        {
            debug!("duplicate message {}; skipping", envelope.external_id);
            return Ok(());
        }

        // 2) Ticket resolution
        let (mut ticket, ticket_created) = match self
            .ticket_repo
            .find_open_by_contact_and_account(contact.contact_id, account_id)
            .await?
        {
            Some(t) => (t, false),
            None => {
                let t = Ticket::new(contact.contact_id, account_id, envelope.is_group);
                self.ticket_repo.create(&t).await?;
                (t, true)
            }
        };

        // 3) Message persistence. The insert is idempotent on message_id;
        //    a replayed envelope must not touch counters or preview again.
        let message = self.build_message(&ticket, &contact, envelope);
        let inserted = self.message_repo.insert(&message).await?;
        if !inserted {
            debug!(
                "duplicate message {} for ticket {}; skipping",
                message.message_id, ticket.ticket_id
            );
            return Ok(());
        }

        // 4) Ticket mutations: unread counter and preview
        if !envelope.from_self {
            ticket.unread_messages += 1;
        }
        ticket.last_message = preview_of(envelope);
        ticket.updated_at = message.created_at;
        self.ticket_repo.update(&ticket).await?;

        if ticket_created {
            self.event_bus
                .publish(DeskEvent::TicketCreated(ticket.clone()))
                .await;
        } else {
            self.event_bus
                .publish(DeskEvent::TicketUpdated(ticket.clone()))
                .await;
        }
        self.event_bus
            .publish(DeskEvent::MessageIngested {
                ticket: ticket.clone(),
                message: message.clone(),
                contact: contact.clone(),
            })
            .await;

        // 5) Auto-reply dispatch (inbound, non-deleted messages only).
        if !message.from_self && !message.deleted {
            if let Err(e) = self.dispatch_auto_reply(&ticket, &contact, &message).await {
                error!(
                    "auto-reply dispatch failed for ticket {}: {:?}",
                    ticket.ticket_id, e
                );
            }
        }

        Ok(())
    }

    /// Marks a message deleted and replaces its body with the placeholder.
    pub async fn soft_delete_message(&self, message_id: &str) -> Result<(), Error> {
        self.message_repo.soft_delete(message_id).await
    }

    async fn resolve_contact(&self, envelope: &MessageEnvelope) -> Result<Contact, Error> {
        let push_name = envelope
            .push_name
            .as_deref()
            .filter(|n| !n.trim().is_empty());

        let candidate = Contact::new(
            &envelope.remote_address,
            push_name.unwrap_or(&envelope.remote_address),
            envelope.is_group,
        );
        let mut contact = self.contact_repo.upsert(&candidate).await?;

        // Keep the display name fresh, but never clobber a stored name with
        // an empty one.
        if let Some(name) = push_name {
            if contact.name != name {
                self.contact_repo
                    .update_name(contact.contact_id, name)
                    .await?;
                contact.name = name.to_string();
            }
        }

        Ok(contact)
    }

    fn build_message(
        &self,
        ticket: &Ticket,
        contact: &Contact,
        envelope: &MessageEnvelope,
    ) -> Message {
        let message_id = if envelope.external_id.is_empty() {
            Uuid::new_v4().to_string()
        } else {
            envelope.external_id.clone()
        };

        let mut message = Message::new(&message_id, ticket.ticket_id);
        message.body = envelope.body.clone();
        message.from_self = envelope.from_self;
        message.media_kind = envelope.media_kind;
        message.read = envelope.from_self;
        // Inbound messages are attributed to the sender contact; outbound
        // attribution is by operator and lives outside this core.
        message.contact_id = (!envelope.from_self).then_some(contact.contact_id);
        message
    }

    /// Resolves the applicable automation prompt (queue-level first, then
    /// the account default) and enqueues the reply job. Best-effort.
    async fn dispatch_auto_reply(
        &self,
        ticket: &Ticket,
        contact: &Contact,
        message: &Message,
    ) -> Result<(), Error> {
        let mut prompt_id = None;
        if let Some(queue_id) = ticket.queue_id {
            prompt_id = self
                .queue_repo
                .get(queue_id)
                .await?
                .and_then(|q| q.prompt_id);
        }
        if prompt_id.is_none() {
            prompt_id = self
                .account_repo
                .get(ticket.account_id)
                .await?
                .and_then(|a| a.default_prompt_id);
        }

        let Some(prompt_id) = prompt_id else {
            return Ok(());
        };

        self.job_queue.enqueue(
            JobPayload::AutoReply(ReplyJob {
                ticket_id: ticket.ticket_id,
                message_body: message.body.clone().unwrap_or_default(),
                sender_name: contact.name.clone(),
                prompt_id,
            }),
            JobOptions::best_effort(),
        )
    }
}

fn preview_of(envelope: &MessageEnvelope) -> String {
    match &envelope.body {
        Some(body) => body.chars().take(PREVIEW_MAX_CHARS).collect(),
        None => MEDIA_PLACEHOLDER.to_string(),
    }
}
