// tests/ingest_tests.rs
//
// The message ingestion pipeline: contact and ticket resolution, unread
// counters and previews, idempotent replay, batch filtering, and auto-reply
// dispatch.

mod common;

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time::sleep;
use uuid::Uuid;

use chatdesk_common::models::{
    Account, JobPayload, MediaKind, Queue, Ticket, TicketStatus,
};
use chatdesk_common::traits::repository_traits::{AccountRepo, TicketRepo};
use chatdesk_core::eventbus::DeskEvent;
use chatdesk_core::ingest::InboundRouter;
use chatdesk_core::services::ticket_service::MEDIA_PLACEHOLDER;
use chatdesk_core::sessions::{BROADCAST_ADDRESS, RawContent, RawMessage};

use common::{
    history_batch, inbound, live_batch, media_inbound, outbound, pipeline, raw_text, wait_for,
};

const ACCOUNT: i32 = 1;
const NUMBER: &str = "5511999990000";

#[tokio::test]
async fn first_message_creates_contact_ticket_and_message() {
    let p = pipeline();

    p.ticket_service
        .ingest_message(ACCOUNT, &inbound("W1", NUMBER, Some("Ana"), "Oi"))
        .await
        .unwrap();

    let contacts = p.contacts.all();
    assert_eq!(contacts.len(), 1);
    assert_eq!(contacts[0].number, NUMBER);
    assert_eq!(contacts[0].name, "Ana");
    assert!(!contacts[0].is_group);

    let tickets = p.tickets.all();
    assert_eq!(tickets.len(), 1);
    assert_eq!(tickets[0].status, TicketStatus::Pending);
    assert_eq!(tickets[0].unread_messages, 1);
    assert_eq!(tickets[0].last_message, "Oi");

    let messages = p.messages.all();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].message_id, "W1");
    assert!(!messages[0].read);
    assert_eq!(messages[0].contact_id, Some(contacts[0].contact_id));
}

#[tokio::test]
async fn later_messages_reuse_the_open_ticket() {
    let p = pipeline();

    p.ticket_service
        .ingest_message(ACCOUNT, &inbound("W1", NUMBER, Some("Ana"), "Oi"))
        .await
        .unwrap();
    p.ticket_service
        .ingest_message(ACCOUNT, &inbound("W2", NUMBER, Some("Ana"), "Tudo bem?"))
        .await
        .unwrap();

    assert_eq!(p.contacts.all().len(), 1);
    let tickets = p.tickets.all();
    assert_eq!(tickets.len(), 1);
    assert_eq!(tickets[0].unread_messages, 2);
    assert_eq!(tickets[0].last_message, "Tudo bem?");
    assert_eq!(p.messages.all().len(), 2);
}

#[tokio::test]
async fn closed_ticket_gets_a_fresh_one() {
    let p = pipeline();

    p.ticket_service
        .ingest_message(ACCOUNT, &inbound("W1", NUMBER, None, "Oi"))
        .await
        .unwrap();
    let old = p.tickets.all()[0].clone();
    p.tickets
        .update_status(old.ticket_id, TicketStatus::Closed)
        .await
        .unwrap();

    p.ticket_service
        .ingest_message(ACCOUNT, &inbound("W2", NUMBER, None, "De novo"))
        .await
        .unwrap();

    let tickets = p.tickets.all();
    assert_eq!(tickets.len(), 2);
    let open: Vec<&Ticket> = tickets
        .iter()
        .filter(|t| t.status != TicketStatus::Closed)
        .collect();
    assert_eq!(open.len(), 1);
    assert_ne!(open[0].ticket_id, old.ticket_id);
    assert_eq!(open[0].unread_messages, 1);
}

#[tokio::test]
async fn own_messages_never_count_as_unread() {
    let p = pipeline();

    p.ticket_service
        .ingest_message(ACCOUNT, &outbound("W1", NUMBER, "On our way"))
        .await
        .unwrap();

    let tickets = p.tickets.all();
    assert_eq!(tickets[0].unread_messages, 0);
    assert_eq!(tickets[0].last_message, "On our way");

    let messages = p.messages.all();
    assert!(messages[0].read);
    assert!(messages[0].from_self);
    // Outbound rows are not attributed to the remote contact.
    assert_eq!(messages[0].contact_id, None);
}

#[tokio::test]
async fn media_without_body_uses_the_placeholder_preview() {
    let p = pipeline();

    p.ticket_service
        .ingest_message(ACCOUNT, &media_inbound("W1", NUMBER, MediaKind::Image))
        .await
        .unwrap();

    let tickets = p.tickets.all();
    assert_eq!(tickets[0].last_message, MEDIA_PLACEHOLDER);
    assert_eq!(tickets[0].unread_messages, 1);
    assert_eq!(p.messages.all()[0].body, None);
}

#[tokio::test]
async fn replayed_message_id_is_a_no_op() {
    let p = pipeline();
    let envelope = inbound("W1", NUMBER, Some("Ana"), "Oi");

    p.ticket_service
        .ingest_message(ACCOUNT, &envelope)
        .await
        .unwrap();
    p.ticket_service
        .ingest_message(ACCOUNT, &envelope)
        .await
        .unwrap();

    assert_eq!(p.messages.all().len(), 1);
    let tickets = p.tickets.all();
    assert_eq!(tickets.len(), 1);
    assert_eq!(tickets[0].unread_messages, 1);
}

#[tokio::test]
async fn replay_after_ticket_close_does_not_mint_an_empty_ticket() {
    let p = pipeline();
    let envelope = inbound("W1", NUMBER, None, "Oi");

    p.ticket_service
        .ingest_message(ACCOUNT, &envelope)
        .await
        .unwrap();
    let first = p.tickets.all()[0].clone();
    p.tickets
        .update_status(first.ticket_id, TicketStatus::Closed)
        .await
        .unwrap();

    // Same external id again: no new ticket, no new message.
    p.ticket_service
        .ingest_message(ACCOUNT, &envelope)
        .await
        .unwrap();

    assert_eq!(p.tickets.all().len(), 1);
    assert_eq!(p.messages.all().len(), 1);
}

#[tokio::test]
async fn push_name_refreshes_but_never_clears_the_contact_name() {
    let p = pipeline();

    // No push name: the number doubles as the display name.
    p.ticket_service
        .ingest_message(ACCOUNT, &inbound("W1", NUMBER, None, "Oi"))
        .await
        .unwrap();
    assert_eq!(p.contacts.all()[0].name, NUMBER);

    p.ticket_service
        .ingest_message(ACCOUNT, &inbound("W2", NUMBER, Some("Ana"), "Sou eu"))
        .await
        .unwrap();
    assert_eq!(p.contacts.all()[0].name, "Ana");

    // A later message without a push name keeps the stored name.
    p.ticket_service
        .ingest_message(ACCOUNT, &inbound("W3", NUMBER, None, "Ainda eu"))
        .await
        .unwrap();
    assert_eq!(p.contacts.all()[0].name, "Ana");
}

#[tokio::test]
async fn ingestion_publishes_ticket_and_message_events() {
    let p = pipeline();
    let mut rx = p.event_bus.subscribe(Some(16)).await;

    p.ticket_service
        .ingest_message(ACCOUNT, &inbound("W1", NUMBER, Some("Ana"), "Oi"))
        .await
        .unwrap();

    match rx.recv().await.unwrap() {
        DeskEvent::TicketCreated(t) => assert_eq!(t.unread_messages, 1),
        other => panic!("expected ticket-created, got {}", other.event_type()),
    }
    match rx.recv().await.unwrap() {
        DeskEvent::MessageIngested {
            ticket,
            message,
            contact,
        } => {
            assert_eq!(message.message_id, "W1");
            assert_eq!(contact.name, "Ana");
            assert_eq!(ticket.last_message, "Oi");
        }
        other => panic!("expected message-ingested, got {}", other.event_type()),
    }

    p.ticket_service
        .ingest_message(ACCOUNT, &inbound("W2", NUMBER, Some("Ana"), "Alo"))
        .await
        .unwrap();
    match rx.recv().await.unwrap() {
        DeskEvent::TicketUpdated(t) => assert_eq!(t.unread_messages, 2),
        other => panic!("expected ticket-updated, got {}", other.event_type()),
    }
}

#[tokio::test]
async fn auto_reply_prefers_the_queue_prompt() {
    let p = pipeline();
    let queue_prompt = Uuid::new_v4();
    let account_prompt = Uuid::new_v4();

    let mut account = Account::new(ACCOUNT, "support");
    account.default_prompt_id = Some(account_prompt);
    p.accounts.create(&account).await.unwrap();

    let now = Utc::now();
    let queue = Queue {
        queue_id: Uuid::new_v4(),
        name: "billing".into(),
        prompt_id: Some(queue_prompt),
        created_at: now,
        updated_at: now,
    };
    p.queues.insert(queue.clone());

    // Pre-route the ticket to the queue, as an operator would.
    let contact = p
        .ticket_service
        .ingest_message(ACCOUNT, &inbound("W0", NUMBER, Some("Ana"), "Oi"))
        .await
        .map(|_| p.contacts.all()[0].clone())
        .unwrap();
    let mut ticket = p.tickets.all()[0].clone();
    ticket.queue_id = Some(queue.queue_id);
    p.tickets.update(&ticket).await.unwrap();

    p.ticket_service
        .ingest_message(ACCOUNT, &inbound("W1", NUMBER, Some("Ana"), "Fatura?"))
        .await
        .unwrap();

    wait_for("queued auto-replies", || p.handler.calls() >= 2).await;
    let handled = p.handler.handled();
    let JobPayload::AutoReply(job) = handled.last().unwrap() else {
        panic!("expected an auto-reply job");
    };
    assert_eq!(job.prompt_id, queue_prompt);
    assert_eq!(job.ticket_id, ticket.ticket_id);
    assert_eq!(job.message_body, "Fatura?");
    assert_eq!(job.sender_name, contact.name);
}

#[tokio::test]
async fn auto_reply_falls_back_to_the_account_default_prompt() {
    let p = pipeline();
    let account_prompt = Uuid::new_v4();

    let mut account = Account::new(ACCOUNT, "support");
    account.default_prompt_id = Some(account_prompt);
    p.accounts.create(&account).await.unwrap();

    p.ticket_service
        .ingest_message(ACCOUNT, &inbound("W1", NUMBER, Some("Ana"), "Oi"))
        .await
        .unwrap();

    wait_for("queued auto-reply", || p.handler.calls() >= 1).await;
    let handled = p.handler.handled();
    assert_eq!(handled.len(), 1);
    let JobPayload::AutoReply(job) = &handled[0] else {
        panic!("expected an auto-reply job");
    };
    assert_eq!(job.prompt_id, account_prompt);
}

#[tokio::test]
async fn no_prompt_configured_means_no_auto_reply() {
    let p = pipeline();
    p.accounts
        .create(&Account::new(ACCOUNT, "support"))
        .await
        .unwrap();

    p.ticket_service
        .ingest_message(ACCOUNT, &inbound("W1", NUMBER, Some("Ana"), "Oi"))
        .await
        .unwrap();

    sleep(Duration::from_millis(50)).await;
    assert_eq!(p.handler.calls(), 0);
}

#[tokio::test]
async fn own_messages_never_trigger_auto_replies() {
    let p = pipeline();
    let mut account = Account::new(ACCOUNT, "support");
    account.default_prompt_id = Some(Uuid::new_v4());
    p.accounts.create(&account).await.unwrap();

    p.ticket_service
        .ingest_message(ACCOUNT, &outbound("W1", NUMBER, "On our way"))
        .await
        .unwrap();

    sleep(Duration::from_millis(50)).await;
    assert_eq!(p.handler.calls(), 0);
}

#[tokio::test]
async fn soft_delete_replaces_the_body_with_the_placeholder() {
    let p = pipeline();

    p.ticket_service
        .ingest_message(ACCOUNT, &inbound("W1", NUMBER, None, "typo"))
        .await
        .unwrap();
    p.ticket_service.soft_delete_message("W1").await.unwrap();

    let message = &p.messages.all()[0];
    assert!(message.deleted);
    assert_eq!(message.body.as_deref(), Some("(deleted)"));
}

#[tokio::test]
async fn router_ingests_live_batches_in_order() {
    let p = pipeline();
    let router = InboundRouter::new(p.ticket_service.clone());
    let address = format!("{}@s.whatsapp.net", NUMBER);

    router
        .route_batch(
            ACCOUNT,
            live_batch(vec![
                raw_text("W1", &address, "one"),
                raw_text("W2", &address, "two"),
                raw_text("W3", &address, "three"),
            ]),
        )
        .await;

    assert_eq!(p.messages.all().len(), 3);
    let tickets = p.tickets.all();
    assert_eq!(tickets.len(), 1);
    assert_eq!(tickets[0].unread_messages, 3);
    assert_eq!(tickets[0].last_message, "three");
    // Suffix stripped before the contact was stored.
    assert_eq!(p.contacts.all()[0].number, NUMBER);
}

#[tokio::test]
async fn history_sync_batches_are_ignored() {
    let p = pipeline();
    let router = InboundRouter::new(p.ticket_service.clone());
    let address = format!("{}@s.whatsapp.net", NUMBER);

    router
        .route_batch(ACCOUNT, history_batch(vec![raw_text("W1", &address, "old")]))
        .await;

    assert!(p.messages.all().is_empty());
    assert!(p.tickets.all().is_empty());
    assert!(p.contacts.all().is_empty());
}

#[tokio::test]
async fn broadcast_status_posts_are_skipped() {
    let p = pipeline();
    let router = InboundRouter::new(p.ticket_service.clone());
    let address = format!("{}@s.whatsapp.net", NUMBER);

    router
        .route_batch(
            ACCOUNT,
            live_batch(vec![
                raw_text("W1", BROADCAST_ADDRESS, "status post"),
                raw_text("W2", &address, "real message"),
            ]),
        )
        .await;

    let messages = p.messages.all();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].message_id, "W2");
}

#[tokio::test]
async fn group_messages_resolve_a_group_contact_and_ticket() {
    let p = pipeline();
    let router = InboundRouter::new(p.ticket_service.clone());

    let raw = RawMessage {
        content: RawContent::Conversation("hello group".into()),
        ..raw_text("W1", "123456789-987654@g.us", "")
    };
    router.route_batch(ACCOUNT, live_batch(vec![raw])).await;

    let contacts = p.contacts.all();
    assert_eq!(contacts[0].number, "123456789-987654");
    assert!(contacts[0].is_group);
    assert!(p.tickets.all()[0].is_group);
}

#[tokio::test]
async fn concurrent_messages_for_one_contact_settle_on_one_ticket() {
    let p = pipeline();

    let mut handles = Vec::new();
    for i in 0..10 {
        let service = Arc::clone(&p.ticket_service);
        let envelope = inbound(&format!("W{}", i), NUMBER, Some("Ana"), &format!("msg {}", i));
        handles.push(tokio::spawn(async move {
            service.ingest_message(ACCOUNT, &envelope).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let tickets = p.tickets.all();
    assert_eq!(tickets.len(), 1);
    assert_eq!(tickets[0].unread_messages, 10);
    assert_eq!(p.messages.all().len(), 10);
}
