// tests/common/mod.rs
//
// Shared wiring for the integration suites: a fully assembled ingestion
// pipeline over in-memory repositories, and a session manager driven by
// scripted adapters.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tempfile::TempDir;
use tokio::time::{Instant, sleep};

use chatdesk_common::models::{AccountStatus, MediaKind, MessageEnvelope};
use chatdesk_core::eventbus::EventBus;
use chatdesk_core::ingest::InboundRouter;
use chatdesk_core::jobs::JobQueue;
use chatdesk_core::services::TicketService;
use chatdesk_core::sessions::credentials::CredentialStore;
use chatdesk_core::sessions::{
    BatchKind, MessageBatch, RawContent, RawMessage, SessionConfig, SessionManager,
    SessionStatusView,
};
use chatdesk_core::test_utils::{
    MemoryAccountRepo, MemoryContactRepo, MemoryMessageRepo, MemoryQueueRepo, MemoryTicketRepo,
    RecordingJobHandler, ScriptedAdapterFactory,
};

/// The ingestion pipeline wired over in-memory repositories.
pub struct Pipeline {
    pub accounts: Arc<MemoryAccountRepo>,
    pub contacts: Arc<MemoryContactRepo>,
    pub tickets: Arc<MemoryTicketRepo>,
    pub messages: Arc<MemoryMessageRepo>,
    pub queues: Arc<MemoryQueueRepo>,
    pub event_bus: Arc<EventBus>,
    pub handler: Arc<RecordingJobHandler>,
    pub job_queue: Arc<JobQueue>,
    pub ticket_service: Arc<TicketService>,
}

pub fn pipeline() -> Pipeline {
    pipeline_with_handler(RecordingJobHandler::new())
}

pub fn pipeline_with_handler(handler: RecordingJobHandler) -> Pipeline {
    // The global subscriber installs once per test binary; later calls
    // return an error we do not care about.
    let _ = chatdesk_core::logging::init("chatdesk_core=debug");

    let accounts = Arc::new(MemoryAccountRepo::new());
    let contacts = Arc::new(MemoryContactRepo::new());
    let tickets = Arc::new(MemoryTicketRepo::new());
    let messages = Arc::new(MemoryMessageRepo::new());
    let queues = Arc::new(MemoryQueueRepo::new());
    let event_bus = Arc::new(EventBus::new());
    let handler = Arc::new(handler);
    let job_queue = JobQueue::spawn(handler.clone());

    let ticket_service = Arc::new(TicketService::new(
        contacts.clone(),
        tickets.clone(),
        messages.clone(),
        accounts.clone(),
        queues.clone(),
        event_bus.clone(),
        job_queue.clone(),
    ));

    Pipeline {
        accounts,
        contacts,
        tickets,
        messages,
        queues,
        event_bus,
        handler,
        job_queue,
        ticket_service,
    }
}

/// The full desk: pipeline plus a session manager over scripted adapters.
pub struct Desk {
    pub pipeline: Pipeline,
    pub factory: Arc<ScriptedAdapterFactory>,
    pub credentials: CredentialStore,
    pub manager: Arc<SessionManager>,
    _auth_dir: TempDir,
}

pub fn desk(config: SessionConfig) -> Desk {
    let pipeline = pipeline();
    let auth_dir = tempfile::tempdir().unwrap();
    let credentials = CredentialStore::new(auth_dir.path());
    let factory = Arc::new(ScriptedAdapterFactory::new());
    let router = Arc::new(InboundRouter::new(pipeline.ticket_service.clone()));
    let manager = SessionManager::new(
        factory.clone(),
        credentials.clone(),
        pipeline.event_bus.clone(),
        router,
        config,
    );

    Desk {
        pipeline,
        factory,
        credentials,
        manager,
        _auth_dir: auth_dir,
    }
}

/// Backoff short enough that reconnects fire within the test timeout.
pub fn fast_config() -> SessionConfig {
    SessionConfig {
        backoff_base: Duration::from_millis(20),
        max_retries: 5,
    }
}

const WAIT_TIMEOUT: Duration = Duration::from_secs(2);

/// Polls `cond` until it holds or the timeout expires.
pub async fn wait_for(what: &str, mut cond: impl FnMut() -> bool) {
    let deadline = Instant::now() + WAIT_TIMEOUT;
    while !cond() {
        assert!(Instant::now() < deadline, "timed out waiting for {}", what);
        sleep(Duration::from_millis(5)).await;
    }
}

pub async fn wait_for_status(
    manager: &SessionManager,
    account_id: i32,
    status: AccountStatus,
) -> SessionStatusView {
    let deadline = Instant::now() + WAIT_TIMEOUT;
    loop {
        let view = manager.get_status(account_id).await;
        if view.status == status {
            return view;
        }
        assert!(
            Instant::now() < deadline,
            "timed out waiting for account {} to reach {}, last seen {}",
            account_id,
            status,
            view.status
        );
        sleep(Duration::from_millis(5)).await;
    }
}

pub fn inbound(id: &str, number: &str, push_name: Option<&str>, body: &str) -> MessageEnvelope {
    MessageEnvelope {
        external_id: id.to_string(),
        remote_address: number.to_string(),
        is_group: false,
        from_self: false,
        push_name: push_name.map(String::from),
        body: Some(body.to_string()),
        media_kind: Some(MediaKind::Chat),
        timestamp: Utc::now(),
    }
}

pub fn media_inbound(id: &str, number: &str, kind: MediaKind) -> MessageEnvelope {
    MessageEnvelope {
        body: None,
        media_kind: Some(kind),
        ..inbound(id, number, None, "")
    }
}

pub fn outbound(id: &str, number: &str, body: &str) -> MessageEnvelope {
    MessageEnvelope {
        from_self: true,
        ..inbound(id, number, None, body)
    }
}

pub fn raw_text(id: &str, address: &str, body: &str) -> RawMessage {
    RawMessage {
        external_id: id.to_string(),
        remote_address: address.to_string(),
        from_self: false,
        push_name: Some("Ana".to_string()),
        timestamp: Utc::now(),
        content: RawContent::Conversation(body.to_string()),
    }
}

pub fn live_batch(messages: Vec<RawMessage>) -> MessageBatch {
    MessageBatch {
        kind: BatchKind::Live,
        messages,
    }
}

pub fn history_batch(messages: Vec<RawMessage>) -> MessageBatch {
    MessageBatch {
        kind: BatchKind::HistorySync,
        messages,
    }
}
