// File: src/test_utils/scripted_adapter.rs

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::time::Instant;

use chatdesk_common::models::JobPayload;

use crate::Error;
use crate::jobs::JobHandler;
use crate::sessions::{AdapterEvent, AdapterFactory, ConnectionAdapter};

/// Test-side handle for one adapter the factory has built. The `events`
/// sender feeds the receiver that `connect` handed to the session manager,
/// so a test can script QR codes, opens, closes, and message batches.
#[derive(Clone)]
pub struct AdapterHandle {
    pub account_id: i32,
    pub auth_dir: PathBuf,
    /// When the factory built this adapter; lets tests check reconnect
    /// scheduling against the backoff policy.
    pub created_at: Instant,
    pub events: mpsc::Sender<AdapterEvent>,
    pub sent: Arc<Mutex<Vec<(String, String)>>>,
    pub disconnects: Arc<AtomicUsize>,
    pub logouts: Arc<AtomicUsize>,
}

struct ScriptedAdapter {
    rx: Mutex<Option<mpsc::Receiver<AdapterEvent>>>,
    sent: Arc<Mutex<Vec<(String, String)>>>,
    disconnects: Arc<AtomicUsize>,
    logouts: Arc<AtomicUsize>,
    fail_connect: bool,
}

#[async_trait]
impl ConnectionAdapter for ScriptedAdapter {
    async fn connect(&mut self) -> Result<mpsc::Receiver<AdapterEvent>, Error> {
        if self.fail_connect {
            return Err(Error::Adapter("scripted connect failure".to_string()));
        }
        self.rx
            .lock()
            .unwrap()
            .take()
            .ok_or_else(|| Error::Adapter("adapter already connected".to_string()))
    }

    async fn send_message(&self, address: &str, body: &str) -> Result<(), Error> {
        self.sent
            .lock()
            .unwrap()
            .push((address.to_string(), body.to_string()));
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), Error> {
        self.disconnects.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn logout(&self) -> Result<(), Error> {
        self.logouts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Builds scripted adapters and records a handle for each, in creation
/// order, so tests can drive every connection the manager opens (including
/// the fresh instances built on reconnect).
#[derive(Default)]
pub struct ScriptedAdapterFactory {
    handles: Mutex<Vec<AdapterHandle>>,
    /// Number of upcoming `connect` calls that should fail.
    fail_next_connects: AtomicUsize,
}

impl ScriptedAdapterFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handles(&self) -> Vec<AdapterHandle> {
        self.handles.lock().unwrap().clone()
    }

    pub fn handle(&self, index: usize) -> AdapterHandle {
        self.handles.lock().unwrap()[index].clone()
    }

    pub fn created(&self) -> usize {
        self.handles.lock().unwrap().len()
    }

    pub fn fail_next_connects(&self, n: usize) {
        self.fail_next_connects.store(n, Ordering::SeqCst);
    }

    fn take_connect_failure(&self) -> bool {
        self.fail_next_connects
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

impl AdapterFactory for ScriptedAdapterFactory {
    fn create(
        &self,
        account_id: i32,
        auth_dir: &Path,
    ) -> Result<Box<dyn ConnectionAdapter>, Error> {
        let (tx, rx) = mpsc::channel(64);
        let sent = Arc::new(Mutex::new(Vec::new()));
        let disconnects = Arc::new(AtomicUsize::new(0));
        let logouts = Arc::new(AtomicUsize::new(0));

        self.handles.lock().unwrap().push(AdapterHandle {
            account_id,
            auth_dir: auth_dir.to_path_buf(),
            created_at: Instant::now(),
            events: tx,
            sent: Arc::clone(&sent),
            disconnects: Arc::clone(&disconnects),
            logouts: Arc::clone(&logouts),
        });

        Ok(Box::new(ScriptedAdapter {
            rx: Mutex::new(Some(rx)),
            sent,
            disconnects,
            logouts,
            fail_connect: self.take_connect_failure(),
        }))
    }
}

/// Job handler that records every payload it sees and can be told to fail
/// the first N calls.
#[derive(Default)]
pub struct RecordingJobHandler {
    handled: Mutex<Vec<JobPayload>>,
    fail_first: AtomicUsize,
    calls: AtomicUsize,
}

impl RecordingJobHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_first(n: usize) -> Self {
        Self {
            fail_first: AtomicUsize::new(n),
            ..Self::default()
        }
    }

    pub fn handled(&self) -> Vec<JobPayload> {
        self.handled.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl JobHandler for RecordingJobHandler {
    async fn handle(&self, payload: &JobPayload) -> Result<(), Error> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.fail_first.load(Ordering::SeqCst) {
            return Err(Error::Dispatch("scripted handler failure".to_string()));
        }
        self.handled.lock().unwrap().push(payload.clone());
        Ok(())
    }
}
