// File: src/sessions/manager.rs
//
// Owns the set of active sessions, one per tenant-configured account, and
// drives (re)connection, QR surfacing, reconnect backoff and teardown. The
// session table is the only cross-account shared mutable state in this
// core; every mutation goes through this manager.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use chatdesk_common::models::AccountStatus;

use crate::Error;
use crate::eventbus::{DeskEvent, EventBus};
use crate::ingest::InboundRouter;
use crate::sessions::credentials::CredentialStore;
use crate::sessions::{AdapterEvent, AdapterFactory, ConnectionAdapter, DisconnectReason};

#[derive(Debug, Clone, Copy)]
pub struct SessionConfig {
    /// Linear backoff base: the nth reconnect waits `backoff_base * n`.
    pub backoff_base: Duration,
    /// Reconnects stop once the retry counter reaches this value; the
    /// session then stays terminally disconnected until a manual restart.
    pub max_retries: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            backoff_base: Duration::from_millis(5000),
            max_retries: 5,
        }
    }
}

/// Snapshot of one session's state, as exposed to collaborators.
#[derive(Debug, Clone)]
pub struct SessionStatusView {
    pub connected: bool,
    pub status: AccountStatus,
    pub qrcode: Option<String>,
    pub retry_count: u32,
}

struct Session {
    name: String,
    status: AccountStatus,
    qrcode: Option<String>,
    retry_count: u32,
    adapter: Option<Arc<dyn ConnectionAdapter>>,
    event_loop: Option<JoinHandle<()>>,
    reconnect_timer: Option<JoinHandle<()>>,
}

impl Session {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            status: AccountStatus::Connecting,
            qrcode: None,
            retry_count: 0,
            adapter: None,
            event_loop: None,
            reconnect_timer: None,
        }
    }

    fn view(&self) -> SessionStatusView {
        SessionStatusView {
            connected: self.status == AccountStatus::Connected,
            status: self.status,
            qrcode: self.qrcode.clone(),
            retry_count: self.retry_count,
        }
    }

    fn abort_tasks(&mut self) {
        if let Some(h) = self.event_loop.take() {
            h.abort();
        }
        self.cancel_reconnect();
    }

    fn cancel_reconnect(&mut self) {
        if let Some(h) = self.reconnect_timer.take() {
            h.abort();
        }
    }
}

pub struct SessionManager {
    sessions: Mutex<HashMap<i32, Session>>,
    factory: Arc<dyn AdapterFactory>,
    credentials: CredentialStore,
    event_bus: Arc<EventBus>,
    router: Arc<InboundRouter>,
    config: SessionConfig,
}

impl SessionManager {
    pub fn new(
        factory: Arc<dyn AdapterFactory>,
        credentials: CredentialStore,
        event_bus: Arc<EventBus>,
        router: Arc<InboundRouter>,
        config: SessionConfig,
    ) -> Arc<Self> {
        Arc::new(Self {
            sessions: Mutex::new(HashMap::new()),
            factory,
            credentials,
            event_bus,
            router,
            config,
        })
    }

    /// Starts (or restarts) the session for an account. Idempotent with
    /// respect to an already-connected session: that session is returned
    /// unchanged, without re-issuing a QR.
    pub async fn start_session(
        self: &Arc<Self>,
        account_id: i32,
        name: &str,
    ) -> Result<SessionStatusView, Error> {
        {
            let mut sessions = self.sessions.lock().await;
            if let Some(existing) = sessions.get(&account_id) {
                if existing.status == AccountStatus::Connected {
                    info!("account {}: session already connected", account_id);
                    return Ok(existing.view());
                }
            }
            if let Some(mut old) = sessions.remove(&account_id) {
                old.abort_tasks();
            }
            sessions.insert(account_id, Session::new(name));
        }

        info!("account {}: starting session '{}'", account_id, name);
        if let Err(e) = self.establish(account_id).await {
            let mut sessions = self.sessions.lock().await;
            if let Some(s) = sessions.get_mut(&account_id) {
                s.status = AccountStatus::Disconnected;
            }
            return Err(e);
        }

        let sessions = self.sessions.lock().await;
        sessions
            .get(&account_id)
            .map(Session::view)
            .ok_or_else(|| Error::Session(format!("session for account {} vanished", account_id)))
    }

    /// Sends `body` to `address` through the account's live connection.
    pub async fn send(&self, account_id: i32, address: &str, body: &str) -> Result<(), Error> {
        let adapter = {
            let sessions = self.sessions.lock().await;
            match sessions.get(&account_id) {
                Some(s) if s.status == AccountStatus::Connected => s.adapter.clone(),
                _ => None,
            }
        };
        match adapter {
            Some(a) => a.send_message(address, body).await,
            None => Err(Error::NotConnected(account_id)),
        }
    }

    /// Requests adapter logout, then purges the session and its on-disk
    /// credential artifacts unconditionally.
    pub async fn logout(&self, account_id: i32) -> Result<(), Error> {
        let removed = {
            let mut sessions = self.sessions.lock().await;
            sessions.remove(&account_id)
        };

        if let Some(mut session) = removed {
            session.abort_tasks();
            if let Some(adapter) = session.adapter {
                if let Err(e) = adapter.logout().await {
                    warn!("account {}: adapter logout failed: {:?}", account_id, e);
                }
            }
        }

        self.credentials.purge(account_id).await?;
        self.event_bus
            .publish_connection_changed(account_id, AccountStatus::Disconnected, 0, Some("logged out"))
            .await;
        info!("account {}: logged out, session and credentials purged", account_id);
        Ok(())
    }

    /// Best-effort teardown of every session. Per-session close failures
    /// are logged and never abort the loop.
    pub async fn shutdown(&self) {
        let drained: Vec<(i32, Session)> = {
            let mut sessions = self.sessions.lock().await;
            sessions.drain().collect()
        };

        for (account_id, mut session) in drained {
            session.abort_tasks();
            if let Some(adapter) = session.adapter {
                if let Err(e) = adapter.disconnect().await {
                    error!("account {}: disconnect during shutdown failed: {:?}", account_id, e);
                }
            }
        }
        info!("session manager shut down");
    }

    /// Session control surface: current connection state for an account.
    /// Absent sessions read as disconnected.
    pub async fn get_status(&self, account_id: i32) -> SessionStatusView {
        let sessions = self.sessions.lock().await;
        sessions
            .get(&account_id)
            .map(Session::view)
            .unwrap_or(SessionStatusView {
                connected: false,
                status: AccountStatus::Disconnected,
                qrcode: None,
                retry_count: 0,
            })
    }

    /// Account ids with a live (non-removed) session entry.
    pub async fn active_accounts(&self) -> Vec<i32> {
        let sessions = self.sessions.lock().await;
        sessions.keys().copied().collect()
    }

    /// Builds a fresh adapter, connects it, and installs it (plus its event
    /// loop) into the existing session entry.
    async fn establish(self: &Arc<Self>, account_id: i32) -> Result<(), Error> {
        let auth_dir = self.credentials.ensure(account_id).await?;
        let mut adapter = self.factory.create(account_id, &auth_dir)?;
        let rx = adapter.connect().await?;
        let adapter: Arc<dyn ConnectionAdapter> = Arc::from(adapter);

        let mgr = Arc::clone(self);
        let loop_handle = tokio::spawn(async move {
            mgr.run_event_loop(account_id, rx).await;
        });

        let leftover = {
            let mut sessions = self.sessions.lock().await;
            match sessions.get_mut(&account_id) {
                Some(session) => {
                    if let Some(old) = session.event_loop.take() {
                        old.abort();
                    }
                    session.adapter = Some(adapter);
                    session.event_loop = Some(loop_handle);
                    None
                }
                // Logged out while we were connecting; tear back down.
                None => {
                    loop_handle.abort();
                    Some(adapter)
                }
            }
        };

        if let Some(adapter) = leftover {
            let _ = adapter.disconnect().await;
        }
        Ok(())
    }

    async fn run_event_loop(self: Arc<Self>, account_id: i32, mut rx: mpsc::Receiver<AdapterEvent>) {
        while let Some(event) = rx.recv().await {
            match event {
                AdapterEvent::Qr(payload) => self.on_qr(account_id, payload).await,
                AdapterEvent::Open => self.on_open(account_id).await,
                AdapterEvent::Closed(reason) => {
                    let terminal = self.on_closed(account_id, reason).await;
                    if terminal {
                        break;
                    }
                }
                // Awaiting the router inline keeps batches for one account
                // strictly in arrival order.
                AdapterEvent::Batch(batch) => self.router.route_batch(account_id, batch).await,
            }
        }
        debug!("account {}: adapter event loop ended", account_id);
    }

    async fn on_qr(&self, account_id: i32, payload: String) {
        {
            let mut sessions = self.sessions.lock().await;
            if let Some(s) = sessions.get_mut(&account_id) {
                s.status = AccountStatus::QrCode;
                s.qrcode = Some(payload.clone());
            }
        }
        info!("account {}: QR code issued", account_id);
        self.event_bus
            .publish(DeskEvent::QrCodeIssued {
                account_id,
                payload,
            })
            .await;
    }

    async fn on_open(&self, account_id: i32) {
        {
            let mut sessions = self.sessions.lock().await;
            if let Some(s) = sessions.get_mut(&account_id) {
                s.status = AccountStatus::Connected;
                s.retry_count = 0;
                s.qrcode = None;
            }
        }
        info!("account {}: connected", account_id);
        self.event_bus
            .publish_connection_changed(account_id, AccountStatus::Connected, 0, None)
            .await;
    }

    /// Returns true when the close is terminal (logged out) and the event
    /// loop should stop.
    async fn on_closed(self: &Arc<Self>, account_id: i32, reason: DisconnectReason) -> bool {
        match reason {
            DisconnectReason::LoggedOut => {
                let removed = {
                    let mut sessions = self.sessions.lock().await;
                    sessions.remove(&account_id)
                };
                if let Some(mut session) = removed {
                    session.cancel_reconnect();
                }
                if let Err(e) = self.credentials.purge(account_id).await {
                    warn!("account {}: credential purge failed: {:?}", account_id, e);
                }
                info!("account {}: logged out by remote, session removed", account_id);
                self.event_bus
                    .publish_connection_changed(
                        account_id,
                        AccountStatus::Disconnected,
                        0,
                        Some("logged out"),
                    )
                    .await;
                true
            }
            DisconnectReason::Lost(why) => {
                let retry = {
                    let mut sessions = self.sessions.lock().await;
                    match sessions.get_mut(&account_id) {
                        Some(s) => {
                            s.status = AccountStatus::Disconnected;
                            s.qrcode = None;
                            s.retry_count += 1;
                            Some(s.retry_count)
                        }
                        None => None,
                    }
                };

                warn!("account {}: connection lost: {}", account_id, why);
                self.event_bus
                    .publish_connection_changed(
                        account_id,
                        AccountStatus::Disconnected,
                        retry.unwrap_or(0),
                        Some(&why),
                    )
                    .await;

                if let Some(n) = retry {
                    if n < self.config.max_retries {
                        self.schedule_reconnect(account_id, n).await;
                    } else {
                        warn!(
                            "account {}: retries exhausted ({}); manual restart required",
                            account_id, n
                        );
                    }
                }
                false
            }
        }
    }

    async fn schedule_reconnect(self: &Arc<Self>, account_id: i32, retry: u32) {
        let delay = self.config.backoff_base * retry;
        info!(
            "account {}: reconnect #{} scheduled in {:?}",
            account_id, retry, delay
        );

        let mgr = Arc::clone(self);
        let timer = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            mgr.reconnect(account_id).await;
        });

        let mut sessions = self.sessions.lock().await;
        match sessions.get_mut(&account_id) {
            Some(s) => {
                s.cancel_reconnect();
                s.reconnect_timer = Some(timer);
            }
            // Session torn down between the status update and here.
            None => timer.abort(),
        }
    }

    fn reconnect(
        self: Arc<Self>,
        account_id: i32,
    ) -> Pin<Box<dyn Future<Output = ()> + Send>> {
        Box::pin(async move {
        {
            let mut sessions = self.sessions.lock().await;
            match sessions.get_mut(&account_id) {
                Some(s) if s.status == AccountStatus::Disconnected => {
                    s.status = AccountStatus::Connecting;
                    s.reconnect_timer = None;
                }
                // Connected again, or removed by logout/shutdown.
                _ => return,
            }
        }

        info!("account {}: attempting reconnect", account_id);
        if let Err(e) = self.establish(account_id).await {
            error!("account {}: reconnect failed: {:?}", account_id, e);
            self.on_closed(
                account_id,
                DisconnectReason::Lost(format!("reconnect failed: {}", e)),
            )
            .await;
        }
        })
    }
}
