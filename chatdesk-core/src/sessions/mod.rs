// File: src/sessions/mod.rs
//
// The connection-adapter seam. The external network client is a provided
// capability: connect, authenticate, send, receive, detect disconnect. One
// adapter instance per account; event delivery is inherently serial per
// account.

use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::mpsc;

use crate::Error;

pub mod credentials;
pub mod manager;

pub use manager::{SessionConfig, SessionManager, SessionStatusView};

/// Network suffix carried by group addresses.
pub const GROUP_ADDRESS_SUFFIX: &str = "@g.us";
/// Network suffix carried by individual addresses.
pub const USER_ADDRESS_SUFFIX: &str = "@s.whatsapp.net";
/// Pseudo-address used by the network for broadcast/status posts; inbound
/// messages from it are never ingested.
pub const BROADCAST_ADDRESS: &str = "status@broadcast";

/// Why a connection was closed, as classified from the adapter's raw
/// disconnect reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisconnectReason {
    /// Explicit user action on the paired device. Terminal: credentials are
    /// purged and the session is removed.
    LoggedOut,
    /// Anything else (transport drop, timeout, server restart). Recovered
    /// by reconnect-with-backoff.
    Lost(String),
}

impl DisconnectReason {
    pub fn as_str(&self) -> &str {
        match self {
            DisconnectReason::LoggedOut => "logged out",
            DisconnectReason::Lost(reason) => reason,
        }
    }
}

/// Tagged content union of one raw protocol message.
#[derive(Debug, Clone, PartialEq)]
pub enum RawContent {
    Conversation(String),
    ExtendedText(String),
    Image { caption: Option<String> },
    Video { caption: Option<String> },
    Audio { ptt: bool },
    Document { filename: Option<String> },
    Sticker,
    Location { lat: f64, lon: f64 },
    ContactCard { display_name: Option<String> },
    Unknown,
}

/// One message as delivered by the network, before normalization.
#[derive(Debug, Clone)]
pub struct RawMessage {
    pub external_id: String,
    /// Full network address including suffix, e.g. `5511999990000@s.whatsapp.net`.
    pub remote_address: String,
    pub from_self: bool,
    pub push_name: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub content: RawContent,
}

/// Discriminates live notifications from history-sync replays. Only live
/// batches are ingested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchKind {
    Live,
    HistorySync,
}

#[derive(Debug, Clone)]
pub struct MessageBatch {
    pub kind: BatchKind,
    pub messages: Vec<RawMessage>,
}

/// Raw protocol events surfaced by a connection adapter.
#[derive(Debug, Clone)]
pub enum AdapterEvent {
    /// The network wants the user to scan a pairing QR code.
    Qr(String),
    /// The connection is up and authenticated.
    Open,
    /// The connection went down.
    Closed(DisconnectReason),
    /// A batch of inbound messages.
    Batch(MessageBatch),
}

/// Wraps one external-network client instance.
///
/// `connect` hands back the event stream for this connection; the caller
/// owns the receiving loop. All post-connect operations take `&self` so the
/// adapter can be shared between the event loop and the send path.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ConnectionAdapter: Send + Sync {
    async fn connect(&mut self) -> Result<mpsc::Receiver<AdapterEvent>, Error>;
    async fn send_message(&self, address: &str, body: &str) -> Result<(), Error>;
    async fn disconnect(&self) -> Result<(), Error>;
    /// Requests a network-side logout (invalidates the pairing).
    async fn logout(&self) -> Result<(), Error>;
}

/// Builds adapters. The manager goes through a factory so reconnects get a
/// fresh client instance and tests can inject scripted adapters.
#[cfg_attr(test, mockall::automock)]
pub trait AdapterFactory: Send + Sync {
    fn create(
        &self,
        account_id: i32,
        auth_dir: &Path,
    ) -> Result<Box<dyn ConnectionAdapter>, Error>;
}
