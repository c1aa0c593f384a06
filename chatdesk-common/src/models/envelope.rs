// File: chatdesk-common/src/models/envelope.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::MediaKind;

/// Canonical representation of one inbound message, independent of the
/// network wire format. Produced by the normalizer, consumed by the ticket
/// resolution pipeline.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct MessageEnvelope {
    /// External protocol message id.
    pub external_id: String,
    /// Raw network identifier of the remote party (suffix already stripped).
    pub remote_address: String,
    pub is_group: bool,
    pub from_self: bool,
    /// Sender-declared display name, if any.
    pub push_name: Option<String>,
    pub body: Option<String>,
    pub media_kind: Option<MediaKind>,
    pub timestamp: DateTime<Utc>,
}
