// File: chatdesk-common/src/models/message.rs

use std::fmt;
use std::str::FromStr;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of media carried by a message, as mapped from the protocol's
/// tagged content union.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Eq, PartialEq, Hash, sqlx::Type)]
#[sqlx(type_name = "TEXT")]
#[sqlx(rename_all = "lowercase")]
pub enum MediaKind {
    Chat,
    Image,
    Video,
    Audio,
    Ptt,
    Document,
    Sticker,
    Location,
    Vcard,
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaKind::Chat => write!(f, "chat"),
            MediaKind::Image => write!(f, "image"),
            MediaKind::Video => write!(f, "video"),
            MediaKind::Audio => write!(f, "audio"),
            MediaKind::Ptt => write!(f, "ptt"),
            MediaKind::Document => write!(f, "document"),
            MediaKind::Sticker => write!(f, "sticker"),
            MediaKind::Location => write!(f, "location"),
            MediaKind::Vcard => write!(f, "vcard"),
        }
    }
}

impl FromStr for MediaKind {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "chat" => Ok(MediaKind::Chat),
            "image" => Ok(MediaKind::Image),
            "video" => Ok(MediaKind::Video),
            "audio" => Ok(MediaKind::Audio),
            "ptt" => Ok(MediaKind::Ptt),
            "document" => Ok(MediaKind::Document),
            "sticker" => Ok(MediaKind::Sticker),
            "location" => Ok(MediaKind::Location),
            "vcard" => Ok(MediaKind::Vcard),
            _ => Err(format!("Unknown media kind: {}", s)),
        }
    }
}

/// One stored chat message. Immutable once written, except for soft
/// deletion which flips `deleted` and replaces the body with a placeholder.
#[derive(Debug, Serialize, Deserialize, Clone, sqlx::FromRow)]
pub struct Message {
    /// External protocol id when the network provides one, else a
    /// generated uuid.
    pub message_id: String,
    pub ticket_id: Uuid,
    /// Sender contact for inbound messages; None for outbound rows, whose
    /// attribution is by operator and lives outside this core.
    pub contact_id: Option<Uuid>,
    pub body: Option<String>,
    pub from_self: bool,
    pub media_kind: Option<MediaKind>,
    /// Agent-sent messages are pre-read; inbound messages start unread.
    pub read: bool,
    pub deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body shown in place of a soft-deleted message.
pub const DELETED_MESSAGE_PLACEHOLDER: &str = "(deleted)";

impl Message {
    pub fn new(message_id: &str, ticket_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            message_id: message_id.to_string(),
            ticket_id,
            contact_id: None,
            body: None,
            from_self: false,
            media_kind: None,
            read: false,
            deleted: false,
            created_at: now,
            updated_at: now,
        }
    }
}
