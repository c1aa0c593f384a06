// File: chatdesk-common/src/models/ticket.rs

use std::fmt;
use std::str::FromStr;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, Eq, PartialEq, Hash, sqlx::Type)]
#[sqlx(type_name = "TEXT")]
#[sqlx(rename_all = "lowercase")]
pub enum TicketStatus {
    Pending,
    Open,
    Closed,
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TicketStatus::Pending => write!(f, "pending"),
            TicketStatus::Open => write!(f, "open"),
            TicketStatus::Closed => write!(f, "closed"),
        }
    }
}

impl FromStr for TicketStatus {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(TicketStatus::Pending),
            "open" => Ok(TicketStatus::Open),
            "closed" => Ok(TicketStatus::Closed),
            _ => Err(format!("Unknown ticket status: {}", s)),
        }
    }
}

/// The unit of work grouping all messages with one contact on one account.
///
/// Invariant: at most one non-closed ticket per (contact, account) pair.
/// Resolution always looks for the existing non-closed ticket before
/// creating a new one.
#[derive(Debug, Serialize, Deserialize, Clone, sqlx::FromRow)]
pub struct Ticket {
    pub ticket_id: Uuid,
    pub contact_id: Uuid,
    pub account_id: i32,
    /// Tenant queue the ticket was routed to, if any. Carries the
    /// queue-level automation prompt.
    pub queue_id: Option<Uuid>,
    pub status: TicketStatus,
    pub unread_messages: i32,
    /// Preview of the most recent message (first 255 chars of the body, or
    /// a media placeholder).
    pub last_message: String,
    pub is_group: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Ticket {
    pub fn new(contact_id: Uuid, account_id: i32, is_group: bool) -> Self {
        let now = Utc::now();
        Self {
            ticket_id: Uuid::new_v4(),
            contact_id,
            account_id,
            queue_id: None,
            status: TicketStatus::Pending,
            unread_messages: 0,
            last_message: String::new(),
            is_group,
            created_at: now,
            updated_at: now,
        }
    }
}
