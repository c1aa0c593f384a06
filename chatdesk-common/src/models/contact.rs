// File: chatdesk-common/src/models/contact.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One external chat peer (person or group), created on first inbound
/// message from a never-seen number.
#[derive(Debug, Serialize, Deserialize, Clone, sqlx::FromRow)]
pub struct Contact {
    pub contact_id: Uuid,
    /// Canonical external address with the network suffix stripped. Unique.
    pub number: String,
    pub name: String,
    pub is_group: bool,
    pub profile_pic_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Contact {
    pub fn new(number: &str, name: &str, is_group: bool) -> Self {
        let now = Utc::now();
        Self {
            contact_id: Uuid::new_v4(),
            number: number.to_string(),
            name: name.to_string(),
            is_group,
            profile_pic_url: None,
            created_at: now,
            updated_at: now,
        }
    }
}
