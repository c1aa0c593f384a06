// File: chatdesk-common/src/models/queue.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A tenant routing queue. Only the automation-relevant fields are modeled
/// here; queue CRUD belongs to the REST layer.
#[derive(Debug, Serialize, Deserialize, Clone, sqlx::FromRow)]
pub struct Queue {
    pub queue_id: Uuid,
    pub name: String,
    /// Queue-level automation prompt; checked before the account default.
    pub prompt_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
