// File: chatdesk-common/src/models/account.rs

use std::fmt;
use std::str::FromStr;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Connection lifecycle state of one external chat account.
/// Add sqlx::Type so that SQLx knows how to decode this enum.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Eq, PartialEq, Hash, sqlx::Type)]
#[sqlx(type_name = "TEXT")]
#[sqlx(rename_all = "lowercase")]
pub enum AccountStatus {
    Connecting,
    #[sqlx(rename = "qrcode")]
    QrCode,
    Connected,
    Disconnected,
}

impl fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccountStatus::Connecting => write!(f, "connecting"),
            AccountStatus::QrCode => write!(f, "qrcode"),
            AccountStatus::Connected => write!(f, "connected"),
            AccountStatus::Disconnected => write!(f, "disconnected"),
        }
    }
}

impl FromStr for AccountStatus {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "connecting" => Ok(AccountStatus::Connecting),
            "qrcode" => Ok(AccountStatus::QrCode),
            "connected" => Ok(AccountStatus::Connected),
            "disconnected" => Ok(AccountStatus::Disconnected),
            _ => Err(format!("Unknown account status: {}", s)),
        }
    }
}

/// One tenant-configured external chat identity (a single
/// phone-number-equivalent connection).
#[derive(Debug, Serialize, Deserialize, Clone, sqlx::FromRow)]
pub struct Account {
    pub account_id: i32,
    pub name: String,
    pub status: AccountStatus,
    /// Present only while the session is waiting on a QR scan.
    pub qrcode: Option<String>,
    pub retries: i32,
    /// Account-level fallback prompt for the auto-responder.
    pub default_prompt_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    pub fn new(account_id: i32, name: &str) -> Self {
        let now = Utc::now();
        Self {
            account_id,
            name: name.to_string(),
            status: AccountStatus::Disconnected,
            qrcode: None,
            retries: 0,
            default_prompt_id: None,
            created_at: now,
            updated_at: now,
        }
    }
}
