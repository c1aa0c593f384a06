// File: chatdesk-common/src/models/job.rs

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A queued request for an automated reply to be generated and sent.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ReplyJob {
    pub ticket_id: Uuid,
    pub message_body: String,
    pub sender_name: String,
    pub prompt_id: Uuid,
}

/// Tenant-configured webhook delivery.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct WebhookJob {
    pub url: String,
    pub payload: serde_json::Value,
}

/// One outbound campaign send, reusing the same queue as the
/// auto-responder.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CampaignJob {
    pub campaign_id: Uuid,
    pub account_id: i32,
    pub address: String,
    pub body: String,
}

/// Every job kind carries its own strongly-typed payload; the worker
/// dispatches via pattern match.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub enum JobPayload {
    AutoReply(ReplyJob),
    Webhook(WebhookJob),
    CampaignSend(CampaignJob),
}

impl JobPayload {
    pub fn kind(&self) -> &'static str {
        match self {
            JobPayload::AutoReply(_) => "auto-reply",
            JobPayload::Webhook(_) => "webhook",
            JobPayload::CampaignSend(_) => "campaign-send",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub enum Backoff {
    /// Same delay between every attempt.
    Fixed { base_ms: u64 },
    /// base, base*2, base*4, ...
    Exponential { base_ms: u64 },
}

impl Backoff {
    /// Delay before retrying after the given failed attempt (1-based).
    pub fn delay_ms(&self, attempt: u32) -> u64 {
        match self {
            Backoff::Fixed { base_ms } => *base_ms,
            Backoff::Exponential { base_ms } => base_ms.saturating_mul(1u64 << (attempt - 1).min(16)),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct JobOptions {
    pub attempts: u32,
    pub backoff: Backoff,
    pub remove_on_complete: bool,
    /// When false, jobs that exhaust their retries stay inspectable in the
    /// failed list instead of being dropped.
    pub remove_on_fail: bool,
}

impl JobOptions {
    /// Policy for best-effort jobs (auto-reply): 3 attempts, exponential
    /// backoff from 1000ms, dropped on failure.
    pub fn best_effort() -> Self {
        Self {
            attempts: 3,
            backoff: Backoff::Exponential { base_ms: 1000 },
            remove_on_complete: true,
            remove_on_fail: true,
        }
    }

    /// Policy for sends whose failure must remain inspectable
    /// (campaign/schedule sends).
    pub fn inspectable() -> Self {
        Self {
            attempts: 3,
            backoff: Backoff::Exponential { base_ms: 1000 },
            remove_on_complete: true,
            remove_on_fail: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exponential_backoff_doubles() {
        let b = Backoff::Exponential { base_ms: 1000 };
        assert_eq!(b.delay_ms(1), 1000);
        assert_eq!(b.delay_ms(2), 2000);
        assert_eq!(b.delay_ms(3), 4000);
    }

    #[test]
    fn fixed_backoff_is_flat() {
        let b = Backoff::Fixed { base_ms: 250 };
        assert_eq!(b.delay_ms(1), 250);
        assert_eq!(b.delay_ms(5), 250);
    }
}
