use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Error;
use crate::models::account::{Account, AccountStatus};
use crate::models::contact::Contact;
use crate::models::message::Message;
use crate::models::queue::Queue;
use crate::models::ticket::{Ticket, TicketStatus};

#[async_trait]
pub trait AccountRepo: Send + Sync {
    async fn create(&self, account: &Account) -> Result<(), Error>;
    async fn get(&self, account_id: i32) -> Result<Option<Account>, Error>;
    /// Mirror of the live session state: status, QR payload and retry
    /// counter in one write.
    async fn update_connection(
        &self,
        account_id: i32,
        status: AccountStatus,
        qrcode: Option<&str>,
        retries: i32,
    ) -> Result<(), Error>;
    async fn list_all(&self) -> Result<Vec<Account>, Error>;
}

#[async_trait]
pub trait ContactRepo: Send + Sync {
    async fn find_by_number(&self, number: &str) -> Result<Option<Contact>, Error>;
    /// Atomic create-or-fetch keyed by the unique canonical number.
    /// Returns the stored row (the existing one on conflict).
    async fn upsert(&self, contact: &Contact) -> Result<Contact, Error>;
    async fn update_name(&self, contact_id: Uuid, name: &str) -> Result<(), Error>;
}

#[async_trait]
pub trait TicketRepo: Send + Sync {
    async fn create(&self, ticket: &Ticket) -> Result<(), Error>;
    async fn get(&self, ticket_id: Uuid) -> Result<Option<Ticket>, Error>;
    /// The "one non-closed ticket per (contact, account)" lookup.
    async fn find_open_by_contact_and_account(
        &self,
        contact_id: Uuid,
        account_id: i32,
    ) -> Result<Option<Ticket>, Error>;
    async fn update(&self, ticket: &Ticket) -> Result<(), Error>;
    async fn update_status(&self, ticket_id: Uuid, status: TicketStatus) -> Result<(), Error>;
}

#[async_trait]
pub trait MessageRepo: Send + Sync {
    /// Idempotent insert keyed by message_id. Returns false when a row with
    /// the same id already existed (the write is then a no-op).
    async fn insert(&self, message: &Message) -> Result<bool, Error>;
    async fn get(&self, message_id: &str) -> Result<Option<Message>, Error>;
    async fn list_for_ticket(&self, ticket_id: Uuid) -> Result<Vec<Message>, Error>;
    /// Soft delete: flips `deleted` and replaces the body with the
    /// placeholder text.
    async fn soft_delete(&self, message_id: &str) -> Result<(), Error>;
}

#[async_trait]
pub trait QueueRepo: Send + Sync {
    async fn get(&self, queue_id: Uuid) -> Result<Option<Queue>, Error>;
}
