// File: src/test_utils/memory_repos.rs

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use uuid::Uuid;

use chatdesk_common::models::message::DELETED_MESSAGE_PLACEHOLDER;
use chatdesk_common::models::{
    Account, AccountStatus, Contact, Message, Queue, Ticket, TicketStatus,
};
use chatdesk_common::traits::repository_traits::{
    AccountRepo, ContactRepo, MessageRepo, QueueRepo, TicketRepo,
};

use crate::Error;

#[derive(Default)]
pub struct MemoryAccountRepo {
    rows: Mutex<HashMap<i32, Account>>,
}

impl MemoryAccountRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn all(&self) -> Vec<Account> {
        self.rows.lock().unwrap().values().cloned().collect()
    }
}

#[async_trait]
impl AccountRepo for MemoryAccountRepo {
    async fn create(&self, account: &Account) -> Result<(), Error> {
        self.rows
            .lock()
            .unwrap()
            .insert(account.account_id, account.clone());
        Ok(())
    }

    async fn get(&self, account_id: i32) -> Result<Option<Account>, Error> {
        Ok(self.rows.lock().unwrap().get(&account_id).cloned())
    }

    async fn update_connection(
        &self,
        account_id: i32,
        status: AccountStatus,
        qrcode: Option<&str>,
        retries: i32,
    ) -> Result<(), Error> {
        let mut rows = self.rows.lock().unwrap();
        if let Some(account) = rows.get_mut(&account_id) {
            account.status = status;
            account.qrcode = qrcode.map(String::from);
            account.retries = retries;
            account.updated_at = chrono::Utc::now();
        }
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<Account>, Error> {
        Ok(self.all())
    }
}

#[derive(Default)]
pub struct MemoryContactRepo {
    rows: Mutex<HashMap<String, Contact>>,
}

impl MemoryContactRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn all(&self) -> Vec<Contact> {
        self.rows.lock().unwrap().values().cloned().collect()
    }
}

#[async_trait]
impl ContactRepo for MemoryContactRepo {
    async fn find_by_number(&self, number: &str) -> Result<Option<Contact>, Error> {
        Ok(self.rows.lock().unwrap().get(number).cloned())
    }

    async fn upsert(&self, contact: &Contact) -> Result<Contact, Error> {
        let mut rows = self.rows.lock().unwrap();
        let stored = rows
            .entry(contact.number.clone())
            .or_insert_with(|| contact.clone());
        Ok(stored.clone())
    }

    async fn update_name(&self, contact_id: Uuid, name: &str) -> Result<(), Error> {
        let mut rows = self.rows.lock().unwrap();
        for contact in rows.values_mut() {
            if contact.contact_id == contact_id {
                contact.name = name.to_string();
                contact.updated_at = chrono::Utc::now();
            }
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryTicketRepo {
    rows: Mutex<HashMap<Uuid, Ticket>>,
}

impl MemoryTicketRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn all(&self) -> Vec<Ticket> {
        self.rows.lock().unwrap().values().cloned().collect()
    }
}

#[async_trait]
impl TicketRepo for MemoryTicketRepo {
    async fn create(&self, ticket: &Ticket) -> Result<(), Error> {
        self.rows
            .lock()
            .unwrap()
            .insert(ticket.ticket_id, ticket.clone());
        Ok(())
    }

    async fn get(&self, ticket_id: Uuid) -> Result<Option<Ticket>, Error> {
        Ok(self.rows.lock().unwrap().get(&ticket_id).cloned())
    }

    async fn find_open_by_contact_and_account(
        &self,
        contact_id: Uuid,
        account_id: i32,
    ) -> Result<Option<Ticket>, Error> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .values()
            .find(|t| {
                t.contact_id == contact_id
                    && t.account_id == account_id
                    && t.status != TicketStatus::Closed
            })
            .cloned())
    }

    async fn update(&self, ticket: &Ticket) -> Result<(), Error> {
        self.rows
            .lock()
            .unwrap()
            .insert(ticket.ticket_id, ticket.clone());
        Ok(())
    }

    async fn update_status(&self, ticket_id: Uuid, status: TicketStatus) -> Result<(), Error> {
        let mut rows = self.rows.lock().unwrap();
        if let Some(ticket) = rows.get_mut(&ticket_id) {
            ticket.status = status;
            ticket.updated_at = chrono::Utc::now();
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryMessageRepo {
    rows: Mutex<HashMap<String, Message>>,
}

impl MemoryMessageRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn all(&self) -> Vec<Message> {
        let mut messages: Vec<Message> = self.rows.lock().unwrap().values().cloned().collect();
        messages.sort_by_key(|m| m.created_at);
        messages
    }
}

#[async_trait]
impl MessageRepo for MemoryMessageRepo {
    async fn insert(&self, message: &Message) -> Result<bool, Error> {
        let mut rows = self.rows.lock().unwrap();
        if rows.contains_key(&message.message_id) {
            return Ok(false);
        }
        rows.insert(message.message_id.clone(), message.clone());
        Ok(true)
    }

    async fn get(&self, message_id: &str) -> Result<Option<Message>, Error> {
        Ok(self.rows.lock().unwrap().get(message_id).cloned())
    }

    async fn list_for_ticket(&self, ticket_id: Uuid) -> Result<Vec<Message>, Error> {
        Ok(self
            .all()
            .into_iter()
            .filter(|m| m.ticket_id == ticket_id)
            .collect())
    }

    async fn soft_delete(&self, message_id: &str) -> Result<(), Error> {
        let mut rows = self.rows.lock().unwrap();
        if let Some(message) = rows.get_mut(message_id) {
            message.deleted = true;
            message.body = Some(DELETED_MESSAGE_PLACEHOLDER.to_string());
            message.updated_at = chrono::Utc::now();
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryQueueRepo {
    rows: Mutex<HashMap<Uuid, Queue>>,
}

impl MemoryQueueRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, queue: Queue) {
        self.rows.lock().unwrap().insert(queue.queue_id, queue);
    }
}

#[async_trait]
impl QueueRepo for MemoryQueueRepo {
    async fn get(&self, queue_id: Uuid) -> Result<Option<Queue>, Error> {
        Ok(self.rows.lock().unwrap().get(&queue_id).cloned())
    }
}
