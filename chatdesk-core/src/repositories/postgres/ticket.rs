// src/repositories/postgres/ticket.rs

use sqlx::{Pool, Postgres};
use uuid::Uuid;

use chatdesk_common::models::{Ticket, TicketStatus};
use chatdesk_common::traits::repository_traits::TicketRepo;

use crate::Error;

pub struct PostgresTicketRepository {
    pub pool: Pool<Postgres>,
}

impl PostgresTicketRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

const TICKET_COLUMNS: &str = r#"ticket_id, contact_id, account_id, queue_id, status,
       unread_messages, last_message, is_group, created_at, updated_at"#;

#[async_trait::async_trait]
impl TicketRepo for PostgresTicketRepository {
    async fn create(&self, ticket: &Ticket) -> Result<(), Error> {
        sqlx::query(
            r#"
            INSERT INTO tickets (
                ticket_id, contact_id, account_id, queue_id, status,
                unread_messages, last_message, is_group, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(ticket.ticket_id)
        .bind(ticket.contact_id)
        .bind(ticket.account_id)
        .bind(ticket.queue_id)
        .bind(ticket.status)
        .bind(ticket.unread_messages)
        .bind(&ticket.last_message)
        .bind(ticket.is_group)
        .bind(ticket.created_at)
        .bind(ticket.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get(&self, ticket_id: Uuid) -> Result<Option<Ticket>, Error> {
        let row = sqlx::query_as::<_, Ticket>(&format!(
            "SELECT {} FROM tickets WHERE ticket_id = $1",
            TICKET_COLUMNS
        ))
        .bind(ticket_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn find_open_by_contact_and_account(
        &self,
        contact_id: Uuid,
        account_id: i32,
    ) -> Result<Option<Ticket>, Error> {
        // Backed by the partial unique index on (contact_id, account_id)
        // WHERE status <> 'closed'.
        let row = sqlx::query_as::<_, Ticket>(&format!(
            r#"
            SELECT {}
            FROM tickets
            WHERE contact_id = $1
              AND account_id = $2
              AND status <> 'closed'
            "#,
            TICKET_COLUMNS
        ))
        .bind(contact_id)
        .bind(account_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn update(&self, ticket: &Ticket) -> Result<(), Error> {
        sqlx::query(
            r#"
            UPDATE tickets
            SET queue_id = $2,
                status = $3,
                unread_messages = $4,
                last_message = $5,
                updated_at = $6
            WHERE ticket_id = $1
            "#,
        )
        .bind(ticket.ticket_id)
        .bind(ticket.queue_id)
        .bind(ticket.status)
        .bind(ticket.unread_messages)
        .bind(&ticket.last_message)
        .bind(ticket.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update_status(&self, ticket_id: Uuid, status: TicketStatus) -> Result<(), Error> {
        sqlx::query(
            r#"
            UPDATE tickets
            SET status = $2,
                updated_at = now()
            WHERE ticket_id = $1
            "#,
        )
        .bind(ticket_id)
        .bind(status)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
