// src/repositories/postgres/message.rs

use sqlx::{Pool, Postgres};
use uuid::Uuid;

use chatdesk_common::models::Message;
use chatdesk_common::models::message::DELETED_MESSAGE_PLACEHOLDER;
use chatdesk_common::traits::repository_traits::MessageRepo;

use crate::Error;

pub struct PostgresMessageRepository {
    pub pool: Pool<Postgres>,
}

impl PostgresMessageRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl MessageRepo for PostgresMessageRepository {
    async fn insert(&self, message: &Message) -> Result<bool, Error> {
        // Replayed external ids are a no-op; the caller checks the return
        // value before touching ticket counters.
        let result = sqlx::query(
            r#"
            INSERT INTO messages (
                message_id, ticket_id, contact_id, body, from_self,
                media_kind, read, deleted, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (message_id) DO NOTHING
            "#,
        )
        .bind(&message.message_id)
        .bind(message.ticket_id)
        .bind(message.contact_id)
        .bind(&message.body)
        .bind(message.from_self)
        .bind(message.media_kind)
        .bind(message.read)
        .bind(message.deleted)
        .bind(message.created_at)
        .bind(message.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn get(&self, message_id: &str) -> Result<Option<Message>, Error> {
        let row = sqlx::query_as::<_, Message>(
            r#"
            SELECT message_id, ticket_id, contact_id, body, from_self,
                   media_kind, read, deleted, created_at, updated_at
            FROM messages
            WHERE message_id = $1
            "#,
        )
        .bind(message_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn list_for_ticket(&self, ticket_id: Uuid) -> Result<Vec<Message>, Error> {
        let rows = sqlx::query_as::<_, Message>(
            r#"
            SELECT message_id, ticket_id, contact_id, body, from_self,
                   media_kind, read, deleted, created_at, updated_at
            FROM messages
            WHERE ticket_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(ticket_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn soft_delete(&self, message_id: &str) -> Result<(), Error> {
        sqlx::query(
            r#"
            UPDATE messages
            SET deleted = TRUE,
                body = $2,
                updated_at = now()
            WHERE message_id = $1
            "#,
        )
        .bind(message_id)
        .bind(DELETED_MESSAGE_PLACEHOLDER)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
