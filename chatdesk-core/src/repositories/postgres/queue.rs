// src/repositories/postgres/queue.rs

use sqlx::{Pool, Postgres};
use uuid::Uuid;

use chatdesk_common::models::Queue;
use chatdesk_common::traits::repository_traits::QueueRepo;

use crate::Error;

pub struct PostgresQueueRepository {
    pub pool: Pool<Postgres>,
}

impl PostgresQueueRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl QueueRepo for PostgresQueueRepository {
    async fn get(&self, queue_id: Uuid) -> Result<Option<Queue>, Error> {
        let row = sqlx::query_as::<_, Queue>(
            r#"
            SELECT queue_id, name, prompt_id, created_at, updated_at
            FROM queues
            WHERE queue_id = $1
            "#,
        )
        .bind(queue_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }
}
