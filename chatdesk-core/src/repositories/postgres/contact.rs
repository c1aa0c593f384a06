// src/repositories/postgres/contact.rs

use sqlx::{Pool, Postgres};
use uuid::Uuid;

use chatdesk_common::models::Contact;
use chatdesk_common::traits::repository_traits::ContactRepo;

use crate::Error;

pub struct PostgresContactRepository {
    pub pool: Pool<Postgres>,
}

impl PostgresContactRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl ContactRepo for PostgresContactRepository {
    async fn find_by_number(&self, number: &str) -> Result<Option<Contact>, Error> {
        let row = sqlx::query_as::<_, Contact>(
            r#"
            SELECT contact_id, number, name, is_group, profile_pic_url,
                   created_at, updated_at
            FROM contacts
            WHERE number = $1
            "#,
        )
        .bind(number)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn upsert(&self, contact: &Contact) -> Result<Contact, Error> {
        // The unique constraint on `number` makes the create-or-fetch
        // atomic; a conflicting insert returns the already-stored row.
        let row = sqlx::query_as::<_, Contact>(
            r#"
            INSERT INTO contacts (
                contact_id, number, name, is_group, profile_pic_url,
                created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (number) DO UPDATE
                SET number = EXCLUDED.number
            RETURNING contact_id, number, name, is_group, profile_pic_url,
                      created_at, updated_at
            "#,
        )
        .bind(contact.contact_id)
        .bind(&contact.number)
        .bind(&contact.name)
        .bind(contact.is_group)
        .bind(&contact.profile_pic_url)
        .bind(contact.created_at)
        .bind(contact.updated_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn update_name(&self, contact_id: Uuid, name: &str) -> Result<(), Error> {
        sqlx::query(
            r#"
            UPDATE contacts
            SET name = $2,
                updated_at = now()
            WHERE contact_id = $1
            "#,
        )
        .bind(contact_id)
        .bind(name)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
