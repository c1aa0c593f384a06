// src/repositories/postgres/account.rs

use sqlx::{Pool, Postgres};

use chatdesk_common::models::{Account, AccountStatus};
use chatdesk_common::traits::repository_traits::AccountRepo;

use crate::Error;

pub struct PostgresAccountRepository {
    pub pool: Pool<Postgres>,
}

impl PostgresAccountRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl AccountRepo for PostgresAccountRepository {
    async fn create(&self, account: &Account) -> Result<(), Error> {
        sqlx::query(
            r#"
            INSERT INTO accounts (
                account_id, name, status, qrcode, retries,
                default_prompt_id, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(account.account_id)
        .bind(&account.name)
        .bind(account.status)
        .bind(&account.qrcode)
        .bind(account.retries)
        .bind(account.default_prompt_id)
        .bind(account.created_at)
        .bind(account.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get(&self, account_id: i32) -> Result<Option<Account>, Error> {
        let row = sqlx::query_as::<_, Account>(
            r#"
            SELECT account_id, name, status, qrcode, retries,
                   default_prompt_id, created_at, updated_at
            FROM accounts
            WHERE account_id = $1
            "#,
        )
        .bind(account_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn update_connection(
        &self,
        account_id: i32,
        status: AccountStatus,
        qrcode: Option<&str>,
        retries: i32,
    ) -> Result<(), Error> {
        sqlx::query(
            r#"
            UPDATE accounts
            SET status = $2,
                qrcode = $3,
                retries = $4,
                updated_at = now()
            WHERE account_id = $1
            "#,
        )
        .bind(account_id)
        .bind(status)
        .bind(qrcode)
        .bind(retries)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<Account>, Error> {
        let rows = sqlx::query_as::<_, Account>(
            r#"
            SELECT account_id, name, status, qrcode, retries,
                   default_prompt_id, created_at, updated_at
            FROM accounts
            ORDER BY account_id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
