// src/db/transfer_repo.rs

use sqlx::{Executor, PgConnection, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::transfer::{TransferRequest, TransferStatus},
};

#[derive(Clone)]
pub struct TransferRepository {
    pool: PgPool,
}

impl TransferRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create<'e, E>(
        &self,
        executor: E,
        from_room_id: Uuid,
        to_room_id: Uuid,
        created_by: Uuid,
        item_type: &str,
        item_id: Uuid,
        quantity: i32,
        note: Option<&str>,
    ) -> Result<TransferRequest, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let transfer = sqlx::query_as::<_, TransferRequest>(
            r#"
            INSERT INTO transfer_requests
                (from_room_id, to_room_id, created_by, item_type, item_id, quantity, note)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(from_room_id)
        .bind(to_room_id)
        .bind(created_by)
        .bind(item_type)
        .bind(item_id)
        .bind(quantity)
        .bind(note)
        .fetch_one(executor)
        .await?;
        Ok(transfer)
    }

    pub async fn get_by_id<'e, E>(
        &self,
        executor: E,
        id: Uuid,
    ) -> Result<Option<TransferRequest>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let transfer =
            sqlx::query_as::<_, TransferRequest>("SELECT * FROM transfer_requests WHERE id = $1")
                .bind(id)
                .fetch_optional(executor)
                .await?;
        Ok(transfer)
    }

    /// Leitura simples via pool, para as checagens pré-transição.
    pub async fn get_from_pool(&self, id: Uuid) -> Result<Option<TransferRequest>, AppError> {
        self.get_by_id(&self.pool, id).await
    }

    pub async fn get_by_id_for_update(
        &self,
        conn: &mut PgConnection,
        id: Uuid,
    ) -> Result<Option<TransferRequest>, AppError> {
        let transfer = sqlx::query_as::<_, TransferRequest>(
            "SELECT * FROM transfer_requests WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(conn)
        .await?;
        Ok(transfer)
    }

    pub async fn list<'e, E>(
        &self,
        executor: E,
        status: Option<TransferStatus>,
    ) -> Result<Vec<TransferRequest>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rows = match status {
            Some(status) => {
                sqlx::query_as::<_, TransferRequest>(
                    "SELECT * FROM transfer_requests WHERE status = $1 ORDER BY created_at DESC",
                )
                .bind(status)
                .fetch_all(executor)
                .await?
            }
            None => {
                sqlx::query_as::<_, TransferRequest>(
                    "SELECT * FROM transfer_requests ORDER BY created_at DESC",
                )
                .fetch_all(executor)
                .await?
            }
        };
        Ok(rows)
    }

    pub async fn mark_accepted<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        accepted_by: Uuid,
    ) -> Result<TransferRequest, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let transfer = sqlx::query_as::<_, TransferRequest>(
            r#"
            UPDATE transfer_requests
            SET status = 'transfer_accepted', accepted_by = $2, accepted_at = NOW(), updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(accepted_by)
        .fetch_one(executor)
        .await?;
        Ok(transfer)
    }
}
