// src/db/borrow_repo.rs

use sqlx::{Executor, PgConnection, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::borrow::{BorrowRequest, BorrowStatus},
};

#[derive(Clone)]
pub struct BorrowRepository {
    pool: PgPool,
}

impl BorrowRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create<'e, E>(
        &self,
        executor: E,
        requester_id: Uuid,
        room_id: Uuid,
        item_id: Option<Uuid>,
        item_type: Option<&str>,
        quantity: i32,
        note: Option<&str>,
    ) -> Result<BorrowRequest, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let borrow = sqlx::query_as::<_, BorrowRequest>(
            r#"
            INSERT INTO borrow_requests (requester_id, room_id, item_id, item_type, quantity, note)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(requester_id)
        .bind(room_id)
        .bind(item_id)
        .bind(item_type)
        .bind(quantity)
        .bind(note)
        .fetch_one(executor)
        .await?;
        Ok(borrow)
    }

    pub async fn get_by_id<'e, E>(
        &self,
        executor: E,
        id: Uuid,
    ) -> Result<Option<BorrowRequest>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let borrow = sqlx::query_as::<_, BorrowRequest>("SELECT * FROM borrow_requests WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(borrow)
    }

    /// Leitura simples via pool, para as checagens pré-transição.
    pub async fn get_from_pool(&self, id: Uuid) -> Result<Option<BorrowRequest>, AppError> {
        self.get_by_id(&self.pool, id).await
    }

    /// Leitura com lock da linha do workflow; toda transição passa por
    /// aqui antes de validar estado e mutar o ledger.
    pub async fn get_by_id_for_update(
        &self,
        conn: &mut PgConnection,
        id: Uuid,
    ) -> Result<Option<BorrowRequest>, AppError> {
        let borrow = sqlx::query_as::<_, BorrowRequest>(
            "SELECT * FROM borrow_requests WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(conn)
        .await?;
        Ok(borrow)
    }

    pub async fn list<'e, E>(
        &self,
        executor: E,
        status: Option<BorrowStatus>,
    ) -> Result<Vec<BorrowRequest>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rows = match status {
            Some(status) => {
                sqlx::query_as::<_, BorrowRequest>(
                    "SELECT * FROM borrow_requests WHERE status = $1 ORDER BY created_at DESC",
                )
                .bind(status)
                .fetch_all(executor)
                .await?
            }
            None => {
                sqlx::query_as::<_, BorrowRequest>(
                    "SELECT * FROM borrow_requests ORDER BY created_at DESC",
                )
                .fetch_all(executor)
                .await?
            }
        };
        Ok(rows)
    }

    // ---
    // Transições (uma função por coluna de ator/carimbo)
    // ---

    pub async fn mark_approved<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        approved_by: Uuid,
    ) -> Result<BorrowRequest, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let borrow = sqlx::query_as::<_, BorrowRequest>(
            r#"
            UPDATE borrow_requests
            SET status = 'approved', approved_by = $2, approved_at = NOW(), updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(approved_by)
        .fetch_one(executor)
        .await?;
        Ok(borrow)
    }

    pub async fn mark_declined<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        declined_by: Uuid,
        reason: Option<&str>,
    ) -> Result<BorrowRequest, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let borrow = sqlx::query_as::<_, BorrowRequest>(
            r#"
            UPDATE borrow_requests
            SET status = 'declined', declined_by = $2, declined_at = NOW(),
                decline_reason = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(declined_by)
        .bind(reason)
        .fetch_one(executor)
        .await?;
        Ok(borrow)
    }

    pub async fn mark_cancelled<'e, E>(
        &self,
        executor: E,
        id: Uuid,
    ) -> Result<BorrowRequest, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let borrow = sqlx::query_as::<_, BorrowRequest>(
            r#"
            UPDATE borrow_requests
            SET status = 'cancelled', updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .fetch_one(executor)
        .await?;
        Ok(borrow)
    }

    pub async fn mark_acquired<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        acquired_by: Uuid,
    ) -> Result<BorrowRequest, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let borrow = sqlx::query_as::<_, BorrowRequest>(
            r#"
            UPDATE borrow_requests
            SET status = 'acquired', acquired_by = $2, acquired_at = NOW(), updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(acquired_by)
        .fetch_one(executor)
        .await?;
        Ok(borrow)
    }

    pub async fn mark_in_return<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        returned_by: Uuid,
        note: Option<&str>,
    ) -> Result<BorrowRequest, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let borrow = sqlx::query_as::<_, BorrowRequest>(
            r#"
            UPDATE borrow_requests
            SET status = 'in_return', returned_by = $2, returned_at = NOW(),
                note = COALESCE($3, note), updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(returned_by)
        .bind(note)
        .fetch_one(executor)
        .await?;
        Ok(borrow)
    }

    pub async fn mark_return_accepted<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        accepted_by: Uuid,
    ) -> Result<BorrowRequest, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let borrow = sqlx::query_as::<_, BorrowRequest>(
            r#"
            UPDATE borrow_requests
            SET status = 'return_accepted', accepted_by = $2, accepted_at = NOW(), updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(accepted_by)
        .fetch_one(executor)
        .await?;
        Ok(borrow)
    }
}
