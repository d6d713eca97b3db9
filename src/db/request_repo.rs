// src/db/request_repo.rs

use sqlx::{Executor, PgConnection, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::request::{
        ItemRequest, ItemRequestDetail, ItemRequestStatus, StockRequest, StockRequestStatus,
    },
};

#[derive(Clone)]
pub struct RequestRepository {
    pool: PgPool,
}

impl RequestRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    //  PEDIDOS DE ITEM (sala -> sala fornecedora)
    // =========================================================================

    pub async fn create_item_request<'e, E>(
        &self,
        executor: E,
        requester_id: Uuid,
        requester_room_id: Uuid,
        room_id: Uuid,
        note: Option<&str>,
    ) -> Result<ItemRequest, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let request = sqlx::query_as::<_, ItemRequest>(
            r#"
            INSERT INTO item_requests (requester_id, requester_room_id, room_id, note)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(requester_id)
        .bind(requester_room_id)
        .bind(room_id)
        .bind(note)
        .fetch_one(executor)
        .await?;
        Ok(request)
    }

    pub async fn add_detail<'e, E>(
        &self,
        executor: E,
        request_id: Uuid,
        item_id: Option<Uuid>,
        item_type: Option<&str>,
        other_item_name: Option<&str>,
        quantity: i32,
    ) -> Result<ItemRequestDetail, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let detail = sqlx::query_as::<_, ItemRequestDetail>(
            r#"
            INSERT INTO item_request_details (request_id, item_id, item_type, other_item_name, quantity)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(request_id)
        .bind(item_id)
        .bind(item_type)
        .bind(other_item_name)
        .bind(quantity)
        .fetch_one(executor)
        .await?;
        Ok(detail)
    }

    pub async fn get_item_request<'e, E>(
        &self,
        executor: E,
        id: Uuid,
    ) -> Result<Option<ItemRequest>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let request = sqlx::query_as::<_, ItemRequest>("SELECT * FROM item_requests WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(request)
    }

    pub async fn get_item_request_for_update(
        &self,
        conn: &mut PgConnection,
        id: Uuid,
    ) -> Result<Option<ItemRequest>, AppError> {
        let request = sqlx::query_as::<_, ItemRequest>(
            "SELECT * FROM item_requests WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(conn)
        .await?;
        Ok(request)
    }

    pub async fn list_item_requests<'e, E>(
        &self,
        executor: E,
        status: Option<ItemRequestStatus>,
    ) -> Result<Vec<ItemRequest>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rows = match status {
            Some(status) => {
                sqlx::query_as::<_, ItemRequest>(
                    "SELECT * FROM item_requests WHERE status = $1 ORDER BY created_at DESC",
                )
                .bind(status)
                .fetch_all(executor)
                .await?
            }
            None => {
                sqlx::query_as::<_, ItemRequest>(
                    "SELECT * FROM item_requests ORDER BY created_at DESC",
                )
                .fetch_all(executor)
                .await?
            }
        };
        Ok(rows)
    }

    pub async fn get_details<'e, E>(
        &self,
        executor: E,
        request_id: Uuid,
    ) -> Result<Vec<ItemRequestDetail>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let details = sqlx::query_as::<_, ItemRequestDetail>(
            "SELECT * FROM item_request_details WHERE request_id = $1 ORDER BY id",
        )
        .bind(request_id)
        .fetch_all(executor)
        .await?;
        Ok(details)
    }

    pub async fn set_detail_status<'e, E>(
        &self,
        executor: E,
        detail_id: Uuid,
        status: ItemRequestStatus,
    ) -> Result<ItemRequestDetail, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let detail = sqlx::query_as::<_, ItemRequestDetail>(
            "UPDATE item_request_details SET status = $2 WHERE id = $1 RETURNING *",
        )
        .bind(detail_id)
        .bind(status)
        .fetch_one(executor)
        .await?;
        Ok(detail)
    }

    pub async fn mark_item_request_accepted<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        accepted_by: Uuid,
    ) -> Result<ItemRequest, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let request = sqlx::query_as::<_, ItemRequest>(
            r#"
            UPDATE item_requests
            SET status = 'accepted', accepted_by = $2, accepted_at = NOW(), updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(accepted_by)
        .fetch_one(executor)
        .await?;
        Ok(request)
    }

    pub async fn mark_item_request_declined<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        declined_by: Uuid,
    ) -> Result<ItemRequest, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let request = sqlx::query_as::<_, ItemRequest>(
            r#"
            UPDATE item_requests
            SET status = 'declined', declined_by = $2, declined_at = NOW(), updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(declined_by)
        .fetch_one(executor)
        .await?;
        Ok(request)
    }

    pub async fn mark_item_request_released<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        released_by: Uuid,
    ) -> Result<ItemRequest, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let request = sqlx::query_as::<_, ItemRequest>(
            r#"
            UPDATE item_requests
            SET status = 'released', released_by = $2, released_at = NOW(), updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(released_by)
        .fetch_one(executor)
        .await?;
        Ok(request)
    }

    pub async fn mark_item_request_fulfilled<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        fulfilled_by: Uuid,
    ) -> Result<ItemRequest, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let request = sqlx::query_as::<_, ItemRequest>(
            r#"
            UPDATE item_requests
            SET status = 'fulfilled', fulfilled_by = $2, fulfilled_at = NOW(), updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(fulfilled_by)
        .fetch_one(executor)
        .await?;
        Ok(request)
    }

    /// Marca o pedido como sem estoque NUMA TRANSAÇÃO PRÓPRIA, depois do
    /// rollback do release; a tentativa falhada fica registrada em vez de
    /// se perder em silêncio.
    pub async fn mark_item_request_out_of_stock(&self, id: Uuid) -> Result<(), AppError> {
        sqlx::query(
            "UPDATE item_requests SET status = 'out_of_stock', updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    // =========================================================================
    //  PEDIDOS DE ESTOQUE (sala -> administração central)
    // =========================================================================

    pub async fn create_stock_request<'e, E>(
        &self,
        executor: E,
        requester_id: Uuid,
        room_id: Uuid,
        item_id: Option<Uuid>,
        item_type: Option<&str>,
        other_item_name: Option<&str>,
        quantity: i32,
        note: Option<&str>,
    ) -> Result<StockRequest, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let request = sqlx::query_as::<_, StockRequest>(
            r#"
            INSERT INTO stock_requests
                (requester_id, room_id, item_id, item_type, other_item_name, quantity, note)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(requester_id)
        .bind(room_id)
        .bind(item_id)
        .bind(item_type)
        .bind(other_item_name)
        .bind(quantity)
        .bind(note)
        .fetch_one(executor)
        .await?;
        Ok(request)
    }

    pub async fn get_stock_request<'e, E>(
        &self,
        executor: E,
        id: Uuid,
    ) -> Result<Option<StockRequest>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let request = sqlx::query_as::<_, StockRequest>("SELECT * FROM stock_requests WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(request)
    }

    pub async fn get_stock_request_for_update(
        &self,
        conn: &mut PgConnection,
        id: Uuid,
    ) -> Result<Option<StockRequest>, AppError> {
        let request = sqlx::query_as::<_, StockRequest>(
            "SELECT * FROM stock_requests WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(conn)
        .await?;
        Ok(request)
    }

    pub async fn list_stock_requests<'e, E>(
        &self,
        executor: E,
        status: Option<StockRequestStatus>,
    ) -> Result<Vec<StockRequest>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rows = match status {
            Some(status) => {
                sqlx::query_as::<_, StockRequest>(
                    "SELECT * FROM stock_requests WHERE status = $1 ORDER BY created_at DESC",
                )
                .bind(status)
                .fetch_all(executor)
                .await?
            }
            None => {
                sqlx::query_as::<_, StockRequest>(
                    "SELECT * FROM stock_requests ORDER BY created_at DESC",
                )
                .fetch_all(executor)
                .await?
            }
        };
        Ok(rows)
    }

    pub async fn mark_stock_request_approved<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        approved_by: Uuid,
        approved_quantity: Option<i32>,
    ) -> Result<StockRequest, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let request = sqlx::query_as::<_, StockRequest>(
            r#"
            UPDATE stock_requests
            SET status = 'approved', approved_by = $2, approved_at = NOW(),
                approved_quantity = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(approved_by)
        .bind(approved_quantity)
        .fetch_one(executor)
        .await?;
        Ok(request)
    }

    pub async fn mark_stock_request_disapproved<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        disapproved_by: Uuid,
    ) -> Result<StockRequest, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let request = sqlx::query_as::<_, StockRequest>(
            r#"
            UPDATE stock_requests
            SET status = 'disapproved', disapproved_by = $2, disapproved_at = NOW(), updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(disapproved_by)
        .fetch_one(executor)
        .await?;
        Ok(request)
    }

    pub async fn mark_stock_request_fulfilled<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        fulfilled_by: Uuid,
    ) -> Result<StockRequest, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let request = sqlx::query_as::<_, StockRequest>(
            r#"
            UPDATE stock_requests
            SET status = 'fulfilled', fulfilled_by = $2, fulfilled_at = NOW(), updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(fulfilled_by)
        .fetch_one(executor)
        .await?;
        Ok(request)
    }

    /// Registro visível da tentativa falhada, em transação própria (o
    /// fulfill que falhou já sofreu rollback completo).
    pub async fn mark_stock_request_failed(&self, id: Uuid) -> Result<(), AppError> {
        sqlx::query(
            "UPDATE stock_requests SET status = 'failed_request', updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
