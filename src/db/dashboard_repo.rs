// src/db/dashboard_repo.rs

use sqlx::{PgPool, Row};

use crate::{common::error::AppError, models::dashboard::DashboardSummary};

#[derive(Clone)]
pub struct DashboardRepository {
    pool: PgPool,
}

impl DashboardRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // Contadores do painel. Leitura sem lock direto na pool: os invariantes
    // são garantidos nas transições, não aqui.
    pub async fn get_summary(&self) -> Result<DashboardSummary, AppError> {
        let row = sqlx::query(
            r#"
            SELECT
                (SELECT COUNT(*) FROM borrow_requests WHERE status = 'waiting_for_approval') AS pending_borrows,
                (SELECT COUNT(*) FROM transfer_requests WHERE status = 'in_transfer') AS in_transfer,
                (SELECT COUNT(*) FROM item_requests WHERE status = 'pending') AS pending_item_requests,
                (SELECT COUNT(*) FROM stock_requests WHERE status = 'pending') AS pending_stock_requests,
                (SELECT COALESCE(SUM(total_quantity), 0) FROM apparel_inventories) AS apparel_quantity,
                (SELECT COALESCE(SUM(total_quantity), 0) FROM supply_inventories) AS supply_quantity,
                (SELECT COALESCE(SUM(total_quantity), 0) FROM gen_item_inventories) AS gen_item_quantity
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(DashboardSummary {
            pending_borrows: row.try_get("pending_borrows")?,
            in_transfer: row.try_get("in_transfer")?,
            pending_item_requests: row.try_get("pending_item_requests")?,
            pending_stock_requests: row.try_get("pending_stock_requests")?,
            apparel_quantity: row.try_get("apparel_quantity")?,
            supply_quantity: row.try_get("supply_quantity")?,
            gen_item_quantity: row.try_get("gen_item_quantity")?,
        })
    }
}
