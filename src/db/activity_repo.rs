// src/db/activity_repo.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::{common::error::AppError, models::activity::ACTIVITY_LOG_RETENTION};

// Log de atividades: canal lateral, nunca participa da transação de
// negócio. Por isso este repositório fala direto com a pool.
#[derive(Clone)]
pub struct ActivityRepository {
    pool: PgPool,
}

impl ActivityRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insere a entrada e poda o excedente além da retenção, das mais
    /// antigas para as mais novas.
    pub async fn insert_and_prune(
        &self,
        account_id: Uuid,
        action: &str,
        detail: &str,
    ) -> Result<(), AppError> {
        sqlx::query("INSERT INTO activity_logs (account_id, action, detail) VALUES ($1, $2, $3)")
            .bind(account_id)
            .bind(action)
            .bind(detail)
            .execute(&self.pool)
            .await?;

        sqlx::query(
            r#"
            DELETE FROM activity_logs
            WHERE account_id = $1
              AND id NOT IN (
                  SELECT id FROM activity_logs
                  WHERE account_id = $1
                  ORDER BY created_at DESC
                  LIMIT $2
              )
            "#,
        )
        .bind(account_id)
        .bind(ACTIVITY_LOG_RETENTION)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
