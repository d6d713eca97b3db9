// src/db/room_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{common::error::AppError, models::room::Room};

// Diretório de salas: o CRUD pertence a outro sistema, o núcleo só lê
// (responsável da sala, tipo de sala para validar destinos).
#[derive(Clone)]
pub struct RoomRepository {
    pool: PgPool,
}

impl RoomRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get_room<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Room>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let room = sqlx::query_as::<_, Room>("SELECT * FROM rooms WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(room)
    }

    /// Variante que lê direto da pool, para as checagens feitas antes de
    /// abrir a transação.
    pub async fn get_room_from_pool(&self, id: Uuid) -> Result<Option<Room>, AppError> {
        self.get_room(&self.pool, id).await
    }
}
