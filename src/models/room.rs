// src/models/room.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// O CRUD de salas vive noutro sistema; o núcleo só lê este diretório
// para resolver responsáveis e validar destinos de transferência.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "room_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RoomType {
    Office,
    Classroom,
    Stockroom,
    Substockroom,
}

impl RoomType {
    /// Apenas salas de estoque podem receber transferências e pedidos de item.
    pub fn accepts_stock(&self) -> bool {
        matches!(self, RoomType::Stockroom | RoomType::Substockroom)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "stockroom_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum StockroomType {
    Apparel,
    Supply,
    General,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub id: Uuid,
    pub name: String,
    pub room_type: RoomType,
    pub stockroom_type: Option<StockroomType>,
    pub room_in_charge: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Room {
    pub fn is_in_charge(&self, account_id: Uuid) -> bool {
        self.room_in_charge == Some(account_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn somente_salas_de_estoque_recebem_transferencias() {
        assert!(RoomType::Stockroom.accepts_stock());
        assert!(RoomType::Substockroom.accepts_stock());
        assert!(!RoomType::Office.accepts_stock());
        assert!(!RoomType::Classroom.accepts_stock());
    }
}
