// src/models/transfer.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// Transferência sala-a-sala: nasce in_transfer e termina em
// transfer_accepted quando o destino aceita (e o estoque muda de mãos).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "transfer_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TransferStatus {
    InTransfer,
    TransferAccepted,
}

impl TransferStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferStatus::InTransfer => "in_transfer",
            TransferStatus::TransferAccepted => "transfer_accepted",
        }
    }

    pub fn can_accept(&self) -> bool {
        *self == TransferStatus::InTransfer
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    pub id: Uuid,
    pub from_room_id: Uuid,
    pub to_room_id: Uuid,
    pub created_by: Uuid,
    pub item_type: String,
    pub item_id: Uuid,
    pub quantity: i32,
    pub status: TransferStatus,
    pub note: Option<String>,
    pub accepted_by: Option<Uuid>,
    pub accepted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aceitar_duas_vezes_nao_e_permitido() {
        assert!(TransferStatus::InTransfer.can_accept());
        assert!(!TransferStatus::TransferAccepted.can_accept());
    }
}
