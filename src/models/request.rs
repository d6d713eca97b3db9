// src/models/request.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// Pedido de item (sala -> sala fornecedora) e pedido de estoque
// (sala -> administração central). As duas máquinas têm o mesmo formato:
// pending -> accepted/approved -> released -> fulfilled, com terminais
// alternativos declined / out_of_stock / disapproved / failed_request.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "item_request_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ItemRequestStatus {
    Pending,
    Accepted,
    Declined,
    Released,
    Fulfilled,
    OutOfStock,
}

impl ItemRequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemRequestStatus::Pending => "pending",
            ItemRequestStatus::Accepted => "accepted",
            ItemRequestStatus::Declined => "declined",
            ItemRequestStatus::Released => "released",
            ItemRequestStatus::Fulfilled => "fulfilled",
            ItemRequestStatus::OutOfStock => "out_of_stock",
        }
    }

    pub fn can_review(&self) -> bool {
        *self == ItemRequestStatus::Pending
    }

    pub fn can_release(&self) -> bool {
        *self == ItemRequestStatus::Accepted
    }

    pub fn can_fulfill(&self) -> bool {
        *self == ItemRequestStatus::Released
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ItemRequest {
    pub id: Uuid,
    pub requester_id: Uuid,
    // Sala de quem pede: é nela que o fulfill credita o estoque.
    pub requester_room_id: Uuid,
    // Sala fornecedora, de onde o release debita.
    pub room_id: Uuid,
    pub status: ItemRequestStatus,
    pub note: Option<String>,
    pub accepted_by: Option<Uuid>,
    pub accepted_at: Option<DateTime<Utc>>,
    pub declined_by: Option<Uuid>,
    pub declined_at: Option<DateTime<Utc>>,
    pub released_by: Option<Uuid>,
    pub released_at: Option<DateTime<Utc>>,
    pub fulfilled_by: Option<Uuid>,
    pub fulfilled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Linha do pedido. item_id é referência fraca resolvida pelo resolver;
// other_item_name cobre itens de texto livre, que nunca tocam o inventário.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ItemRequestDetail {
    pub id: Uuid,
    pub request_id: Uuid,
    pub item_id: Option<Uuid>,
    pub item_type: Option<String>,
    pub other_item_name: Option<String>,
    pub quantity: i32,
    pub status: ItemRequestStatus,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ItemRequestWithDetails {
    #[serde(flatten)]
    pub header: ItemRequest,
    pub details: Vec<ItemRequestDetail>,
}

/// Decisão granular de revisão para uma linha do pedido.
#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DetailDecision {
    pub detail_id: Uuid,
    pub accept: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "stock_request_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum StockRequestStatus {
    Pending,
    Approved,
    Disapproved,
    Fulfilled,
    FailedRequest,
}

impl StockRequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StockRequestStatus::Pending => "pending",
            StockRequestStatus::Approved => "approved",
            StockRequestStatus::Disapproved => "disapproved",
            StockRequestStatus::Fulfilled => "fulfilled",
            StockRequestStatus::FailedRequest => "failed_request",
        }
    }

    pub fn can_review(&self) -> bool {
        *self == StockRequestStatus::Pending
    }

    pub fn can_fulfill(&self) -> bool {
        *self == StockRequestStatus::Approved
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StockRequest {
    pub id: Uuid,
    pub requester_id: Uuid,
    // Sala de quem pede; o fulfill credita aqui.
    pub room_id: Uuid,
    pub item_id: Option<Uuid>,
    pub item_type: Option<String>,
    pub other_item_name: Option<String>,
    pub quantity: i32,
    // O aprovador pode emendar a quantidade antes de aprovar.
    pub approved_quantity: Option<i32>,
    pub status: StockRequestStatus,
    pub note: Option<String>,
    pub approved_by: Option<Uuid>,
    pub approved_at: Option<DateTime<Utc>>,
    pub disapproved_by: Option<Uuid>,
    pub disapproved_at: Option<DateTime<Utc>>,
    pub fulfilled_by: Option<Uuid>,
    pub fulfilled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StockRequest {
    /// Quantidade efetiva a creditar: a emendada pelo aprovador, se houver.
    pub fn effective_quantity(&self) -> i32 {
        self.approved_quantity.unwrap_or(self.quantity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pedido_de_item_segue_a_ordem() {
        use ItemRequestStatus::*;
        assert!(Pending.can_review());
        assert!(!Accepted.can_review());

        assert!(Accepted.can_release());
        // Repetir release num pedido já liberado falha, não é no-op.
        assert!(!Released.can_release());
        assert!(!Pending.can_release());

        assert!(Released.can_fulfill());
        assert!(!Fulfilled.can_fulfill());
        assert!(!OutOfStock.can_fulfill());
    }

    #[test]
    fn pedido_de_estoque_segue_a_ordem() {
        use StockRequestStatus::*;
        assert!(Pending.can_review());
        assert!(!Approved.can_review());
        assert!(!Disapproved.can_review());

        assert!(Approved.can_fulfill());
        assert!(!Pending.can_fulfill());
        assert!(!Fulfilled.can_fulfill());
        assert!(!FailedRequest.can_fulfill());
    }

    #[test]
    fn quantidade_efetiva_prefere_a_emenda_do_aprovador() {
        let base = StockRequest {
            id: Uuid::new_v4(),
            requester_id: Uuid::new_v4(),
            room_id: Uuid::new_v4(),
            item_id: None,
            item_type: None,
            other_item_name: Some("Grampeador".into()),
            quantity: 10,
            approved_quantity: None,
            status: StockRequestStatus::Pending,
            note: None,
            approved_by: None,
            approved_at: None,
            disapproved_by: None,
            disapproved_at: None,
            fulfilled_by: None,
            fulfilled_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert_eq!(base.effective_quantity(), 10);

        let amended = StockRequest {
            approved_quantity: Some(4),
            ..base
        };
        assert_eq!(amended.effective_quantity(), 4);
    }
}
