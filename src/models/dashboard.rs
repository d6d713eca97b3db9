// src/models/dashboard.rs

use serde::Serialize;
use utoipa::ToSchema;

// Contadores que alimentam o painel. Leituras sem lock; podem estar
// ligeiramente defasadas em relação às transações em andamento.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub pending_borrows: i64,
    pub in_transfer: i64,
    pub pending_item_requests: i64,
    pub pending_stock_requests: i64,
    pub apparel_quantity: i64,
    pub supply_quantity: i64,
    pub gen_item_quantity: i64,
}
