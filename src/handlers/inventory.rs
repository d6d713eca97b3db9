// src/handlers/inventory.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedActor,
    models::inventory::{ItemKind, ReceiptBatch, ResolvedItem, VariantSpec},
};

// ---
// Payload: entrada de estoque (intake)
// ---
// A primeira entrada de uma variante numa sala cria o registro do ledger;
// as seguintes incrementam. Os atributos exigidos dependem da espécie.
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReceiveStockPayload {
    pub room_id: Uuid,
    pub item_kind: ItemKind,

    // Fardamento
    pub apparel_type: Option<String>,
    pub apparel_for: Option<String>,
    pub size: Option<String>,

    // Material de expediente
    pub supply_name: Option<String>,
    pub supply_type: Option<String>,

    // Item geral
    pub item_name: Option<String>,
    pub item_type: Option<String>,

    #[validate(range(min = 1, message = "A quantidade precisa ser maior que zero."))]
    pub quantity: i32,

    #[validate(length(min = 1, message = "Informe quem entregou."))]
    pub delivered_by: String,

    pub source: Option<String>,
}

impl ReceiveStockPayload {
    // Monta a chave natural da variante, exigindo os campos da espécie.
    fn into_variant(self) -> Result<(Uuid, VariantSpec, i32, String, Option<String>), AppError> {
        let missing = |field: &'static str| {
            let mut errors = validator::ValidationErrors::new();
            errors.add(field, ValidationError::new("required_for_kind"));
            AppError::ValidationError(errors)
        };

        let variant = match self.item_kind {
            ItemKind::Apparel => VariantSpec::Apparel {
                apparel_type: self.apparel_type.ok_or_else(|| missing("apparelType"))?,
                apparel_for: self.apparel_for.ok_or_else(|| missing("apparelFor"))?,
                size: self.size.ok_or_else(|| missing("size"))?,
            },
            ItemKind::Supply => VariantSpec::Supply {
                supply_name: self.supply_name.ok_or_else(|| missing("supplyName"))?,
                supply_type: self.supply_type.ok_or_else(|| missing("supplyType"))?,
            },
            ItemKind::GenItem => VariantSpec::GenItem {
                item_name: self.item_name.ok_or_else(|| missing("itemName"))?,
                item_type: self.item_type.ok_or_else(|| missing("itemType"))?,
            },
        };

        Ok((
            self.room_id,
            variant,
            self.quantity,
            self.delivered_by,
            self.source,
        ))
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReceiveStockResponse {
    pub inventory: ResolvedItem,
    pub batch: ReceiptBatch,
}

// ---
// Handler: receive_stock
// ---
#[utoipa::path(
    post,
    path = "/api/inventory/receipts",
    tag = "Inventory",
    request_body = ReceiveStockPayload,
    responses(
        (status = 201, description = "Entrada registrada: ledger creditado, lote (e unidades) criados", body = ReceiveStockResponse),
        (status = 400, description = "Payload inválido para a espécie")
    ),
    security(("api_jwt" = []))
)]
pub async fn receive_stock(
    State(app_state): State<AppState>,
    AuthenticatedActor(actor): AuthenticatedActor,
    Json(payload): Json<ReceiveStockPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let (room_id, variant, quantity, delivered_by, source) = payload.into_variant()?;

    let (inventory, batch) = app_state
        .inventory_service
        .receive_stock(
            &app_state.db_pool,
            actor,
            room_id,
            variant,
            quantity,
            &delivered_by,
            source.as_deref(),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(ReceiveStockResponse { inventory, batch })))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_payload(kind: ItemKind) -> ReceiveStockPayload {
        ReceiveStockPayload {
            room_id: Uuid::new_v4(),
            item_kind: kind,
            apparel_type: None,
            apparel_for: None,
            size: None,
            supply_name: None,
            supply_type: None,
            item_name: None,
            item_type: None,
            quantity: 3,
            delivered_by: "Fornecedor".into(),
            source: None,
        }
    }

    #[test]
    fn entrada_de_fardamento_exige_os_tres_atributos() {
        let payload = ReceiveStockPayload {
            apparel_type: Some("Camisa".into()),
            apparel_for: Some("Educação Física".into()),
            ..base_payload(ItemKind::Apparel)
        };
        // Falta o tamanho.
        assert!(matches!(
            payload.into_variant(),
            Err(AppError::ValidationError(_))
        ));

        let payload = ReceiveStockPayload {
            apparel_type: Some("Camisa".into()),
            apparel_for: Some("Educação Física".into()),
            size: Some("M".into()),
            ..base_payload(ItemKind::Apparel)
        };
        let (_, variant, qty, _, _) = payload.into_variant().unwrap();
        assert!(matches!(variant, VariantSpec::Apparel { .. }));
        assert_eq!(qty, 3);
    }

    #[test]
    fn atributos_de_outra_especie_nao_contam() {
        // Campos de fardamento preenchidos, mas a espécie é material.
        let payload = ReceiveStockPayload {
            apparel_type: Some("Camisa".into()),
            apparel_for: Some("EF".into()),
            size: Some("M".into()),
            ..base_payload(ItemKind::Supply)
        };
        assert!(payload.into_variant().is_err());
    }
}
