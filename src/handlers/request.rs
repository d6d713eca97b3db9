// src/handlers/request.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedActor,
    models::request::{
        DetailDecision, ItemRequest, ItemRequestStatus, ItemRequestWithDetails, StockRequest,
        StockRequestStatus,
    },
    services::request_service::NewRequestLine,
};

// =========================================================================
//  PEDIDOS DE ITEM
// =========================================================================

#[derive(Debug, Deserialize, Serialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RequestLinePayload {
    pub item_id: Option<Uuid>,
    pub item_type: Option<String>,
    pub other_item_name: Option<String>,

    #[validate(range(min = 1, message = "A quantidade precisa ser maior que zero."))]
    pub quantity: i32,
}

impl RequestLinePayload {
    // Toda linha precisa apontar para um item do catálogo ou trazer o nome
    // de um item avulso.
    fn validate_consistency(&self) -> Result<(), validator::ValidationError> {
        if self.item_id.is_none() && self.other_item_name.is_none() {
            return Err(validator::ValidationError::new("missing_item"));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateItemRequestPayload {
    pub requester_room_id: Uuid,
    pub room_id: Uuid,
    pub note: Option<String>,

    #[validate(
        length(min = 1, message = "O pedido precisa de pelo menos uma linha."),
        nested
    )]
    pub details: Vec<RequestLinePayload>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AcceptItemRequestPayload {
    // Ausente = aceita todas as linhas. Presente = decisão linha a linha
    // (linhas não citadas são recusadas).
    pub decisions: Option<Vec<DetailDecision>>,
}

#[derive(Debug, Deserialize)]
pub struct ListItemRequestsParams {
    pub status: Option<ItemRequestStatus>,
}

#[utoipa::path(
    post,
    path = "/api/item-requests",
    tag = "Item Requests",
    request_body = CreateItemRequestPayload,
    responses(
        (status = 201, description = "Pedido criado", body = ItemRequestWithDetails),
        (status = 400, description = "Payload inválido")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_item_request(
    State(app_state): State<AppState>,
    AuthenticatedActor(actor): AuthenticatedActor,
    Json(payload): Json<CreateItemRequestPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    for (index, line) in payload.details.iter().enumerate() {
        line.validate_consistency().map_err(|e| {
            let mut errors = validator::ValidationErrors::new();
            errors.add("details", e);
            tracing::debug!("Linha {} sem item nem nome avulso", index);
            AppError::ValidationError(errors)
        })?;
    }

    let lines = payload
        .details
        .into_iter()
        .map(|line| NewRequestLine {
            item_id: line.item_id,
            item_type: line.item_type,
            other_item_name: line.other_item_name,
            quantity: line.quantity,
        })
        .collect();

    let request = app_state
        .request_service
        .create_item_request(
            &app_state.db_pool,
            actor,
            payload.requester_room_id,
            payload.room_id,
            payload.note.as_deref(),
            lines,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(request)))
}

#[utoipa::path(
    post,
    path = "/api/item-requests/{id}/accept",
    tag = "Item Requests",
    params(("id" = Uuid, Path, description = "ID do pedido")),
    request_body = AcceptItemRequestPayload,
    responses(
        (status = 200, description = "Pedido revisado (linha a linha ou em bloco)", body = ItemRequestWithDetails),
        (status = 409, description = "Status atual não permite revisão")
    ),
    security(("api_jwt" = []))
)]
pub async fn accept_item_request(
    State(app_state): State<AppState>,
    AuthenticatedActor(actor): AuthenticatedActor,
    Path(id): Path<Uuid>,
    Json(payload): Json<AcceptItemRequestPayload>,
) -> Result<impl IntoResponse, AppError> {
    let request = app_state
        .request_service
        .accept_item_request(&app_state.db_pool, actor, id, payload.decisions)
        .await?;
    Ok((StatusCode::OK, Json(request)))
}

#[utoipa::path(
    post,
    path = "/api/item-requests/{id}/decline",
    tag = "Item Requests",
    params(("id" = Uuid, Path, description = "ID do pedido")),
    responses((status = 200, description = "Pedido recusado", body = ItemRequestWithDetails)),
    security(("api_jwt" = []))
)]
pub async fn decline_item_request(
    State(app_state): State<AppState>,
    AuthenticatedActor(actor): AuthenticatedActor,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let request = app_state
        .request_service
        .decline_item_request(&app_state.db_pool, actor, id)
        .await?;
    Ok((StatusCode::OK, Json(request)))
}

#[utoipa::path(
    post,
    path = "/api/item-requests/{id}/release",
    tag = "Item Requests",
    params(("id" = Uuid, Path, description = "ID do pedido")),
    responses(
        (status = 200, description = "Estoque debitado do fornecedor", body = ItemRequestWithDetails),
        (status = 409, description = "Alguma linha sem estoque: nada é liberado e o pedido vira out_of_stock")
    ),
    security(("api_jwt" = []))
)]
pub async fn release_item_request(
    State(app_state): State<AppState>,
    AuthenticatedActor(actor): AuthenticatedActor,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let request = app_state
        .request_service
        .release_item_request(&app_state.db_pool, actor, id)
        .await?;
    Ok((StatusCode::OK, Json(request)))
}

#[utoipa::path(
    post,
    path = "/api/item-requests/{id}/fulfill",
    tag = "Item Requests",
    params(("id" = Uuid, Path, description = "ID do pedido")),
    responses(
        (status = 200, description = "Estoque creditado na sala requerente", body = ItemRequestWithDetails)
    ),
    security(("api_jwt" = []))
)]
pub async fn fulfill_item_request(
    State(app_state): State<AppState>,
    AuthenticatedActor(actor): AuthenticatedActor,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let request = app_state
        .request_service
        .fulfill_item_request(&app_state.db_pool, actor, id)
        .await?;
    Ok((StatusCode::OK, Json(request)))
}

#[utoipa::path(
    get,
    path = "/api/item-requests/{id}",
    tag = "Item Requests",
    params(("id" = Uuid, Path, description = "ID do pedido")),
    responses((status = 200, body = ItemRequestWithDetails), (status = 404, description = "Não encontrado")),
    security(("api_jwt" = []))
)]
pub async fn get_item_request(
    State(app_state): State<AppState>,
    AuthenticatedActor(_actor): AuthenticatedActor,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let request = app_state
        .request_service
        .get_item_request(&app_state.db_pool, id)
        .await?;
    Ok((StatusCode::OK, Json(request)))
}

#[utoipa::path(
    get,
    path = "/api/item-requests",
    tag = "Item Requests",
    responses((status = 200, body = [ItemRequest])),
    security(("api_jwt" = []))
)]
pub async fn list_item_requests(
    State(app_state): State<AppState>,
    AuthenticatedActor(_actor): AuthenticatedActor,
    Query(params): Query<ListItemRequestsParams>,
) -> Result<impl IntoResponse, AppError> {
    let requests = app_state
        .request_service
        .list_item_requests(&app_state.db_pool, params.status)
        .await?;
    Ok((StatusCode::OK, Json(requests)))
}

// =========================================================================
//  PEDIDOS DE ESTOQUE
// =========================================================================

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateStockRequestPayload {
    pub room_id: Uuid,
    pub item_id: Option<Uuid>,
    pub item_type: Option<String>,
    pub other_item_name: Option<String>,

    #[validate(range(min = 1, message = "A quantidade precisa ser maior que zero."))]
    pub quantity: i32,

    pub note: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApproveStockRequestPayload {
    // O aprovador pode emendar a quantidade pedida.
    #[validate(range(min = 1, message = "A quantidade aprovada precisa ser maior que zero."))]
    pub approved_quantity: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct ListStockRequestsParams {
    pub status: Option<StockRequestStatus>,
}

#[utoipa::path(
    post,
    path = "/api/stock-requests",
    tag = "Stock Requests",
    request_body = CreateStockRequestPayload,
    responses((status = 201, description = "Pedido criado", body = StockRequest)),
    security(("api_jwt" = []))
)]
pub async fn create_stock_request(
    State(app_state): State<AppState>,
    AuthenticatedActor(actor): AuthenticatedActor,
    Json(payload): Json<CreateStockRequestPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let request = app_state
        .request_service
        .create_stock_request(
            &app_state.db_pool,
            actor,
            payload.room_id,
            payload.item_id,
            payload.item_type.as_deref(),
            payload.other_item_name.as_deref(),
            payload.quantity,
            payload.note.as_deref(),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(request)))
}

#[utoipa::path(
    post,
    path = "/api/stock-requests/{id}/approve",
    tag = "Stock Requests",
    params(("id" = Uuid, Path, description = "ID do pedido")),
    request_body = ApproveStockRequestPayload,
    responses(
        (status = 200, description = "Pedido aprovado (quantidade pode ter sido emendada)", body = StockRequest),
        (status = 403, description = "Apenas a administração aprova")
    ),
    security(("api_jwt" = []))
)]
pub async fn approve_stock_request(
    State(app_state): State<AppState>,
    AuthenticatedActor(actor): AuthenticatedActor,
    Path(id): Path<Uuid>,
    Json(payload): Json<ApproveStockRequestPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let request = app_state
        .request_service
        .approve_stock_request(&app_state.db_pool, actor, id, payload.approved_quantity)
        .await?;
    Ok((StatusCode::OK, Json(request)))
}

#[utoipa::path(
    post,
    path = "/api/stock-requests/{id}/disapprove",
    tag = "Stock Requests",
    params(("id" = Uuid, Path, description = "ID do pedido")),
    responses((status = 200, description = "Pedido reprovado", body = StockRequest)),
    security(("api_jwt" = []))
)]
pub async fn disapprove_stock_request(
    State(app_state): State<AppState>,
    AuthenticatedActor(actor): AuthenticatedActor,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let request = app_state
        .request_service
        .disapprove_stock_request(&app_state.db_pool, actor, id)
        .await?;
    Ok((StatusCode::OK, Json(request)))
}

#[utoipa::path(
    post,
    path = "/api/stock-requests/{id}/fulfill",
    tag = "Stock Requests",
    params(("id" = Uuid, Path, description = "ID do pedido")),
    responses(
        (status = 200, description = "Estoque criado/incrementado na sala requerente", body = StockRequest),
        (status = 404, description = "Item do catálogo não resolve: pedido vira failed_request")
    ),
    security(("api_jwt" = []))
)]
pub async fn fulfill_stock_request(
    State(app_state): State<AppState>,
    AuthenticatedActor(actor): AuthenticatedActor,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let request = app_state
        .request_service
        .fulfill_stock_request(&app_state.db_pool, actor, id)
        .await?;
    Ok((StatusCode::OK, Json(request)))
}

#[utoipa::path(
    get,
    path = "/api/stock-requests/{id}",
    tag = "Stock Requests",
    params(("id" = Uuid, Path, description = "ID do pedido")),
    responses((status = 200, body = StockRequest), (status = 404, description = "Não encontrado")),
    security(("api_jwt" = []))
)]
pub async fn get_stock_request(
    State(app_state): State<AppState>,
    AuthenticatedActor(_actor): AuthenticatedActor,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let request = app_state
        .request_service
        .get_stock_request(&app_state.db_pool, id)
        .await?;
    Ok((StatusCode::OK, Json(request)))
}

#[utoipa::path(
    get,
    path = "/api/stock-requests",
    tag = "Stock Requests",
    responses((status = 200, body = [StockRequest])),
    security(("api_jwt" = []))
)]
pub async fn list_stock_requests(
    State(app_state): State<AppState>,
    AuthenticatedActor(_actor): AuthenticatedActor,
    Query(params): Query<ListStockRequestsParams>,
) -> Result<impl IntoResponse, AppError> {
    let requests = app_state
        .request_service
        .list_stock_requests(&app_state.db_pool, params.status)
        .await?;
    Ok((StatusCode::OK, Json(requests)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linha_precisa_de_item_ou_nome_avulso() {
        let sem_nada = RequestLinePayload {
            item_id: None,
            item_type: None,
            other_item_name: None,
            quantity: 1,
        };
        assert!(sem_nada.validate_consistency().is_err());

        let com_item = RequestLinePayload {
            item_id: Some(Uuid::new_v4()),
            item_type: Some("apparel".into()),
            other_item_name: None,
            quantity: 1,
        };
        assert!(com_item.validate_consistency().is_ok());

        let avulso = RequestLinePayload {
            item_id: None,
            item_type: None,
            other_item_name: Some("Extintor".into()),
            quantity: 1,
        };
        assert!(avulso.validate_consistency().is_ok());
    }

    #[test]
    fn pedido_sem_linhas_reprova_na_validacao() {
        let payload = CreateItemRequestPayload {
            requester_room_id: Uuid::new_v4(),
            room_id: Uuid::new_v4(),
            note: None,
            details: vec![],
        };
        assert!(payload.validate().is_err());
    }
}
