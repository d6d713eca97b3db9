// src/handlers/transfer.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedActor,
    models::transfer::{TransferRequest, TransferStatus},
};

// ---
// Payload: CreateTransfer
// ---
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateTransferPayload {
    pub from_room_id: Uuid,
    pub to_room_id: Uuid,

    // Dica de espécie ("apparel", "supply", "genItem" e sinônimos).
    #[validate(length(min = 1, message = "O tipo do item é obrigatório."))]
    pub item_type: String,

    pub item_id: Uuid,

    #[validate(range(min = 1, message = "A quantidade precisa ser maior que zero."))]
    pub quantity: i32,

    pub note: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListTransfersParams {
    pub status: Option<TransferStatus>,
}

// ---
// Handler: create_transfer
// ---
#[utoipa::path(
    post,
    path = "/api/transfers",
    tag = "Transfers",
    request_body = CreateTransferPayload,
    responses(
        (status = 201, description = "Transferência criada", body = TransferRequest),
        (status = 422, description = "Item não pertence à sala de origem")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_transfer(
    State(app_state): State<AppState>,
    AuthenticatedActor(actor): AuthenticatedActor,
    Json(payload): Json<CreateTransferPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let transfer = app_state
        .transfer_service
        .create(
            &app_state.db_pool,
            actor,
            payload.from_room_id,
            payload.to_room_id,
            &payload.item_type,
            payload.item_id,
            payload.quantity,
            payload.note.as_deref(),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(transfer)))
}

// ---
// Handler: accept_transfer (move o estoque entre as salas)
// ---
#[utoipa::path(
    post,
    path = "/api/transfers/{id}/accept",
    tag = "Transfers",
    params(("id" = Uuid, Path, description = "ID da transferência")),
    responses(
        (status = 200, description = "Transferência aceita; estoque movido", body = TransferRequest),
        (status = 409, description = "Estoque insuficiente ou status inválido")
    ),
    security(("api_jwt" = []))
)]
pub async fn accept_transfer(
    State(app_state): State<AppState>,
    AuthenticatedActor(actor): AuthenticatedActor,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let transfer = app_state
        .transfer_service
        .accept(&app_state.db_pool, actor, id)
        .await?;
    Ok((StatusCode::OK, Json(transfer)))
}

#[utoipa::path(
    get,
    path = "/api/transfers/{id}",
    tag = "Transfers",
    params(("id" = Uuid, Path, description = "ID da transferência")),
    responses((status = 200, body = TransferRequest), (status = 404, description = "Não encontrada")),
    security(("api_jwt" = []))
)]
pub async fn get_transfer(
    State(app_state): State<AppState>,
    AuthenticatedActor(_actor): AuthenticatedActor,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let transfer = app_state.transfer_service.get(&app_state.db_pool, id).await?;
    Ok((StatusCode::OK, Json(transfer)))
}

#[utoipa::path(
    get,
    path = "/api/transfers",
    tag = "Transfers",
    responses((status = 200, body = [TransferRequest])),
    security(("api_jwt" = []))
)]
pub async fn list_transfers(
    State(app_state): State<AppState>,
    AuthenticatedActor(_actor): AuthenticatedActor,
    Query(params): Query<ListTransfersParams>,
) -> Result<impl IntoResponse, AppError> {
    let transfers = app_state
        .transfer_service
        .list(&app_state.db_pool, params.status)
        .await?;
    Ok((StatusCode::OK, Json(transfers)))
}
