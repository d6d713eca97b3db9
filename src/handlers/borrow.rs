// src/handlers/borrow.rs

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
    models::borrow::{BorrowRequest, BorrowStatus},
};

// ---
// Payload: CreateBorrow
// ---
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateBorrowPayload {
    pub room_id: Uuid,
    pub item_id: Option<Uuid>,
    pub item_type: Option<String>,

    #[validate(range(min = 1, message = "A quantidade precisa ser maior que zero."))]
    pub quantity: i32,

    pub note: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct DeclineBorrowPayload {
    #[validate(length(min = 1, message = "Informe o motivo da recusa."))]
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ReturnBorrowPayload {
    pub note: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListBorrowsParams {
    pub status: Option<BorrowStatus>,
}

// ---
// Handler: create_borrow
// ---
#[utoipa::path(
    post,
    path = "/api/borrows",
    tag = "Borrows",
    request_body = CreateBorrowPayload,
    responses(
        (status = 201, description = "Empréstimo criado, aguardando aprovação", body = BorrowRequest),
        (status = 400, description = "Payload inválido")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_borrow(
    State(app_state): State<AppState>,
    AuthenticatedActor(actor): AuthenticatedActor,
    Json(payload): Json<CreateBorrowPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let borrow = app_state
        .borrow_service
        .create(
            &app_state.db_pool,
            actor,
            payload.room_id,
            payload.item_id,
            payload.item_type.as_deref(),
            payload.quantity,
            payload.note.as_deref(),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(borrow)))
}

// ---
// Handler: approve_borrow
// ---
#[utoipa::path(
    post,
    path = "/api/borrows/{id}/approve",
    tag = "Borrows",
    params(("id" = Uuid, Path, description = "ID do empréstimo")),
    responses(
        (status = 200, description = "Empréstimo aprovado", body = BorrowRequest),
        (status = 403, description = "Ator não pode revisar"),
        (status = 409, description = "Status atual não permite aprovação")
    ),
    security(("api_jwt" = []))
)]
pub async fn approve_borrow(
    State(app_state): State<AppState>,
    AuthenticatedActor(actor): AuthenticatedActor,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let borrow = app_state
        .borrow_service
        .approve(&app_state.db_pool, actor, id)
        .await?;
    Ok((StatusCode::OK, Json(borrow)))
}

// ---
// Handler: decline_borrow
// ---
#[utoipa::path(
    post,
    path = "/api/borrows/{id}/decline",
    tag = "Borrows",
    params(("id" = Uuid, Path, description = "ID do empréstimo")),
    request_body = DeclineBorrowPayload,
    responses((status = 200, description = "Empréstimo recusado", body = BorrowRequest)),
    security(("api_jwt" = []))
)]
pub async fn decline_borrow(
    State(app_state): State<AppState>,
    AuthenticatedActor(actor): AuthenticatedActor,
    Path(id): Path<Uuid>,
    Json(payload): Json<DeclineBorrowPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let borrow = app_state
        .borrow_service
        .decline(&app_state.db_pool, actor, id, payload.reason.as_deref())
        .await?;
    Ok((StatusCode::OK, Json(borrow)))
}

// ---
// Handler: cancel_borrow (somente o requerente)
// ---
#[utoipa::path(
    post,
    path = "/api/borrows/{id}/cancel",
    tag = "Borrows",
    params(("id" = Uuid, Path, description = "ID do empréstimo")),
    responses((status = 200, description = "Empréstimo cancelado", body = BorrowRequest)),
    security(("api_jwt" = []))
)]
pub async fn cancel_borrow(
    State(app_state): State<AppState>,
    AuthenticatedActor(actor): AuthenticatedActor,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let borrow = app_state
        .borrow_service
        .cancel(&app_state.db_pool, actor, id)
        .await?;
    Ok((StatusCode::OK, Json(borrow)))
}

// ---
// Handler: acquire_borrow (debita o estoque)
// ---
#[utoipa::path(
    post,
    path = "/api/borrows/{id}/acquire",
    tag = "Borrows",
    params(("id" = Uuid, Path, description = "ID do empréstimo")),
    responses(
        (status = 200, description = "Item retirado; estoque debitado", body = BorrowRequest),
        (status = 409, description = "Estoque insuficiente ou status inválido")
    ),
    security(("api_jwt" = []))
)]
pub async fn acquire_borrow(
    State(app_state): State<AppState>,
    AuthenticatedActor(actor): AuthenticatedActor,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let borrow = app_state
        .borrow_service
        .acquire(&app_state.db_pool, actor, id)
        .await?;
    Ok((StatusCode::OK, Json(borrow)))
}

// ---
// Handler: return_borrow
// ---
#[utoipa::path(
    post,
    path = "/api/borrows/{id}/return",
    tag = "Borrows",
    params(("id" = Uuid, Path, description = "ID do empréstimo")),
    request_body = ReturnBorrowPayload,
    responses((status = 200, description = "Devolução iniciada", body = BorrowRequest)),
    security(("api_jwt" = []))
)]
pub async fn return_borrow(
    State(app_state): State<AppState>,
    AuthenticatedActor(actor): AuthenticatedActor,
    Path(id): Path<Uuid>,
    Json(payload): Json<ReturnBorrowPayload>,
) -> Result<impl IntoResponse, AppError> {
    let borrow = app_state
        .borrow_service
        .start_return(&app_state.db_pool, actor, id, payload.note.as_deref())
        .await?;
    Ok((StatusCode::OK, Json(borrow)))
}

// ---
// Handler: accept_borrow_return (credita o estoque de volta)
// ---
#[utoipa::path(
    post,
    path = "/api/borrows/{id}/accept-return",
    tag = "Borrows",
    params(("id" = Uuid, Path, description = "ID do empréstimo")),
    responses((status = 200, description = "Devolução aceita; estoque creditado", body = BorrowRequest)),
    security(("api_jwt" = []))
)]
pub async fn accept_borrow_return(
    State(app_state): State<AppState>,
    AuthenticatedActor(actor): AuthenticatedActor,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let borrow = app_state
        .borrow_service
        .accept_return(&app_state.db_pool, actor, id)
        .await?;
    Ok((StatusCode::OK, Json(borrow)))
}

// ---
// Handler: get_borrow / list_borrows
// ---
#[utoipa::path(
    get,
    path = "/api/borrows/{id}",
    tag = "Borrows",
    params(("id" = Uuid, Path, description = "ID do empréstimo")),
    responses((status = 200, body = BorrowRequest), (status = 404, description = "Não encontrado")),
    security(("api_jwt" = []))
)]
pub async fn get_borrow(
    State(app_state): State<AppState>,
    AuthenticatedActor(_actor): AuthenticatedActor,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let borrow = app_state.borrow_service.get(&app_state.db_pool, id).await?;
    Ok((StatusCode::OK, Json(borrow)))
}

#[utoipa::path(
    get,
    path = "/api/borrows",
    tag = "Borrows",
    responses((status = 200, body = [BorrowRequest])),
    security(("api_jwt" = []))
)]
pub async fn list_borrows(
    State(app_state): State<AppState>,
    AuthenticatedActor(_actor): AuthenticatedActor,
    Query(params): Query<ListBorrowsParams>,
) -> Result<impl IntoResponse, AppError> {
    let borrows = app_state
        .borrow_service
        .list(&app_state.db_pool, params.status)
        .await?;
    Ok((StatusCode::OK, Json(borrows)))
}
