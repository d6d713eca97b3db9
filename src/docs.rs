// src/docs.rs

use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::OpenApi;

use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Borrows ---
        handlers::borrow::create_borrow,
        handlers::borrow::approve_borrow,
        handlers::borrow::decline_borrow,
        handlers::borrow::cancel_borrow,
        handlers::borrow::acquire_borrow,
        handlers::borrow::return_borrow,
        handlers::borrow::accept_borrow_return,
        handlers::borrow::get_borrow,
        handlers::borrow::list_borrows,

        // --- Transfers ---
        handlers::transfer::create_transfer,
        handlers::transfer::accept_transfer,
        handlers::transfer::get_transfer,
        handlers::transfer::list_transfers,

        // --- Item Requests ---
        handlers::request::create_item_request,
        handlers::request::accept_item_request,
        handlers::request::decline_item_request,
        handlers::request::release_item_request,
        handlers::request::fulfill_item_request,
        handlers::request::get_item_request,
        handlers::request::list_item_requests,

        // --- Stock Requests ---
        handlers::request::create_stock_request,
        handlers::request::approve_stock_request,
        handlers::request::disapprove_stock_request,
        handlers::request::fulfill_stock_request,
        handlers::request::get_stock_request,
        handlers::request::list_stock_requests,

        // --- Inventory ---
        handlers::inventory::receive_stock,

        // --- Dashboard ---
        handlers::dashboard::get_summary,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::Role,
            models::auth::Account,

            // --- Rooms ---
            models::room::RoomType,
            models::room::StockroomType,
            models::room::Room,

            // --- Inventory ---
            models::inventory::ItemKind,
            models::inventory::ApparelInventory,
            models::inventory::SupplyInventory,
            models::inventory::GenItemInventory,
            models::inventory::ResolvedItem,
            models::inventory::ReceiptBatch,
            models::inventory::UnitStatus,
            models::inventory::BatchUnit,

            // --- Borrows ---
            models::borrow::BorrowStatus,
            models::borrow::BorrowRequest,

            // --- Transfers ---
            models::transfer::TransferStatus,
            models::transfer::TransferRequest,

            // --- Requests ---
            models::request::ItemRequestStatus,
            models::request::ItemRequest,
            models::request::ItemRequestDetail,
            models::request::ItemRequestWithDetails,
            models::request::DetailDecision,
            models::request::StockRequestStatus,
            models::request::StockRequest,

            // --- Dashboard ---
            models::dashboard::DashboardSummary,

            // --- Payloads ---
            handlers::borrow::CreateBorrowPayload,
            handlers::borrow::DeclineBorrowPayload,
            handlers::borrow::ReturnBorrowPayload,
            handlers::transfer::CreateTransferPayload,
            handlers::request::RequestLinePayload,
            handlers::request::CreateItemRequestPayload,
            handlers::request::AcceptItemRequestPayload,
            handlers::request::CreateStockRequestPayload,
            handlers::request::ApproveStockRequestPayload,
            handlers::inventory::ReceiveStockPayload,
            handlers::inventory::ReceiveStockResponse,
        )
    ),
    tags(
        (name = "Borrows", description = "Empréstimos temporários com devolução"),
        (name = "Transfers", description = "Transferências de estoque entre salas"),
        (name = "Item Requests", description = "Pedidos de item entre salas"),
        (name = "Stock Requests", description = "Pedidos de estoque à administração"),
        (name = "Inventory", description = "Entradas de estoque e lotes"),
        (name = "Dashboard", description = "Contadores operacionais")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        );
    }
}
