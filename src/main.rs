//src/main.rs

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use almoxarifado_backend::{config::AppState, docs, handlers, middleware::auth::auth_guard};

#[tokio::main]
async fn main() {
    // Inicializa o logger
    tracing_subscriber::fmt().with_target(false).compact().init();

    let app_state = AppState::new()
        .await
        .expect("Falha ao inicializar o estado da aplicação.");

    // Roda as migrações do SQLx na inicialização
    sqlx::migrate!()
        .run(&app_state.db_pool)
        .await
        .expect("Falha ao rodar as migrações do banco de dados.");

    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    // Uma rota por transição de cada workflow; tudo atrás do auth_guard.
    let borrow_routes = Router::new()
        .route("/"
               ,post(handlers::borrow::create_borrow)
               .get(handlers::borrow::list_borrows)
        )
        .route("/{id}", get(handlers::borrow::get_borrow))
        .route("/{id}/approve", post(handlers::borrow::approve_borrow))
        .route("/{id}/decline", post(handlers::borrow::decline_borrow))
        .route("/{id}/cancel", post(handlers::borrow::cancel_borrow))
        .route("/{id}/acquire", post(handlers::borrow::acquire_borrow))
        .route("/{id}/return", post(handlers::borrow::return_borrow))
        .route("/{id}/accept-return", post(handlers::borrow::accept_borrow_return))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    let transfer_routes = Router::new()
        .route("/"
               ,post(handlers::transfer::create_transfer)
               .get(handlers::transfer::list_transfers)
        )
        .route("/{id}", get(handlers::transfer::get_transfer))
        .route("/{id}/accept", post(handlers::transfer::accept_transfer))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    let item_request_routes = Router::new()
        .route("/"
               ,post(handlers::request::create_item_request)
               .get(handlers::request::list_item_requests)
        )
        .route("/{id}", get(handlers::request::get_item_request))
        .route("/{id}/accept", post(handlers::request::accept_item_request))
        .route("/{id}/decline", post(handlers::request::decline_item_request))
        .route("/{id}/release", post(handlers::request::release_item_request))
        .route("/{id}/fulfill", post(handlers::request::fulfill_item_request))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    let stock_request_routes = Router::new()
        .route("/"
               ,post(handlers::request::create_stock_request)
               .get(handlers::request::list_stock_requests)
        )
        .route("/{id}", get(handlers::request::get_stock_request))
        .route("/{id}/approve", post(handlers::request::approve_stock_request))
        .route("/{id}/disapprove", post(handlers::request::disapprove_stock_request))
        .route("/{id}/fulfill", post(handlers::request::fulfill_stock_request))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    let inventory_routes = Router::new()
        .route("/receipts", post(handlers::inventory::receive_stock))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    let dashboard_routes = Router::new()
        .route("/summary", get(handlers::dashboard::get_summary))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    // Combina tudo no router principal
    let app = Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .nest("/api/borrows", borrow_routes)
        .nest("/api/transfers", transfer_routes)
        .nest("/api/item-requests", item_request_routes)
        .nest("/api/stock-requests", stock_request_routes)
        .nest("/api/inventory", inventory_routes)
        .nest("/api/dashboard", dashboard_routes)
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", docs::ApiDoc::openapi()))
        .with_state(app_state);

    // Inicia o servidor
    let addr = "0.0.0.0:3000";
    let listener = TcpListener::bind(addr)
        .await
        .expect("Falha ao iniciar o listener TCP");
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr().unwrap());
    axum::serve(listener, app)
        .await
        .expect("Erro no servidor Axum");
}
