// src/config.rs

use sqlx::{postgres::PgPoolOptions, PgPool};
use std::{env, time::Duration};

use crate::{
    db::{
        AccountRepository, ActivityRepository, BorrowRepository, DashboardRepository,
        InventoryRepository, RequestRepository, RoomRepository, TransferRepository,
    },
    services::{
        ActivityService, AuthService, BorrowService, DashboardService, InventoryService,
        RequestService, TransferService,
    },
};

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub auth_service: AuthService,
    pub inventory_service: InventoryService,
    pub borrow_service: BorrowService,
    pub transfer_service: TransferService,
    pub request_service: RequestService,
    pub dashboard_service: DashboardService,
}

impl AppState {
    pub async fn new() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL").expect("DATABASE_URL deve ser definida");
        let jwt_secret = env::var("JWT_SECRET").expect("JWT_SECRET deve ser definido");

        // Conecta ao banco de dados, usando '?' para propagar erros
        let db_pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&database_url)
            .await?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        // --- Monta o gráfico de dependências ---
        // Injeção explícita por construtor: cada service recebe os
        // repositórios e colaboradores de que precisa; nada de registro
        // global de handlers.
        let account_repo = AccountRepository::new(db_pool.clone());
        let room_repo = RoomRepository::new(db_pool.clone());
        let inventory_repo = InventoryRepository::new(db_pool.clone());
        let borrow_repo = BorrowRepository::new(db_pool.clone());
        let transfer_repo = TransferRepository::new(db_pool.clone());
        let request_repo = RequestRepository::new(db_pool.clone());
        let activity_repo = ActivityRepository::new(db_pool.clone());
        let dashboard_repo = DashboardRepository::new(db_pool.clone());

        let activity_service = ActivityService::new(activity_repo);
        let auth_service = AuthService::new(account_repo, jwt_secret);
        let inventory_service =
            InventoryService::new(inventory_repo, room_repo.clone(), activity_service.clone());
        let borrow_service = BorrowService::new(
            borrow_repo,
            room_repo.clone(),
            inventory_service.clone(),
            activity_service.clone(),
        );
        let transfer_service = TransferService::new(
            transfer_repo,
            room_repo.clone(),
            inventory_service.clone(),
            activity_service.clone(),
        );
        let request_service = RequestService::new(
            request_repo,
            room_repo,
            inventory_service.clone(),
            activity_service,
        );
        let dashboard_service = DashboardService::new(dashboard_repo);

        Ok(Self {
            db_pool,
            auth_service,
            inventory_service,
            borrow_service,
            transfer_service,
            request_service,
            dashboard_service,
        })
    }
}
