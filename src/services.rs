pub mod auth;
pub use auth::AuthService;
pub mod activity_service;
pub use activity_service::ActivityService;
pub mod borrow_service;
pub use borrow_service::BorrowService;
pub mod dashboard_service;
pub use dashboard_service::DashboardService;
pub mod inventory_service;
pub use inventory_service::InventoryService;
pub mod request_service;
pub use request_service::RequestService;
pub mod transfer_service;
pub use transfer_service::TransferService;
