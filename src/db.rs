pub mod account_repo;
pub use account_repo::AccountRepository;
pub mod activity_repo;
pub use activity_repo::ActivityRepository;
pub mod borrow_repo;
pub use borrow_repo::BorrowRepository;
pub mod dashboard_repo;
pub use dashboard_repo::DashboardRepository;
pub mod inventory_repo;
pub use inventory_repo::InventoryRepository;
pub mod request_repo;
pub use request_repo::RequestRepository;
pub mod room_repo;
pub use room_repo::RoomRepository;
pub mod transfer_repo;
pub use transfer_repo::TransferRepository;
