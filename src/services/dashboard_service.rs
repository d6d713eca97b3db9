// src/services/dashboard_service.rs

use crate::{
    common::error::AppError, db::DashboardRepository, models::dashboard::DashboardSummary,
};

#[derive(Clone)]
pub struct DashboardService {
    repo: DashboardRepository,
}

impl DashboardService {
    pub fn new(repo: DashboardRepository) -> Self {
        Self { repo }
    }

    pub async fn get_summary(&self) -> Result<DashboardSummary, AppError> {
        self.repo.get_summary().await
    }
}
