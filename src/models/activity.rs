// src/models/activity.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// Retenção: no máximo 100 entradas por conta; as mais antigas são podadas
/// depois de cada inserção.
pub const ACTIVITY_LOG_RETENTION: i64 = 100;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ActivityLogEntry {
    pub id: Uuid,
    pub account_id: Uuid,
    pub action: String,
    pub detail: String,
    pub created_at: DateTime<Utc>,
}
