// src/models/auth.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::common::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "account_role", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Role {
    SuperAdmin,
    Admin,
    Personnel,
}

// Representa uma conta vinda do banco de dados. A emissão de sessões é
// responsabilidade do serviço de auth externo; aqui só consumimos.
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Identidade normalizada produzida uma única vez pelo middleware de auth
/// e passada por valor para cada transição. Os services só comparam papel
/// e posse; nunca tocam em credenciais.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub id: Uuid,
    pub role: Role,
}

impl Actor {
    pub fn is_super_admin(&self) -> bool {
        self.role == Role::SuperAdmin
    }

    pub fn is_admin(&self) -> bool {
        matches!(self.role, Role::SuperAdmin | Role::Admin)
    }

    pub fn ensure_admin(&self, action: &str) -> Result<(), AppError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::Forbidden(format!(
                "Apenas a administração pode {}.",
                action
            )))
        }
    }
}

impl From<&Account> for Actor {
    fn from(account: &Account) -> Self {
        Actor {
            id: account.id,
            role: account.role,
        }
    }
}

// Estrutura de dados ("claims") dentro do JWT
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,  // Subject (ID da conta)
    pub exp: usize, // Expiration time (quando o token expira)
    pub iat: usize, // Issued At (quando o token foi criado)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn actor(role: Role) -> Actor {
        Actor {
            id: Uuid::new_v4(),
            role,
        }
    }

    #[test]
    fn super_admin_tambem_e_admin() {
        assert!(actor(Role::SuperAdmin).is_admin());
        assert!(actor(Role::Admin).is_admin());
        assert!(!actor(Role::Personnel).is_admin());
    }

    #[test]
    fn ensure_admin_barra_personnel() {
        let err = actor(Role::Personnel).ensure_admin("aprovar").unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
        assert!(actor(Role::Admin).ensure_admin("aprovar").is_ok());
    }
}
