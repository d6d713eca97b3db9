// src/services/auth.rs

use jsonwebtoken::{decode, DecodingKey, Validation};

use crate::{
    common::error::AppError,
    db::AccountRepository,
    models::auth::{Actor, Claims},
};

// A emissão de tokens é do serviço de auth externo. Aqui só validamos a
// assinatura e normalizamos a conta para o Actor {id, role} que os
// services consomem.
#[derive(Clone)]
pub struct AuthService {
    account_repo: AccountRepository,
    jwt_secret: String,
}

impl AuthService {
    pub fn new(account_repo: AccountRepository, jwt_secret: String) -> Self {
        Self {
            account_repo,
            jwt_secret,
        }
    }

    pub async fn validate_token(&self, token: &str) -> Result<Actor, AppError> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_bytes()),
            &Validation::default(),
        )?;

        let account = self
            .account_repo
            .get_account_by_id(token_data.claims.sub)
            .await?
            .ok_or(AppError::InvalidToken)?;

        Ok(Actor::from(&account))
    }
}
