use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// Nosso tipo de erro, com `thiserror` para melhor ergonomia.
// A taxonomia segue as falhas das máquinas de estado:
// tudo que é detectável antes da transação (validação, 404, 403) nunca
// chega a abrir uma; InsufficientStock/ItemNotInRoom abortam a transação
// inteira quando detectados no meio dela.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("{0} não encontrado(a)")]
    NotFound(&'static str),

    // Transição tentada a partir de um status que não a permite.
    #[error("Transição inválida: {0}")]
    InvalidState(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("Token inválido")]
    InvalidToken,

    #[error("Estoque insuficiente: disponível {available}, solicitado {requested}")]
    InsufficientStock { available: i32, requested: i32 },

    #[error("O item não pertence à sala de origem")]
    ItemNotInRoom,

    // Variante para erros de banco de dados (sqlx)
    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    // Variante genérica para qualquer outro erro inesperado
    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

impl AppError {
    /// Erro de validação semântica de um único campo (regras que o derive
    /// do validator não cobre, como "o destino precisa ser sala de estoque").
    pub fn invalid_field(field: &'static str, code: &'static str, message: &str) -> AppError {
        let mut err = validator::ValidationError::new(code);
        err.message = Some(message.to_string().into());
        let mut errors = validator::ValidationErrors::new();
        errors.add(field, err);
        AppError::ValidationError(errors)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            // Retorna todos os detalhes da validação, campo a campo.
            AppError::ValidationError(errors) => {
                let mut details = std::collections::HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                let body = Json(json!({
                    "error": "Um ou mais campos são inválidos.",
                    "details": details,
                }));
                return (StatusCode::BAD_REQUEST, body).into_response();
            }
            AppError::NotFound(entity) => {
                let body = Json(json!({ "error": format!("{} não encontrado(a).", entity) }));
                return (StatusCode::NOT_FOUND, body).into_response();
            }
            AppError::InvalidState(msg) => {
                let body = Json(json!({ "error": msg }));
                return (StatusCode::CONFLICT, body).into_response();
            }
            AppError::Forbidden(msg) => {
                let body = Json(json!({ "error": msg }));
                return (StatusCode::FORBIDDEN, body).into_response();
            }
            AppError::InsufficientStock { available, requested } => {
                let body = Json(json!({
                    "error": "Estoque insuficiente para completar a operação.",
                    "available": available,
                    "requested": requested,
                }));
                return (StatusCode::CONFLICT, body).into_response();
            }
            AppError::ItemNotInRoom => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "O item informado não pertence à sala de origem.",
            ),
            AppError::InvalidToken | AppError::JwtError(_) => (
                StatusCode::UNAUTHORIZED,
                "Token de autenticação inválido ou ausente.",
            ),

            // Todos os outros erros (DatabaseError, InternalServerError) viram 500.
            // O `tracing` loga a mensagem detalhada que `thiserror` nos deu.
            ref e => {
                tracing::error!("Erro Interno do Servidor: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Ocorreu um erro inesperado.")
            }
        };

        // Resposta padrão para erros simples que só têm uma mensagem.
        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}
