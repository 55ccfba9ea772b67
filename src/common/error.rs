// src/common/error.rs

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// Taxonomia de erros da aplicação. Cada variante tem um status HTTP fixo.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Requisição inválida: {0}")]
    BadRequest(String),

    #[error("Não autenticado")]
    Unauthenticated,

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Acesso negado: {0}")]
    Forbidden(String),

    // Distinto de `Forbidden` para que o cliente saiba que falta o negócio,
    // e não que o negócio pedido é de outro tenant.
    #[error("Usuário sem negócio associado")]
    NoTenantAssigned,

    #[error("{0}")]
    NotFound(String),

    #[error("Conflito: {0}")]
    Conflict(String),

    #[error("E-mail já existe")]
    EmailAlreadyExists,

    #[error("Erro de banco de dados: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // `anyhow::Error` guarda o contexto de falhas inesperadas (locks, tasks, etc.)
    #[error("Erro interno do servidor: {0}")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

impl AppError {
    pub fn forbidden(message: impl Into<String>) -> Self {
        AppError::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        AppError::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        AppError::Conflict(message.into())
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        AppError::BadRequest(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthenticated | AppError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) | AppError::NoTenantAssigned => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) | AppError::EmailAlreadyExists => StatusCode::CONFLICT,
            AppError::DatabaseError(_)
            | AppError::InternalServerError(_)
            | AppError::BcryptError(_)
            | AppError::JwtError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error_message = match self {
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
                return (status, body).into_response();
            }
            AppError::BadRequest(message) => message,
            AppError::Unauthenticated => "Não autorizado - sessão inválida ou ausente.".to_string(),
            AppError::InvalidCredentials => "E-mail ou senha inválidos.".to_string(),
            AppError::Forbidden(message) => message,
            AppError::NoTenantAssigned => "Usuário sem negócio atribuído.".to_string(),
            AppError::NotFound(message) => message,
            AppError::Conflict(message) => message,
            AppError::EmailAlreadyExists => "Este e-mail já está em uso.".to_string(),

            // Todos os outros erros viram 500. O detalhe fica só no log.
            ref e => {
                tracing::error!("Erro Interno do Servidor: {}", e);
                "Ocorreu um erro inesperado.".to_string()
            }
        };

        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}

/// Traduz violações de unicidade do banco em `Conflict`; o resto segue como erro de banco.
pub(crate) fn map_unique_violation(e: sqlx::Error, message: &str) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            return AppError::conflict(message);
        }
    }
    e.into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forbidden_variants_share_the_same_status() {
        assert_eq!(AppError::NoTenantAssigned.status(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::forbidden("x").status(), StatusCode::FORBIDDEN);
        assert_ne!(
            AppError::NoTenantAssigned.to_string(),
            AppError::forbidden("Sem acesso a este negócio").to_string()
        );
    }

    #[test]
    fn internal_errors_hide_details() {
        let err = AppError::InternalServerError(anyhow::anyhow!("lock envenenado"));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn conflicts_map_to_409() {
        assert_eq!(AppError::conflict("dup").status(), StatusCode::CONFLICT);
        assert_eq!(AppError::EmailAlreadyExists.status(), StatusCode::CONFLICT);
    }
}
