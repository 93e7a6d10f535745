//! Sistema de manejo de errores
//!
//! Este módulo define los tipos de errores del sistema y su conversión a
//! respuestas HTTP. Los errores de validación viajan siempre como una lista
//! completa de mensajes; nunca se corta en el primero.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

/// Errores principales de la aplicación
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Falla de un colaborador externo (correo, PDF, almacenamiento, push)
    #[error("Dependency error: {0}")]
    Dependency(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::Validation(errors) => {
                warn!(errors = ?errors, "Solicitud rechazada por validación");
                (StatusCode::BAD_REQUEST, json!({ "errors": errors }))
            }

            AppError::NotFound(msg) => {
                warn!("Recurso no encontrado: {}", msg);
                (StatusCode::NOT_FOUND, json!({ "message": msg }))
            }

            AppError::Conflict(msg) => {
                warn!("Conflicto: {}", msg);
                (StatusCode::BAD_REQUEST, json!({ "message": msg }))
            }

            AppError::BadRequest(msg) => {
                warn!("Solicitud incorrecta: {}", msg);
                (StatusCode::BAD_REQUEST, json!({ "message": msg }))
            }

            AppError::Database(e) => {
                error!("Error de base de datos: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "message": "Error interno del servidor" }),
                )
            }

            AppError::Dependency(msg) => {
                error!("Error de servicio externo: {}", msg);
                (
                    StatusCode::BAD_GATEWAY,
                    json!({ "message": "Un servicio externo no respondió correctamente" }),
                )
            }

            AppError::Internal(msg) => {
                error!("Error interno: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "message": "Error interno del servidor" }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Validation(super::validation::flatten_validation_errors(&errors))
    }
}

/// Resultado tipado para operaciones que pueden fallar
pub type AppResult<T> = Result<T, AppError>;

/// Función helper para crear errores de recurso no encontrado
pub fn not_found_error(resource: &str, id: i32) -> AppError {
    AppError::NotFound(format!("{} con id {} no existe o está eliminado", resource, id))
}
