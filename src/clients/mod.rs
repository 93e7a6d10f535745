//! Clients - HTTP Clients for External Services
//!
//! Colaboradores externos del flujo de mantenciones: envío de correo,
//! renderizado de PDF y almacenamiento de archivos. Cada uno se expone como
//! trait para poder sustituirlo en pruebas.

pub mod mailer;
pub mod object_storage;
pub mod pdf_renderer;

use thiserror::Error;

use crate::utils::errors::AppError;

pub use mailer::{Attachment, EmailMessage, HttpMailer, Mailer};
pub use object_storage::{HttpObjectStorage, ObjectStorage, UploadedFile};
pub use pdf_renderer::{render_table_html, HttpPdfRenderer, PdfRenderer, PdfRow};

/// Errores de los clientes HTTP
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{service} respondió {status}: {body}")]
    Status {
        service: &'static str,
        status: u16,
        body: String,
    },

    #[error("{0} no pertenece al almacenamiento")]
    ForeignUrl(String),
}

impl From<ClientError> for AppError {
    fn from(error: ClientError) -> Self {
        AppError::Dependency(error.to_string())
    }
}

/// Convierte una respuesta no exitosa en `ClientError::Status`
pub(crate) async fn ensure_success(
    service: &'static str,
    response: reqwest::Response,
) -> Result<reqwest::Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ClientError::Status {
        service,
        status: status.as_u16(),
        body,
    })
}

pub(crate) fn http_client() -> Result<reqwest::Client, ClientError> {
    Ok(reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(30))
        .build()?)
}
