use async_trait::async_trait;
use tracing::info;
use uuid::Uuid;

use super::{ensure_success, http_client, ClientError};

/// Archivo recibido en un formulario multipart
#[derive(Debug, Clone, PartialEq)]
pub struct UploadedFile {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Sube el archivo y devuelve su URL pública
    async fn upload(&self, file: &UploadedFile) -> Result<String, ClientError>;

    /// Elimina un objeto subido antes, a partir de su URL pública
    async fn remove(&self, url: &str) -> Result<(), ClientError>;
}

pub struct HttpObjectStorage {
    client: reqwest::Client,
    upload_url: String,
    public_url: String,
}

impl HttpObjectStorage {
    pub fn new(upload_url: String, public_url: String) -> Result<Self, ClientError> {
        Ok(Self {
            client: http_client()?,
            upload_url,
            public_url,
        })
    }
}

/// Clave única del objeto; conserva sólo caracteres seguros del nombre original
pub fn object_key(filename: &str) -> String {
    let safe: String = filename
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("mantenciones/{}-{}", Uuid::new_v4(), safe)
}

#[async_trait]
impl ObjectStorage for HttpObjectStorage {
    async fn upload(&self, file: &UploadedFile) -> Result<String, ClientError> {
        let key = object_key(&file.filename);

        let response = self
            .client
            .put(format!("{}/{}", self.upload_url, key))
            .header(reqwest::header::CONTENT_TYPE, &file.content_type)
            .body(file.bytes.clone())
            .send()
            .await?;
        ensure_success("storage", response).await?;

        info!(key = %key, size = file.bytes.len(), "📦 Archivo subido");
        Ok(format!("{}/{}", self.public_url, key))
    }

    async fn remove(&self, url: &str) -> Result<(), ClientError> {
        let key = object_key_from_url(&self.public_url, url)
            .ok_or_else(|| ClientError::ForeignUrl(url.to_string()))?;

        let response = self
            .client
            .delete(format!("{}/{}", self.upload_url, key))
            .send()
            .await?;
        ensure_success("storage", response).await?;

        info!(key = %key, "🗑️ Archivo eliminado");
        Ok(())
    }
}

/// Clave del objeto dentro de una URL pública del almacenamiento
pub fn object_key_from_url<'a>(public_url: &str, url: &'a str) -> Option<&'a str> {
    url.strip_prefix(public_url)?
        .strip_prefix('/')
        .filter(|key| !key.is_empty())
}
