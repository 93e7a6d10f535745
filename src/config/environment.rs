//! Configuración de variables de entorno
//!
//! Este módulo lee la configuración del proceso desde el entorno (cargado
//! previamente con `dotenvy`) y la valida una sola vez al arrancar.

use std::env;
use std::time::Duration;

use thiserror::Error;

/// Error al leer la configuración
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{var} has an invalid value: '{value}'")]
    Invalid { var: &'static str, value: String },
}

/// Configuración del entorno
#[derive(Debug, Clone)]
pub struct EnvironmentConfig {
    pub environment: String,
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub db_max_connections: u32,
    pub cors_origins: Vec<String>,
    /// Base de los enlaces que se incluyen en los correos
    pub frontend_url: String,
    pub mail_api_url: String,
    pub mail_api_key: Option<String>,
    pub mail_from: String,
    pub pdf_render_url: String,
    pub storage_upload_url: String,
    pub storage_public_url: String,
    /// Presupuesto de entrega por destinatario en el fan-out
    pub notification_timeout: Duration,
    pub log_json: bool,
}

impl EnvironmentConfig {
    /// Construir la configuración desde las variables de entorno
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            environment: optional("ENVIRONMENT").unwrap_or_else(|| "development".to_string()),
            host: optional("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parsed("PORT", 3000)?,
            database_url: required("DATABASE_URL")?,
            db_max_connections: parsed("DB_MAX_CONNECTIONS", 20)?,
            cors_origins: optional("CORS_ORIGINS")
                .map(|origins| {
                    origins
                        .split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
            frontend_url: required("FRONTEND_URL")?.trim_end_matches('/').to_string(),
            mail_api_url: required("MAIL_API_URL")?,
            mail_api_key: optional("MAIL_API_KEY"),
            mail_from: required("MAIL_FROM")?,
            pdf_render_url: required("PDF_RENDER_URL")?,
            storage_upload_url: required("STORAGE_UPLOAD_URL")?.trim_end_matches('/').to_string(),
            storage_public_url: required("STORAGE_PUBLIC_URL")?.trim_end_matches('/').to_string(),
            notification_timeout: Duration::from_secs(parsed("NOTIFICATION_TIMEOUT_SECS", 15)?),
            log_json: parsed("LOG_JSON", false)?,
        })
    }

    /// Obtener la dirección del servidor
    pub fn server_url(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn optional(var: &'static str) -> Option<String> {
    env::var(var).ok().filter(|value| !value.trim().is_empty())
}

fn required(var: &'static str) -> Result<String, ConfigError> {
    optional(var).ok_or(ConfigError::Missing(var))
}

fn parsed<T: std::str::FromStr>(var: &'static str, default: T) -> Result<T, ConfigError> {
    match optional(var) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { var, value }),
        None => Ok(default),
    }
}
