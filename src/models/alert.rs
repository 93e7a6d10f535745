//! Modelos de alertas
//!
//! Una `Alert` se inserta una vez y se asocia a cada destinatario con una fila
//! de `usuario_alerta`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Tipo de alerta almacenado en la columna `tipo`
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AlertType {
    Mantencion,
    Combustible,
    General,
}

impl AlertType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertType::Mantencion => "mantencion",
            AlertType::Combustible => "combustible",
            AlertType::General => "general",
        }
    }
}

#[derive(Debug, Clone, Serialize, FromRow, PartialEq)]
pub struct Alert {
    pub id: i32,
    pub contenido: String,
    pub tipo: String,
    pub created_at: DateTime<Utc>,
    pub leida: bool,
}

/// Alerta tal como la ve un usuario
#[derive(Debug, Clone, Serialize, FromRow, PartialEq)]
pub struct UserAlertView {
    pub usuario_alerta_id: i32,
    pub alerta_id: i32,
    pub contenido: String,
    pub tipo: String,
    pub created_at: DateTime<Utc>,
    pub leida: bool,
}

/// Destinatario resuelto por la consulta de audiencia (no se persiste)
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct NotificationRecipient {
    pub usuario_id: Option<i32>,
    pub email: Option<String>,
    pub rol: String,
    pub empresa_id: Option<i32>,
}

/// Filtros de audiencia; todos opcionales y combinados con AND
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AudienceFilter {
    pub rol: Option<String>,
    pub empresa_id: Option<i32>,
    pub solo_privilegiados: bool,
}

impl AudienceFilter {
    /// Roles privilegiados de una empresa
    pub fn privileged_in_company(empresa_id: i32) -> Self {
        Self {
            rol: None,
            empresa_id: Some(empresa_id),
            solo_privilegiados: true,
        }
    }
}

/// Evento enviado por websocket a las sesiones del usuario
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PushPayload {
    pub event: String,
    pub alerta_id: i32,
    pub contenido: String,
    pub tipo: String,
    pub created_at: DateTime<Utc>,
}

impl PushPayload {
    pub fn from_alert(alert: &Alert) -> Self {
        Self {
            event: "nueva_alerta".to_string(),
            alerta_id: alert.id,
            contenido: alert.contenido.clone(),
            tipo: alert.tipo.clone(),
            created_at: alert.created_at,
        }
    }
}
