//! Aprobación de mantenciones
//!
//! Alterna la bandera `aprobada`. Al aprobar se registran la fecha y la
//! persona del usuario que actúa; al desaprobar se limpian ambas.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use crate::models::catalog::EntityKind;
use crate::models::maintenance::{Approval, MaintenanceRecord};
use crate::repositories::{CatalogRepository, MaintenanceRepository};
use crate::utils::errors::{not_found_error, AppError, AppResult};

pub struct ApprovalService {
    maintenance: Arc<dyn MaintenanceRepository>,
    catalog: Arc<dyn CatalogRepository>,
}

impl ApprovalService {
    pub fn new(
        maintenance: Arc<dyn MaintenanceRepository>,
        catalog: Arc<dyn CatalogRepository>,
    ) -> Self {
        Self {
            maintenance,
            catalog,
        }
    }

    pub async fn toggle(&self, id: i32, usuario_id: i32) -> AppResult<MaintenanceRecord> {
        let current = self
            .maintenance
            .find_active(id)
            .await?
            .ok_or_else(|| not_found_error(EntityKind::Mantencion.label(), id))?;

        let persona_id = self
            .catalog
            .person_for_user(usuario_id)
            .await?
            .ok_or_else(|| {
                AppError::Validation(vec![format!(
                    "Usuario con id {} no existe o no tiene persona asociada",
                    usuario_id
                )])
            })?;

        let approval = if current.aprobada {
            Approval::revoked()
        } else {
            Approval::granted(persona_id, Utc::now())
        };

        let record = self
            .maintenance
            .set_approval(id, approval)
            .await?
            .ok_or_else(|| not_found_error(EntityKind::Mantencion.label(), id))?;

        info!(
            mantencion_id = id,
            usuario_id,
            aprobada = record.aprobada,
            "🔁 Aprobación de mantención actualizada"
        );
        Ok(record)
    }
}
