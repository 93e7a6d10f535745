//! Estados de mantención
//!
//! Cualquier estado vigente puede asignarse desde cualquier otro; no hay
//! tabla de transiciones.

use std::sync::Arc;

use tracing::info;

use super::existence_validator::ExistenceValidator;
use super::workflow_catalog::WorkflowCatalog;
use crate::models::catalog::EntityKind;
use crate::models::maintenance::MaintenanceRecord;
use crate::repositories::MaintenanceRepository;
use crate::utils::errors::{not_found_error, AppResult};
use crate::utils::validation::ErrorCollector;

pub struct StatusService {
    validator: Arc<ExistenceValidator>,
    maintenance: Arc<dyn MaintenanceRepository>,
    workflow: WorkflowCatalog,
}

impl StatusService {
    pub fn new(
        validator: Arc<ExistenceValidator>,
        maintenance: Arc<dyn MaintenanceRepository>,
        workflow: WorkflowCatalog,
    ) -> Self {
        Self {
            validator,
            maintenance,
            workflow,
        }
    }

    pub async fn set_status(&self, id: i32, estado_mantencion_id: i32) -> AppResult<MaintenanceRecord> {
        let mut errors = ErrorCollector::new();
        self.validator
            .require(EntityKind::EstadoMantencion, estado_mantencion_id, &mut errors)
            .await?;
        errors.finish()?;

        let record = self
            .maintenance
            .set_state(id, estado_mantencion_id)
            .await?
            .ok_or_else(|| not_found_error(EntityKind::Mantencion.label(), id))?;

        info!(mantencion_id = id, estado_mantencion_id, "🔄 Estado de mantención actualizado");
        Ok(record)
    }

    /// Atajo para pasar la mantención a "En Proceso"
    pub async fn set_en_proceso(&self, id: i32) -> AppResult<MaintenanceRecord> {
        self.set_status(id, self.workflow.estado_en_proceso).await
    }
}
