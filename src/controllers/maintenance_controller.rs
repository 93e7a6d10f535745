use crate::dto::maintenance_dto::{
    CreateMaintenanceForm, PeriodicBatchFailure, PeriodicBatchRequest, PeriodicBatchResponse,
    SetStatusRequest, ToggleApprovalRequest, UpdateMaintenanceRequest,
};
use crate::dto::ApiResponse;
use crate::models::maintenance::MaintenanceRecord;
use crate::services::{AppServices, BatchOutcome};
use crate::utils::errors::AppError;
use validator::Validate;

/// Resultado del lote tal como se responde al cliente
pub enum BatchReply {
    Created(ApiResponse<PeriodicBatchResponse>),
    Failed(PeriodicBatchFailure),
}

pub struct MaintenanceController {
    services: AppServices,
}

fn validate_body<T: Validate>(body: &T) -> Result<(), AppError> {
    Ok(body.validate()?)
}

impl MaintenanceController {
    pub fn new(services: AppServices) -> Self {
        Self { services }
    }

    pub async fn create(
        &self,
        form: CreateMaintenanceForm,
    ) -> Result<ApiResponse<MaintenanceRecord>, AppError> {
        let record = self.services.maintenance.create(form).await?;
        Ok(ApiResponse::success_with_message(
            record,
            "Mantención creada exitosamente".to_string(),
        ))
    }

    pub async fn get(&self, id: i32) -> Result<ApiResponse<MaintenanceRecord>, AppError> {
        let record = self.services.maintenance.get(id).await?;
        Ok(ApiResponse::success(record))
    }

    pub async fn update(
        &self,
        id: i32,
        request: UpdateMaintenanceRequest,
    ) -> Result<ApiResponse<MaintenanceRecord>, AppError> {
        let record = self.services.maintenance.update(id, request).await?;
        Ok(ApiResponse::success_with_message(
            record,
            "Mantención actualizada exitosamente".to_string(),
        ))
    }

    pub async fn delete(&self, id: i32) -> Result<ApiResponse<()>, AppError> {
        self.services.maintenance.delete(id).await?;
        Ok(ApiResponse::message("Mantención eliminada exitosamente".to_string()))
    }

    pub async fn create_batch(&self, request: PeriodicBatchRequest) -> Result<BatchReply, AppError> {
        let solicitadas = request.fechas.len();
        let reply = match self.services.batches.create_batch(request).await? {
            BatchOutcome::Completed { created } => BatchReply::Created(
                ApiResponse::success_with_message(
                    PeriodicBatchResponse {
                        creadas: created.len(),
                        solicitadas,
                        mantenciones: created,
                    },
                    "Mantenciones periódicas creadas exitosamente".to_string(),
                ),
            ),
            BatchOutcome::Aborted {
                created,
                solicitadas,
                error,
                compensation,
            } => BatchReply::Failed(PeriodicBatchFailure {
                message: error,
                creadas: created.len(),
                solicitadas,
                compensacion: compensation,
            }),
        };
        Ok(reply)
    }

    pub async fn toggle_approval(
        &self,
        id: i32,
        request: ToggleApprovalRequest,
    ) -> Result<ApiResponse<MaintenanceRecord>, AppError> {
        validate_body(&request)?;
        let record = self.services.approvals.toggle(id, request.usuario_id).await?;
        let message = if record.aprobada {
            "Mantención aprobada"
        } else {
            "Aprobación de mantención revocada"
        };
        Ok(ApiResponse::success_with_message(record, message.to_string()))
    }

    pub async fn set_status(
        &self,
        id: i32,
        request: SetStatusRequest,
    ) -> Result<ApiResponse<MaintenanceRecord>, AppError> {
        validate_body(&request)?;
        let record = self
            .services
            .status
            .set_status(id, request.estado_mantencion_id)
            .await?;
        Ok(ApiResponse::success_with_message(
            record,
            "Estado de mantención actualizado".to_string(),
        ))
    }

    pub async fn set_en_proceso(&self, id: i32) -> Result<ApiResponse<MaintenanceRecord>, AppError> {
        let record = self.services.status.set_en_proceso(id).await?;
        Ok(ApiResponse::success_with_message(
            record,
            "Mantención en proceso".to_string(),
        ))
    }
}
