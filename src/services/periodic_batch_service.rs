//! Lote de mantenciones periódicas
//!
//! Crea un par bitácora/mantención por fecha solicitada, en estado
//! "Programada" y tipo "Preventiva". Todo el lote corre en una sola
//! transacción: si una fecha falla, se descarta completa y el llamador recibe
//! cuántos pares se alcanzaron a crear. Si falla la confirmación final, los
//! pares se eliminan lógicamente en orden inverso.

use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{error, info, warn};
use validator::Validate;

use super::existence_validator::ExistenceValidator;
use super::notification_service::{EmailContent, NotificationService};
use super::workflow_catalog::WorkflowCatalog;
use crate::dto::maintenance_dto::PeriodicBatchRequest;
use crate::metrics;
use crate::models::alert::{AlertType, AudienceFilter};
use crate::models::catalog::{
    EntityKind, CLAVE_MANTENCION_PROGRAMADA, ESTADO_PROGRAMADA, TIPO_PREVENTIVA,
};
use crate::models::logbook::{NewScheduledService, ScheduledPair};
use crate::repositories::{CatalogRepository, LogbookRepository, ScheduledBatch};
use crate::utils::errors::{AppError, AppResult};
use crate::utils::validation::{
    flatten_validation_errors, parse_decimal, parse_fecha, ErrorCollector, FECHA_FORMAT,
};

/// Resultado del pase de compensación
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CompensationReport {
    pub intentados: usize,
    pub revertidos: usize,
    pub fallidos: usize,
}

#[derive(Debug, Clone)]
pub enum BatchOutcome {
    Completed {
        created: Vec<ScheduledPair>,
    },
    /// El lote se detuvo en una fecha; `created` son los pares creados antes
    /// de la falla (ya compensados en lo posible)
    Aborted {
        created: Vec<ScheduledPair>,
        solicitadas: usize,
        error: String,
        compensation: CompensationReport,
    },
}

pub struct PeriodicBatchService {
    validator: Arc<ExistenceValidator>,
    catalog: Arc<dyn CatalogRepository>,
    logbooks: Arc<dyn LogbookRepository>,
    notifications: Arc<NotificationService>,
    workflow: WorkflowCatalog,
}

impl PeriodicBatchService {
    pub fn new(
        validator: Arc<ExistenceValidator>,
        catalog: Arc<dyn CatalogRepository>,
        logbooks: Arc<dyn LogbookRepository>,
        notifications: Arc<NotificationService>,
        workflow: WorkflowCatalog,
    ) -> Self {
        Self {
            validator,
            catalog,
            logbooks,
            notifications,
            workflow,
        }
    }

    pub async fn create_batch(&self, request: PeriodicBatchRequest) -> AppResult<BatchOutcome> {
        let mut errors = ErrorCollector::new();
        if let Err(e) = request.validate() {
            errors.extend(flatten_validation_errors(&e));
        }

        let fechas: Vec<Option<NaiveDate>> = request
            .fechas
            .iter()
            .enumerate()
            .map(|(i, fecha)| errors.check(parse_fecha(&format!("fechas[{}]", i), fecha)))
            .collect();

        let costo_estimado = request
            .costo_estimado
            .as_ref()
            .and_then(|v| errors.check(parse_decimal("costo_estimado", &v.as_text())));

        let empresa_id = if self
            .validator
            .require(EntityKind::Maquina, request.maquina_id, &mut errors)
            .await?
        {
            let empresa_id = self.catalog.machine_company(request.maquina_id).await?;
            if empresa_id.is_none() {
                errors.push("Máquina no pertenece a ninguna empresa");
            }
            empresa_id
        } else {
            None
        };

        self.validator
            .require(EntityKind::Taller, request.taller_id, &mut errors)
            .await?;

        if self
            .validator
            .require(EntityKind::Persona, request.responsable_id, &mut errors)
            .await?
        {
            if let Some(empresa_id) = empresa_id {
                if !self
                    .catalog
                    .person_in_company(request.responsable_id, empresa_id)
                    .await?
                {
                    errors.push("Responsable no pertenece a la empresa de la máquina");
                }
            }
        }

        self.validator
            .require_named(
                EntityKind::EstadoMantencion,
                self.workflow.estado_programada,
                ESTADO_PROGRAMADA,
                &mut errors,
            )
            .await?;
        self.validator
            .require_named(
                EntityKind::Clave,
                self.workflow.clave_programada,
                CLAVE_MANTENCION_PROGRAMADA,
                &mut errors,
            )
            .await?;
        self.validator
            .require_named(
                EntityKind::TipoMantencion,
                self.workflow.tipo_preventiva,
                TIPO_PREVENTIVA,
                &mut errors,
            )
            .await?;

        errors.finish()?;

        let empresa_id = empresa_id
            .ok_or_else(|| AppError::Internal("empresa de la máquina no resuelta".to_string()))?;
        let fechas: Vec<NaiveDate> = fechas.into_iter().flatten().collect();
        let solicitadas = fechas.len();

        let mut batch = self.logbooks.begin_batch().await?;
        let mut created: Vec<ScheduledPair> = Vec::with_capacity(solicitadas);
        for fec_inicio in fechas {
            let service = NewScheduledService {
                empresa_id,
                maquina_id: request.maquina_id,
                clave_id: self.workflow.clave_programada,
                taller_id: request.taller_id,
                responsable_id: request.responsable_id,
                estado_mantencion_id: self.workflow.estado_programada,
                tipo_mantencion_id: self.workflow.tipo_preventiva,
                fec_inicio,
                descripcion: request.descripcion.clone(),
                costo_estimado,
            };

            match batch.create_pair(&service).await {
                Ok(pair) => created.push(pair),
                Err(e) => {
                    error!(
                        maquina_id = request.maquina_id,
                        fecha = %fec_inicio,
                        creadas = created.len(),
                        solicitadas,
                        "❌ Falló el lote periódico: {}",
                        e
                    );
                    let compensation = Self::roll_back(batch, created.len()).await;
                    return Ok(BatchOutcome::Aborted {
                        created,
                        solicitadas,
                        error: format!(
                            "No se pudo programar la mantención del {}",
                            fec_inicio.format(FECHA_FORMAT)
                        ),
                        compensation,
                    });
                }
            }
        }

        if let Err(e) = batch.commit().await {
            // El commit pudo haberse aplicado aunque falle la confirmación
            error!(
                maquina_id = request.maquina_id,
                creadas = created.len(),
                "❌ No se pudo confirmar el lote periódico: {}",
                e
            );
            let compensation = self.compensate(&created).await;
            return Ok(BatchOutcome::Aborted {
                created,
                solicitadas,
                error: "No se pudo confirmar el lote de mantenciones periódicas".to_string(),
                compensation,
            });
        }

        info!(
            maquina_id = request.maquina_id,
            creadas = created.len(),
            "✅ Lote de mantenciones periódicas creado"
        );

        self.notifications
            .notify_best_effort(
                &AudienceFilter::privileged_in_company(empresa_id),
                format!(
                    "Se han programado {} mantenciones periódicas para la máquina {}",
                    created.len(),
                    request.maquina_id
                ),
                AlertType::Mantencion,
                EmailContent {
                    subject: "Mantenciones periódicas programadas".to_string(),
                    redirect_path: "/mantenciones".to_string(),
                    button_text: "Ver mantenciones".to_string(),
                    attachments: Vec::new(),
                },
            )
            .await;

        Ok(BatchOutcome::Completed { created })
    }

    /// Descarta la transacción del lote con los `pendientes` pares creados
    async fn roll_back(batch: Box<dyn ScheduledBatch>, pendientes: usize) -> CompensationReport {
        let mut report = CompensationReport {
            intentados: pendientes,
            ..Default::default()
        };

        match batch.rollback().await {
            Ok(()) => {
                report.revertidos = pendientes;
                metrics::record_compensation("revertido", pendientes);
                info!(?report, "↩️ Lote revertido");
            }
            Err(e) => {
                report.fallidos = pendientes;
                metrics::record_compensation("fallido", pendientes);
                error!(?report, "❌ No se pudo revertir el lote: {}", e);
            }
        }
        report
    }

    /// Elimina lógicamente pares ya confirmados, del último al primero
    async fn compensate(&self, created: &[ScheduledPair]) -> CompensationReport {
        let mut report = CompensationReport {
            intentados: created.len(),
            ..Default::default()
        };

        for pair in created.iter().rev() {
            match self.logbooks.soft_delete_scheduled_service(pair).await {
                Ok(()) => {
                    report.revertidos += 1;
                    metrics::record_compensation("revertido", 1);
                }
                Err(e) => {
                    report.fallidos += 1;
                    metrics::record_compensation("fallido", 1);
                    error!(
                        bitacora_id = pair.bitacora_id,
                        mantencion_id = pair.mantencion_id,
                        "❌ No se pudo eliminar el par del lote: {}",
                        e
                    );
                }
            }
        }

        if report.fallidos > 0 {
            warn!(?report, "⚠️ Compensación del lote incompleta");
        } else {
            info!(?report, "↩️ Lote compensado");
        }
        report
    }
}
