//! Gestión de mantenciones
//!
//! Creación, actualización parcial, consulta y eliminación lógica de una
//! mantención ligada a una bitácora. La creación valida todas las referencias
//! juntas, inserta respetando el invariante de un servicio activo por
//! bitácora y luego, sin afectar el resultado, aprueba automáticamente (si se
//! indicó aprobador), genera el PDF y notifica.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use tracing::{info, warn};

use super::existence_validator::ExistenceValidator;
use super::notification_service::{EmailContent, NotificationService};
use super::workflow_catalog::WorkflowCatalog;
use crate::clients::{Attachment, ObjectStorage, PdfRenderer, PdfRow};
use crate::dto::maintenance_dto::{CreateMaintenanceForm, UpdateMaintenanceRequest};
use crate::models::alert::{AlertType, AudienceFilter};
use crate::models::catalog::EntityKind;
use crate::models::maintenance::{
    Approval, InsertOutcome, MaintenanceChanges, MaintenanceRecord, NewMaintenance,
};
use crate::repositories::{CatalogRepository, MaintenanceRepository};
use crate::utils::errors::{not_found_error, AppError, AppResult};
use crate::utils::validation::{
    flatten_validation_errors, parse_decimal, parse_fecha, parse_id, parse_integer,
    parse_ot, ErrorCollector, FECHA_FORMAT,
};
use validator::Validate;

/// Aprobador validado: persona con rol privilegiado
#[derive(Debug, Clone)]
struct Approver {
    persona_id: i32,
    nombre: String,
}

pub struct MaintenanceService {
    validator: Arc<ExistenceValidator>,
    maintenance: Arc<dyn MaintenanceRepository>,
    catalog: Arc<dyn CatalogRepository>,
    storage: Arc<dyn ObjectStorage>,
    pdf: Arc<dyn PdfRenderer>,
    notifications: Arc<NotificationService>,
    workflow: WorkflowCatalog,
}

fn required_field<'a>(
    errors: &mut ErrorCollector,
    field: &str,
    value: &'a Option<String>,
) -> Option<&'a str> {
    match value.as_deref() {
        Some(v) => Some(v),
        None => {
            errors.push(format!("{} es requerido", field));
            None
        }
    }
}

fn required_id(errors: &mut ErrorCollector, field: &str, value: &Option<String>) -> Option<i32> {
    let raw = required_field(errors, field, value)?;
    errors.check(parse_id(field, raw))
}

fn check_date_order(errors: &mut ErrorCollector, inicio: NaiveDate, termino: Option<NaiveDate>) {
    if let Some(termino) = termino {
        if termino < inicio {
            errors.push("fec_termino no puede ser anterior a fec_inicio");
        }
    }
}

fn format_fecha(fecha: NaiveDate) -> String {
    fecha.format(FECHA_FORMAT).to_string()
}

/// Fila del PDF resumen de una mantención
pub fn summary_row(record: &MaintenanceRecord, aprobador: Option<&str>) -> PdfRow {
    PdfRow::new()
        .cell("ID", Some(record.id.to_string()))
        .cell("OT", record.ot.clone())
        .cell("Bitácora", Some(record.bitacora_id.to_string()))
        .cell("Máquina", Some(record.maquina_id.to_string()))
        .cell("Taller", Some(record.taller_id.to_string()))
        .cell("Tipo", Some(record.tipo_mantencion_id.to_string()))
        .cell("Fecha inicio", Some(format_fecha(record.fec_inicio)))
        .cell("Fecha término", record.fec_termino.map(format_fecha))
        .cell("N° factura", record.num_factura.map(|n| n.to_string()))
        .cell("Costo", record.costo_servicio.map(|c| c.to_string()))
        .cell("Aprobada", Some(if record.aprobada { "Sí" } else { "No" }.to_string()))
        .cell("Aprobador", aprobador.map(str::to_string))
}

impl MaintenanceService {
    pub fn new(
        validator: Arc<ExistenceValidator>,
        maintenance: Arc<dyn MaintenanceRepository>,
        catalog: Arc<dyn CatalogRepository>,
        storage: Arc<dyn ObjectStorage>,
        pdf: Arc<dyn PdfRenderer>,
        notifications: Arc<NotificationService>,
        workflow: WorkflowCatalog,
    ) -> Self {
        Self {
            validator,
            maintenance,
            catalog,
            storage,
            pdf,
            notifications,
            workflow,
        }
    }

    pub async fn get(&self, id: i32) -> AppResult<MaintenanceRecord> {
        self.maintenance
            .find_active(id)
            .await?
            .ok_or_else(|| not_found_error(EntityKind::Mantencion.label(), id))
    }

    pub async fn create(&self, form: CreateMaintenanceForm) -> AppResult<MaintenanceRecord> {
        let mut errors = ErrorCollector::new();

        let bitacora_id = required_id(&mut errors, "bitacora_id", &form.bitacora_id);
        let maquina_id = required_id(&mut errors, "maquina_id", &form.maquina_id);
        let taller_id = required_id(&mut errors, "taller_id", &form.taller_id);
        let tipo_mantencion_id =
            required_id(&mut errors, "tipo_mantencion_id", &form.tipo_mantencion_id);

        for (kind, id) in [
            (EntityKind::Bitacora, bitacora_id),
            (EntityKind::Maquina, maquina_id),
            (EntityKind::Taller, taller_id),
            (EntityKind::TipoMantencion, tipo_mantencion_id),
        ] {
            if let Some(id) = id {
                self.validator.require(kind, id, &mut errors).await?;
            }
        }

        let ot = match form.ot.as_deref() {
            Some(ot) => errors.check(parse_ot(ot)),
            None => {
                errors.push("ot es requerido");
                None
            }
        };
        let num_factura = form
            .num_factura
            .as_deref()
            .and_then(|v| errors.check(parse_integer("num_factura", v)));
        let costo_servicio = form
            .costo_servicio
            .as_deref()
            .and_then(|v| errors.check(parse_decimal("costo_servicio", v)));

        let fec_inicio = required_field(&mut errors, "fec_inicio", &form.fec_inicio)
            .and_then(|v| errors.check(parse_fecha("fec_inicio", v)));
        let fec_termino = form
            .fec_termino
            .as_deref()
            .and_then(|v| errors.check(parse_fecha("fec_termino", v)));
        if let Some(inicio) = fec_inicio {
            check_date_order(&mut errors, inicio, fec_termino);
        }

        let approver = match form.aprobador_id.as_deref() {
            Some(raw) => match errors.check(parse_id("aprobador_id", raw)) {
                Some(persona_id) => match self.catalog.privileged_person_name(persona_id).await? {
                    Some(nombre) => Some(Approver { persona_id, nombre }),
                    None => {
                        errors.push("Aprobador no existe o no tiene un rol autorizado para aprobar");
                        None
                    }
                },
                None => None,
            },
            None => None,
        };

        // La imagen se sube sólo si el resto de la solicitud es válido
        let imagen_url = match &form.imagen {
            Some(file) if errors.is_empty() => match self.storage.upload(file).await {
                Ok(url) => Some(url),
                Err(e) => {
                    warn!(filename = %file.filename, "⚠️ No se pudo subir la imagen: {}", e);
                    errors.push("imagen: no se pudo subir el archivo");
                    None
                }
            },
            _ => None,
        };

        errors.finish()?;

        let (bitacora_id, maquina_id, taller_id, tipo_mantencion_id, fec_inicio, ot) =
            match (bitacora_id, maquina_id, taller_id, tipo_mantencion_id, fec_inicio, ot) {
                (Some(b), Some(m), Some(t), Some(tipo), Some(f), Some(ot)) => (b, m, t, tipo, f, ot),
                _ => return Err(AppError::Internal("validación incompleta".to_string())),
            };

        let new = NewMaintenance {
            bitacora_id,
            maquina_id,
            taller_id,
            estado_mantencion_id: self.workflow.estado_pendiente,
            tipo_mantencion_id,
            fec_inicio,
            fec_termino,
            ot,
            num_factura,
            costo_servicio,
            imagen_url,
        };

        let record = match self.maintenance.insert_guarded(&new).await? {
            InsertOutcome::Inserted(record) => record,
            InsertOutcome::ActiveService {
                mantencion,
                combustible,
            } => {
                self.discard_upload(new.imagen_url.as_deref()).await;
                let what = match (mantencion, combustible) {
                    (true, true) => "una mantención y una carga de combustible activas",
                    (true, false) => "una mantención activa",
                    _ => "una carga de combustible activa",
                };
                return Err(AppError::Conflict(format!(
                    "La bitácora {} ya tiene {}",
                    bitacora_id, what
                )));
            }
            InsertOutcome::LogbookUnavailable => {
                self.discard_upload(new.imagen_url.as_deref()).await;
                return Err(AppError::Validation(vec![EntityKind::Bitacora.missing_message()]));
            }
        };

        info!(mantencion_id = record.id, bitacora_id, "✅ Mantención creada");

        let record = match &approver {
            Some(approver) => self.auto_approve(record, approver).await,
            None => record,
        };

        self.notify_creation(&record, approver.as_ref()).await;

        Ok(record)
    }

    /// Elimina la imagen de una mantención que no se llegó a crear
    async fn discard_upload(&self, imagen_url: Option<&str>) {
        let Some(url) = imagen_url else {
            return;
        };
        if let Err(e) = self.storage.remove(url).await {
            warn!(imagen_url = %url, "⚠️ Imagen huérfana en el almacenamiento: {}", e);
        }
    }

    pub async fn update(
        &self,
        id: i32,
        request: UpdateMaintenanceRequest,
    ) -> AppResult<MaintenanceRecord> {
        if request.is_empty() {
            return Err(AppError::Validation(vec![
                "Debe enviar al menos un campo para actualizar".to_string(),
            ]));
        }

        let current = self.get(id).await?;
        let mut errors = ErrorCollector::new();
        if let Err(e) = request.validate() {
            errors.extend(flatten_validation_errors(&e));
        }

        let mut changes = MaintenanceChanges::default();

        for (kind, value, slot) in [
            (EntityKind::Maquina, request.maquina_id, &mut changes.maquina_id),
            (EntityKind::Taller, request.taller_id, &mut changes.taller_id),
            (
                EntityKind::TipoMantencion,
                request.tipo_mantencion_id,
                &mut changes.tipo_mantencion_id,
            ),
        ] {
            if let Some(id) = value {
                if self.validator.require(kind, id, &mut errors).await? {
                    *slot = Some(id);
                }
            }
        }

        changes.fec_inicio = request
            .fec_inicio
            .as_deref()
            .and_then(|v| errors.check(parse_fecha("fec_inicio", v)));
        changes.fec_termino = request
            .fec_termino
            .as_deref()
            .and_then(|v| errors.check(parse_fecha("fec_termino", v)));
        changes.ot = request
            .ot
            .as_deref()
            .and_then(|v| errors.check(parse_ot(v)));
        changes.num_factura = request
            .num_factura
            .as_ref()
            .and_then(|v| errors.check(parse_integer("num_factura", &v.as_text())));
        changes.costo_servicio = request
            .costo_servicio
            .as_ref()
            .and_then(|v| errors.check(parse_decimal("costo_servicio", &v.as_text())));
        changes.descripcion = request.descripcion.clone();

        let merged = changes.apply_to(&current);
        check_date_order(&mut errors, merged.fec_inicio, merged.fec_termino);

        errors.finish()?;

        let record = self
            .maintenance
            .update_fields(id, &changes)
            .await?
            .ok_or_else(|| not_found_error(EntityKind::Mantencion.label(), id))?;

        info!(mantencion_id = id, "✏️ Mantención actualizada");
        Ok(record)
    }

    pub async fn delete(&self, id: i32) -> AppResult<()> {
        if !self.maintenance.soft_delete(id).await? {
            return Err(not_found_error(EntityKind::Mantencion.label(), id));
        }
        info!(mantencion_id = id, "🗑️ Mantención eliminada");
        Ok(())
    }

    async fn auto_approve(&self, record: MaintenanceRecord, approver: &Approver) -> MaintenanceRecord {
        let approval = Approval::granted(approver.persona_id, Utc::now());
        match self.maintenance.set_approval(record.id, approval).await {
            Ok(Some(approved)) => {
                info!(
                    mantencion_id = approved.id,
                    aprobador_id = approver.persona_id,
                    "✅ Mantención aprobada al crearla"
                );
                approved
            }
            Ok(None) => record,
            Err(e) => {
                warn!(mantencion_id = record.id, "⚠️ No se pudo aprobar la mantención: {}", e);
                record
            }
        }
    }

    async fn notify_creation(&self, record: &MaintenanceRecord, approver: Option<&Approver>) {
        let empresa_id = match self.catalog.machine_company(record.maquina_id).await {
            Ok(Some(empresa_id)) => empresa_id,
            Ok(None) => {
                warn!(maquina_id = record.maquina_id, "⚠️ Máquina sin empresa, no se notifica");
                return;
            }
            Err(e) => {
                warn!(maquina_id = record.maquina_id, "⚠️ No se pudo obtener la empresa: {}", e);
                return;
            }
        };

        let aprobador = approver.map(|a| a.nombre.as_str());
        let rows = [summary_row(record, aprobador)];
        let attachments = match self.pdf.render("Resumen de mantención", &rows).await {
            Ok(bytes) => vec![Attachment {
                filename: format!("mantencion-{}.pdf", record.id),
                content_type: "application/pdf".to_string(),
                content: bytes,
            }],
            Err(e) => {
                warn!(mantencion_id = record.id, "⚠️ No se pudo generar el PDF: {}", e);
                Vec::new()
            }
        };

        let ot = record.ot.as_deref().unwrap_or("sin OT");
        let contenido = match aprobador {
            Some(nombre) => format!(
                "Se registró la mantención {} (OT {}) para la máquina {}, aprobada por {}",
                record.id, ot, record.maquina_id, nombre
            ),
            None => format!(
                "Se registró la mantención {} (OT {}) para la máquina {}",
                record.id, ot, record.maquina_id
            ),
        };

        self.notifications
            .notify_best_effort(
                &AudienceFilter::privileged_in_company(empresa_id),
                contenido,
                AlertType::Mantencion,
                EmailContent {
                    subject: format!("Nueva mantención registrada (OT {})", ot),
                    redirect_path: format!("/mantenciones/{}", record.id),
                    button_text: "Ver mantención".to_string(),
                    attachments,
                },
            )
            .await;
    }
}
