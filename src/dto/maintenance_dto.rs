use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::clients::UploadedFile;
use crate::models::logbook::ScheduledPair;
use crate::services::periodic_batch_service::CompensationReport;
use crate::utils::validation::NumberOrText;

/// Formulario multipart de creación; todos los campos llegan como texto y se
/// validan juntos en el servicio
#[derive(Debug, Clone, Default)]
pub struct CreateMaintenanceForm {
    pub bitacora_id: Option<String>,
    pub maquina_id: Option<String>,
    pub taller_id: Option<String>,
    pub tipo_mantencion_id: Option<String>,
    pub fec_inicio: Option<String>,
    pub fec_termino: Option<String>,
    pub ot: Option<String>,
    pub num_factura: Option<String>,
    pub costo_servicio: Option<String>,
    pub aprobador_id: Option<String>,
    pub imagen: Option<UploadedFile>,
}

impl CreateMaintenanceForm {
    /// Asigna un campo de texto por nombre; devuelve `false` si no se reconoce
    pub fn set_text_field(&mut self, name: &str, value: String) -> bool {
        // Un campo vacío en un formulario equivale a no enviarlo
        let value = Some(value).filter(|v| !v.trim().is_empty());
        let slot = match name {
            "bitacora_id" => &mut self.bitacora_id,
            "maquina_id" => &mut self.maquina_id,
            "taller_id" => &mut self.taller_id,
            "tipo_mantencion_id" => &mut self.tipo_mantencion_id,
            "fec_inicio" => &mut self.fec_inicio,
            "fec_termino" => &mut self.fec_termino,
            "ot" => &mut self.ot,
            "num_factura" => &mut self.num_factura,
            "costo_servicio" => &mut self.costo_servicio,
            "aprobador_id" => &mut self.aprobador_id,
            _ => return false,
        };
        *slot = value;
        true
    }
}

/// Actualización parcial de una mantención
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateMaintenanceRequest {
    pub maquina_id: Option<i32>,
    pub taller_id: Option<i32>,
    pub tipo_mantencion_id: Option<i32>,
    pub fec_inicio: Option<String>,
    pub fec_termino: Option<String>,
    pub ot: Option<String>,
    pub num_factura: Option<NumberOrText>,
    pub costo_servicio: Option<NumberOrText>,
    #[validate(length(max = 500, message = "descripcion no puede superar 500 caracteres"))]
    pub descripcion: Option<String>,
}

impl UpdateMaintenanceRequest {
    pub fn is_empty(&self) -> bool {
        self.maquina_id.is_none()
            && self.taller_id.is_none()
            && self.tipo_mantencion_id.is_none()
            && self.fec_inicio.is_none()
            && self.fec_termino.is_none()
            && self.ot.is_none()
            && self.num_factura.is_none()
            && self.costo_servicio.is_none()
            && self.descripcion.is_none()
    }
}

/// Lote de mantenciones periódicas
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PeriodicBatchRequest {
    pub maquina_id: i32,
    pub taller_id: i32,
    pub responsable_id: i32,
    #[validate(length(min = 1, message = "fechas debe contener al menos una fecha"))]
    pub fechas: Vec<String>,
    #[validate(length(min = 1, max = 500, message = "descripcion debe tener entre 1 y 500 caracteres"))]
    pub descripcion: String,
    pub costo_estimado: Option<NumberOrText>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ToggleApprovalRequest {
    #[validate(range(min = 1, message = "usuario_id debe ser un identificador válido"))]
    pub usuario_id: i32,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SetStatusRequest {
    #[validate(range(min = 1, message = "estado_mantencion_id debe ser un identificador válido"))]
    pub estado_mantencion_id: i32,
}

#[derive(Debug, Serialize)]
pub struct PeriodicBatchResponse {
    pub creadas: usize,
    pub solicitadas: usize,
    pub mantenciones: Vec<ScheduledPair>,
}

/// Cuerpo de respuesta cuando el lote se aborta
#[derive(Debug, Serialize)]
pub struct PeriodicBatchFailure {
    pub message: String,
    pub creadas: usize,
    pub solicitadas: usize,
    pub compensacion: CompensationReport,
}
