//! Modelo de Bitácora
//!
//! Una bitácora registra una salida de máquina. Las mantenciones programadas
//! generan bitácoras sintéticas con sólo empresa, máquina y clave.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

/// Servicio programado a crear: una bitácora sintética más su mantención
#[derive(Debug, Clone)]
pub struct NewScheduledService {
    pub empresa_id: i32,
    pub maquina_id: i32,
    pub clave_id: i32,
    pub taller_id: i32,
    pub responsable_id: i32,
    pub estado_mantencion_id: i32,
    pub tipo_mantencion_id: i32,
    pub fec_inicio: NaiveDate,
    pub descripcion: String,
    pub costo_estimado: Option<Decimal>,
}

/// Par bitácora/mantención creado por el lote periódico
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct ScheduledPair {
    pub bitacora_id: i32,
    pub mantencion_id: i32,
    pub fec_inicio: NaiveDate,
}
