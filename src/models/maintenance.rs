//! Modelo de Mantención
//!
//! Mapea la tabla `mantencion`. Cada registro cuelga de una bitácora; el
//! borrado es lógico mediante la columna `estado`.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;

/// Columnas seleccionadas por todos los repositorios de mantención
pub const MAINTENANCE_COLUMNS: &str = "id, bitacora_id, maquina_id, taller_id, estado_mantencion_id, \
     tipo_mantencion_id, responsable_id, aprobador_id, fec_inicio, fec_termino, ot, num_factura, \
     costo_servicio, imagen_url, descripcion, aprobada, fecha_aprobacion, estado";

#[derive(Debug, Clone, Serialize, FromRow, PartialEq)]
pub struct MaintenanceRecord {
    pub id: i32,
    pub bitacora_id: i32,
    pub maquina_id: i32,
    pub taller_id: i32,
    pub estado_mantencion_id: i32,
    pub tipo_mantencion_id: i32,
    pub responsable_id: Option<i32>,
    pub aprobador_id: Option<i32>,
    pub fec_inicio: NaiveDate,
    pub fec_termino: Option<NaiveDate>,
    pub ot: Option<String>,
    pub num_factura: Option<i64>,
    pub costo_servicio: Option<Decimal>,
    pub imagen_url: Option<String>,
    pub descripcion: Option<String>,
    pub aprobada: bool,
    pub fecha_aprobacion: Option<DateTime<Utc>>,
    /// `false` cuando el registro fue eliminado
    pub estado: bool,
}

/// Datos para insertar una mantención ad-hoc
#[derive(Debug, Clone)]
pub struct NewMaintenance {
    pub bitacora_id: i32,
    pub maquina_id: i32,
    pub taller_id: i32,
    pub estado_mantencion_id: i32,
    pub tipo_mantencion_id: i32,
    pub fec_inicio: NaiveDate,
    pub fec_termino: Option<NaiveDate>,
    pub ot: String,
    pub num_factura: Option<i64>,
    pub costo_servicio: Option<Decimal>,
    pub imagen_url: Option<String>,
}

/// Resultado de la inserción protegida por el invariante de servicio único
#[derive(Debug, Clone)]
pub enum InsertOutcome {
    Inserted(MaintenanceRecord),
    /// La bitácora ya tiene una mantención y/o carga de combustible activa
    ActiveService { mantencion: bool, combustible: bool },
    /// La bitácora desapareció entre la validación y la inserción
    LogbookUnavailable,
}

/// Actualización parcial; `None` deja el campo intacto
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MaintenanceChanges {
    pub maquina_id: Option<i32>,
    pub taller_id: Option<i32>,
    pub tipo_mantencion_id: Option<i32>,
    pub fec_inicio: Option<NaiveDate>,
    pub fec_termino: Option<NaiveDate>,
    pub ot: Option<String>,
    pub num_factura: Option<i64>,
    pub costo_servicio: Option<Decimal>,
    pub descripcion: Option<String>,
}

impl MaintenanceChanges {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Aplica los cambios sobre una copia del registro
    pub fn apply_to(&self, record: &MaintenanceRecord) -> MaintenanceRecord {
        let mut updated = record.clone();
        if let Some(v) = self.maquina_id {
            updated.maquina_id = v;
        }
        if let Some(v) = self.taller_id {
            updated.taller_id = v;
        }
        if let Some(v) = self.tipo_mantencion_id {
            updated.tipo_mantencion_id = v;
        }
        if let Some(v) = self.fec_inicio {
            updated.fec_inicio = v;
        }
        if let Some(v) = self.fec_termino {
            updated.fec_termino = Some(v);
        }
        if let Some(v) = &self.ot {
            updated.ot = Some(v.clone());
        }
        if let Some(v) = self.num_factura {
            updated.num_factura = Some(v);
        }
        if let Some(v) = self.costo_servicio {
            updated.costo_servicio = Some(v);
        }
        if let Some(v) = &self.descripcion {
            updated.descripcion = Some(v.clone());
        }
        updated
    }
}

/// Estado de aprobación a escribir (bandera, aprobador y fecha van juntos)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Approval {
    pub aprobada: bool,
    pub aprobador_id: Option<i32>,
    pub fecha_aprobacion: Option<DateTime<Utc>>,
}

impl Approval {
    pub fn granted(aprobador_id: i32, at: DateTime<Utc>) -> Self {
        Self {
            aprobada: true,
            aprobador_id: Some(aprobador_id),
            fecha_aprobacion: Some(at),
        }
    }

    pub fn revoked() -> Self {
        Self {
            aprobada: false,
            aprobador_id: None,
            fecha_aprobacion: None,
        }
    }
}
