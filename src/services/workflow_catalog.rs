//! Catálogo de flujo
//!
//! Ids de los estados, tipo y clave que el flujo de mantenciones usa por
//! nombre. Se resuelven una vez al arrancar; si falta alguno el proceso no
//! inicia.

use tracing::info;

use crate::models::catalog::{
    LookupTable, CLAVE_MANTENCION_PROGRAMADA, ESTADO_EN_PROCESO, ESTADO_PENDIENTE,
    ESTADO_PROGRAMADA, TIPO_PREVENTIVA,
};
use crate::repositories::CatalogRepository;
use crate::utils::errors::{AppError, AppResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkflowCatalog {
    pub estado_pendiente: i32,
    pub estado_programada: i32,
    pub estado_en_proceso: i32,
    pub tipo_preventiva: i32,
    pub clave_programada: i32,
}

impl WorkflowCatalog {
    pub async fn resolve(repository: &dyn CatalogRepository) -> AppResult<Self> {
        let mut missing = Vec::new();

        let mut lookup = |table: LookupTable, name: &'static str, found: Option<i32>| {
            if found.is_none() {
                missing.push(format!("{} '{}'", table.entity().label(), name));
            }
            found.unwrap_or_default()
        };

        let estado_pendiente = lookup(
            LookupTable::EstadoMantencion,
            ESTADO_PENDIENTE,
            repository
                .find_id_by_name(LookupTable::EstadoMantencion, ESTADO_PENDIENTE)
                .await?,
        );
        let estado_programada = lookup(
            LookupTable::EstadoMantencion,
            ESTADO_PROGRAMADA,
            repository
                .find_id_by_name(LookupTable::EstadoMantencion, ESTADO_PROGRAMADA)
                .await?,
        );
        let estado_en_proceso = lookup(
            LookupTable::EstadoMantencion,
            ESTADO_EN_PROCESO,
            repository
                .find_id_by_name(LookupTable::EstadoMantencion, ESTADO_EN_PROCESO)
                .await?,
        );
        let tipo_preventiva = lookup(
            LookupTable::TipoMantencion,
            TIPO_PREVENTIVA,
            repository
                .find_id_by_name(LookupTable::TipoMantencion, TIPO_PREVENTIVA)
                .await?,
        );
        let clave_programada = lookup(
            LookupTable::Clave,
            CLAVE_MANTENCION_PROGRAMADA,
            repository
                .find_id_by_name(LookupTable::Clave, CLAVE_MANTENCION_PROGRAMADA)
                .await?,
        );

        if !missing.is_empty() {
            return Err(AppError::Internal(format!(
                "Catálogo de mantenciones incompleto, faltan: {}",
                missing.join(", ")
            )));
        }

        let catalog = Self {
            estado_pendiente,
            estado_programada,
            estado_en_proceso,
            tipo_preventiva,
            clave_programada,
        };
        info!(?catalog, "✅ Catálogo de mantenciones resuelto");
        Ok(catalog)
    }
}
