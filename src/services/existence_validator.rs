//! Verificador de existencia
//!
//! Comprueba que una entidad referenciada exista y no esté eliminada. Los
//! métodos `require*` agregan el mensaje al acumulador en vez de fallar, para
//! que una solicitud reporte todas sus referencias inválidas a la vez.

use std::sync::Arc;

use crate::models::catalog::EntityKind;
use crate::repositories::ExistenceRepository;
use crate::utils::errors::AppResult;
use crate::utils::validation::ErrorCollector;

pub struct ExistenceValidator {
    repository: Arc<dyn ExistenceRepository>,
}

impl ExistenceValidator {
    pub fn new(repository: Arc<dyn ExistenceRepository>) -> Self {
        Self { repository }
    }

    pub async fn exists(&self, kind: EntityKind, id: i32) -> AppResult<bool> {
        self.repository.exists(kind, id).await
    }

    /// Agrega "<Entidad> no existe o está eliminado" si la referencia no es válida
    pub async fn require(
        &self,
        kind: EntityKind,
        id: i32,
        errors: &mut ErrorCollector,
    ) -> AppResult<bool> {
        let exists = self.exists(kind, id).await?;
        if !exists {
            errors.push(kind.missing_message());
        }
        Ok(exists)
    }

    /// Variante para filas de catálogo conocidas por nombre
    pub async fn require_named(
        &self,
        kind: EntityKind,
        id: i32,
        name: &str,
        errors: &mut ErrorCollector,
    ) -> AppResult<bool> {
        let exists = self.exists(kind, id).await?;
        if !exists {
            errors.push(format!("{} '{}' no existe o está eliminado", kind.label(), name));
        }
        Ok(exists)
    }
}
