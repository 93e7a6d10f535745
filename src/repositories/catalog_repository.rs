use async_trait::async_trait;
use sqlx::PgPool;

use crate::models::catalog::{LookupTable, PRIVILEGED_ROLES};
use crate::utils::errors::AppResult;

/// Consultas de catálogo, máquinas y personas que necesita el flujo de mantención
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    /// Id de una fila de catálogo activa buscada por nombre
    async fn find_id_by_name(&self, table: LookupTable, name: &str) -> AppResult<Option<i32>>;

    /// Empresa dueña de una máquina activa
    async fn machine_company(&self, maquina_id: i32) -> AppResult<Option<i32>>;

    async fn person_in_company(&self, persona_id: i32, empresa_id: i32) -> AppResult<bool>;

    /// Nombre visible de la persona si tiene un rol privilegiado
    async fn privileged_person_name(&self, persona_id: i32) -> AppResult<Option<String>>;

    /// Persona asociada a un usuario activo
    async fn person_for_user(&self, usuario_id: i32) -> AppResult<Option<i32>>;
}

pub struct PgCatalogRepository {
    pool: PgPool,
}

impl PgCatalogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn privileged_roles() -> Vec<String> {
    PRIVILEGED_ROLES.iter().map(|r| r.to_string()).collect()
}

#[async_trait]
impl CatalogRepository for PgCatalogRepository {
    async fn find_id_by_name(&self, table: LookupTable, name: &str) -> AppResult<Option<i32>> {
        let sql = format!(
            "SELECT id FROM {} WHERE {} = $1 AND estado = true ORDER BY id LIMIT 1",
            table.entity().table(),
            table.name_column()
        );
        let row: Option<(i32,)> = sqlx::query_as(&sql)
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|(id,)| id))
    }

    async fn machine_company(&self, maquina_id: i32) -> AppResult<Option<i32>> {
        let row: Option<(Option<i32>,)> =
            sqlx::query_as("SELECT empresa_id FROM maquina WHERE id = $1 AND estado = true")
                .bind(maquina_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.and_then(|(empresa_id,)| empresa_id))
    }

    async fn person_in_company(&self, persona_id: i32, empresa_id: i32) -> AppResult<bool> {
        let (exists,): (bool,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM persona WHERE id = $1 AND empresa_id = $2 AND estado = true)",
        )
        .bind(persona_id)
        .bind(empresa_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn privileged_person_name(&self, persona_id: i32) -> AppResult<Option<String>> {
        let row: Option<(String,)> = sqlx::query_as(
            r#"
            SELECT TRIM(p.nombres || ' ' || COALESCE(p.apellidos, ''))
            FROM persona p
            JOIN rol r ON r.id = p.rol_id
            WHERE p.id = $1
              AND p.estado = true
              AND r.estado = true
              AND r.nombre = ANY($2)
            "#,
        )
        .bind(persona_id)
        .bind(privileged_roles())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(nombre,)| nombre))
    }

    async fn person_for_user(&self, usuario_id: i32) -> AppResult<Option<i32>> {
        let row: Option<(Option<i32>,)> =
            sqlx::query_as("SELECT persona_id FROM usuario WHERE id = $1 AND estado = true")
                .bind(usuario_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.and_then(|(persona_id,)| persona_id))
    }
}
