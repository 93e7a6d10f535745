use async_trait::async_trait;
use sqlx::PgPool;

use crate::models::catalog::EntityKind;
use crate::utils::errors::AppResult;

/// "¿Existe una fila no eliminada con este id en esta tabla?"
#[async_trait]
pub trait ExistenceRepository: Send + Sync {
    async fn exists(&self, kind: EntityKind, id: i32) -> AppResult<bool>;
}

pub struct PgExistenceRepository {
    pool: PgPool,
}

impl PgExistenceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ExistenceRepository for PgExistenceRepository {
    async fn exists(&self, kind: EntityKind, id: i32) -> AppResult<bool> {
        // El nombre de tabla sale de EntityKind, nunca de la entrada del usuario
        let sql = format!(
            "SELECT EXISTS(SELECT 1 FROM {} WHERE id = $1 AND estado = true)",
            kind.table()
        );
        let (exists,): (bool,) = sqlx::query_as(&sql)
            .bind(id)
            .fetch_one(&self.pool)
            .await?;

        Ok(exists)
    }
}
