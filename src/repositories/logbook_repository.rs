use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};

use crate::models::logbook::{NewScheduledService, ScheduledPair};
use crate::utils::errors::AppResult;

/// Unidad de trabajo del lote periódico: todos los pares se confirman juntos
/// o ninguno queda visible
#[async_trait]
pub trait ScheduledBatch: Send {
    /// Crea la bitácora sintética y su mantención dentro del lote
    async fn create_pair(&mut self, service: &NewScheduledService) -> AppResult<ScheduledPair>;

    async fn commit(self: Box<Self>) -> AppResult<()>;

    async fn rollback(self: Box<Self>) -> AppResult<()>;
}

/// Persistencia de los pares bitácora/mantención del lote periódico
#[async_trait]
pub trait LogbookRepository: Send + Sync {
    async fn begin_batch(&self) -> AppResult<Box<dyn ScheduledBatch>>;

    /// Elimina lógicamente ambos lados de un par ya confirmado
    async fn soft_delete_scheduled_service(&self, pair: &ScheduledPair) -> AppResult<()>;
}

pub struct PgLogbookRepository {
    pool: PgPool,
}

impl PgLogbookRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Lote abierto sobre una transacción de PostgreSQL
pub struct PgScheduledBatch {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl ScheduledBatch for PgScheduledBatch {
    async fn create_pair(&mut self, service: &NewScheduledService) -> AppResult<ScheduledPair> {
        let (bitacora_id,): (i32,) = sqlx::query_as(
            r#"
            INSERT INTO bitacora (empresa_id, maquina_id, clave_id, estado)
            VALUES ($1, $2, $3, true)
            RETURNING id
            "#,
        )
        .bind(service.empresa_id)
        .bind(service.maquina_id)
        .bind(service.clave_id)
        .fetch_one(&mut *self.tx)
        .await?;

        let (mantencion_id,): (i32,) = sqlx::query_as(
            r#"
            INSERT INTO mantencion (
                bitacora_id, maquina_id, taller_id, estado_mantencion_id, tipo_mantencion_id,
                responsable_id, fec_inicio, descripcion, costo_servicio, aprobada, estado
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, false, true)
            RETURNING id
            "#,
        )
        .bind(bitacora_id)
        .bind(service.maquina_id)
        .bind(service.taller_id)
        .bind(service.estado_mantencion_id)
        .bind(service.tipo_mantencion_id)
        .bind(service.responsable_id)
        .bind(service.fec_inicio)
        .bind(&service.descripcion)
        .bind(service.costo_estimado)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(ScheduledPair {
            bitacora_id,
            mantencion_id,
            fec_inicio: service.fec_inicio,
        })
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> AppResult<()> {
        self.tx.rollback().await?;
        Ok(())
    }
}

#[async_trait]
impl LogbookRepository for PgLogbookRepository {
    async fn begin_batch(&self) -> AppResult<Box<dyn ScheduledBatch>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgScheduledBatch { tx }))
    }

    async fn soft_delete_scheduled_service(&self, pair: &ScheduledPair) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("UPDATE mantencion SET estado = false WHERE id = $1")
            .bind(pair.mantencion_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("UPDATE bitacora SET estado = false WHERE id = $1")
            .bind(pair.bitacora_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }
}
