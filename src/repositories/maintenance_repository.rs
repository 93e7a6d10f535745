use async_trait::async_trait;
use sqlx::PgPool;

use crate::models::maintenance::{
    Approval, InsertOutcome, MaintenanceChanges, MaintenanceRecord, NewMaintenance,
    MAINTENANCE_COLUMNS,
};
use crate::utils::errors::AppResult;

/// SQLSTATE de violación de unicidad en PostgreSQL
const UNIQUE_VIOLATION: &str = "23505";

#[async_trait]
pub trait MaintenanceRepository: Send + Sync {
    async fn find_active(&self, id: i32) -> AppResult<Option<MaintenanceRecord>>;

    /// Inserta la mantención sólo si la bitácora no tiene otro servicio activo.
    /// La verificación y la inserción ocurren en la misma transacción.
    async fn insert_guarded(&self, new: &NewMaintenance) -> AppResult<InsertOutcome>;

    async fn update_fields(
        &self,
        id: i32,
        changes: &MaintenanceChanges,
    ) -> AppResult<Option<MaintenanceRecord>>;

    async fn set_approval(&self, id: i32, approval: Approval)
        -> AppResult<Option<MaintenanceRecord>>;

    async fn set_state(
        &self,
        id: i32,
        estado_mantencion_id: i32,
    ) -> AppResult<Option<MaintenanceRecord>>;

    /// `false` si el registro no existía o ya estaba eliminado
    async fn soft_delete(&self, id: i32) -> AppResult<bool>;
}

pub struct PgMaintenanceRepository {
    pool: PgPool,
}

impl PgMaintenanceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn is_unique_violation(error: &sqlx::Error) -> bool {
    match error {
        sqlx::Error::Database(db) => db.code().as_deref() == Some(UNIQUE_VIOLATION),
        _ => false,
    }
}

#[async_trait]
impl MaintenanceRepository for PgMaintenanceRepository {
    async fn find_active(&self, id: i32) -> AppResult<Option<MaintenanceRecord>> {
        let sql = format!(
            "SELECT {} FROM mantencion WHERE id = $1 AND estado = true",
            MAINTENANCE_COLUMNS
        );
        let record = sqlx::query_as::<_, MaintenanceRecord>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(record)
    }

    async fn insert_guarded(&self, new: &NewMaintenance) -> AppResult<InsertOutcome> {
        let mut tx = self.pool.begin().await?;

        // Bloquear la bitácora serializa las creaciones concurrentes sobre ella
        let locked: Option<(i32,)> =
            sqlx::query_as("SELECT id FROM bitacora WHERE id = $1 AND estado = true FOR UPDATE")
                .bind(new.bitacora_id)
                .fetch_optional(&mut *tx)
                .await?;

        if locked.is_none() {
            tx.rollback().await?;
            return Ok(InsertOutcome::LogbookUnavailable);
        }

        let (mantencion, combustible): (bool, bool) = sqlx::query_as(
            r#"
            SELECT
                EXISTS(SELECT 1 FROM mantencion WHERE bitacora_id = $1 AND estado = true),
                EXISTS(SELECT 1 FROM carga_combustible WHERE bitacora_id = $1 AND estado = true)
            "#,
        )
        .bind(new.bitacora_id)
        .fetch_one(&mut *tx)
        .await?;

        if mantencion || combustible {
            tx.rollback().await?;
            return Ok(InsertOutcome::ActiveService {
                mantencion,
                combustible,
            });
        }

        let sql = format!(
            r#"
            INSERT INTO mantencion (
                bitacora_id, maquina_id, taller_id, estado_mantencion_id, tipo_mantencion_id,
                fec_inicio, fec_termino, ot, num_factura, costo_servicio, imagen_url,
                aprobada, estado
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, false, true)
            RETURNING {}
            "#,
            MAINTENANCE_COLUMNS
        );
        let inserted = sqlx::query_as::<_, MaintenanceRecord>(&sql)
            .bind(new.bitacora_id)
            .bind(new.maquina_id)
            .bind(new.taller_id)
            .bind(new.estado_mantencion_id)
            .bind(new.tipo_mantencion_id)
            .bind(new.fec_inicio)
            .bind(new.fec_termino)
            .bind(&new.ot)
            .bind(new.num_factura)
            .bind(new.costo_servicio)
            .bind(&new.imagen_url)
            .fetch_one(&mut *tx)
            .await;

        match inserted {
            Ok(record) => {
                tx.commit().await?;
                Ok(InsertOutcome::Inserted(record))
            }
            // Índice único parcial sobre mantenciones activas, si existe
            Err(e) if is_unique_violation(&e) => {
                tx.rollback().await?;
                Ok(InsertOutcome::ActiveService {
                    mantencion: true,
                    combustible: false,
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn update_fields(
        &self,
        id: i32,
        changes: &MaintenanceChanges,
    ) -> AppResult<Option<MaintenanceRecord>> {
        let sql = format!(
            r#"
            UPDATE mantencion SET
                maquina_id = COALESCE($2, maquina_id),
                taller_id = COALESCE($3, taller_id),
                tipo_mantencion_id = COALESCE($4, tipo_mantencion_id),
                fec_inicio = COALESCE($5, fec_inicio),
                fec_termino = COALESCE($6, fec_termino),
                ot = COALESCE($7, ot),
                num_factura = COALESCE($8, num_factura),
                costo_servicio = COALESCE($9, costo_servicio),
                descripcion = COALESCE($10, descripcion)
            WHERE id = $1 AND estado = true
            RETURNING {}
            "#,
            MAINTENANCE_COLUMNS
        );
        let record = sqlx::query_as::<_, MaintenanceRecord>(&sql)
            .bind(id)
            .bind(changes.maquina_id)
            .bind(changes.taller_id)
            .bind(changes.tipo_mantencion_id)
            .bind(changes.fec_inicio)
            .bind(changes.fec_termino)
            .bind(&changes.ot)
            .bind(changes.num_factura)
            .bind(changes.costo_servicio)
            .bind(&changes.descripcion)
            .fetch_optional(&self.pool)
            .await?;

        Ok(record)
    }

    async fn set_approval(
        &self,
        id: i32,
        approval: Approval,
    ) -> AppResult<Option<MaintenanceRecord>> {
        let sql = format!(
            r#"
            UPDATE mantencion
            SET aprobada = $2, aprobador_id = $3, fecha_aprobacion = $4
            WHERE id = $1 AND estado = true
            RETURNING {}
            "#,
            MAINTENANCE_COLUMNS
        );
        let record = sqlx::query_as::<_, MaintenanceRecord>(&sql)
            .bind(id)
            .bind(approval.aprobada)
            .bind(approval.aprobador_id)
            .bind(approval.fecha_aprobacion)
            .fetch_optional(&self.pool)
            .await?;

        Ok(record)
    }

    async fn set_state(
        &self,
        id: i32,
        estado_mantencion_id: i32,
    ) -> AppResult<Option<MaintenanceRecord>> {
        let sql = format!(
            "UPDATE mantencion SET estado_mantencion_id = $2 WHERE id = $1 AND estado = true RETURNING {}",
            MAINTENANCE_COLUMNS
        );
        let record = sqlx::query_as::<_, MaintenanceRecord>(&sql)
            .bind(id)
            .bind(estado_mantencion_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(record)
    }

    async fn soft_delete(&self, id: i32) -> AppResult<bool> {
        let result = sqlx::query("UPDATE mantencion SET estado = false WHERE id = $1 AND estado = true")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
