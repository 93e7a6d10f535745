use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;

use crate::models::alert::{Alert, AlertType, AudienceFilter, NotificationRecipient, UserAlertView};
use crate::models::catalog::PRIVILEGED_ROLES;
use crate::utils::errors::AppResult;

#[async_trait]
pub trait AlertRepository: Send + Sync {
    async fn insert_alert(&self, contenido: &str, tipo: AlertType) -> AppResult<Alert>;

    async fn link_user(&self, alerta_id: i32, usuario_id: i32) -> AppResult<()>;

    /// Usuarios activos que cumplen todos los filtros presentes
    async fn resolve_audience(&self, filter: &AudienceFilter)
        -> AppResult<Vec<NotificationRecipient>>;

    async fn alerts_for_user(&self, usuario_id: i32) -> AppResult<Vec<UserAlertView>>;

    async fn mark_read(&self, alerta_id: i32) -> AppResult<bool>;
}

pub struct PgAlertRepository {
    pool: PgPool,
}

impl PgAlertRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AlertRepository for PgAlertRepository {
    async fn insert_alert(&self, contenido: &str, tipo: AlertType) -> AppResult<Alert> {
        let alert = sqlx::query_as::<_, Alert>(
            r#"
            INSERT INTO alerta (contenido, tipo, created_at, leida)
            VALUES ($1, $2, $3, false)
            RETURNING id, contenido, tipo, created_at, leida
            "#,
        )
        .bind(contenido)
        .bind(tipo.as_str())
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(alert)
    }

    async fn link_user(&self, alerta_id: i32, usuario_id: i32) -> AppResult<()> {
        sqlx::query("INSERT INTO usuario_alerta (usuario_id, alerta_id, estado) VALUES ($1, $2, true)")
            .bind(usuario_id)
            .bind(alerta_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn resolve_audience(
        &self,
        filter: &AudienceFilter,
    ) -> AppResult<Vec<NotificationRecipient>> {
        let roles: Vec<String> = PRIVILEGED_ROLES.iter().map(|r| r.to_string()).collect();

        let recipients = sqlx::query_as::<_, NotificationRecipient>(
            r#"
            SELECT u.id AS usuario_id, u.email, r.nombre AS rol, p.empresa_id
            FROM usuario u
            JOIN persona p ON p.id = u.persona_id
            JOIN rol r ON r.id = p.rol_id
            WHERE u.estado = true
              AND ($1::text IS NULL OR r.nombre = $1)
              AND ($2::int4 IS NULL OR p.empresa_id = $2)
              AND (NOT $3 OR r.nombre = ANY($4))
            ORDER BY u.id
            "#,
        )
        .bind(&filter.rol)
        .bind(filter.empresa_id)
        .bind(filter.solo_privilegiados)
        .bind(roles)
        .fetch_all(&self.pool)
        .await?;

        Ok(recipients)
    }

    async fn alerts_for_user(&self, usuario_id: i32) -> AppResult<Vec<UserAlertView>> {
        let alerts = sqlx::query_as::<_, UserAlertView>(
            r#"
            SELECT ua.id AS usuario_alerta_id, a.id AS alerta_id, a.contenido, a.tipo,
                   a.created_at, a.leida
            FROM usuario_alerta ua
            JOIN alerta a ON a.id = ua.alerta_id
            WHERE ua.usuario_id = $1 AND ua.estado = true
            ORDER BY a.created_at DESC
            "#,
        )
        .bind(usuario_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(alerts)
    }

    async fn mark_read(&self, alerta_id: i32) -> AppResult<bool> {
        let result = sqlx::query("UPDATE alerta SET leida = true WHERE id = $1")
            .bind(alerta_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
