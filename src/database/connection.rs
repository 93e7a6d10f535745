//! Conexión a PostgreSQL
//!
//! Abre el pool a partir de `DatabaseConfig` y verifica que responda antes de
//! que el servidor acepte requests.

use sqlx::PgPool;
use tracing::info;

use crate::config::DatabaseConfig;

pub struct DatabaseConnection {
    pool: PgPool,
}

impl DatabaseConnection {
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, sqlx::Error> {
        info!(
            url = %mask_database_url(&config.url),
            max_connections = config.max_connections,
            "🗄️ Conectando a PostgreSQL"
        );
        let pool = config.create_pool().await?;
        let connection = Self { pool };
        connection.ping().await?;
        info!("✅ Conexión a PostgreSQL establecida");
        Ok(connection)
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn ping(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Enmascara usuario y contraseña de la URL para los logs
fn mask_database_url(url: &str) -> String {
    match (url.find("://"), url.rfind('@')) {
        (Some(scheme_end), Some(at_pos)) if at_pos > scheme_end => {
            format!("{}***:***@{}", &url[..scheme_end + 3], &url[at_pos + 1..])
        }
        _ => url.to_string(),
    }
}
