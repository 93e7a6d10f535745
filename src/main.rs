use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use dotenvy::dotenv;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fleet_maintenance::clients::{HttpMailer, HttpObjectStorage, HttpPdfRenderer};
use fleet_maintenance::config::{DatabaseConfig, EnvironmentConfig};
use fleet_maintenance::database::DatabaseConnection;
use fleet_maintenance::realtime::SessionRegistry;
use fleet_maintenance::repositories::{
    PgAlertRepository, PgCatalogRepository, PgExistenceRepository, PgLogbookRepository,
    PgMaintenanceRepository,
};
use fleet_maintenance::routes::create_router;
use fleet_maintenance::services::{AppServices, ServiceDeps, WorkflowCatalog};
use fleet_maintenance::state::AppState;

const DEFAULT_LOG_FILTER: &str = "fleet_maintenance=info,tower_http=info";

fn init_tracing(log_json: bool) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(DEFAULT_LOG_FILTER));

    if log_json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Cargar variables de entorno
    dotenv().ok();

    let config = EnvironmentConfig::from_env().context("configuración inválida")?;
    init_tracing(config.log_json);

    info!("🔧 Fleet Maintenance API");
    info!(environment = %config.environment, "================================================");

    let database = DatabaseConnection::connect(&DatabaseConfig::from_environment(&config))
        .await
        .context("no se pudo conectar a PostgreSQL")?;
    let pool = database.pool().clone();

    let catalog = Arc::new(PgCatalogRepository::new(pool.clone()));
    // El catálogo del flujo debe estar completo antes de aceptar requests
    let workflow = WorkflowCatalog::resolve(catalog.as_ref())
        .await
        .context("catálogo de mantenciones")?;

    let sessions = SessionRegistry::new();
    let services = AppServices::new(
        ServiceDeps {
            existence: Arc::new(PgExistenceRepository::new(pool.clone())),
            catalog,
            maintenance: Arc::new(PgMaintenanceRepository::new(pool.clone())),
            logbooks: Arc::new(PgLogbookRepository::new(pool.clone())),
            alerts: Arc::new(PgAlertRepository::new(pool.clone())),
            mailer: Arc::new(HttpMailer::new(
                config.mail_api_url.clone(),
                config.mail_api_key.clone(),
                config.mail_from.clone(),
            )?),
            pdf: Arc::new(HttpPdfRenderer::new(config.pdf_render_url.clone())?),
            storage: Arc::new(HttpObjectStorage::new(
                config.storage_upload_url.clone(),
                config.storage_public_url.clone(),
            )?),
            push: Arc::new(sessions.clone()),
            frontend_url: config.frontend_url.clone(),
            notification_timeout: config.notification_timeout,
        },
        workflow,
    );

    let addr: SocketAddr = config
        .server_url()
        .parse()
        .with_context(|| format!("dirección inválida: {}", config.server_url()))?;
    let app = create_router(AppState::new(config, services, sessions));

    info!("🌐 Servidor iniciando en http://{}", addr);
    info!("🔍 Endpoints disponibles:");
    info!("   POST   /api/mantenciones - Crear mantención (multipart)");
    info!("   GET    /api/mantenciones/:id - Obtener mantención");
    info!("   PUT    /api/mantenciones/:id - Actualizar mantención");
    info!("   DELETE /api/mantenciones/:id - Eliminar mantención");
    info!("   POST   /api/mantenciones/periodicas - Lote de mantenciones periódicas");
    info!("   PATCH  /api/mantenciones/:id/aprobacion - Alternar aprobación");
    info!("   PATCH  /api/mantenciones/:id/estado - Cambiar estado");
    info!("   PATCH  /api/mantenciones/:id/en-proceso - Pasar a En Proceso");
    info!("   GET    /api/alertas/usuario/:usuario_id - Alertas de un usuario");
    info!("   PATCH  /api/alertas/:alerta_id/leida - Marcar alerta leída");
    info!("   GET    /ws?usuario_id=N - Alertas en vivo");
    info!("   GET    /health, /metrics");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("❌ Error del servidor: {}", e);
        return Err(e.into());
    }

    info!("👋 Servidor terminado");
    Ok(())
}

/// Señal de apagado graceful
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("❌ No se pudo escuchar Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("❌ No se pudo escuchar SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("🛑 Señal Ctrl+C recibida, apagando servidor...");
        },
        _ = terminate => {
            info!("🛑 Señal de terminación recibida, apagando servidor...");
        },
    }
}
