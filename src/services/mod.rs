//! Services module
//!
//! Este módulo contiene la lógica de negocio del ciclo de vida de las
//! mantenciones y del fan-out de notificaciones. Los servicios dependen sólo
//! de los traits de `repositories`, `clients` y `realtime`.

pub mod approval_service;
pub mod existence_validator;
pub mod maintenance_service;
pub mod notification_service;
pub mod periodic_batch_service;
pub mod status_service;
pub mod workflow_catalog;

use std::sync::Arc;
use std::time::Duration;

use crate::clients::{Mailer, ObjectStorage, PdfRenderer};
use crate::realtime::LivePush;
use crate::repositories::{
    AlertRepository, CatalogRepository, ExistenceRepository, LogbookRepository,
    MaintenanceRepository,
};

pub use approval_service::ApprovalService;
pub use existence_validator::ExistenceValidator;
pub use maintenance_service::MaintenanceService;
pub use notification_service::{DispatchReport, NotificationService};
pub use periodic_batch_service::{BatchOutcome, CompensationReport, PeriodicBatchService};
pub use status_service::StatusService;
pub use workflow_catalog::WorkflowCatalog;

/// Dependencias con las que se arman los servicios
pub struct ServiceDeps {
    pub existence: Arc<dyn ExistenceRepository>,
    pub catalog: Arc<dyn CatalogRepository>,
    pub maintenance: Arc<dyn MaintenanceRepository>,
    pub logbooks: Arc<dyn LogbookRepository>,
    pub alerts: Arc<dyn AlertRepository>,
    pub mailer: Arc<dyn Mailer>,
    pub pdf: Arc<dyn PdfRenderer>,
    pub storage: Arc<dyn ObjectStorage>,
    pub push: Arc<dyn LivePush>,
    pub frontend_url: String,
    pub notification_timeout: Duration,
}

/// Servicios compartidos por todos los handlers
#[derive(Clone)]
pub struct AppServices {
    pub maintenance: Arc<MaintenanceService>,
    pub batches: Arc<PeriodicBatchService>,
    pub approvals: Arc<ApprovalService>,
    pub status: Arc<StatusService>,
    pub notifications: Arc<NotificationService>,
}

impl AppServices {
    pub fn new(deps: ServiceDeps, workflow: WorkflowCatalog) -> Self {
        let validator = Arc::new(ExistenceValidator::new(deps.existence));
        let notifications = Arc::new(NotificationService::new(
            deps.alerts,
            deps.mailer,
            deps.push,
            deps.frontend_url,
            deps.notification_timeout,
        ));

        Self {
            maintenance: Arc::new(MaintenanceService::new(
                validator.clone(),
                deps.maintenance.clone(),
                deps.catalog.clone(),
                deps.storage,
                deps.pdf,
                notifications.clone(),
                workflow,
            )),
            batches: Arc::new(PeriodicBatchService::new(
                validator.clone(),
                deps.catalog.clone(),
                deps.logbooks,
                notifications.clone(),
                workflow,
            )),
            approvals: Arc::new(ApprovalService::new(deps.maintenance.clone(), deps.catalog)),
            status: Arc::new(StatusService::new(validator, deps.maintenance, workflow)),
            notifications,
        }
    }
}
