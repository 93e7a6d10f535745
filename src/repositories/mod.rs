//! Repositorios
//!
//! Cada repositorio es un trait async con una implementación PostgreSQL
//! (`Pg*`). Los servicios dependen sólo de los traits.

pub mod alert_repository;
pub mod catalog_repository;
pub mod existence_repository;
pub mod logbook_repository;
pub mod maintenance_repository;

pub use alert_repository::{AlertRepository, PgAlertRepository};
pub use catalog_repository::{CatalogRepository, PgCatalogRepository};
pub use existence_repository::{ExistenceRepository, PgExistenceRepository};
pub use logbook_repository::{LogbookRepository, PgLogbookRepository, ScheduledBatch};
pub use maintenance_repository::{MaintenanceRepository, PgMaintenanceRepository};
