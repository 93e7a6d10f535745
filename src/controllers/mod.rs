//! Controllers
//!
//! Traducen los DTO de entrada en llamadas a los servicios y envuelven el
//! resultado en `ApiResponse`.

pub mod alert_controller;
pub mod maintenance_controller;

pub use alert_controller::AlertController;
pub use maintenance_controller::{BatchReply, MaintenanceController};
