//! Shared application state
//!
//! Este módulo define el estado compartido de la aplicación que se pasa
//! a través del router de Axum.

use std::sync::Arc;

use crate::config::environment::EnvironmentConfig;
use crate::realtime::SessionRegistry;
use crate::services::AppServices;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<EnvironmentConfig>,
    pub services: AppServices,
    /// Sesiones websocket abiertas; también es el canal de push del fan-out
    pub sessions: SessionRegistry,
}

impl AppState {
    pub fn new(config: EnvironmentConfig, services: AppServices, sessions: SessionRegistry) -> Self {
        Self {
            config: Arc::new(config),
            services,
            sessions,
        }
    }
}
