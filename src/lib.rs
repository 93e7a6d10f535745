//! Backend de mantenciones de flota
//!
//! Ciclo de vida de las mantenciones (creación, lote periódico, aprobación,
//! estados y eliminación lógica) y fan-out de notificaciones por alerta
//! persistida, correo con PDF y push websocket.

pub mod clients;
pub mod config;
pub mod controllers;
pub mod database;
pub mod dto;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod realtime;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod state;
pub mod utils;

#[cfg(test)]
pub mod testing;
