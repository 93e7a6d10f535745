//! Modelos del sistema
//!
//! Este módulo contiene los modelos de datos que mapean al schema PostgreSQL
//! (tablas en español, borrado lógico con la columna `estado`).

pub mod alert;
pub mod catalog;
pub mod logbook;
pub mod maintenance;
