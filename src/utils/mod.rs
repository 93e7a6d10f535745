//! Utilidades del sistema
//!
//! Este módulo contiene utilidades para manejo de errores, validación
//! y escapado de HTML.

pub mod errors;
pub mod html;
pub mod validation;
