//! DTOs de la API
//!
//! Formas de entrada y salida de los endpoints HTTP.

pub mod common;
pub mod maintenance_dto;

pub use common::ApiResponse;
