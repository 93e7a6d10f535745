//! Utilidades de validación
//!
//! Este módulo contiene el acumulador de errores y los parsers de los campos
//! que llegan como texto (formularios multipart) o como JSON flexible.

use std::borrow::Cow;
use std::str::FromStr;

use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::Decimal;
use serde::Deserialize;
use validator::{ValidationError, ValidationErrors};

use super::errors::AppError;

/// Formato de fecha aceptado por la API
pub const FECHA_FORMAT: &str = "%d-%m-%Y";

lazy_static! {
    static ref FECHA_REGEX: Regex = Regex::new(r"^\d{2}-\d{2}-\d{4}$").unwrap();
}

/// Acumula mensajes de validación sin detenerse en el primero.
#[derive(Debug, Default)]
pub struct ErrorCollector {
    errors: Vec<String>,
}

impl ErrorCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    pub fn extend(&mut self, messages: impl IntoIterator<Item = String>) {
        self.errors.extend(messages);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Registra el error de un parser y devuelve el valor si fue válido
    pub fn check<T>(&mut self, result: Result<T, ValidationError>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(error) => {
                self.push(describe(&error));
                None
            }
        }
    }

    /// `Ok(())` si no hubo errores, o todos los mensajes como `AppError::Validation`
    pub fn finish(self) -> Result<(), AppError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(self.errors))
        }
    }
}

/// Número que puede llegar como número JSON o como texto
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum NumberOrText {
    Number(serde_json::Number),
    Text(String),
}

impl NumberOrText {
    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            NumberOrText::Number(n) => Cow::Owned(n.to_string()),
            NumberOrText::Text(s) => Cow::Borrowed(s.as_str()),
        }
    }
}

fn error_with(code: &'static str, message: String, value: &str) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.add_param("value".into(), &value.to_string());
    error.message = Some(Cow::Owned(message));
    error
}

fn describe(error: &ValidationError) -> String {
    error
        .message
        .as_ref()
        .map(|m| m.to_string())
        .unwrap_or_else(|| error.code.to_string())
}

/// Validar y convertir una fecha `dd-mm-yyyy`
pub fn parse_fecha(field: &str, value: &str) -> Result<NaiveDate, ValidationError> {
    let trimmed = value.trim();
    if !FECHA_REGEX.is_match(trimmed) {
        return Err(error_with(
            "fecha",
            format!("{} debe tener el formato dd-mm-yyyy", field),
            value,
        ));
    }
    NaiveDate::parse_from_str(trimmed, FECHA_FORMAT).map_err(|_| {
        error_with("fecha", format!("{} no es una fecha válida", field), value)
    })
}

/// Validar un identificador numérico positivo
pub fn parse_id(field: &str, value: &str) -> Result<i32, ValidationError> {
    match value.trim().parse::<i32>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(error_with(
            "id",
            format!("{} debe ser un identificador numérico", field),
            value,
        )),
    }
}

/// Validar un monto numérico no negativo
pub fn parse_decimal(field: &str, value: &str) -> Result<Decimal, ValidationError> {
    match Decimal::from_str(value.trim()) {
        Ok(amount) if !amount.is_sign_negative() => Ok(amount),
        _ => Err(error_with(
            "numeric",
            format!("{} debe ser numérico", field),
            value,
        )),
    }
}

/// Validar un número entero (por ejemplo, número de factura)
pub fn parse_integer(field: &str, value: &str) -> Result<i64, ValidationError> {
    value.trim().parse::<i64>().map_err(|_| {
        error_with("numeric", format!("{} debe ser numérico", field), value)
    })
}

/// Largo máximo de la orden de trabajo
pub const OT_MAX_LEN: usize = 50;

/// Validar la orden de trabajo: requerida y de a lo más `OT_MAX_LEN` caracteres
pub fn parse_ot(value: &str) -> Result<String, ValidationError> {
    let ot = value.trim();
    if ot.is_empty() {
        return Err(error_with("not_empty", "ot es requerido".to_string(), value));
    }
    if ot.chars().count() > OT_MAX_LEN {
        return Err(error_with(
            "length",
            format!("ot no puede superar {} caracteres", OT_MAX_LEN),
            value,
        ));
    }
    Ok(ot.to_string())
}

/// Aplana `ValidationErrors` del derive en mensajes legibles, ordenados por campo
pub fn flatten_validation_errors(errors: &ValidationErrors) -> Vec<String> {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by_key(|(field, _)| *field);
    fields
        .into_iter()
        .flat_map(|(field, errors)| {
            errors.iter().map(move |error| match &error.message {
                Some(message) => message.to_string(),
                None => format!("{} no es válido ({})", field, error.code),
            })
        })
        .collect()
}
