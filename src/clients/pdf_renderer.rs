//! Renderizado de resúmenes PDF
//!
//! El HTML de la tabla se arma aquí; la conversión a PDF la hace un servicio
//! externo. Un valor nulo se muestra siempre como `n/a`.

use async_trait::async_trait;
use serde::Serialize;
use tracing::debug;

use super::{ensure_success, http_client, ClientError};
use crate::utils::html::escape_html;

/// Valor mostrado en las celdas sin dato
pub const EMPTY_CELL: &str = "n/a";

/// Fila plana clave/valor; el orden de las celdas define las columnas
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PdfRow {
    pub cells: Vec<(String, Option<String>)>,
}

impl PdfRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cell(mut self, key: &str, value: Option<String>) -> Self {
        self.cells.push((key.to_string(), value));
        self
    }

    /// Valores tal como se imprimen
    pub fn rendered_values(&self) -> Vec<String> {
        self.cells
            .iter()
            .map(|(_, value)| match value {
                Some(v) if !v.is_empty() => v.clone(),
                _ => EMPTY_CELL.to_string(),
            })
            .collect()
    }
}

/// HTML de una tabla con los encabezados de la primera fila
pub fn render_table_html(title: &str, rows: &[PdfRow]) -> String {
    let mut html = String::new();
    html.push_str("<!DOCTYPE html><html><head><meta charset=\"utf-8\"><style>");
    html.push_str("body{font-family:Arial,sans-serif;font-size:11px}");
    html.push_str("table{border-collapse:collapse;width:100%}");
    html.push_str("th,td{border:1px solid #999;padding:4px;text-align:left}");
    html.push_str("th{background:#e8e8e8}");
    html.push_str("</style></head><body>");
    html.push_str(&format!("<h2>{}</h2>", escape_html(title)));
    html.push_str("<table><thead><tr>");

    if let Some(first) = rows.first() {
        for (key, _) in &first.cells {
            html.push_str(&format!("<th>{}</th>", escape_html(key)));
        }
    }
    html.push_str("</tr></thead><tbody>");

    for row in rows {
        html.push_str("<tr>");
        for value in row.rendered_values() {
            html.push_str(&format!("<td>{}</td>", escape_html(&value)));
        }
        html.push_str("</tr>");
    }

    html.push_str("</tbody></table></body></html>");
    html
}

#[async_trait]
pub trait PdfRenderer: Send + Sync {
    async fn render(&self, title: &str, rows: &[PdfRow]) -> Result<Vec<u8>, ClientError>;
}

#[derive(Serialize)]
struct RenderRequest<'a> {
    html: &'a str,
    landscape: bool,
}

/// Conversión HTML a PDF mediante un servicio HTTP
pub struct HttpPdfRenderer {
    client: reqwest::Client,
    render_url: String,
}

impl HttpPdfRenderer {
    pub fn new(render_url: String) -> Result<Self, ClientError> {
        Ok(Self {
            client: http_client()?,
            render_url,
        })
    }
}

#[async_trait]
impl PdfRenderer for HttpPdfRenderer {
    async fn render(&self, title: &str, rows: &[PdfRow]) -> Result<Vec<u8>, ClientError> {
        let html = render_table_html(title, rows);
        debug!(rows = rows.len(), "📄 Renderizando PDF");

        let response = self
            .client
            .post(&self.render_url)
            .json(&RenderRequest {
                html: &html,
                landscape: true,
            })
            .send()
            .await?;

        let response = ensure_success("pdf", response).await?;
        Ok(response.bytes().await?.to_vec())
    }
}
