//! Métricas Prometheus
//!
//! Resultado de cada entrega del fan-out y de cada compensación del lote
//! periódico. Se exponen en `/metrics`.

use lazy_static::lazy_static;
use prometheus::{register_int_counter_vec, Encoder, IntCounterVec, TextEncoder};

lazy_static! {
    pub static ref NOTIFICATION_DELIVERIES: IntCounterVec = register_int_counter_vec!(
        "notification_deliveries_total",
        "Entregas de notificaciones por canal y resultado",
        &["channel", "outcome"]
    )
    .unwrap();
    pub static ref BATCH_COMPENSATIONS: IntCounterVec = register_int_counter_vec!(
        "maintenance_batch_compensations_total",
        "Pares del lote periódico revertidos tras una falla",
        &["outcome"]
    )
    .unwrap();
}

pub fn record_delivery(channel: &str, outcome: &str) {
    NOTIFICATION_DELIVERIES
        .with_label_values(&[channel, outcome])
        .inc();
}

pub fn record_compensation(outcome: &str, pares: usize) {
    BATCH_COMPENSATIONS
        .with_label_values(&[outcome])
        .inc_by(pares as u64);
}

/// Todas las métricas registradas en formato de texto
pub fn render() -> String {
    let mut buffer = Vec::new();
    let encoder = TextEncoder::new();
    if let Err(e) = encoder.encode(&prometheus::gather(), &mut buffer) {
        tracing::error!("❌ Error codificando métricas: {}", e);
    }
    String::from_utf8(buffer).unwrap_or_default()
}
