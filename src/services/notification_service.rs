//! Fan-out de notificaciones
//!
//! Una notificación inserta una sola alerta compartida y luego entrega a cada
//! destinatario por tres canales independientes: vínculo `usuario_alerta`,
//! correo (con adjuntos) y push websocket. Las entregas corren en paralelo,
//! cada una con su propio plazo; la falla de un destinatario o de un canal no
//! detiene a los demás. Sólo la inserción de la alerta se propaga al llamador.

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::clients::{Attachment, EmailMessage, Mailer};
use crate::metrics;
use crate::models::alert::{
    Alert, AlertType, AudienceFilter, NotificationRecipient, PushPayload, UserAlertView,
};
use crate::realtime::LivePush;
use crate::repositories::AlertRepository;
use crate::utils::errors::{AppError, AppResult};
use crate::utils::html::escape_html;

/// Parte de correo de una notificación
#[derive(Debug, Clone)]
pub struct EmailContent {
    pub subject: String,
    /// Ruta relativa al frontend para el botón del correo
    pub redirect_path: String,
    pub button_text: String,
    pub attachments: Vec<Attachment>,
}

#[derive(Debug, Clone)]
pub struct Notification {
    pub contenido: String,
    pub tipo: AlertType,
    pub recipients: Vec<NotificationRecipient>,
    pub email: EmailContent,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "lowercase")]
pub enum DeliveryStatus {
    Delivered,
    Skipped,
    Failed(String),
}

impl DeliveryStatus {
    fn outcome_label(&self) -> &'static str {
        match self {
            DeliveryStatus::Delivered => "ok",
            DeliveryStatus::Skipped => "skipped",
            DeliveryStatus::Failed(_) => "error",
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, DeliveryStatus::Failed(_))
    }
}

/// Resultado por destinatario
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecipientOutcome {
    pub usuario_id: Option<i32>,
    pub email: Option<String>,
    pub link: DeliveryStatus,
    pub mail: DeliveryStatus,
    pub push: DeliveryStatus,
}

impl RecipientOutcome {
    fn pending(recipient: &NotificationRecipient) -> Self {
        Self {
            usuario_id: recipient.usuario_id,
            email: recipient.email.clone(),
            link: DeliveryStatus::Skipped,
            mail: DeliveryStatus::Skipped,
            push: DeliveryStatus::Skipped,
        }
    }

    pub fn has_failures(&self) -> bool {
        self.link.is_failed() || self.mail.is_failed() || self.push.is_failed()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DispatchReport {
    pub alerta_id: i32,
    pub outcomes: Vec<RecipientOutcome>,
}

impl DispatchReport {
    pub fn failed_recipients(&self) -> usize {
        self.outcomes.iter().filter(|o| o.has_failures()).count()
    }
}

pub struct NotificationService {
    alerts: Arc<dyn AlertRepository>,
    mailer: Arc<dyn Mailer>,
    push: Arc<dyn LivePush>,
    frontend_url: String,
    recipient_timeout: Duration,
}

/// HTML del correo de alerta con botón de llamada a la acción
pub fn render_alert_email(contenido: &str, redirect_url: &str, button_text: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<body style="font-family: Arial, sans-serif; background: #f4f4f4; padding: 24px;">
  <div style="max-width: 560px; margin: 0 auto; background: #ffffff; padding: 24px; border-radius: 6px;">
    <h2 style="color: #1f3b57;">Notificación de mantención</h2>
    <p style="font-size: 14px; color: #333333;">{}</p>
    <p style="text-align: center; margin-top: 24px;">
      <a href="{}" style="background: #1f6feb; color: #ffffff; padding: 10px 18px; text-decoration: none; border-radius: 4px;">{}</a>
    </p>
  </div>
</body>
</html>"#,
        escape_html(contenido),
        escape_html(redirect_url),
        escape_html(button_text)
    )
}

/// Clave de deduplicación: correo normalizado o, si falta, el usuario
fn dedup_key(recipient: &NotificationRecipient) -> Option<String> {
    match (&recipient.email, recipient.usuario_id) {
        (Some(email), _) if !email.trim().is_empty() => Some(email.trim().to_lowercase()),
        (_, Some(usuario_id)) => Some(format!("usuario:{}", usuario_id)),
        _ => None,
    }
}

impl NotificationService {
    pub fn new(
        alerts: Arc<dyn AlertRepository>,
        mailer: Arc<dyn Mailer>,
        push: Arc<dyn LivePush>,
        frontend_url: String,
        recipient_timeout: Duration,
    ) -> Self {
        Self {
            alerts,
            mailer,
            push,
            frontend_url,
            recipient_timeout,
        }
    }

    pub async fn resolve_audience(
        &self,
        filter: &AudienceFilter,
    ) -> AppResult<Vec<NotificationRecipient>> {
        self.alerts.resolve_audience(filter).await
    }

    /// Inserta la alerta y la entrega a todos los destinatarios
    pub async fn dispatch(&self, notification: Notification) -> AppResult<DispatchReport> {
        let alert = self
            .alerts
            .insert_alert(&notification.contenido, notification.tipo)
            .await?;

        let mut seen = HashSet::new();
        let recipients: Vec<NotificationRecipient> = notification
            .recipients
            .into_iter()
            .filter(|r| dedup_key(r).map(|key| seen.insert(key)).unwrap_or(false))
            .collect();

        let redirect_url = format!("{}{}", self.frontend_url, notification.email.redirect_path);
        let html = render_alert_email(
            &alert.contenido,
            &redirect_url,
            &notification.email.button_text,
        );
        let text = format!("{}\n\n{}: {}", alert.contenido, notification.email.button_text, redirect_url);
        let payload = PushPayload::from_alert(&alert);

        let deliveries = recipients.iter().map(|recipient| {
            let message = recipient.email.as_ref().map(|to| EmailMessage {
                to: to.clone(),
                subject: notification.email.subject.clone(),
                text: text.clone(),
                html: html.clone(),
                attachments: notification.email.attachments.clone(),
            });
            self.deliver(&alert, recipient, message, &payload)
        });
        let outcomes = join_all(deliveries).await;

        let report = DispatchReport {
            alerta_id: alert.id,
            outcomes,
        };
        self.record(&report);
        Ok(report)
    }

    /// Resuelve la audiencia y despacha; cualquier falla queda sólo en el log
    pub async fn notify_best_effort(
        &self,
        filter: &AudienceFilter,
        contenido: String,
        tipo: AlertType,
        email: EmailContent,
    ) -> Option<DispatchReport> {
        let recipients = match self.resolve_audience(filter).await {
            Ok(recipients) => recipients,
            Err(e) => {
                error!(?filter, "❌ No se pudo resolver la audiencia: {}", e);
                return None;
            }
        };

        let notification = Notification {
            contenido,
            tipo,
            recipients,
            email,
        };
        match self.dispatch(notification).await {
            Ok(report) => Some(report),
            Err(e) => {
                error!("❌ No se pudo registrar la alerta: {}", e);
                None
            }
        }
    }

    pub async fn alerts_for_user(&self, usuario_id: i32) -> AppResult<Vec<UserAlertView>> {
        self.alerts.alerts_for_user(usuario_id).await
    }

    pub async fn mark_read(&self, alerta_id: i32) -> AppResult<()> {
        if self.alerts.mark_read(alerta_id).await? {
            Ok(())
        } else {
            Err(AppError::NotFound(format!("Alerta con id {} no existe", alerta_id)))
        }
    }

    /// Aplica el plazo por canal; al vencer sólo ese canal queda fallido
    async fn within<F>(&self, canal: &str, alerta_id: i32, delivery: F) -> DeliveryStatus
    where
        F: Future<Output = DeliveryStatus>,
    {
        match tokio::time::timeout(self.recipient_timeout, delivery).await {
            Ok(status) => status,
            Err(_) => {
                warn!(alerta_id, canal, "⏱️ Entrega cancelada por timeout");
                DeliveryStatus::Failed(format!("timeout tras {:?}", self.recipient_timeout))
            }
        }
    }

    /// Vínculo, correo y push de un destinatario corren en paralelo
    async fn deliver(
        &self,
        alert: &Alert,
        recipient: &NotificationRecipient,
        message: Option<EmailMessage>,
        payload: &PushPayload,
    ) -> RecipientOutcome {
        let mut outcome = RecipientOutcome::pending(recipient);
        let usuario_id = recipient.usuario_id;

        let link = async {
            let Some(usuario_id) = usuario_id else {
                return DeliveryStatus::Skipped;
            };
            match self.alerts.link_user(alert.id, usuario_id).await {
                Ok(()) => DeliveryStatus::Delivered,
                Err(e) => {
                    warn!(alerta_id = alert.id, usuario_id, "⚠️ No se pudo vincular la alerta: {}", e);
                    DeliveryStatus::Failed(e.to_string())
                }
            }
        };

        let mail = async {
            let Some(message) = message else {
                return DeliveryStatus::Skipped;
            };
            match self.mailer.send(&message).await {
                Ok(()) => DeliveryStatus::Delivered,
                Err(e) => {
                    warn!(alerta_id = alert.id, email = %message.to, "⚠️ Falló el envío de correo: {}", e);
                    DeliveryStatus::Failed(e.to_string())
                }
            }
        };

        let push = async {
            let Some(usuario_id) = usuario_id else {
                return DeliveryStatus::Skipped;
            };
            match self.push.emit(usuario_id, payload).await {
                Ok(_) => DeliveryStatus::Delivered,
                Err(e) => {
                    warn!(alerta_id = alert.id, usuario_id, "⚠️ Falló el push: {}", e);
                    DeliveryStatus::Failed(e.to_string())
                }
            }
        };

        let (link, mail, push) = tokio::join!(
            self.within("usuario_alerta", alert.id, link),
            self.within("email", alert.id, mail),
            self.within("push", alert.id, push),
        );
        outcome.link = link;
        outcome.mail = mail;
        outcome.push = push;
        outcome
    }

    fn record(&self, report: &DispatchReport) {
        for outcome in &report.outcomes {
            metrics::record_delivery("usuario_alerta", outcome.link.outcome_label());
            metrics::record_delivery("email", outcome.mail.outcome_label());
            metrics::record_delivery("push", outcome.push.outcome_label());
        }

        let failed = report.failed_recipients();
        if failed > 0 {
            warn!(
                alerta_id = report.alerta_id,
                destinatarios = report.outcomes.len(),
                fallidos = failed,
                "⚠️ Alerta despachada con fallas parciales"
            );
        } else {
            info!(
                alerta_id = report.alerta_id,
                destinatarios = report.outcomes.len(),
                "📣 Alerta despachada"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{RecordingMailer, RecordingPush, InMemoryStore};

    fn recipient(usuario_id: i32, email: &str) -> NotificationRecipient {
        NotificationRecipient {
            usuario_id: Some(usuario_id),
            email: Some(email.to_string()),
            rol: "ADMINISTRADOR".to_string(),
            empresa_id: Some(1),
        }
    }

    fn notification(recipients: Vec<NotificationRecipient>) -> Notification {
        Notification {
            contenido: "Nueva mantención registrada".to_string(),
            tipo: AlertType::Mantencion,
            recipients,
            email: EmailContent {
                subject: "Nueva mantención".to_string(),
                redirect_path: "/mantenciones/1".to_string(),
                button_text: "Ver mantención".to_string(),
                attachments: vec![Attachment {
                    filename: "mantencion-1.pdf".to_string(),
                    content_type: "application/pdf".to_string(),
                    content: b"%PDF".to_vec(),
                }],
            },
        }
    }

    fn service(
        store: Arc<InMemoryStore>,
        mailer: Arc<RecordingMailer>,
        push: Arc<RecordingPush>,
        timeout: Duration,
    ) -> NotificationService {
        NotificationService::new(store, mailer, push, "https://flota.test".to_string(), timeout)
    }

    #[tokio::test]
    async fn test_one_failing_email_does_not_stop_other_recipients() {
        let store = Arc::new(InMemoryStore::seeded());
        let mailer = Arc::new(RecordingMailer::default());
        mailer.fail_for("dos@empresa.cl");
        let push = Arc::new(RecordingPush::default());
        let service = service(store.clone(), mailer.clone(), push.clone(), Duration::from_secs(5));

        let report = service
            .dispatch(notification(vec![
                recipient(1, "uno@empresa.cl"),
                recipient(2, "dos@empresa.cl"),
                recipient(3, "tres@empresa.cl"),
            ]))
            .await
            .unwrap();

        assert!(report.alerta_id > 0);
        assert_eq!(mailer.sent_to(), vec!["uno@empresa.cl", "tres@empresa.cl"]);
        assert_eq!(push.pushed_to(), vec![1, 2, 3]);
        assert_eq!(store.user_alert_links(report.alerta_id), vec![1, 2, 3]);

        assert_eq!(report.failed_recipients(), 1);
        assert!(report.outcomes[1].mail.is_failed());
        assert_eq!(report.outcomes[1].push, DeliveryStatus::Delivered);
    }

    #[tokio::test]
    async fn test_duplicate_emails_are_processed_once() {
        let store = Arc::new(InMemoryStore::seeded());
        let mailer = Arc::new(RecordingMailer::default());
        let push = Arc::new(RecordingPush::default());
        let service = service(store.clone(), mailer.clone(), push, Duration::from_secs(5));

        let report = service
            .dispatch(notification(vec![
                recipient(1, "uno@empresa.cl"),
                recipient(1, " UNO@empresa.cl "),
            ]))
            .await
            .unwrap();

        assert_eq!(report.outcomes.len(), 1);
        assert_eq!(mailer.sent_to().len(), 1);
        assert_eq!(store.alert_count(), 1);
    }

    #[tokio::test]
    async fn test_email_carries_attachment_and_link() {
        let store = Arc::new(InMemoryStore::seeded());
        let mailer = Arc::new(RecordingMailer::default());
        let push = Arc::new(RecordingPush::default());
        let service = service(store, mailer.clone(), push, Duration::from_secs(5));

        service
            .dispatch(notification(vec![recipient(1, "uno@empresa.cl")]))
            .await
            .unwrap();

        let sent = mailer.messages();
        assert_eq!(sent[0].attachments.len(), 1);
        assert!(sent[0].html.contains("https://flota.test/mantenciones/1"));
        assert!(sent[0].html.contains("Ver mantención"));
    }

    #[tokio::test]
    async fn test_slow_recipient_times_out_alone() {
        let store = Arc::new(InMemoryStore::seeded());
        let mailer = Arc::new(RecordingMailer::default());
        mailer.hang_for("lento@empresa.cl");
        let push = Arc::new(RecordingPush::default());
        let service = service(store, mailer.clone(), push, Duration::from_millis(50));

        let report = service
            .dispatch(notification(vec![
                recipient(1, "lento@empresa.cl"),
                recipient(2, "rapido@empresa.cl"),
            ]))
            .await
            .unwrap();

        assert!(report.outcomes[0].mail.is_failed());
        assert_eq!(report.outcomes[1].mail, DeliveryStatus::Delivered);
        assert_eq!(mailer.sent_to(), vec!["rapido@empresa.cl"]);
    }

    #[tokio::test]
    async fn test_hung_email_does_not_block_link_or_push() {
        let store = Arc::new(InMemoryStore::seeded());
        let mailer = Arc::new(RecordingMailer::default());
        mailer.hang_for("lento@empresa.cl");
        let push = Arc::new(RecordingPush::default());
        let service = service(store.clone(), mailer, push.clone(), Duration::from_millis(50));

        let report = service
            .dispatch(notification(vec![recipient(1, "lento@empresa.cl")]))
            .await
            .unwrap();

        let outcome = &report.outcomes[0];
        assert!(outcome.mail.is_failed());
        assert_eq!(outcome.link, DeliveryStatus::Delivered);
        assert_eq!(outcome.push, DeliveryStatus::Delivered);
        assert_eq!(push.pushed_to(), vec![1]);
        assert_eq!(store.user_alert_links(report.alerta_id), vec![1]);
    }

    #[tokio::test]
    async fn test_alert_insert_failure_is_propagated() {
        let store = Arc::new(InMemoryStore::seeded());
        store.fail_alert_insert();
        let mailer = Arc::new(RecordingMailer::default());
        let push = Arc::new(RecordingPush::default());
        let service = service(store, mailer.clone(), push, Duration::from_secs(5));

        let result = service
            .dispatch(notification(vec![recipient(1, "uno@empresa.cl")]))
            .await;

        assert!(result.is_err());
        assert!(mailer.sent_to().is_empty());
    }

    #[tokio::test]
    async fn test_recipient_without_user_only_gets_email() {
        let store = Arc::new(InMemoryStore::seeded());
        let mailer = Arc::new(RecordingMailer::default());
        let push = Arc::new(RecordingPush::default());
        let service = service(store, mailer.clone(), push.clone(), Duration::from_secs(5));

        let external = NotificationRecipient {
            usuario_id: None,
            email: Some("externo@taller.cl".to_string()),
            rol: "EXTERNO".to_string(),
            empresa_id: None,
        };
        let report = service.dispatch(notification(vec![external])).await.unwrap();

        assert_eq!(report.outcomes[0].link, DeliveryStatus::Skipped);
        assert_eq!(report.outcomes[0].mail, DeliveryStatus::Delivered);
        assert!(push.pushed_to().is_empty());
    }

    #[test]
    fn test_render_alert_email_escapes_content() {
        let html = render_alert_email("OT <1>", "https://flota.test/x?a=1&b=2", "Ver");
        assert!(html.contains("OT &lt;1&gt;"));
        assert!(html.contains("https://flota.test/x?a=1&amp;b=2"));
    }
}
