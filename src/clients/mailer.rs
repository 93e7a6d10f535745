use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Serialize;
use tracing::debug;

use super::{ensure_success, http_client, ClientError};

#[derive(Debug, Clone, PartialEq)]
pub struct Attachment {
    pub filename: String,
    pub content_type: String,
    pub content: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub text: String,
    pub html: String,
    pub attachments: Vec<Attachment>,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<(), ClientError>;
}

#[derive(Serialize)]
struct MailApiAttachment<'a> {
    filename: &'a str,
    content_type: &'a str,
    /// Contenido en base64
    content: String,
}

#[derive(Serialize)]
struct MailApiRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    text: &'a str,
    html: &'a str,
    attachments: Vec<MailApiAttachment<'a>>,
}

/// Envío de correo a través de una API HTTP transaccional
pub struct HttpMailer {
    client: reqwest::Client,
    api_url: String,
    api_key: Option<String>,
    from: String,
}

impl HttpMailer {
    pub fn new(api_url: String, api_key: Option<String>, from: String) -> Result<Self, ClientError> {
        Ok(Self {
            client: http_client()?,
            api_url,
            api_key,
            from,
        })
    }
}

fn build_request<'a>(from: &'a str, message: &'a EmailMessage) -> MailApiRequest<'a> {
    MailApiRequest {
        from,
        to: [message.to.as_str()],
        subject: &message.subject,
        text: &message.text,
        html: &message.html,
        attachments: message
            .attachments
            .iter()
            .map(|a| MailApiAttachment {
                filename: &a.filename,
                content_type: &a.content_type,
                content: STANDARD.encode(&a.content),
            })
            .collect(),
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, message: &EmailMessage) -> Result<(), ClientError> {
        debug!(to = %message.to, subject = %message.subject, "📧 Enviando correo");

        let mut request = self
            .client
            .post(&self.api_url)
            .json(&build_request(&self.from, message));
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        ensure_success("mail", response).await?;
        Ok(())
    }
}
