//! Transportes de correo
//!
//! `SmtpMailTransport` envía por SMTP con lettre; `LogMailTransport` solo deja
//! constancia en el log (desarrollo o SMTP sin configurar).

use async_trait::async_trait;
use lettre::{
    message::header::ContentType, transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use thiserror::Error;

use crate::config::MailConfig;

/// Correo HTML listo para enviar
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailNotification {
    pub to: String,
    pub subject: String,
    pub html_body: String,
}

#[derive(Error, Debug)]
pub enum MailError {
    #[error("invalid address: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("could not build message: {0}")]
    Message(#[from] lettre::error::Error),

    #[error("smtp error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
}

#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, email: &EmailNotification) -> Result<(), MailError>;
}

pub struct SmtpMailTransport {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: String,
}

impl SmtpMailTransport {
    pub fn new(host: &str, config: &MailConfig) -> Result<Self, MailError> {
        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)?
            .port(config.port)
            .credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ))
            .build();

        Ok(Self {
            mailer,
            from: config.from.clone(),
        })
    }
}

#[async_trait]
impl MailTransport for SmtpMailTransport {
    async fn send(&self, email: &EmailNotification) -> Result<(), MailError> {
        let message = Message::builder()
            .from(self.from.parse()?)
            .to(email.to.parse()?)
            .subject(email.subject.clone())
            .header(ContentType::TEXT_HTML)
            .body(email.html_body.clone())?;

        self.mailer.send(message).await?;
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct LogMailTransport;

#[async_trait]
impl MailTransport for LogMailTransport {
    async fn send(&self, email: &EmailNotification) -> Result<(), MailError> {
        log::info!("📧 [mail] to={} subject={:?}", email.to, email.subject);
        log::debug!("📧 [mail] body: {}", email.html_body);
        Ok(())
    }
}
