//! Cola de notificaciones por correo
//!
//! Las operaciones de negocio solo encolan; un worker independiente de la petición
//! HTTP consume la cola y envía. Un fallo de envío se registra y nunca afecta al
//! resultado de la operación que lo originó.

use std::sync::Arc;

use chrono::NaiveDate;
use html_escape::{encode_double_quoted_attribute, encode_text};
use rust_decimal::Decimal;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;

use crate::clients::{EmailNotification, MailTransport};

/// Extremo productor de la cola. Barato de clonar.
#[derive(Clone)]
pub struct NotificationQueue {
    sender: mpsc::Sender<EmailNotification>,
}

impl NotificationQueue {
    /// Crea la cola acotada y devuelve el receptor para el worker
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<EmailNotification>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self { sender }, receiver)
    }

    /// Encola sin bloquear. Si la cola está llena o cerrada el correo se descarta.
    pub fn enqueue(&self, email: EmailNotification) {
        match self.sender.try_send(email) {
            Ok(()) => {}
            Err(TrySendError::Full(email)) => {
                log::warn!("⚠️ Cola de correos llena, se descarta '{}' para {}", email.subject, email.to);
            }
            Err(TrySendError::Closed(email)) => {
                log::warn!("⚠️ Cola de correos cerrada, se descarta '{}' para {}", email.subject, email.to);
            }
        }
    }
}

/// Consumidor de la cola
pub struct NotificationWorker {
    receiver: mpsc::Receiver<EmailNotification>,
    transport: Arc<dyn MailTransport>,
}

impl NotificationWorker {
    pub fn new(receiver: mpsc::Receiver<EmailNotification>, transport: Arc<dyn MailTransport>) -> Self {
        Self { receiver, transport }
    }

    /// Procesa correos hasta que se cierran todos los productores y la cola queda vacía
    pub async fn run(mut self) {
        log::info!("📬 Worker de notificaciones iniciado");
        let mut sent = 0usize;
        let mut failed = 0usize;

        while let Some(email) = self.receiver.recv().await {
            match self.transport.send(&email).await {
                Ok(()) => {
                    sent += 1;
                    log::debug!("📧 Correo '{}' enviado a {}", email.subject, email.to);
                }
                Err(e) => {
                    failed += 1;
                    log::error!("❌ Error enviando '{}' a {}: {}", email.subject, email.to, e);
                }
            }
        }

        log::info!("📭 Worker de notificaciones detenido ({} enviados, {} fallidos)", sent, failed);
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }
}

pub fn welcome_email(to: &str, name: &str) -> EmailNotification {
    EmailNotification {
        to: to.to_string(),
        subject: "Welcome to car rental app!".to_string(),
        html_body: format!(
            "<h1>Hi {}, welcome to car rental app!</h1>",
            encode_text(name)
        ),
    }
}

pub fn booking_email(
    to: &str,
    car_name: &str,
    start_date: NaiveDate,
    end_date: NaiveDate,
    total_price: Decimal,
    payment_url: &str,
) -> EmailNotification {
    EmailNotification {
        to: to.to_string(),
        subject: "You've made a booking!".to_string(),
        html_body: format!(
            "<h1>Booking details</h1>\
             <p>Car: {}</p>\
             <p>Start date: {}</p>\
             <p>End date: {}</p>\
             <p>Total price: IDR {}</p>\
             <p>Complete your payment here: <a href=\"{url}\">{url}</a></p>",
            encode_text(car_name),
            start_date.format("%Y-%m-%d"),
            end_date.format("%Y-%m-%d"),
            total_price.round(),
            url = encode_double_quoted_attribute(payment_url),
        ),
    }
}

pub fn payment_received_email(to: &str) -> EmailNotification {
    EmailNotification {
        to: to.to_string(),
        subject: "Payment received!".to_string(),
        html_body: "<h1>We have received your payment, enjoy your drive!</h1>".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::MailError;
    use async_trait::async_trait;
    use tokio::sync::Mutex;

    #[derive(Default)]
    struct RecordingTransport {
        sent: Mutex<Vec<EmailNotification>>,
    }

    #[async_trait]
    impl MailTransport for RecordingTransport {
        async fn send(&self, email: &EmailNotification) -> Result<(), MailError> {
            self.sent.lock().await.push(email.clone());
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_worker_drains_queue_on_close() {
        let transport = Arc::new(RecordingTransport::default());
        let (queue, receiver) = NotificationQueue::channel(8);
        let handle = NotificationWorker::new(receiver, transport.clone()).spawn();

        queue.enqueue(welcome_email("a@example.com", "Ana"));
        queue.enqueue(payment_received_email("b@example.com"));
        drop(queue);
        handle.await.unwrap();

        let sent = transport.sent.lock().await;
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].subject, "Welcome to car rental app!");
        assert_eq!(sent[1].to, "b@example.com");
    }

    #[tokio::test]
    async fn test_full_queue_drops_without_blocking() {
        let (queue, mut receiver) = NotificationQueue::channel(1);
        queue.enqueue(payment_received_email("a@example.com"));
        queue.enqueue(payment_received_email("b@example.com"));

        assert_eq!(receiver.recv().await.unwrap().to, "a@example.com");
        drop(queue);
        assert!(receiver.recv().await.is_none());
    }

    #[test]
    fn test_booking_email_contents() {
        let email = booking_email(
            "c@example.com",
            "Toyota Avanza",
            NaiveDate::from_ymd_opt(2024, 9, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 9, 3).unwrap(),
            Decimal::from(600_000),
            "https://pay.example/inv-1",
        );
        assert_eq!(email.subject, "You've made a booking!");
        assert!(email.html_body.contains("Toyota Avanza"));
        assert!(email.html_body.contains("2024-09-03"));
        assert!(email.html_body.contains("IDR 600000"));
        assert!(email.html_body.contains("https://pay.example/inv-1"));
    }

    #[test]
    fn test_welcome_email_escapes_name() {
        let email = welcome_email("d@example.com", "<script>alert(1)</script> & co");
        assert!(!email.html_body.contains("<script>"));
        assert!(email
            .html_body
            .contains("&lt;script&gt;alert(1)&lt;/script&gt; &amp; co"));
        assert!(email.html_body.starts_with("<h1>Hi "));
    }
}
