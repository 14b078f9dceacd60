//! Conciliación de pagos (webhook del gateway)
//!
//! `Unpaid -> {Completed | <estado del gateway>}`, ambos terminales. La guarda de
//! idempotencia es la propia escritura condicional del repositorio: solo un
//! escritor puede sacar un pago de `Unpaid`.

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::config::WebhookConfig;
use crate::models::{PaymentSettlement, PaymentStatus};
use crate::repositories::BookingRepository;
use crate::services::notification_service::{payment_received_email, NotificationQueue};
use crate::services::purchase_service::resolve_purchase_owner;
use crate::utils::errors::{invalid_input_error, not_found_error, AppError, AppResult};

pub const PAYMENT_ALREADY_UPDATED: &str = "payment already updated";

/// Notificación del gateway, ya extraída del cuerpo HTTP
#[derive(Debug, Clone)]
pub struct WebhookNotice {
    pub invoice_id: String,
    pub external_id: String,
    pub payment_method: String,
    pub paid_amount: Decimal,
    pub status: String,
}

/// Resumen devuelto al gateway
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SettledPayment {
    pub payment_id: Uuid,
    pub payment_method: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub paid_amount: Decimal,
    pub status: String,
}

#[derive(Clone)]
pub struct ReconciliationService {
    repository: Arc<dyn BookingRepository>,
    webhook: WebhookConfig,
    notifications: NotificationQueue,
}

impl ReconciliationService {
    pub fn new(
        repository: Arc<dyn BookingRepository>,
        webhook: WebhookConfig,
        notifications: NotificationQueue,
    ) -> Self {
        Self {
            repository,
            webhook,
            notifications,
        }
    }

    pub async fn apply_webhook(
        &self,
        caller_token: Option<&str>,
        notice: WebhookNotice,
    ) -> AppResult<SettledPayment> {
        self.authenticate(caller_token)?;

        if notice.payment_method.trim().is_empty() {
            return Err(invalid_input_error("payment_method is required"));
        }
        if notice.paid_amount <= Decimal::ZERO {
            return Err(invalid_input_error("paid_amount must be greater than 0"));
        }
        let status = PaymentStatus::from_gateway(&notice.status)?;
        let payment_id = Uuid::parse_str(notice.external_id.trim())
            .map_err(|_| invalid_input_error("external_id is not a valid payment id"))?;

        let payment = self
            .repository
            .find_payment(payment_id)
            .await?
            .ok_or_else(|| not_found_error("Payment", &payment_id.to_string()))?;

        if payment.status.is_terminal() {
            log::info!(
                "🔁 Webhook repetido para pago {} (estado {})",
                payment.id,
                payment.status.as_str()
            );
            return Err(AppError::Conflict(PAYMENT_ALREADY_UPDATED.to_string()));
        }

        let settlement = PaymentSettlement {
            payment_method: notice.payment_method,
            paid_amount: notice.paid_amount,
            status,
        };

        // Otro webhook pudo ganar la carrera entre la lectura y la escritura
        let updated = self
            .repository
            .settle_payment(payment.id, settlement)
            .await?
            .ok_or_else(|| AppError::Conflict(PAYMENT_ALREADY_UPDATED.to_string()))?;

        log::info!(
            "💰 Pago {} conciliado: {} via {} (factura {})",
            updated.id,
            updated.status.as_str(),
            updated.payment_method,
            notice.invoice_id
        );

        match resolve_purchase_owner(self.repository.as_ref(), updated.purchase).await {
            Ok(Some(owner)) => {
                if updated.status == PaymentStatus::Completed {
                    self.notifications.enqueue(payment_received_email(&owner.email));
                }
            }
            Ok(None) => log::warn!(
                "⚠️ Pago {} sin comprador resoluble ({:?})",
                updated.id,
                updated.purchase
            ),
            Err(e) => log::error!(
                "❌ Error resolviendo comprador del pago {}: {}",
                updated.id,
                e
            ),
        }

        Ok(SettledPayment {
            payment_id: updated.id,
            payment_method: updated.payment_method,
            paid_amount: updated.total_payment,
            status: updated.status.as_str().to_string(),
        })
    }

    fn authenticate(&self, caller_token: Option<&str>) -> AppResult<()> {
        match caller_token {
            Some(token) if !self.webhook.callback_token.is_empty() && token == self.webhook.callback_token => {
                Ok(())
            }
            _ => {
                log::warn!("🔒 Webhook de pagos con token inválido");
                Err(AppError::Unauthorized("invalid callback token".to_string()))
            }
        }
    }
}
