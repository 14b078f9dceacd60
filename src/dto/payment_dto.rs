use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::Payment;
use crate::services::{SettledPayment, WebhookNotice};

// Pago tal como lo ve el cliente. La URL solo se expone mientras el pago está pendiente.
#[derive(Debug, Serialize)]
pub struct PaymentSummary {
    pub payment_id: Uuid,
    pub status: String,
    pub invoice_issued: bool,
    pub payment_url: Option<String>,
}

impl From<&Payment> for PaymentSummary {
    fn from(payment: &Payment) -> Self {
        let pending = !payment.status.is_terminal();
        Self {
            payment_id: payment.id,
            status: payment.status.as_str().to_string(),
            invoice_issued: payment.invoice.url().is_some(),
            payment_url: payment
                .invoice
                .url()
                .filter(|_| pending)
                .map(str::to_string),
        }
    }
}

// Cuerpo del webhook del gateway. Los campos ausentes llegan vacíos y los rechaza la conciliación.
#[derive(Debug, Deserialize)]
pub struct WebhookPayload {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub external_id: String,
    #[serde(default)]
    pub payment_method: String,
    #[serde(default, with = "rust_decimal::serde::float")]
    pub paid_amount: Decimal,
    #[serde(default)]
    pub status: String,
}

impl From<WebhookPayload> for WebhookNotice {
    fn from(payload: WebhookPayload) -> Self {
        Self {
            invoice_id: payload.id,
            external_id: payload.external_id,
            payment_method: payload.payment_method,
            paid_amount: payload.paid_amount,
            status: payload.status,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    pub message: String,
    pub payment: SettledPayment,
}
