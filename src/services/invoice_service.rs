//! Emisión de facturas para pagos `Unpaid`
//!
//! La compra y su pago ya están persistidos cuando se llama al gateway. Si el
//! gateway falla o no responde a tiempo el pago queda en `InvoiceState::NotIssued`
//! y se puede reintentar con `reissue`.

use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;
use serde_json::json;
use uuid::Uuid;

use crate::clients::{InvoiceError, InvoiceGateway, InvoiceRequest};
use crate::models::{Payment, PaymentStatus, PurchaseRef, User};
use crate::repositories::BookingRepository;
use crate::services::purchase_service::resolve_purchase_owner;
use crate::utils::errors::{not_found_error, AppError, AppResult};

/// Etapa de emisión en la que se produjo un fallo
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvoiceStage {
    Gateway,
    AttachUrl,
}

impl InvoiceStage {
    fn as_str(&self) -> &'static str {
        match self {
            InvoiceStage::Gateway => "invoice_gateway",
            InvoiceStage::AttachUrl => "attach_invoice_url",
        }
    }
}

pub fn rental_description(car_name: &str, start: chrono::NaiveDate, end: chrono::NaiveDate) -> String {
    format!(
        "Renting {}, from: {} to {}",
        car_name,
        start.format("%Y-%m-%d"),
        end.format("%Y-%m-%d")
    )
}

pub fn top_up_description(amount: Decimal) -> String {
    format!("Top up IDR {}", amount.round())
}

#[derive(Clone)]
pub struct InvoiceService {
    repository: Arc<dyn BookingRepository>,
    gateway: Arc<dyn InvoiceGateway>,
    timeout: Duration,
}

impl InvoiceService {
    pub fn new(
        repository: Arc<dyn BookingRepository>,
        gateway: Arc<dyn InvoiceGateway>,
        timeout: Duration,
    ) -> Self {
        Self {
            repository,
            gateway,
            timeout,
        }
    }

    /// Pide la factura y guarda su URL en el pago.
    ///
    /// Devuelve `Upstream` con el id del pago y de la compra en `details`, tanto si
    /// falla el gateway como si falla guardar la URL.
    pub async fn issue(
        &self,
        payment: &Payment,
        amount: Decimal,
        description: String,
        customer_email: &str,
    ) -> AppResult<Payment> {
        let request = InvoiceRequest {
            payment_id: payment.id,
            amount,
            description,
            customer_email: customer_email.to_string(),
        };

        let url = match tokio::time::timeout(self.timeout, self.gateway.create_invoice(&request)).await
        {
            Ok(Ok(url)) => url,
            Ok(Err(e)) => return Err(upstream(payment, InvoiceStage::Gateway, &e)),
            Err(_) => {
                return Err(upstream(
                    payment,
                    InvoiceStage::Gateway,
                    &InvoiceError::Timeout(self.timeout),
                ))
            }
        };

        match self.repository.attach_invoice_url(payment.id, &url).await {
            Ok(updated) => {
                log::info!("🧾 Factura emitida para pago {}", payment.id);
                Ok(updated)
            }
            Err(e) => Err(upstream(payment, InvoiceStage::AttachUrl, &e)),
        }
    }

    /// Reintenta la factura de un pago propio que sigue `Unpaid` y sin URL.
    ///
    /// Un pago de otro cliente se trata como inexistente.
    pub async fn reissue(&self, user: &User, payment_id: Uuid) -> AppResult<Payment> {
        let payment = self
            .repository
            .find_payment(payment_id)
            .await?
            .ok_or_else(|| not_found_error("Payment", &payment_id.to_string()))?;

        let owner = resolve_purchase_owner(self.repository.as_ref(), payment.purchase).await?;
        if owner.map(|o| o.id) != Some(user.id) {
            return Err(not_found_error("Payment", &payment_id.to_string()));
        }

        if payment.status != PaymentStatus::Unpaid {
            return Err(AppError::Conflict("payment already updated".to_string()));
        }
        if !payment.awaiting_invoice() {
            return Err(AppError::Conflict("invoice already issued".to_string()));
        }

        let (amount, description) = self.describe(payment.purchase).await?;
        log::info!("🔁 Reintentando factura para pago {}", payment.id);
        self.issue(&payment, amount, description, &user.email).await
    }

    async fn describe(&self, purchase: PurchaseRef) -> AppResult<(Decimal, String)> {
        match purchase {
            PurchaseRef::Rental(rental_id) => {
                let rental = self
                    .repository
                    .find_rental(rental_id)
                    .await?
                    .ok_or_else(|| not_found_error("Rental", &rental_id.to_string()))?;
                let vehicle = self
                    .repository
                    .find_vehicle(rental.vehicle_id)
                    .await?
                    .ok_or_else(|| not_found_error("Vehicle", &rental.vehicle_id.to_string()))?;
                Ok((
                    rental.total_price,
                    rental_description(&vehicle.display_name(), rental.start_date, rental.end_date),
                ))
            }
            PurchaseRef::TopUp(top_up_id) => {
                let top_up = self
                    .repository
                    .find_top_up(top_up_id)
                    .await?
                    .ok_or_else(|| not_found_error("TopUp", &top_up_id.to_string()))?;
                Ok((top_up.amount, top_up_description(top_up.amount)))
            }
        }
    }
}

fn upstream(payment: &Payment, stage: InvoiceStage, cause: &dyn std::fmt::Display) -> AppError {
    log::error!(
        "❌ Fallo en {} para pago {}: {}",
        stage.as_str(),
        payment.id,
        cause
    );
    let purchase_key = match payment.purchase {
        PurchaseRef::Rental(_) => "rental_id",
        PurchaseRef::TopUp(_) => "top_up_id",
    };

    let mut details = json!({
        "payment_id": payment.id,
        "stage": stage.as_str(),
    });
    details[purchase_key] = json!(payment.purchase.id());

    AppError::Upstream {
        message: "failed to create payment invoice".to_string(),
        details: Some(details),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptions() {
        let start = chrono::NaiveDate::from_ymd_opt(2024, 9, 1).unwrap();
        let end = chrono::NaiveDate::from_ymd_opt(2024, 9, 3).unwrap();
        assert_eq!(
            rental_description("Toyota Avanza", start, end),
            "Renting Toyota Avanza, from: 2024-09-01 to 2024-09-03"
        );
        assert_eq!(top_up_description(Decimal::from(50_000)), "Top up IDR 50000");
    }

    #[test]
    fn test_upstream_details() {
        let rental_id = Uuid::new_v4();
        let payment = Payment::new_unpaid(PurchaseRef::Rental(rental_id));
        let err = upstream(&payment, InvoiceStage::Gateway, &"boom");

        match err {
            AppError::Upstream { details: Some(details), .. } => {
                assert_eq!(details["rental_id"], rental_id.to_string());
                assert_eq!(details["payment_id"], payment.id.to_string());
                assert_eq!(details["stage"], "invoice_gateway");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
