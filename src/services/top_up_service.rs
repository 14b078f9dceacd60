//! Recargas de saldo
//!
//! Misma mecánica que una reserva: recarga + pago `Unpaid` en una escritura y
//! luego la factura. No hay stock que comprobar.

use std::sync::Arc;

use rust_decimal::Decimal;

use crate::models::{Payment, TopUp, User};
use crate::repositories::BookingRepository;
use crate::services::invoice_service::{top_up_description, InvoiceService};
use crate::utils::errors::{invalid_input_error, AppResult};

#[derive(Clone)]
pub struct TopUpService {
    repository: Arc<dyn BookingRepository>,
    invoices: InvoiceService,
}

impl TopUpService {
    pub fn new(repository: Arc<dyn BookingRepository>, invoices: InvoiceService) -> Self {
        Self {
            repository,
            invoices,
        }
    }

    pub async fn top_up(&self, customer: &User, amount: Decimal) -> AppResult<(TopUp, Payment)> {
        if amount <= Decimal::ZERO {
            return Err(invalid_input_error("amount must be greater than 0"));
        }

        let (top_up, payment) = self.repository.create_top_up(customer.id, amount).await?;
        log::info!("💳 Recarga {} de {} creada para {}", top_up.id, amount, customer.email);

        let payment = self
            .invoices
            .issue(&payment, amount, top_up_description(amount), &customer.email)
            .await?;

        Ok((top_up, payment))
    }
}
