//! Orquestador de reservas
//!
//! Flujo: validar fechas -> comprobar disponibilidad -> reservar (reserva + pago en
//! una sola escritura, con recuento bajo cerrojo) -> emitir factura -> encolar el
//! correo de confirmación. Si la factura falla la reserva queda persistida y el
//! cliente recibe `Upstream` con los ids necesarios para reintentar.

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::json;
use uuid::Uuid;

use crate::models::{NewRental, Payment, Rental, User, Vehicle};
use crate::repositories::BookingRepository;
use crate::services::availability_service::AvailabilityService;
use crate::services::invoice_service::{rental_description, InvoiceService};
use crate::services::notification_service::{booking_email, NotificationQueue};
use crate::services::overlap::DateWindow;
use crate::utils::errors::{not_found_error, AppError, AppResult};

pub const CAR_NOT_AVAILABLE: &str = "car is not available";

/// Etapas de una reserva
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStage {
    Validated,
    Reserved,
    Invoiced,
    Confirmed,
    /// Reserva persistida, factura sin emitir
    InvoiceFailed,
}

/// Resultado de una reserva confirmada
#[derive(Debug, Clone)]
pub struct BookingConfirmation {
    pub rental: Rental,
    pub payment: Payment,
    pub vehicle: Vehicle,
    pub stage: BookingStage,
}

/// Días facturables: horas / 24 redondeado hacia arriba, mínimo un día.
///
/// Con fechas de calendario sale `end - start`, así que 01..03 son 2 días y una
/// reserva del mismo día cuenta como 1.
pub fn rental_days(window: &DateWindow) -> i64 {
    let hours = (window.end - window.start).num_hours();
    let days = (hours + 23).div_euclid(24);
    days.max(1)
}

pub fn rental_price(rate_per_day: Decimal, window: &DateWindow) -> Decimal {
    rate_per_day * Decimal::from(rental_days(window))
}

#[derive(Clone)]
pub struct BookingService {
    repository: Arc<dyn BookingRepository>,
    availability: AvailabilityService,
    invoices: InvoiceService,
    notifications: NotificationQueue,
}

impl BookingService {
    pub fn new(
        repository: Arc<dyn BookingRepository>,
        invoices: InvoiceService,
        notifications: NotificationQueue,
    ) -> Self {
        Self {
            availability: AvailabilityService::new(repository.clone()),
            repository,
            invoices,
            notifications,
        }
    }

    /// Reserva `vehicle_id` para `window` a nombre de `customer`
    pub async fn book(
        &self,
        customer: &User,
        vehicle_id: Uuid,
        window: DateWindow,
    ) -> AppResult<BookingConfirmation> {
        let mut stage = BookingStage::Validated;
        log::debug!("📅 Reserva {:?}: vehículo {} {:?}", stage, vehicle_id, window);

        let vehicle = self
            .repository
            .find_vehicle(vehicle_id)
            .await?
            .ok_or_else(|| not_found_error("Vehicle", &vehicle_id.to_string()))?;

        // Rechazo temprano sin escribir nada; la comprobación definitiva se repite
        // dentro de `reserve` bajo cerrojo.
        if !self.availability.has_capacity(&vehicle, window).await? {
            log::info!("🚫 Vehículo {} sin stock para {:?}", vehicle.id, window);
            return Err(AppError::Conflict(CAR_NOT_AVAILABLE.to_string()));
        }

        let total_price = rental_price(vehicle.rate_per_day, &window);
        let (rental, payment) = self
            .repository
            .reserve(NewRental {
                user_id: customer.id,
                vehicle_id: vehicle.id,
                start_date: window.start,
                end_date: window.end,
                total_price,
            })
            .await?;
        stage = BookingStage::Reserved;
        log::info!(
            "✅ Reserva {} creada ({:?}) para {}, total {}",
            rental.id,
            stage,
            customer.email,
            total_price
        );

        let issued = self
            .invoices
            .issue(
                &payment,
                rental.total_price,
                rental_description(&vehicle.display_name(), rental.start_date, rental.end_date),
                &customer.email,
            )
            .await;
        let payment = match issued {
            Ok(payment) => payment,
            Err(e) => {
                stage = BookingStage::InvoiceFailed;
                log::warn!("⚠️ Reserva {} retenida sin factura ({:?})", rental.id, stage);
                return Err(with_booking_stage(e, stage));
            }
        };
        stage = BookingStage::Invoiced;

        if let Some(url) = payment.invoice.url() {
            self.notifications.enqueue(booking_email(
                &customer.email,
                &vehicle.display_name(),
                rental.start_date,
                rental.end_date,
                rental.total_price,
                url,
            ));
        }
        log::debug!("📨 Reserva {} {:?}, correo encolado", rental.id, stage);

        Ok(BookingConfirmation {
            rental,
            payment,
            vehicle,
            stage: BookingStage::Confirmed,
        })
    }
}

fn with_booking_stage(error: AppError, stage: BookingStage) -> AppError {
    match error {
        AppError::Upstream {
            message,
            details: Some(mut details),
        } => {
            details["booking_stage"] = json!(stage);
            AppError::Upstream {
                message,
                details: Some(details),
            }
        }
        other => other,
    }
}
