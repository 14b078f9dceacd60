use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::dto::payment_dto::PaymentSummary;
use crate::models::{Payment, Rental};
use crate::services::BookingConfirmation;

// Request para reservar un coche
#[derive(Debug, Deserialize, Validate)]
pub struct CreateRentalRequest {
    pub car_id: Uuid,
    #[validate(length(min = 1, message = "start_date is required"))]
    pub start_date: String,
    #[validate(length(min = 1, message = "end_date is required"))]
    pub end_date: String,
}

#[derive(Debug, Serialize)]
pub struct RentalResponse {
    pub rental_id: Uuid,
    pub car_id: Uuid,
    pub car_name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_price: Decimal,
    pub payment: PaymentSummary,
}

impl RentalResponse {
    pub fn new(rental: &Rental, payment: &Payment, car_name: String) -> Self {
        Self {
            rental_id: rental.id,
            car_id: rental.vehicle_id,
            car_name,
            start_date: rental.start_date,
            end_date: rental.end_date,
            total_price: rental.total_price,
            payment: PaymentSummary::from(payment),
        }
    }
}

impl From<&BookingConfirmation> for RentalResponse {
    fn from(confirmation: &BookingConfirmation) -> Self {
        Self::new(
            &confirmation.rental,
            &confirmation.payment,
            confirmation.vehicle.display_name(),
        )
    }
}
