//! Modelo de Rental (reserva) y TopUp (recarga de saldo)

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// Reserva de un vehículo por días completos, ambos extremos incluidos
#[derive(Debug, Clone, Serialize, FromRow, PartialEq)]
pub struct Rental {
    pub id: Uuid,
    pub user_id: Uuid,
    pub vehicle_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub total_price: Decimal,
}

/// Datos de una reserva todavía no persistida
#[derive(Debug, Clone)]
pub struct NewRental {
    pub user_id: Uuid,
    pub vehicle_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub total_price: Decimal,
}

#[derive(Debug, Clone, Serialize, FromRow, PartialEq)]
pub struct TopUp {
    pub id: Uuid,
    pub user_id: Uuid,
    pub amount: Decimal,
}
