use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::VehicleFilters;
use crate::services::VehicleAvailability;

// Query de listado: ventana opcional (ambas fechas o ninguna) + filtros
#[derive(Debug, Default, Deserialize)]
pub struct ListCarsQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub seats: Option<i32>,
    pub transmission: Option<String>,
    pub manufacturer: Option<String>,
    #[serde(rename = "type")]
    pub vehicle_type: Option<String>,
}

impl ListCarsQuery {
    pub fn filters(&self) -> VehicleFilters {
        VehicleFilters {
            seats: self.seats,
            transmission: self.transmission.clone(),
            manufacturer: self.manufacturer.clone(),
            vehicle_type: self.vehicle_type.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
    pub start_date: String,
    pub end_date: String,
}

#[derive(Debug, Serialize)]
pub struct CarResponse {
    pub id: Uuid,
    pub manufacturer: String,
    pub model: String,
    pub year: i32,
    #[serde(rename = "type")]
    pub vehicle_type: String,
    pub seats: i32,
    pub transmission: String,
    pub wheel_drive: i32,
    #[serde(with = "rust_decimal::serde::float")]
    pub rate_per_day: Decimal,
    pub stock: i64,
    pub remaining: i64,
}

impl From<VehicleAvailability> for CarResponse {
    fn from(item: VehicleAvailability) -> Self {
        let vehicle = item.vehicle;
        Self {
            id: vehicle.id,
            manufacturer: vehicle.manufacturer,
            model: vehicle.model,
            year: vehicle.year,
            vehicle_type: vehicle.vehicle_type,
            seats: vehicle.seats,
            transmission: vehicle.transmission,
            wheel_drive: vehicle.wheel_drive,
            rate_per_day: vehicle.rate_per_day,
            stock: vehicle.stock,
            remaining: item.remaining,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AvailabilityResponse {
    pub car_id: Uuid,
    pub start_date: String,
    pub end_date: String,
    pub available: bool,
}
