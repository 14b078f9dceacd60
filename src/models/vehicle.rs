//! Modelo de Vehicle
//!
//! Un vehículo es un tipo de coche con `stock` unidades intercambiables.
//! Para el núcleo de reservas es inmutable.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Vehicle principal - mapea exactamente a la tabla vehicles
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Vehicle {
    pub id: Uuid,
    pub wheel_drive: i32,
    pub vehicle_type: String,
    pub seats: i32,
    pub transmission: String,
    pub manufacturer: String,
    pub model: String,
    pub year: i32,
    pub stock: i64,
    pub rate_per_day: Decimal,
}

impl Vehicle {
    /// Nombre legible, usado en facturas y correos
    pub fn display_name(&self) -> String {
        format!("{} {}", self.manufacturer, self.model)
    }
}

/// Filtros simples para el listado de vehículos
#[derive(Debug, Clone, Default)]
pub struct VehicleFilters {
    /// Mínimo de asientos
    pub seats: Option<i32>,
    pub transmission: Option<String>,
    pub manufacturer: Option<String>,
    pub vehicle_type: Option<String>,
}

impl VehicleFilters {
    pub fn matches(&self, vehicle: &Vehicle) -> bool {
        if let Some(seats) = self.seats {
            if vehicle.seats < seats {
                return false;
            }
        }
        if let Some(transmission) = &self.transmission {
            if !vehicle.transmission.eq_ignore_ascii_case(transmission) {
                return false;
            }
        }
        if let Some(manufacturer) = &self.manufacturer {
            if !vehicle.manufacturer.eq_ignore_ascii_case(manufacturer) {
                return false;
            }
        }
        if let Some(vehicle_type) = &self.vehicle_type {
            if !vehicle.vehicle_type.eq_ignore_ascii_case(vehicle_type) {
                return false;
            }
        }
        true
    }
}
