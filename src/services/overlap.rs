//! Motor de solapamiento de intervalos
//!
//! Funciones puras sobre ventanas de fechas de reservas. Una reserva que cubre el
//! día D ocupa la unidad durante todo el día D, así que ambos extremos son inclusivos.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::Serialize;
use uuid::Uuid;

use crate::utils::errors::AppError;

/// Rango de fechas `[start, end]`, ambos incluidos
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, AppError> {
        if end < start {
            return Err(AppError::InvalidInput(
                "end date cannot be before start date".to_string(),
            ));
        }
        Ok(Self { start, end })
    }

    /// `a.start <= b.end AND b.start <= a.end`
    pub fn overlaps(&self, other: &DateWindow) -> bool {
        self.start <= other.end && other.start <= self.end
    }
}

/// Ventana ocupada por una reserva existente
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::FromRow)]
pub struct ReservationWindow {
    pub vehicle_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl ReservationWindow {
    pub fn window(&self) -> DateWindow {
        DateWindow {
            start: self.start_date,
            end: self.end_date,
        }
    }
}

/// Cuenta, por vehículo, las reservas que se solapan con `query`.
///
/// Sin ventana se cuentan todas las reservas (compromiso total). Los vehículos sin
/// reservas no aparecen en el mapa; quien llama debe tratar la ausencia como cero.
pub fn overlap_counts(
    query: Option<&DateWindow>,
    reservations: &[ReservationWindow],
) -> HashMap<Uuid, i64> {
    let mut counts = HashMap::new();
    for reservation in reservations {
        let hit = match query {
            Some(window) => reservation.window().overlaps(window),
            None => true,
        };
        if hit {
            *counts.entry(reservation.vehicle_id).or_insert(0) += 1;
        }
    }
    counts
}

/// Solapamientos para un único vehículo
pub fn overlap_count_for(
    vehicle_id: Uuid,
    query: Option<&DateWindow>,
    reservations: &[ReservationWindow],
) -> i64 {
    overlap_counts(query, reservations)
        .get(&vehicle_id)
        .copied()
        .unwrap_or(0)
}
