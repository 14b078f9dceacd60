//! Servicio de disponibilidad
//!
//! Solo lectura: combina el motor de solapamiento con el stock de cada vehículo.

use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use crate::models::{Vehicle, VehicleFilters};
use crate::repositories::BookingRepository;
use crate::services::overlap::{self, DateWindow};
use crate::utils::errors::{not_found_error, AppResult};

/// Vehículo con sus unidades comprometidas y restantes para una ventana
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct VehicleAvailability {
    pub vehicle: Vehicle,
    pub committed: i64,
    pub remaining: i64,
}

#[derive(Clone)]
pub struct AvailabilityService {
    repository: Arc<dyn BookingRepository>,
}

impl AvailabilityService {
    pub fn new(repository: Arc<dyn BookingRepository>) -> Self {
        Self { repository }
    }

    /// Vehículos que cumplen los filtros y a los que les queda al menos una unidad.
    ///
    /// Sin ventana se cuentan todas las reservas existentes, no "cualquier fecha":
    /// es el modo conservador del listado general.
    pub async fn list_available(
        &self,
        window: Option<DateWindow>,
        filters: &VehicleFilters,
    ) -> AppResult<Vec<VehicleAvailability>> {
        let vehicles = self.repository.list_vehicles(filters).await?;
        let reservations = self.repository.reservation_windows(None, window).await?;
        let counts = overlap::overlap_counts(window.as_ref(), &reservations);

        let available = vehicles
            .into_iter()
            .filter_map(|vehicle| {
                let committed = counts.get(&vehicle.id).copied().unwrap_or(0);
                let remaining = vehicle.stock - committed;
                (remaining > 0).then_some(VehicleAvailability {
                    vehicle,
                    committed,
                    remaining,
                })
            })
            .collect::<Vec<_>>();

        log::debug!(
            "🚗 {} vehículos disponibles para {:?}",
            available.len(),
            window
        );
        Ok(available)
    }

    /// `true` si quedan unidades del vehículo en toda la ventana
    pub async fn is_available(&self, vehicle_id: Uuid, window: DateWindow) -> AppResult<bool> {
        let vehicle = self
            .repository
            .find_vehicle(vehicle_id)
            .await?
            .ok_or_else(|| not_found_error("Vehicle", &vehicle_id.to_string()))?;

        self.has_capacity(&vehicle, window).await
    }

    pub(crate) async fn has_capacity(&self, vehicle: &Vehicle, window: DateWindow) -> AppResult<bool> {
        let reservations = self
            .repository
            .reservation_windows(Some(vehicle.id), Some(window))
            .await?;
        let committed = overlap::overlap_count_for(vehicle.id, Some(&window), &reservations);

        Ok(committed < vehicle.stock)
    }
}
