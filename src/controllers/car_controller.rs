use uuid::Uuid;

use crate::dto::vehicle_dto::{AvailabilityQuery, AvailabilityResponse, CarResponse, ListCarsQuery};
use crate::services::AvailabilityService;
use crate::state::AppState;
use crate::utils::errors::AppError;
use crate::utils::validation::{parse_date_window, parse_optional_window};

pub struct CarController {
    availability: AvailabilityService,
}

impl CarController {
    pub fn new(state: &AppState) -> Self {
        Self {
            availability: state.availability.clone(),
        }
    }

    pub async fn list(&self, query: ListCarsQuery) -> Result<Vec<CarResponse>, AppError> {
        let window = parse_optional_window(query.start_date.as_deref(), query.end_date.as_deref())?;

        let cars = self
            .availability
            .list_available(window, &query.filters())
            .await?
            .into_iter()
            .map(CarResponse::from)
            .collect();

        Ok(cars)
    }

    pub async fn availability(
        &self,
        car_id: Uuid,
        query: AvailabilityQuery,
    ) -> Result<AvailabilityResponse, AppError> {
        let window = parse_date_window(&query.start_date, &query.end_date)?;
        let available = self.availability.is_available(car_id, window).await?;

        Ok(AvailabilityResponse {
            car_id,
            start_date: query.start_date,
            end_date: query.end_date,
            available,
        })
    }
}
