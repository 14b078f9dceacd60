use std::sync::Arc;

use validator::Validate;

use crate::dto::rental_dto::{CreateRentalRequest, RentalResponse};
use crate::dto::ApiResponse;
use crate::models::User;
use crate::repositories::BookingRepository;
use crate::services::BookingService;
use crate::state::AppState;
use crate::utils::errors::AppError;
use crate::utils::validation::parse_date_window;

pub struct RentalController {
    bookings: BookingService,
    repository: Arc<dyn BookingRepository>,
}

impl RentalController {
    pub fn new(state: &AppState) -> Self {
        Self {
            bookings: state.bookings.clone(),
            repository: state.repository.clone(),
        }
    }

    pub async fn create(
        &self,
        user: &User,
        request: CreateRentalRequest,
    ) -> Result<ApiResponse<RentalResponse>, AppError> {
        request.validate()?;
        let window = parse_date_window(&request.start_date, &request.end_date)?;

        let confirmation = self.bookings.book(user, request.car_id, window).await?;

        Ok(ApiResponse::success_with_message(
            RentalResponse::from(&confirmation),
            "rental created, complete the payment using the payment url".to_string(),
        ))
    }

    pub async fn list(&self, user: &User) -> Result<Vec<RentalResponse>, AppError> {
        let rentals = self.repository.list_rentals_for_user(user.id).await?;

        let mut response = Vec::with_capacity(rentals.len());
        for (rental, payment) in &rentals {
            // El catálogo no borra vehículos; si faltara se lista sin nombre
            let car_name = self
                .repository
                .find_vehicle(rental.vehicle_id)
                .await?
                .map(|vehicle| vehicle.display_name())
                .unwrap_or_default();
            response.push(RentalResponse::new(rental, payment, car_name));
        }

        Ok(response)
    }
}
