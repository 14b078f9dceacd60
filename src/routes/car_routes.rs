use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use uuid::Uuid;

use crate::controllers::car_controller::CarController;
use crate::dto::vehicle_dto::{AvailabilityQuery, AvailabilityResponse, CarResponse, ListCarsQuery};
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_car_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_cars))
        .route("/:id/availability", get(car_availability))
}

async fn list_cars(
    State(state): State<AppState>,
    Query(query): Query<ListCarsQuery>,
) -> Result<Json<Vec<CarResponse>>, AppError> {
    let controller = CarController::new(&state);
    let response = controller.list(query).await?;
    Ok(Json(response))
}

async fn car_availability(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<AvailabilityResponse>, AppError> {
    let controller = CarController::new(&state);
    let response = controller.availability(id, query).await?;
    Ok(Json(response))
}
