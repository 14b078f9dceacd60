//! DTOs de la API HTTP

pub mod api_response;
pub mod payment_dto;
pub mod rental_dto;
pub mod user_dto;
pub mod vehicle_dto;

pub use api_response::ApiResponse;
