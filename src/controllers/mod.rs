//! Controladores: traducen DTOs de la API a llamadas de servicio

pub mod car_controller;
pub mod payment_controller;
pub mod rental_controller;
pub mod user_controller;
