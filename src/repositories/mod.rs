//! Repositorios
//!
//! `BookingRepository` es la única puerta a los datos persistidos (vehículos,
//! reservas, recargas, pagos y usuarios). Hay una implementación PostgreSQL y una en
//! memoria; ambas garantizan lo mismo:
//! - una compra y su pago se escriben juntos o no se escribe ninguno;
//! - `reserve` comprueba stock e inserta bajo el mismo cerrojo por vehículo;
//! - `settle_payment` solo modifica pagos que siguen en `Unpaid`.

pub mod booking_repository;
pub mod memory_repository;

pub use booking_repository::PgBookingRepository;
pub use memory_repository::InMemoryBookingRepository;

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{
    NewRental, NewUser, Payment, PaymentSettlement, Rental, TopUp, User, Vehicle,
    VehicleFilters,
};
use crate::services::overlap::{DateWindow, ReservationWindow};
use crate::utils::errors::AppResult;

#[async_trait]
pub trait BookingRepository: Send + Sync {
    // Vehículos
    async fn find_vehicle(&self, id: Uuid) -> AppResult<Option<Vehicle>>;
    async fn list_vehicles(&self, filters: &VehicleFilters) -> AppResult<Vec<Vehicle>>;

    /// Ventanas de reservas, opcionalmente limitadas a un vehículo y a las que se
    /// solapan con `window`.
    async fn reservation_windows(
        &self,
        vehicle_id: Option<Uuid>,
        window: Option<DateWindow>,
    ) -> AppResult<Vec<ReservationWindow>>;

    // Reservas
    /// Inserta la reserva y su pago `Unpaid` en una sola escritura, tras volver a
    /// contar los solapamientos bajo cerrojo. Devuelve `Conflict` si ya no queda stock.
    async fn reserve(&self, rental: NewRental) -> AppResult<(Rental, Payment)>;
    async fn find_rental(&self, id: Uuid) -> AppResult<Option<Rental>>;
    async fn list_rentals_for_user(&self, user_id: Uuid) -> AppResult<Vec<(Rental, Payment)>>;

    // Recargas
    async fn create_top_up(&self, user_id: Uuid, amount: rust_decimal::Decimal) -> AppResult<(TopUp, Payment)>;
    async fn find_top_up(&self, id: Uuid) -> AppResult<Option<TopUp>>;

    // Pagos
    async fn find_payment(&self, id: Uuid) -> AppResult<Option<Payment>>;
    async fn attach_invoice_url(&self, payment_id: Uuid, url: &str) -> AppResult<Payment>;
    /// Aplica el resultado del webhook solo si el pago sigue `Unpaid`.
    /// `None` significa que otro escritor ya lo finalizó.
    async fn settle_payment(
        &self,
        payment_id: Uuid,
        settlement: PaymentSettlement,
    ) -> AppResult<Option<Payment>>;

    // Usuarios
    async fn create_user(&self, user: NewUser) -> AppResult<User>;
    async fn find_user(&self, id: Uuid) -> AppResult<Option<User>>;
    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<User>>;
    async fn rental_owner(&self, rental_id: Uuid) -> AppResult<Option<User>>;
    async fn top_up_owner(&self, top_up_id: Uuid) -> AppResult<Option<User>>;
}
