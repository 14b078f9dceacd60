//! Modelos del sistema
//!
//! Este módulo contiene los modelos de dominio que mapean al schema PostgreSQL.

pub mod payment;
pub mod rental;
pub mod user;
pub mod vehicle;

pub use payment::{InvoiceState, Payment, PaymentSettlement, PaymentStatus, PurchaseRef};
pub use rental::{NewRental, Rental, TopUp};
pub use user::{NewUser, User};
pub use vehicle::{Vehicle, VehicleFilters};
