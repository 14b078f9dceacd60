//! Repositorio en memoria
//!
//! Misma semántica que el repositorio PostgreSQL, con un único `RwLock` que hace de
//! transacción. Se usa en tests y en desarrollo local sin base de datos.

use std::collections::HashMap;

use async_trait::async_trait;
use rust_decimal::Decimal;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::BookingRepository;
use crate::models::{
    InvoiceState, NewRental, NewUser, Payment, PaymentSettlement, PaymentStatus, PurchaseRef,
    Rental, TopUp, User, Vehicle, VehicleFilters,
};
use crate::services::overlap::{self, DateWindow, ReservationWindow};
use crate::utils::errors::{not_found_error, AppError, AppResult};

#[derive(Default)]
struct Tables {
    vehicles: Vec<Vehicle>,
    rentals: Vec<Rental>,
    top_ups: Vec<TopUp>,
    payments: HashMap<Uuid, Payment>,
    users: Vec<User>,
}

impl Tables {
    fn windows(&self, vehicle_id: Option<Uuid>, window: Option<&DateWindow>) -> Vec<ReservationWindow> {
        self.rentals
            .iter()
            .filter(|r| vehicle_id.map_or(true, |id| r.vehicle_id == id))
            .map(|r| ReservationWindow {
                vehicle_id: r.vehicle_id,
                start_date: r.start_date,
                end_date: r.end_date,
            })
            .filter(|w| window.map_or(true, |q| w.window().overlaps(q)))
            .collect()
    }

    fn payment_for(&self, purchase: PurchaseRef) -> Option<&Payment> {
        self.payments.values().find(|p| p.purchase == purchase)
    }

    fn user(&self, id: Uuid) -> Option<&User> {
        self.users.iter().find(|u| u.id == id)
    }
}

#[derive(Default)]
pub struct InMemoryBookingRepository {
    tables: RwLock<Tables>,
}

impl InMemoryBookingRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Alta directa de vehículos (el catálogo no se gestiona desde la API)
    pub async fn insert_vehicle(&self, vehicle: Vehicle) {
        self.tables.write().await.vehicles.push(vehicle);
    }

    /// Inserta una reserva ya existente con su pago, sin comprobar stock
    pub async fn insert_rental(&self, rental: Rental) -> Payment {
        let mut tables = self.tables.write().await;
        let payment = Payment::new_unpaid(PurchaseRef::Rental(rental.id));
        tables.payments.insert(payment.id, payment.clone());
        tables.rentals.push(rental);
        payment
    }

    pub async fn rental_count(&self) -> usize {
        self.tables.read().await.rentals.len()
    }
}

#[async_trait]
impl BookingRepository for InMemoryBookingRepository {
    async fn find_vehicle(&self, id: Uuid) -> AppResult<Option<Vehicle>> {
        let tables = self.tables.read().await;
        Ok(tables.vehicles.iter().find(|v| v.id == id).cloned())
    }

    async fn list_vehicles(&self, filters: &VehicleFilters) -> AppResult<Vec<Vehicle>> {
        let tables = self.tables.read().await;
        Ok(tables
            .vehicles
            .iter()
            .filter(|v| filters.matches(v))
            .cloned()
            .collect())
    }

    async fn reservation_windows(
        &self,
        vehicle_id: Option<Uuid>,
        window: Option<DateWindow>,
    ) -> AppResult<Vec<ReservationWindow>> {
        let tables = self.tables.read().await;
        Ok(tables.windows(vehicle_id, window.as_ref()))
    }

    async fn reserve(&self, new_rental: NewRental) -> AppResult<(Rental, Payment)> {
        // El cerrojo de escritura cubre el recuento y la inserción
        let mut tables = self.tables.write().await;

        let stock = tables
            .vehicles
            .iter()
            .find(|v| v.id == new_rental.vehicle_id)
            .map(|v| v.stock)
            .ok_or_else(|| not_found_error("Vehicle", &new_rental.vehicle_id.to_string()))?;

        let window = DateWindow::new(new_rental.start_date, new_rental.end_date)?;
        let existing = tables.windows(Some(new_rental.vehicle_id), Some(&window));
        let committed = overlap::overlap_count_for(new_rental.vehicle_id, Some(&window), &existing);
        if committed >= stock {
            return Err(AppError::Conflict("car is not available".to_string()));
        }

        let rental = Rental {
            id: Uuid::new_v4(),
            user_id: new_rental.user_id,
            vehicle_id: new_rental.vehicle_id,
            start_date: new_rental.start_date,
            end_date: new_rental.end_date,
            total_price: new_rental.total_price,
        };
        let payment = Payment::new_unpaid(PurchaseRef::Rental(rental.id));

        tables.rentals.push(rental.clone());
        tables.payments.insert(payment.id, payment.clone());

        Ok((rental, payment))
    }

    async fn find_rental(&self, id: Uuid) -> AppResult<Option<Rental>> {
        let tables = self.tables.read().await;
        Ok(tables.rentals.iter().find(|r| r.id == id).cloned())
    }

    async fn list_rentals_for_user(&self, user_id: Uuid) -> AppResult<Vec<(Rental, Payment)>> {
        let tables = self.tables.read().await;
        let mut result = Vec::new();
        for rental in tables.rentals.iter().filter(|r| r.user_id == user_id) {
            let payment = tables
                .payment_for(PurchaseRef::Rental(rental.id))
                .cloned()
                .ok_or_else(|| AppError::Internal(format!("Rental {} has no payment", rental.id)))?;
            result.push((rental.clone(), payment));
        }
        Ok(result)
    }

    async fn create_top_up(&self, user_id: Uuid, amount: Decimal) -> AppResult<(TopUp, Payment)> {
        let mut tables = self.tables.write().await;
        let top_up = TopUp {
            id: Uuid::new_v4(),
            user_id,
            amount,
        };
        let payment = Payment::new_unpaid(PurchaseRef::TopUp(top_up.id));

        tables.top_ups.push(top_up.clone());
        tables.payments.insert(payment.id, payment.clone());

        Ok((top_up, payment))
    }

    async fn find_top_up(&self, id: Uuid) -> AppResult<Option<TopUp>> {
        let tables = self.tables.read().await;
        Ok(tables.top_ups.iter().find(|t| t.id == id).cloned())
    }

    async fn find_payment(&self, id: Uuid) -> AppResult<Option<Payment>> {
        let tables = self.tables.read().await;
        Ok(tables.payments.get(&id).cloned())
    }

    async fn attach_invoice_url(&self, payment_id: Uuid, url: &str) -> AppResult<Payment> {
        let mut tables = self.tables.write().await;
        let payment = tables
            .payments
            .get_mut(&payment_id)
            .ok_or_else(|| not_found_error("Payment", &payment_id.to_string()))?;
        payment.invoice = InvoiceState::Issued {
            url: url.to_string(),
        };
        Ok(payment.clone())
    }

    async fn settle_payment(
        &self,
        payment_id: Uuid,
        settlement: PaymentSettlement,
    ) -> AppResult<Option<Payment>> {
        let mut tables = self.tables.write().await;
        let payment = match tables.payments.get_mut(&payment_id) {
            Some(payment) if payment.status == PaymentStatus::Unpaid => payment,
            _ => return Ok(None),
        };
        payment.payment_method = settlement.payment_method;
        payment.total_payment = settlement.paid_amount;
        // Misma ida y vuelta por texto que la columna `status` de Postgres
        payment.status = PaymentStatus::from(settlement.status.as_str());
        Ok(Some(payment.clone()))
    }

    async fn create_user(&self, new_user: NewUser) -> AppResult<User> {
        let mut tables = self.tables.write().await;
        if tables.users.iter().any(|u| u.email == new_user.email) {
            return Err(AppError::Conflict("email already registered".to_string()));
        }
        let user = User {
            id: Uuid::new_v4(),
            name: new_user.name,
            email: new_user.email,
            password_hash: new_user.password_hash,
            deposit: Decimal::ZERO,
        };
        tables.users.push(user.clone());
        Ok(user)
    }

    async fn find_user(&self, id: Uuid) -> AppResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.user(id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.email == email).cloned())
    }

    async fn rental_owner(&self, rental_id: Uuid) -> AppResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables
            .rentals
            .iter()
            .find(|r| r.id == rental_id)
            .and_then(|r| tables.user(r.user_id))
            .cloned())
    }

    async fn top_up_owner(&self, top_up_id: Uuid) -> AppResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables
            .top_ups
            .iter()
            .find(|t| t.id == top_up_id)
            .and_then(|t| tables.user(t.user_id))
            .cloned())
    }
}
