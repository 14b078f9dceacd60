use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use super::BookingRepository;
use crate::models::payment::{PURCHASE_RENTAL, PURCHASE_TOP_UP, STATUS_UNPAID};
use crate::models::{
    InvoiceState, NewRental, NewUser, Payment, PaymentSettlement, PaymentStatus, PurchaseRef,
    Rental, TopUp, User, Vehicle, VehicleFilters,
};
use crate::services::overlap::{self, DateWindow, ReservationWindow};
use crate::utils::errors::{not_found_error, AppError, AppResult};

const PAYMENT_COLUMNS: &str =
    "id, purchase_type, purchase_id, status, payment_url, payment_method, total_payment";

// Fila tal cual sale de la tabla payments
#[derive(Debug, sqlx::FromRow)]
struct PaymentRow {
    id: Uuid,
    purchase_type: String,
    purchase_id: Uuid,
    status: String,
    payment_url: Option<String>,
    payment_method: String,
    total_payment: Decimal,
}

impl TryFrom<PaymentRow> for Payment {
    type Error = AppError;

    fn try_from(row: PaymentRow) -> Result<Self, Self::Error> {
        Ok(Payment {
            id: row.id,
            purchase: PurchaseRef::from_parts(&row.purchase_type, row.purchase_id)?,
            status: PaymentStatus::from(row.status.as_str()),
            invoice: InvoiceState::from_url(row.payment_url),
            payment_method: row.payment_method,
            total_payment: row.total_payment,
        })
    }
}

pub struct PgBookingRepository {
    pool: PgPool,
}

impl PgBookingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn insert_payment<'c, E>(executor: E, purchase: PurchaseRef) -> AppResult<Payment>
    where
        E: sqlx::Executor<'c, Database = sqlx::Postgres>,
    {
        let row = sqlx::query_as::<_, PaymentRow>(&format!(
            r#"
            INSERT INTO payments (id, purchase_type, purchase_id, status, payment_url, payment_method, total_payment)
            VALUES ($1, $2, $3, $4, NULL, '', 0)
            RETURNING {PAYMENT_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(purchase.type_tag())
        .bind(purchase.id())
        .bind(STATUS_UNPAID)
        .fetch_one(executor)
        .await?;

        row.try_into()
    }

    async fn find_owner(&self, table: &str, purchase_id: Uuid) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            SELECT u.id, u.name, u.email, u.password_hash, u.deposit
            FROM users u
            JOIN {table} p ON p.user_id = u.id
            WHERE p.id = $1
            "#
        ))
        .bind(purchase_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }
}

#[async_trait]
impl BookingRepository for PgBookingRepository {
    async fn find_vehicle(&self, id: Uuid) -> AppResult<Option<Vehicle>> {
        let vehicle = sqlx::query_as::<_, Vehicle>("SELECT * FROM vehicles WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(vehicle)
    }

    async fn list_vehicles(&self, filters: &VehicleFilters) -> AppResult<Vec<Vehicle>> {
        let vehicles = sqlx::query_as::<_, Vehicle>(
            r#"
            SELECT * FROM vehicles
            WHERE ($1::int IS NULL OR seats >= $1)
              AND ($2::text IS NULL OR LOWER(transmission) = LOWER($2))
              AND ($3::text IS NULL OR LOWER(manufacturer) = LOWER($3))
              AND ($4::text IS NULL OR LOWER(vehicle_type) = LOWER($4))
            ORDER BY manufacturer, model
            "#,
        )
        .bind(filters.seats)
        .bind(filters.transmission.as_deref())
        .bind(filters.manufacturer.as_deref())
        .bind(filters.vehicle_type.as_deref())
        .fetch_all(&self.pool)
        .await?;

        Ok(vehicles)
    }

    async fn reservation_windows(
        &self,
        vehicle_id: Option<Uuid>,
        window: Option<DateWindow>,
    ) -> AppResult<Vec<ReservationWindow>> {
        let windows = sqlx::query_as::<_, ReservationWindow>(
            r#"
            SELECT vehicle_id, start_date, end_date FROM rentals
            WHERE ($1::uuid IS NULL OR vehicle_id = $1)
              AND ($2::date IS NULL OR (start_date <= $3 AND $2 <= end_date))
            "#,
        )
        .bind(vehicle_id)
        .bind(window.map(|w| w.start))
        .bind(window.map(|w| w.end))
        .fetch_all(&self.pool)
        .await?;

        Ok(windows)
    }

    async fn reserve(&self, new_rental: NewRental) -> AppResult<(Rental, Payment)> {
        let window = DateWindow::new(new_rental.start_date, new_rental.end_date)?;
        let mut tx = self.pool.begin().await?;

        // FOR UPDATE sobre el vehículo serializa las reservas concurrentes del mismo coche
        let stock: (i64,) = sqlx::query_as("SELECT stock FROM vehicles WHERE id = $1 FOR UPDATE")
            .bind(new_rental.vehicle_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| not_found_error("Vehicle", &new_rental.vehicle_id.to_string()))?;

        let existing = sqlx::query_as::<_, ReservationWindow>(
            r#"
            SELECT vehicle_id, start_date, end_date FROM rentals
            WHERE vehicle_id = $1 AND start_date <= $3 AND $2 <= end_date
            "#,
        )
        .bind(new_rental.vehicle_id)
        .bind(window.start)
        .bind(window.end)
        .fetch_all(&mut *tx)
        .await?;

        let committed = overlap::overlap_count_for(new_rental.vehicle_id, Some(&window), &existing);
        if committed >= stock.0 {
            tx.rollback().await?;
            return Err(AppError::Conflict("car is not available".to_string()));
        }

        let rental = sqlx::query_as::<_, Rental>(
            r#"
            INSERT INTO rentals (id, user_id, vehicle_id, start_date, end_date, total_price)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, user_id, vehicle_id, start_date, end_date, total_price
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(new_rental.user_id)
        .bind(new_rental.vehicle_id)
        .bind(new_rental.start_date)
        .bind(new_rental.end_date)
        .bind(new_rental.total_price)
        .fetch_one(&mut *tx)
        .await?;

        let payment = Self::insert_payment(&mut *tx, PurchaseRef::Rental(rental.id)).await?;
        tx.commit().await?;

        Ok((rental, payment))
    }

    async fn find_rental(&self, id: Uuid) -> AppResult<Option<Rental>> {
        let rental = sqlx::query_as::<_, Rental>(
            "SELECT id, user_id, vehicle_id, start_date, end_date, total_price FROM rentals WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(rental)
    }

    async fn list_rentals_for_user(&self, user_id: Uuid) -> AppResult<Vec<(Rental, Payment)>> {
        let rentals = sqlx::query_as::<_, Rental>(
            r#"
            SELECT id, user_id, vehicle_id, start_date, end_date, total_price
            FROM rentals WHERE user_id = $1
            ORDER BY start_date DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let ids: Vec<Uuid> = rentals.iter().map(|r| r.id).collect();
        let rows = sqlx::query_as::<_, PaymentRow>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE purchase_type = $1 AND purchase_id = ANY($2)"
        ))
        .bind(PURCHASE_RENTAL)
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let mut payments = Vec::with_capacity(rows.len());
        for row in rows {
            payments.push(Payment::try_from(row)?);
        }

        rentals
            .into_iter()
            .map(|rental| {
                let payment = payments
                    .iter()
                    .find(|p| p.purchase == PurchaseRef::Rental(rental.id))
                    .cloned()
                    .ok_or_else(|| AppError::Internal(format!("Rental {} has no payment", rental.id)))?;
                Ok((rental, payment))
            })
            .collect()
    }

    async fn create_top_up(&self, user_id: Uuid, amount: Decimal) -> AppResult<(TopUp, Payment)> {
        let mut tx = self.pool.begin().await?;

        let top_up = sqlx::query_as::<_, TopUp>(
            "INSERT INTO top_ups (id, user_id, amount) VALUES ($1, $2, $3) RETURNING id, user_id, amount",
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(amount)
        .fetch_one(&mut *tx)
        .await?;

        let payment = Self::insert_payment(&mut *tx, PurchaseRef::TopUp(top_up.id)).await?;
        tx.commit().await?;

        Ok((top_up, payment))
    }

    async fn find_top_up(&self, id: Uuid) -> AppResult<Option<TopUp>> {
        let top_up = sqlx::query_as::<_, TopUp>("SELECT id, user_id, amount FROM top_ups WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(top_up)
    }

    async fn find_payment(&self, id: Uuid) -> AppResult<Option<Payment>> {
        let row = sqlx::query_as::<_, PaymentRow>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Payment::try_from).transpose()
    }

    async fn attach_invoice_url(&self, payment_id: Uuid, url: &str) -> AppResult<Payment> {
        let row = sqlx::query_as::<_, PaymentRow>(&format!(
            "UPDATE payments SET payment_url = $2, updated_at = NOW() WHERE id = $1 RETURNING {PAYMENT_COLUMNS}"
        ))
        .bind(payment_id)
        .bind(url)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| not_found_error("Payment", &payment_id.to_string()))?;

        row.try_into()
    }

    async fn settle_payment(
        &self,
        payment_id: Uuid,
        settlement: PaymentSettlement,
    ) -> AppResult<Option<Payment>> {
        // La condición sobre status hace que solo un escritor gane la transición
        let row = sqlx::query_as::<_, PaymentRow>(&format!(
            r#"
            UPDATE payments
            SET payment_method = $2, total_payment = $3, status = $4, updated_at = NOW()
            WHERE id = $1 AND status = $5
            RETURNING {PAYMENT_COLUMNS}
            "#
        ))
        .bind(payment_id)
        .bind(&settlement.payment_method)
        .bind(settlement.paid_amount)
        .bind(settlement.status.as_str())
        .bind(STATUS_UNPAID)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Payment::try_from).transpose()
    }

    async fn create_user(&self, new_user: NewUser) -> AppResult<User> {
        let result = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, name, email, password_hash, deposit)
            VALUES ($1, $2, $3, $4, 0)
            RETURNING id, name, email, password_hash, deposit
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&new_user.name)
        .bind(&new_user.email)
        .bind(&new_user.password_hash)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(user) => Ok(user),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(AppError::Conflict("email already registered".to_string()))
            }
            Err(e) => Err(AppError::Database(e)),
        }
    }

    async fn find_user(&self, id: Uuid) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, name, email, password_hash, deposit FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, name, email, password_hash, deposit FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn rental_owner(&self, rental_id: Uuid) -> AppResult<Option<User>> {
        self.find_owner(PURCHASE_RENTAL, rental_id).await
    }

    async fn top_up_owner(&self, top_up_id: Uuid) -> AppResult<Option<User>> {
        self.find_owner(PURCHASE_TOP_UP, top_up_id).await
    }
}
