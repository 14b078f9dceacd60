//! Resolución de la compra dueña de un pago
//!
//! Cada variante de `PurchaseRef` tiene su propia búsqueda; no hay asociación
//! polimórfica genérica.

use crate::models::{PurchaseRef, User};
use crate::repositories::BookingRepository;
use crate::utils::errors::AppResult;

/// Cliente que hizo la compra, si la compra y el cliente siguen existiendo
pub async fn resolve_purchase_owner(
    repository: &dyn BookingRepository,
    purchase: PurchaseRef,
) -> AppResult<Option<User>> {
    match purchase {
        PurchaseRef::Rental(rental_id) => repository.rental_owner(rental_id).await,
        PurchaseRef::TopUp(top_up_id) => repository.top_up_owner(top_up_id).await,
    }
}
