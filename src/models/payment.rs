//! Modelo de Payment
//!
//! Un pago pertenece exactamente a una compra (reserva o recarga) y sigue la
//! máquina de estados `Unpaid -> {Completed | <estado del gateway>}`. Los estados
//! terminales no se sobrescriben nunca.

use rust_decimal::Decimal;
use serde::{Serialize, Serializer};
use uuid::Uuid;

use crate::utils::errors::AppError;

pub const STATUS_UNPAID: &str = "Unpaid";
pub const STATUS_COMPLETED: &str = "Completed";

/// Estado del pago tal como se persiste (texto)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentStatus {
    Unpaid,
    Completed,
    /// Cualquier otro estado final informado por el gateway, tal cual
    Gateway(String),
}

impl PaymentStatus {
    /// Traduce el estado reportado por el gateway. "PAID" es el único que se normaliza.
    ///
    /// El resto se guarda tal cual como texto, así que se rechazan los vacíos y los
    /// que al releerlos se confundirían con un estado interno.
    pub fn from_gateway(status: &str) -> Result<Self, AppError> {
        match status.trim() {
            "PAID" => Ok(PaymentStatus::Completed),
            "" => Err(AppError::InvalidInput("status is required".to_string())),
            STATUS_UNPAID | STATUS_COMPLETED => Err(AppError::InvalidInput(format!(
                "status '{}' is not a gateway status",
                status.trim()
            ))),
            other => Ok(PaymentStatus::Gateway(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            PaymentStatus::Unpaid => STATUS_UNPAID,
            PaymentStatus::Completed => STATUS_COMPLETED,
            PaymentStatus::Gateway(status) => status,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, PaymentStatus::Unpaid)
    }
}

impl From<&str> for PaymentStatus {
    fn from(value: &str) -> Self {
        match value {
            STATUS_UNPAID => PaymentStatus::Unpaid,
            STATUS_COMPLETED => PaymentStatus::Completed,
            other => PaymentStatus::Gateway(other.to_string()),
        }
    }
}

impl Serialize for PaymentStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Sub-estado de la factura mientras el pago está `Unpaid`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvoiceState {
    /// La reserva existe pero el enlace de pago aún no se pudo emitir
    NotIssued,
    Issued { url: String },
}

impl InvoiceState {
    pub fn from_url(url: Option<String>) -> Self {
        match url {
            Some(url) if !url.is_empty() => InvoiceState::Issued { url },
            _ => InvoiceState::NotIssued,
        }
    }

    pub fn url(&self) -> Option<&str> {
        match self {
            InvoiceState::Issued { url } => Some(url),
            InvoiceState::NotIssued => None,
        }
    }
}

pub const PURCHASE_RENTAL: &str = "rentals";
pub const PURCHASE_TOP_UP: &str = "top_ups";

/// Referencia tipada a la compra dueña del pago
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum PurchaseRef {
    Rental(Uuid),
    TopUp(Uuid),
}

impl PurchaseRef {
    pub fn type_tag(&self) -> &'static str {
        match self {
            PurchaseRef::Rental(_) => PURCHASE_RENTAL,
            PurchaseRef::TopUp(_) => PURCHASE_TOP_UP,
        }
    }

    pub fn id(&self) -> Uuid {
        match self {
            PurchaseRef::Rental(id) | PurchaseRef::TopUp(id) => *id,
        }
    }

    /// Reconstruye la referencia desde las columnas `purchase_type` + `purchase_id`
    pub fn from_parts(type_tag: &str, id: Uuid) -> Result<Self, AppError> {
        match type_tag {
            PURCHASE_RENTAL => Ok(PurchaseRef::Rental(id)),
            PURCHASE_TOP_UP => Ok(PurchaseRef::TopUp(id)),
            other => Err(AppError::Internal(format!("Unknown purchase type '{}'", other))),
        }
    }
}

/// Payment de dominio
#[derive(Debug, Clone, PartialEq)]
pub struct Payment {
    pub id: Uuid,
    pub purchase: PurchaseRef,
    pub status: PaymentStatus,
    pub invoice: InvoiceState,
    pub payment_method: String,
    pub total_payment: Decimal,
}

impl Payment {
    /// Pago recién creado junto con su compra
    pub fn new_unpaid(purchase: PurchaseRef) -> Self {
        Self {
            id: Uuid::new_v4(),
            purchase,
            status: PaymentStatus::Unpaid,
            invoice: InvoiceState::NotIssued,
            payment_method: String::new(),
            total_payment: Decimal::ZERO,
        }
    }

    pub fn awaiting_invoice(&self) -> bool {
        self.status == PaymentStatus::Unpaid && self.invoice == InvoiceState::NotIssued
    }
}

/// Datos aplicados por el webhook sobre un pago `Unpaid`
#[derive(Debug, Clone)]
pub struct PaymentSettlement {
    pub payment_method: String,
    pub paid_amount: Decimal,
    pub status: PaymentStatus,
}
