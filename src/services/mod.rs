//! Servicios de negocio
//!
//! Este módulo contiene la lógica de reservas y pagos:
//! - `overlap`: motor puro de solapamiento de fechas
//! - `availability_service`: stock restante por ventana
//! - `booking_service`: orquestador reserva + pago + factura
//! - `reconciliation_service`: webhook del gateway de pagos
//! - `notification_service`: cola y worker de correos

pub mod auth_service;
pub mod availability_service;
pub mod booking_service;
pub mod invoice_service;
pub mod notification_service;
pub mod overlap;
pub mod purchase_service;
pub mod reconciliation_service;
pub mod top_up_service;

pub use auth_service::AuthService;
pub use availability_service::{AvailabilityService, VehicleAvailability};
pub use booking_service::{BookingConfirmation, BookingService, BookingStage};
pub use invoice_service::InvoiceService;
pub use notification_service::{NotificationQueue, NotificationWorker};
pub use reconciliation_service::{ReconciliationService, SettledPayment, WebhookNotice};
pub use top_up_service::TopUpService;
