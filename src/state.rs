//! Shared application state
//!
//! Este módulo define el estado compartido de la aplicación que se pasa
//! a través del router de Axum. Todos los servicios comparten el mismo
//! repositorio y la misma cola de notificaciones.

use std::sync::Arc;

use crate::clients::InvoiceGateway;
use crate::config::environment::EnvironmentConfig;
use crate::repositories::BookingRepository;
use crate::services::{
    AuthService, AvailabilityService, BookingService, InvoiceService, NotificationQueue,
    ReconciliationService, TopUpService,
};
use crate::utils::jwt::JwtConfig;

#[derive(Clone)]
pub struct AppState {
    pub config: EnvironmentConfig,
    pub jwt: JwtConfig,
    pub repository: Arc<dyn BookingRepository>,
    pub auth: AuthService,
    pub availability: AvailabilityService,
    pub bookings: BookingService,
    pub invoices: InvoiceService,
    pub top_ups: TopUpService,
    pub reconciliation: ReconciliationService,
}

impl AppState {
    pub fn new(
        config: EnvironmentConfig,
        repository: Arc<dyn BookingRepository>,
        gateway: Arc<dyn InvoiceGateway>,
        notifications: NotificationQueue,
    ) -> Self {
        let jwt = JwtConfig::from(&config);
        let invoices = InvoiceService::new(repository.clone(), gateway, config.invoice.timeout);

        Self {
            auth: AuthService::new(repository.clone(), jwt.clone(), notifications.clone()),
            availability: AvailabilityService::new(repository.clone()),
            bookings: BookingService::new(repository.clone(), invoices.clone(), notifications.clone()),
            top_ups: TopUpService::new(repository.clone(), invoices.clone()),
            reconciliation: ReconciliationService::new(
                repository.clone(),
                config.webhook.clone(),
                notifications,
            ),
            invoices,
            repository,
            jwt,
            config,
        }
    }
}
