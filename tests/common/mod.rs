#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use tokio::sync::mpsc::Receiver;
use uuid::Uuid;

use car_rental::clients::{EmailNotification, InvoiceError, InvoiceGateway, InvoiceRequest};
use car_rental::config::{
    DatabaseConfig, EnvironmentConfig, InvoiceGatewayConfig, MailConfig, WebhookConfig,
};
use car_rental::models::{NewUser, User, Vehicle};
use car_rental::repositories::{BookingRepository, InMemoryBookingRepository};
use car_rental::services::NotificationQueue;
use car_rental::state::AppState;

pub const CALLBACK_TOKEN: &str = "callback-secret";
pub const INVOICE_TIMEOUT: Duration = Duration::from_millis(200);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayMode {
    Succeed,
    Fail,
    Hang,
}

/// Gateway de facturas controlable desde el test
pub struct StubGateway {
    mode: Mutex<GatewayMode>,
    calls: AtomicUsize,
    requests: Mutex<Vec<InvoiceRequest>>,
}

impl StubGateway {
    pub fn new(mode: GatewayMode) -> Self {
        Self {
            mode: Mutex::new(mode),
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn set_mode(&self, mode: GatewayMode) {
        *self.mode.lock().unwrap() = mode;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<InvoiceRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl InvoiceGateway for StubGateway {
    async fn create_invoice(&self, request: &InvoiceRequest) -> Result<String, InvoiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());
        let mode = *self.mode.lock().unwrap();

        match mode {
            GatewayMode::Succeed => Ok(format!("https://pay.example/{}", request.payment_id)),
            GatewayMode::Fail => Err(InvoiceError::Status {
                status: 500,
                body: "gateway down".to_string(),
            }),
            GatewayMode::Hang => std::future::pending().await,
        }
    }
}

pub fn test_config() -> EnvironmentConfig {
    EnvironmentConfig {
        environment: "test".to_string(),
        port: 0,
        host: "127.0.0.1".to_string(),
        jwt_secret: "test-jwt-secret".to_string(),
        jwt_expiration: 3600,
        cors_origins: Vec::new(),
        database: DatabaseConfig::default(),
        invoice: InvoiceGatewayConfig {
            timeout: INVOICE_TIMEOUT,
            ..InvoiceGatewayConfig::default()
        },
        webhook: WebhookConfig {
            callback_token: CALLBACK_TOKEN.to_string(),
        },
        mail: MailConfig::default(),
    }
}

pub struct TestApp {
    pub repo: Arc<InMemoryBookingRepository>,
    pub gateway: Arc<StubGateway>,
    pub state: AppState,
    pub outbox: Receiver<EmailNotification>,
}

impl TestApp {
    pub fn new(mode: GatewayMode) -> Self {
        let repo = Arc::new(InMemoryBookingRepository::new());
        let gateway = Arc::new(StubGateway::new(mode));
        let (queue, outbox) = NotificationQueue::channel(32);
        let state = AppState::new(test_config(), repo.clone(), gateway.clone(), queue);

        Self {
            repo,
            gateway,
            state,
            outbox,
        }
    }

    pub async fn add_vehicle(&self, stock: i64, rate_per_day: i64) -> Vehicle {
        let vehicle = Vehicle {
            id: Uuid::new_v4(),
            wheel_drive: 2,
            vehicle_type: "MPV".to_string(),
            seats: 7,
            transmission: "Manual".to_string(),
            manufacturer: "Toyota".to_string(),
            model: "Avanza".to_string(),
            year: 2022,
            stock,
            rate_per_day: Decimal::from(rate_per_day),
        };
        self.repo.insert_vehicle(vehicle.clone()).await;
        vehicle
    }

    pub async fn add_customer(&self, email: &str) -> User {
        self.repo
            .create_user(NewUser {
                name: "Budi".to_string(),
                email: email.to_string(),
                password_hash: bcrypt::hash("rahasia", 4).unwrap(),
            })
            .await
            .unwrap()
    }

    /// Correos encolados hasta ahora
    pub fn drain_outbox(&mut self) -> Vec<EmailNotification> {
        let mut emails = Vec::new();
        while let Ok(email) = self.outbox.try_recv() {
            emails.push(email);
        }
        emails
    }
}
