//! Configuración de variables de entorno
//!
//! `EnvironmentConfig::from_env` se llama una sola vez en `main`; a partir de ahí la
//! configuración viaja como valor explícito hacia los componentes que la necesitan.
//! La lógica de negocio nunca lee variables de entorno.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};

use super::database::DatabaseConfig;

/// Métodos de pago aceptados por defecto en las facturas
pub const DEFAULT_PAYMENT_METHODS: [&str; 7] =
    ["CREDIT_CARD", "BCA", "BNI", "BSI", "BRI", "MANDIRI", "PERMATA"];

/// Configuración del gateway de facturas
#[derive(Debug, Clone)]
pub struct InvoiceGatewayConfig {
    pub api_url: String,
    pub api_key: String,
    pub timeout: Duration,
    pub currency: String,
    pub payment_methods: Vec<String>,
    pub success_redirect_url: String,
    pub failure_redirect_url: String,
}

impl Default for InvoiceGatewayConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.xendit.co/v2/invoices".to_string(),
            api_key: String::new(),
            timeout: Duration::from_secs(10),
            currency: "IDR".to_string(),
            payment_methods: DEFAULT_PAYMENT_METHODS.iter().map(|m| m.to_string()).collect(),
            success_redirect_url: "https://example.com".to_string(),
            failure_redirect_url: "https://example.com".to_string(),
        }
    }
}

/// Secreto compartido con el gateway para el webhook de pagos
#[derive(Debug, Clone)]
pub struct WebhookConfig {
    pub callback_token: String,
}

/// Configuración SMTP. Sin `host` los correos solo se registran en el log.
#[derive(Debug, Clone)]
pub struct MailConfig {
    pub host: Option<String>,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from: String,
    pub queue_capacity: usize,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            host: None,
            port: 587,
            username: String::new(),
            password: String::new(),
            from: "no-reply@car-rental.local".to_string(),
            queue_capacity: 256,
        }
    }
}

/// Configuración del entorno
#[derive(Debug, Clone)]
pub struct EnvironmentConfig {
    pub environment: String,
    pub port: u16,
    pub host: String,
    pub jwt_secret: String,
    pub jwt_expiration: u64,
    pub cors_origins: Vec<String>,
    pub database: DatabaseConfig,
    pub invoice: InvoiceGatewayConfig,
    pub webhook: WebhookConfig,
    pub mail: MailConfig,
}

fn required(key: &str) -> Result<String> {
    env::var(key).with_context(|| format!("{} must be set", key))
}

fn parsed_or<T: FromStr>(key: &str, default: T) -> Result<T> {
    match env::var(key) {
        Ok(value) => value
            .parse()
            .map_err(|_| anyhow!("{} must be a valid value, got '{}'", key, value)),
        Err(_) => Ok(default),
    }
}

impl EnvironmentConfig {
    /// Construir la configuración a partir del entorno del proceso
    pub fn from_env() -> Result<Self> {
        let invoice_defaults = InvoiceGatewayConfig::default();
        let mail_defaults = MailConfig::default();

        let payment_methods = match env::var("INVOICE_PAYMENT_METHODS") {
            Ok(value) => value
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            Err(_) => invoice_defaults.payment_methods.clone(),
        };

        Ok(Self {
            environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
            port: parsed_or("PORT", 8080)?,
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            jwt_secret: required("JWT_SECRET")?,
            jwt_expiration: parsed_or("JWT_EXPIRATION", 5 * 3600)?,
            cors_origins: env::var("CORS_ORIGINS")
                .map(|origins| {
                    origins
                        .split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
            database: DatabaseConfig {
                url: required("DATABASE_URL")?,
                max_connections: parsed_or("DATABASE_MAX_CONNECTIONS", 20)?,
                ..DatabaseConfig::default()
            },
            invoice: InvoiceGatewayConfig {
                api_url: env::var("INVOICE_API_URL").unwrap_or(invoice_defaults.api_url),
                api_key: required("INVOICE_API_KEY")?,
                timeout: Duration::from_secs(parsed_or("INVOICE_TIMEOUT_SECS", 10)?),
                currency: env::var("INVOICE_CURRENCY").unwrap_or(invoice_defaults.currency),
                payment_methods,
                success_redirect_url: env::var("INVOICE_SUCCESS_URL")
                    .unwrap_or(invoice_defaults.success_redirect_url),
                failure_redirect_url: env::var("INVOICE_FAILURE_URL")
                    .unwrap_or(invoice_defaults.failure_redirect_url),
            },
            webhook: WebhookConfig {
                callback_token: required("PAYMENT_WEBHOOK_TOKEN")?,
            },
            mail: MailConfig {
                host: env::var("SMTP_HOST").ok().filter(|h| !h.is_empty()),
                port: parsed_or("SMTP_PORT", mail_defaults.port)?,
                username: env::var("SMTP_USER").unwrap_or_default(),
                password: env::var("SMTP_PASS").unwrap_or_default(),
                from: env::var("MAIL_FROM").unwrap_or(mail_defaults.from),
                queue_capacity: parsed_or("MAIL_QUEUE_CAPACITY", mail_defaults.queue_capacity)?,
            },
        })
    }

    /// Verificar si estamos en modo desarrollo
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    /// Obtener la URL del servidor
    pub fn server_url(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
