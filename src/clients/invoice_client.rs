//! Cliente HTTP para el gateway de facturas (Xendit Invoices API)
//!
//! El gateway recibe el id del pago como `external_id` y devuelve la URL donde el
//! cliente paga. Cualquier respuesta no 2xx, o sin `invoice_url`, es un fallo.

use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config::InvoiceGatewayConfig;

/// Datos de negocio para emitir una factura
#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceRequest {
    pub payment_id: Uuid,
    pub amount: Decimal,
    pub description: String,
    pub customer_email: String,
}

#[derive(Error, Debug)]
pub enum InvoiceError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("gateway responded with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("gateway response has no invoice_url")]
    MissingUrl,

    #[error("gateway did not answer within {0:?}")]
    Timeout(std::time::Duration),
}

/// Gateway externo de facturas
#[async_trait]
pub trait InvoiceGateway: Send + Sync {
    /// Devuelve la URL de pago de la factura creada
    async fn create_invoice(&self, request: &InvoiceRequest) -> Result<String, InvoiceError>;
}

#[derive(Debug, Serialize)]
struct InvoiceCustomer<'a> {
    email: &'a str,
}

/// Cuerpo tal como lo espera la API
#[derive(Debug, Serialize)]
struct InvoicePayload<'a> {
    external_id: String,
    #[serde(with = "rust_decimal::serde::float")]
    amount: Decimal,
    description: &'a str,
    customer: InvoiceCustomer<'a>,
    success_redirect_url: &'a str,
    failure_redirect_url: &'a str,
    payment_methods: &'a [String],
    currency: &'a str,
}

#[derive(Debug, Deserialize)]
struct InvoiceResponse {
    invoice_url: Option<String>,
}

/// Cliente Xendit
pub struct XenditInvoiceClient {
    client: Client,
    config: InvoiceGatewayConfig,
}

impl XenditInvoiceClient {
    pub fn new(config: InvoiceGatewayConfig) -> Result<Self, InvoiceError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent("CarRental/1.0")
            .build()?;

        Ok(Self { client, config })
    }

    fn payload<'a>(&'a self, request: &'a InvoiceRequest) -> InvoicePayload<'a> {
        InvoicePayload {
            external_id: request.payment_id.to_string(),
            amount: request.amount,
            description: &request.description,
            customer: InvoiceCustomer {
                email: &request.customer_email,
            },
            success_redirect_url: &self.config.success_redirect_url,
            failure_redirect_url: &self.config.failure_redirect_url,
            payment_methods: &self.config.payment_methods,
            currency: &self.config.currency,
        }
    }
}

#[async_trait]
impl InvoiceGateway for XenditInvoiceClient {
    async fn create_invoice(&self, request: &InvoiceRequest) -> Result<String, InvoiceError> {
        log::info!("🧾 Solicitando factura para pago {}", request.payment_id);

        let response = self
            .client
            .post(&self.config.api_url)
            .basic_auth(&self.config.api_key, Some(""))
            .json(&self.payload(request))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    InvoiceError::Timeout(self.config.timeout)
                } else {
                    InvoiceError::Transport(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            log::warn!("⚠️ Gateway de facturas respondió {}: {}", status, body);
            return Err(InvoiceError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body: InvoiceResponse = response.json().await?;
        body.invoice_url
            .filter(|url| !url.is_empty())
            .ok_or(InvoiceError::MissingUrl)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_shape() {
        let client = XenditInvoiceClient::new(InvoiceGatewayConfig::default()).unwrap();
        let payment_id = Uuid::new_v4();
        let request = InvoiceRequest {
            payment_id,
            amount: Decimal::from(600_000),
            description: "Renting Toyota Avanza, from: 2024-09-01 to 2024-09-03".to_string(),
            customer_email: "budi@example.com".to_string(),
        };

        let json = serde_json::to_value(client.payload(&request)).unwrap();
        assert_eq!(json["external_id"], payment_id.to_string());
        assert_eq!(json["amount"], 600000.0);
        assert_eq!(json["customer"]["email"], "budi@example.com");
        assert_eq!(json["currency"], "IDR");
        assert_eq!(json["payment_methods"].as_array().unwrap().len(), 7);
        assert_eq!(json["success_redirect_url"], "https://example.com");
    }

    #[test]
    fn test_response_without_url() {
        let body: InvoiceResponse = serde_json::from_str(r#"{"id":"inv-1"}"#).unwrap();
        assert!(body.invoice_url.is_none());
    }
}
