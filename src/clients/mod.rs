//! Clients - HTTP/SMTP clients for external services
//!
//! This module contains the clients for the invoice gateway and outbound mail.

pub mod invoice_client;
pub mod mail_client;

pub use invoice_client::{InvoiceError, InvoiceGateway, InvoiceRequest, XenditInvoiceClient};
pub use mail_client::{EmailNotification, LogMailTransport, MailError, MailTransport, SmtpMailTransport};
