use uuid::Uuid;

use crate::dto::payment_dto::{PaymentSummary, WebhookPayload, WebhookResponse};
use crate::dto::ApiResponse;
use crate::models::User;
use crate::services::{InvoiceService, ReconciliationService};
use crate::state::AppState;
use crate::utils::errors::AppError;

pub struct PaymentController {
    reconciliation: ReconciliationService,
    invoices: InvoiceService,
}

impl PaymentController {
    pub fn new(state: &AppState) -> Self {
        Self {
            reconciliation: state.reconciliation.clone(),
            invoices: state.invoices.clone(),
        }
    }

    pub async fn callback(
        &self,
        caller_token: Option<&str>,
        payload: WebhookPayload,
    ) -> Result<WebhookResponse, AppError> {
        let payment = self
            .reconciliation
            .apply_webhook(caller_token, payload.into())
            .await?;

        Ok(WebhookResponse {
            message: "payment updated successfully".to_string(),
            payment,
        })
    }

    pub async fn reissue_invoice(
        &self,
        user: &User,
        payment_id: Uuid,
    ) -> Result<ApiResponse<PaymentSummary>, AppError> {
        let payment = self.invoices.reissue(user, payment_id).await?;

        Ok(ApiResponse::success_with_message(
            PaymentSummary::from(&payment),
            "invoice issued".to_string(),
        ))
    }
}
