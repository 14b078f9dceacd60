use axum::{
    extract::{Path, State},
    http::HeaderMap,
    middleware,
    routing::post,
    Extension, Json, Router,
};
use uuid::Uuid;

use crate::controllers::payment_controller::PaymentController;
use crate::dto::payment_dto::{PaymentSummary, WebhookPayload, WebhookResponse};
use crate::dto::ApiResponse;
use crate::middleware::auth::{auth_middleware, AuthenticatedUser};
use crate::state::AppState;
use crate::utils::errors::AppError;

pub const CALLBACK_TOKEN_HEADER: &str = "x-callback-token";

pub fn create_payment_router(state: AppState) -> Router<AppState> {
    // El webhook se autentica con el token compartido, no con sesión de cliente
    let protected = Router::new()
        .route("/:id/invoice", post(reissue_invoice))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware));

    Router::new()
        .route("/callback", post(payment_callback))
        .merge(protected)
}

async fn payment_callback(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<WebhookPayload>,
) -> Result<Json<WebhookResponse>, AppError> {
    let token = headers
        .get(CALLBACK_TOKEN_HEADER)
        .and_then(|value| value.to_str().ok());

    let controller = PaymentController::new(&state);
    let response = controller.callback(token, payload).await?;
    Ok(Json(response))
}

async fn reissue_invoice(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<PaymentSummary>>, AppError> {
    let controller = PaymentController::new(&state);
    let response = controller.reissue_invoice(&user, id).await?;
    Ok(Json(response))
}
